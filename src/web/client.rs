use crate::config::ClientConfig;
use crate::domain::card::Card;
use crate::domain::model::{Token, TokenParams, TokenVerification};
use crate::domain::ports::{ApiError, ApiResult, TokenGateway};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

/// Gateway API client over HTTP. Authenticates every request with HTTP
/// basic auth, the API key as username and an empty password.
pub struct StartClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTokenBody<'a> {
    number: &'a str,
    cvc: &'a str,
    expiration_month: u32,
    expiration_year: i32,
    owner: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount_in_cents: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateVerificationBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    amount_in_cents: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<&'a str>,
}

impl StartClient {
    pub fn new(config: &ClientConfig) -> Result<StartClient> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(StartClient {
            client,
            base_url: config.parsed_base_url()?,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .expect("base URL is a valid http(s) base")
            .pop_if_empty()
            .extend(segments);
        url
    }

    /// Issues one request and maps the response per the gateway contract:
    /// 2xx bodies decode into `T`, non-2xx responses surface as structured
    /// status errors with the raw body, everything else (including decode
    /// failures) is a transport failure.
    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> ApiResult<T> {
        let response = request
            .basic_auth(&self.api_key, Some(""))
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("gateway responded with status {}", status);
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl TokenGateway for StartClient {
    async fn create_token(&self, card: &Card, params: &TokenParams) -> ApiResult<Token> {
        let url = self.endpoint(&["tokens"]);
        tracing::debug!("POST {}", url);
        let body = CreateTokenBody {
            number: card.number(),
            cvc: card.cvc(),
            expiration_month: card.expiration_month(),
            expiration_year: card.expiration_year(),
            owner: card.owner(),
            amount_in_cents: params.amount_in_cents,
            currency: params.currency.as_deref(),
        };
        self.execute(self.client.post(url).json(&body)).await
    }

    async fn create_verification(
        &self,
        token_id: &str,
        params: &TokenParams,
    ) -> ApiResult<TokenVerification> {
        let url = self.endpoint(&["tokens", token_id, "verification"]);
        tracing::debug!("POST {}", url);
        let body = CreateVerificationBody {
            amount_in_cents: params.amount_in_cents,
            currency: params.currency.as_deref(),
        };
        self.execute(self.client.post(url).json(&body)).await
    }

    async fn get_verification(&self, token_id: &str) -> ApiResult<TokenVerification> {
        let url = self.endpoint(&["tokens", token_id, "verification"]);
        tracing::debug!("GET {}", url);
        self.execute(self.client.get(url)).await
    }

    fn verification_url(&self, token_id: &str) -> Url {
        self.endpoint(&["tokens", token_id, "verification", "verify"])
    }
}
