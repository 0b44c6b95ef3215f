use crate::domain::card::Card;
use crate::domain::model::{Token, TokenParams, TokenVerification};
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Outcome of a single gateway request. A structured non-2xx response and a
/// transport failure are distinct: retry policies treat them differently.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("gateway returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(Box::new(err))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The gateway operations the issuance engine depends on. Each call is a
/// fresh one-shot request; implementations must be safe to re-issue.
#[async_trait]
pub trait TokenGateway: Send + Sync {
    async fn create_token(&self, card: &Card, params: &TokenParams) -> ApiResult<Token>;

    async fn create_verification(
        &self,
        token_id: &str,
        params: &TokenParams,
    ) -> ApiResult<TokenVerification>;

    async fn get_verification(&self, token_id: &str) -> ApiResult<TokenVerification>;

    /// The page the cardholder must visit to complete a 3-D-Secure style
    /// challenge for the given token.
    fn verification_url(&self, token_id: &str) -> Url;
}

/// Where the cardholder completes the browser challenge. Opaque to the
/// engine: a webview dialog, a system browser, a terminal prompt.
#[async_trait]
pub trait ChallengeSurface: Send + Sync {
    /// Presents the verification page. Resolves only when the user
    /// dismisses the page, which the engine treats as cancellation.
    async fn present(&self, url: &Url);

    /// Tears the page down after the verification finalized remotely.
    async fn close(&self);
}

#[async_trait]
impl<T: ChallengeSurface + ?Sized> ChallengeSurface for std::sync::Arc<T> {
    async fn present(&self, url: &Url) {
        (**self).present(url).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
