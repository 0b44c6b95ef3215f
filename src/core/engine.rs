use crate::core::retry::{with_bounded_retry, with_condition_retry};
use crate::domain::card::Card;
use crate::domain::model::{Token, TokenParams, TokenVerification};
use crate::domain::ports::{ChallengeSurface, TokenGateway};
use crate::utils::error::{Result, StartError};
use std::time::Duration;

pub const MAX_REQUEST_ATTEMPTS: u32 = 4;
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Terminal outcome of one token issuance. The future returned by
/// [`TokenEngine::issue_token`] resolves exactly once, so every issuance
/// ends in exactly one of success, error or cancellation.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenOutcome {
    Issued(Token),
    Cancelled,
}

/// Drives a validated card through the gateway's issuance protocol:
/// token creation, the optional issuer-enrollment check, and the
/// browser challenge with status polling when the issuer demands one.
///
/// The engine holds no per-call state; a single instance serves any
/// number of concurrent issuances.
pub struct TokenEngine<G: TokenGateway, S: ChallengeSurface> {
    gateway: G,
    surface: S,
    max_request_attempts: u32,
    retry_delay: Duration,
}

impl<G: TokenGateway, S: ChallengeSurface> TokenEngine<G, S> {
    pub fn new(gateway: G, surface: S) -> Self {
        Self::with_retry_policy(gateway, surface, MAX_REQUEST_ATTEMPTS, RETRY_DELAY)
    }

    /// Panics if `max_request_attempts` is zero.
    pub fn with_retry_policy(
        gateway: G,
        surface: S,
        max_request_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        assert!(max_request_attempts > 0, "max_request_attempts must be positive");
        Self {
            gateway,
            surface,
            max_request_attempts,
            retry_delay,
        }
    }

    /// Issues a single-use token for `card`.
    ///
    /// Transient transport failures on the token and verification creation
    /// calls are retried a bounded number of times; a structured gateway
    /// rejection is surfaced immediately with its status code and raw
    /// body. When the issuer requires a browser challenge, the challenge
    /// surface is presented and the verification status polled until it
    /// finalizes; dismissing the surface cancels the poll and resolves to
    /// [`TokenOutcome::Cancelled`].
    ///
    /// Panics if `params.amount_in_cents` is zero; an absent amount is
    /// fine, a zero one is a programming error.
    pub async fn issue_token(&self, card: &Card, params: TokenParams) -> Result<TokenOutcome> {
        if let Some(amount) = params.amount_in_cents {
            assert!(amount > 0, "amount must be positive");
        }

        tracing::info!("issuing token for card ending in {}", card.last_digits());
        let token = with_bounded_retry(
            || self.gateway.create_token(card, &params),
            self.max_request_attempts,
            self.retry_delay,
        )
        .await
        .map_err(|e| StartError::from_api("create token", e))?;

        if !token.verification_required {
            tracing::info!("token {} issued, no verification required", token.id);
            return Ok(TokenOutcome::Issued(token));
        }

        tracing::debug!("token {} requires verification", token.id);
        let verification = with_bounded_retry(
            || self.gateway.create_verification(&token.id, &params),
            self.max_request_attempts,
            self.retry_delay,
        )
        .await
        .map_err(|e| StartError::from_api("create token verification", e))?;

        if !verification.enrolled {
            tracing::info!("token {} issued, issuer not enrolled", token.id);
            return Ok(TokenOutcome::Issued(token));
        }

        self.verify_in_browser(token).await
    }

    /// Enrolled path: show the challenge page and poll the verification
    /// status in parallel. Whichever finishes first decides the outcome;
    /// losing the race drops the other side, which cancels any in-flight
    /// poll call without delivering its response.
    async fn verify_in_browser(&self, token: Token) -> Result<TokenOutcome> {
        let url = self.gateway.verification_url(&token.id);
        tracing::info!("issuer is enrolled, presenting challenge page {}", url);

        let token_id = token.id.clone();
        let poll = with_condition_retry(
            || self.gateway.get_verification(&token_id),
            |verification: &TokenVerification| !verification.finalized,
            self.retry_delay,
        );

        // Biased: the surface must be up before the first poll, and a
        // dismissal that ties with a finalized poll counts as cancelled.
        tokio::select! {
            biased;
            _ = self.surface.present(&url) => {
                tracing::info!("challenge dismissed by user, issuance cancelled");
                Ok(TokenOutcome::Cancelled)
            }
            _ = poll => {
                self.surface.close().await;
                tracing::info!("token {} verification finalized", token.id);
                Ok(TokenOutcome::Issued(token))
            }
        }
    }
}
