use serde::Deserialize;

/// A single-use card token received from the gateway.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    #[serde(default)]
    pub verification_required: bool,
}

/// A snapshot of a token verification attempt. Re-fetched by polling until
/// `finalized` turns true; never mutated locally.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TokenVerification {
    #[serde(default)]
    pub enrolled: bool,
    #[serde(default)]
    pub finalized: bool,
}

/// Optional charge details attached to a token issuance.
#[derive(Debug, Clone, Default)]
pub struct TokenParams {
    /// Amount in the smallest currency unit. Must be strictly positive
    /// when present.
    pub amount_in_cents: Option<u64>,
    /// ISO 4217 currency code.
    pub currency: Option<String>,
}

impl TokenParams {
    pub fn with_amount(amount_in_cents: u64, currency: &str) -> Self {
        Self {
            amount_in_cents: Some(amount_in_cents),
            currency: Some(currency.to_string()),
        }
    }
}
