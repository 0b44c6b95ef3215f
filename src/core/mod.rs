pub mod engine;
pub mod retry;

pub use crate::domain::card::{Brand, Card, CardError, CardField};
pub use crate::domain::model::{Token, TokenParams, TokenVerification};
pub use crate::domain::ports::{ApiError, ApiResult, ChallengeSurface, TokenGateway};
pub use crate::utils::error::Result;
