pub mod config;
pub mod core;
pub mod domain;
pub mod utils;
pub mod web;

pub use crate::config::ClientConfig;
pub use crate::core::engine::{TokenEngine, TokenOutcome};
pub use crate::domain::card::{Brand, Card, CardError, CardField};
pub use crate::domain::model::{Token, TokenParams, TokenVerification};
pub use crate::domain::ports::{ApiError, ApiResult, ChallengeSurface, TokenGateway};
pub use crate::utils::error::{Result, StartError};
pub use crate::web::client::StartClient;
