//! OAuth credential management for providers that require interactive login
//!
//! A device-code [`Authenticator`] acquires, persists, and refreshes bearer
//! tokens; the [`azure`] module walks the Entra ID identity chain for
//! Azure-style deployments.

pub mod azure;
mod authenticator;
mod device;
mod error;
mod jwt;
mod record;
mod store;

pub use authenticator::{AccessToken, Authenticator};
pub use device::{DeviceAuthorization, DeviceFlowSpec, TokenResponse};
pub use error::OauthError;
pub use jwt::decode_claims;
pub use record::{AuthRecord, now_epoch};
pub use store::TokenStore;
