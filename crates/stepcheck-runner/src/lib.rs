//! stepcheck-runner: HTTP session and scenario execution
//!
//! Owns everything that touches the network: the OAuth token fetch, request
//! dispatch against the API under test, and response capture. The matching
//! logic itself lives in stepcheck-core.

pub mod auth;
pub mod session;

pub use auth::{AuthError, BearerToken, TokenResponse, fetch_token};
pub use session::{ApiSession, ResponseSnapshot, SessionError};
