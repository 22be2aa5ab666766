//! Per-request authentication.
//!
//! [`Authenticator`] turns an `Authorization: Bearer` header into an
//! [`Identity`](ror_identity::Identity); [`auth_middleware`] wires it into
//! axum and short-circuits rejected requests with 401.

pub mod audit;
pub mod authenticator;
mod error;
pub mod groups;
pub mod middleware;

pub use authenticator::Authenticator;
pub use error::AuthError;
pub use groups::resolve_groups;
pub use middleware::{AuthState, auth_middleware};
