//! HTTP middleware.

mod auth;

pub use self::auth::{AuthenticatedUser, auth_middleware};
