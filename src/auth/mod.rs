//! Authentication module
//!
//! Sessions are issued by the external auth provider; this server only
//! verifies their tokens and resolves the caller's marketplace profile.

mod jwt;
mod service;

pub use jwt::{issue_token, verify_token, Claims, JwtError};
pub use service::{AuthService, Session};
