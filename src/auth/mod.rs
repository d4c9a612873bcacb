//! Authentication for the board server
//!
//! Token issuance and parsing, the request gate that attaches a caller
//! identity, the route access policy, and the login/reissue session flows.

pub mod gate;
pub mod handlers;
pub mod password;
pub mod policy;
mod service;
pub mod token;

pub use gate::{Authenticated, CallerIdentity, RequestGate};
pub use password::{Argon2Encoder, PasswordEncoder};
pub use policy::AccessPolicy;
pub use service::{AuthService, LoginTokens, ReissuedToken};
pub use token::{Claims, TokenCodec, TokenError};
