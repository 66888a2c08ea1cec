//! `assetflow-auth` — authentication boundary.
//!
//! `claims` is transport-agnostic claims validation; `token` is the HS256
//! encode/decode pair the HTTP layer uses. Authorization decisions (who is HR,
//! who owns a request) live with the read models, not here.

pub mod claims;
pub mod token;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use token::{TOKEN_TTL_DAYS, TokenError, TokenService};
