//! Authentication and authorization collaborators for the interceptor.
//!
//! - [`jwt`] -- HS256 access-token issuing/validation and the bearer-token
//!   [`IdentityResolver`](trellis_core::access::IdentityResolver).
//! - [`grants`] -- role-based static permission checker.

pub mod grants;
pub mod jwt;
