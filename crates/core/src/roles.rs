//! Well-known role name constants.
//!
//! Role names arrive in the `role` claim of access tokens and key the grant
//! table of the static permission checker.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_COACH: &str = "coach";
pub const ROLE_MEMBER: &str = "member";
