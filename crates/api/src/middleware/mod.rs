//! Request extractors: [`auth::AuthUser`] for any member, [`rbac::RequireAdmin`]
//! for campaign operators.

pub mod auth;
pub mod rbac;
