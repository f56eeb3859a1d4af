//! Token verification. Accounts and logins belong to the identity service.

pub mod jwt;
