//! Well-known role names carried in the JWT `role` claim.

/// Back-office operator: manages campaigns and decides applications.
pub const ROLE_ADMIN: &str = "admin";

/// Regular member who browses, applies to, and reviews campaigns.
pub const ROLE_USER: &str = "user";
