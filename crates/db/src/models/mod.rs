//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` create/update DTOs where the API accepts input for it

pub mod application;
pub mod campaign;
pub mod domain_event;
pub mod notification;
pub mod user;
