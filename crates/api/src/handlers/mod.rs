pub mod application;
pub mod campaign;
pub mod notification;
