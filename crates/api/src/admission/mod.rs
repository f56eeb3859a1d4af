//! Admission: applying to campaigns, deciding applications, reviews, and the
//! campaign edits that change who may still apply.

pub mod service;

pub use service::AdmissionService;
