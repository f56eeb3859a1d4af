use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// The campaign is missing, hidden, not `ONGOING`, or outside its window.
    #[error("Campaign {campaign_id} is not open for applications")]
    CampaignNotOpen { campaign_id: DbId },

    #[error("User has already applied to campaign {campaign_id}")]
    AlreadyApplied { campaign_id: DbId },

    #[error("Campaign {campaign_id} has reached its limit of {max_participants} participants")]
    CampaignFull {
        campaign_id: DbId,
        max_participants: i32,
    },

    #[error("Invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// The store aborted or timed out; the whole unit of work was rolled back.
    #[error("Transient store failure: {0}")]
    TransientStoreFailure(String),
}

impl CoreError {
    /// Whether the caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::TransientStoreFailure(_))
    }
}
