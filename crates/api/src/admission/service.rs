//! Admission and decision service.
//!
//! Every write that touches capacity runs as one transaction that locks the
//! campaign row first, then (if needed) the application row. Admissions,
//! decisions and campaign edits for the same campaign therefore serialize on
//! a single lock, while different campaigns proceed in parallel.
//!
//! Each unit of work is bounded by a deadline; a timed-out attempt drops its
//! transaction (rolling it back) and, like serialization failures and
//! deadlocks, is retried with backoff before surfacing as
//! [`CoreError::TransientStoreFailure`]. Domain events are written to the
//! outbox inside the transaction and published on the bus only after commit.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use reviewhub_core::application::{validate_review_content, validate_transition};
use reviewhub_core::campaign::{
    validate_campaign_transition, validate_max_participants, validate_window,
};
use reviewhub_core::error::CoreError;
use reviewhub_core::events::DomainEvent;
use reviewhub_core::status::{ApplicationStatus, CampaignStatus};
use reviewhub_core::types::DbId;
use reviewhub_db::models::application::{Application, Review};
use reviewhub_db::models::campaign::{Campaign, CreateCampaign, UpdateCampaign};
use reviewhub_db::repositories::application_repo::UQ_CAMPAIGN_USER;
use reviewhub_db::repositories::review_repo::UQ_APPLICATION;
use reviewhub_db::repositories::{
    ApplicationRepo, CampaignRepo, CapacityLedger, DomainEventRepo, Reservation, ReviewRepo,
};
use reviewhub_db::{is_transient, is_unique_violation, DbPool};
use reviewhub_events::{EventBus, PlatformEvent};
use sqlx::PgConnection;

use crate::config::AdmissionConfig;

/// Result of a committed unit of work plus the events to publish for it.
struct Committed<T> {
    value: T,
    events: Vec<PlatformEvent>,
}

impl<T> Committed<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            events: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct AdmissionService {
    pool: DbPool,
    bus: Arc<EventBus>,
    config: AdmissionConfig,
}

impl AdmissionService {
    pub fn new(pool: DbPool, bus: Arc<EventBus>, config: AdmissionConfig) -> Self {
        Self { pool, bus, config }
    }

    /// Apply `user_id` to `campaign_id`.
    ///
    /// Checks, in order: the campaign is open (`CampaignNotOpen`), the user
    /// has no application yet (`AlreadyApplied`), a slot is free
    /// (`CampaignFull`). On success the PENDING application and its
    /// `ApplicationCreated` outbox row commit together.
    pub async fn apply(&self, user_id: DbId, campaign_id: DbId) -> Result<Application, CoreError> {
        let application = self
            .run("apply", || self.try_apply(user_id, campaign_id))
            .await?;
        tracing::info!(
            user_id,
            campaign_id,
            application_id = application.id,
            "Application admitted"
        );
        Ok(application)
    }

    async fn try_apply(
        &self,
        user_id: DbId,
        campaign_id: DbId,
    ) -> Result<Committed<Application>, CoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let campaign = CampaignRepo::lock(&mut *tx, campaign_id)
            .await
            .map_err(store_error)?
            .ok_or(CoreError::CampaignNotOpen { campaign_id })?;
        campaign.schedule()?.ensure_open(campaign_id, Utc::now())?;

        if ApplicationRepo::find_for_user(&mut *tx, campaign_id, user_id)
            .await
            .map_err(store_error)?
            .is_some()
        {
            return Err(CoreError::AlreadyApplied { campaign_id });
        }

        match CapacityLedger::try_reserve(&mut *tx, campaign_id)
            .await
            .map_err(store_error)?
        {
            Reservation::Reserved { .. } => {}
            Reservation::Rejected(exceeded) => {
                return Err(CoreError::CampaignFull {
                    campaign_id,
                    max_participants: exceeded.max_participants,
                });
            }
        }

        let application = ApplicationRepo::insert_pending(&mut *tx, campaign_id, user_id)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, UQ_CAMPAIGN_USER) {
                    CoreError::AlreadyApplied { campaign_id }
                } else {
                    store_error(e)
                }
            })?;

        let mut committed = Committed::new(application);
        let event = DomainEvent::ApplicationCreated {
            application_id: committed.value.id,
            campaign_id,
            user_id,
            campaign_title: campaign.title,
        };
        record(&mut *tx, event, Some(user_id), &mut committed.events).await?;

        tx.commit().await.map_err(store_error)?;
        Ok(committed)
    }

    /// Move an application to `to` on behalf of `actor`.
    ///
    /// `InvalidTransition` leaves the row untouched.
    pub async fn transition(
        &self,
        application_id: DbId,
        to: ApplicationStatus,
        actor: DbId,
    ) -> Result<Application, CoreError> {
        let application = self
            .run("transition", || self.try_transition(application_id, to, actor))
            .await?;
        tracing::info!(application_id, status = %to, actor, "Application status changed");
        Ok(application)
    }

    async fn try_transition(
        &self,
        application_id: DbId,
        to: ApplicationStatus,
        actor: DbId,
    ) -> Result<Committed<Application>, CoreError> {
        let not_found = || CoreError::NotFound {
            entity: "Application",
            id: application_id,
        };

        // campaign_id never changes, so it is safe to read before locking.
        let campaign_id = ApplicationRepo::find_by_id(&self.pool, application_id)
            .await
            .map_err(store_error)?
            .ok_or_else(not_found)?
            .campaign_id;

        let mut tx = self.pool.begin().await.map_err(store_error)?;
        let campaign = CampaignRepo::lock(&mut *tx, campaign_id)
            .await
            .map_err(store_error)?
            .ok_or_else(not_found)?;
        let current = ApplicationRepo::lock(&mut *tx, application_id)
            .await
            .map_err(store_error)?
            .ok_or_else(not_found)?;

        let from = current.status()?;
        validate_transition(from, to)?;

        let updated = ApplicationRepo::set_status(&mut *tx, application_id, to, Some(actor))
            .await
            .map_err(store_error)?;

        let mut committed = Committed::new(updated);
        let event = DomainEvent::ApplicationStatusChanged {
            application_id,
            campaign_id,
            user_id: current.user_id,
            campaign_title: campaign.title,
            from,
            to,
        };
        record(&mut *tx, event, Some(actor), &mut committed.events).await?;

        tx.commit().await.map_err(store_error)?;
        Ok(committed)
    }

    /// Attach the owner's review to an accepted application, once.
    pub async fn submit_review(
        &self,
        user_id: DbId,
        application_id: DbId,
        content: &str,
    ) -> Result<Review, CoreError> {
        validate_review_content(content)?;
        let content = content.trim();
        let review = self
            .run("submit_review", || {
                self.try_submit_review(user_id, application_id, content)
            })
            .await?;
        tracing::info!(user_id, application_id, review_id = review.id, "Review submitted");
        Ok(review)
    }

    async fn try_submit_review(
        &self,
        user_id: DbId,
        application_id: DbId,
        content: &str,
    ) -> Result<Committed<Review>, CoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let application = ApplicationRepo::lock(&mut *tx, application_id)
            .await
            .map_err(store_error)?
            .ok_or(CoreError::NotFound {
                entity: "Application",
                id: application_id,
            })?;
        if application.user_id != user_id {
            return Err(CoreError::Forbidden(
                "Only the applicant can review this application".into(),
            ));
        }
        if application.status()? != ApplicationStatus::Accepted {
            return Err(CoreError::Conflict(
                "Reviews can only be submitted for accepted applications".into(),
            ));
        }

        let review = ReviewRepo::create(&mut *tx, application_id, content)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, UQ_APPLICATION) {
                    CoreError::Conflict("This application has already been reviewed".into())
                } else {
                    store_error(e)
                }
            })?;

        tx.commit().await.map_err(store_error)?;
        Ok(Committed::new(review))
    }

    pub async fn create_campaign(
        &self,
        input: &CreateCampaign,
        actor: DbId,
    ) -> Result<Campaign, CoreError> {
        validate_title(&input.title)?;
        validate_window(input.start_date, input.end_date)?;
        validate_max_participants(input.max_participants, None)?;

        let campaign = self
            .run("create_campaign", || async {
                CampaignRepo::create(&self.pool, input, Some(actor))
                    .await
                    .map(Committed::new)
                    .map_err(store_error)
            })
            .await?;
        tracing::info!(campaign_id = campaign.id, actor, "Campaign created");
        Ok(campaign)
    }

    /// Edit a campaign under the admission lock.
    ///
    /// Capacity may not drop below the slots already held. Completing the
    /// campaign rejects its remaining PENDING applications. Every applicant
    /// still holding a slot afterwards receives a `CampaignUpdated` event for
    /// the new revision.
    pub async fn update_campaign(
        &self,
        campaign_id: DbId,
        input: &UpdateCampaign,
        actor: DbId,
    ) -> Result<Campaign, CoreError> {
        if let Some(title) = &input.title {
            validate_title(title)?;
        }
        let campaign = self
            .run("update_campaign", || {
                self.try_update_campaign(campaign_id, input, actor)
            })
            .await?;
        tracing::info!(
            campaign_id,
            revision = campaign.revision,
            actor,
            "Campaign updated"
        );
        Ok(campaign)
    }

    async fn try_update_campaign(
        &self,
        campaign_id: DbId,
        input: &UpdateCampaign,
        actor: DbId,
    ) -> Result<Committed<Campaign>, CoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let current = CampaignRepo::lock(&mut *tx, campaign_id)
            .await
            .map_err(store_error)?
            .ok_or(CoreError::NotFound {
                entity: "Campaign",
                id: campaign_id,
            })?;

        let from = current.status()?;
        if let Some(to) = input.status {
            validate_campaign_transition(from, to)?;
        }
        validate_window(
            input.start_date.unwrap_or(current.start_date),
            input.end_date.unwrap_or(current.end_date),
        )?;
        if let Some(max_participants) = input.max_participants {
            let reserved = CapacityLedger::reserved_count(&mut *tx, campaign_id)
                .await
                .map_err(store_error)?;
            validate_max_participants(max_participants, Some(reserved))?;
        }

        let updated = CampaignRepo::update(&mut *tx, campaign_id, input)
            .await
            .map_err(store_error)?;
        let mut committed = Committed::new(updated);
        let status = committed.value.status()?;
        let title = committed.value.title.clone();

        if status == CampaignStatus::Completed && from != CampaignStatus::Completed {
            let rejected =
                ApplicationRepo::reject_pending_for_campaign(&mut *tx, campaign_id, Some(actor))
                    .await
                    .map_err(store_error)?;
            if !rejected.is_empty() {
                tracing::info!(
                    campaign_id,
                    count = rejected.len(),
                    "Rejected pending applications of completed campaign"
                );
            }
            for application in rejected {
                let event = DomainEvent::ApplicationStatusChanged {
                    application_id: application.id,
                    campaign_id,
                    user_id: application.user_id,
                    campaign_title: title.clone(),
                    from: ApplicationStatus::Pending,
                    to: ApplicationStatus::Rejected,
                };
                record(&mut *tx, event, Some(actor), &mut committed.events).await?;
            }
        }

        let participants = CampaignRepo::list_participant_user_ids(&mut *tx, campaign_id)
            .await
            .map_err(store_error)?;
        for user_id in participants {
            let event = DomainEvent::CampaignUpdated {
                campaign_id,
                user_id,
                campaign_title: title.clone(),
                revision: committed.value.revision,
                status,
            };
            record(&mut *tx, event, Some(actor), &mut committed.events).await?;
        }

        tx.commit().await.map_err(store_error)?;
        Ok(committed)
    }

    /// Run one unit of work under the deadline and retry policy, then
    /// publish its events.
    async fn run<T, F, Fut>(&self, operation: &'static str, op: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Committed<T>, CoreError>>,
    {
        let timeout = self.config.timeout;
        let committed = self
            .config
            .retry
            .run(CoreError::is_retryable, |attempt| {
                let unit = op();
                async move {
                    match tokio::time::timeout(timeout, unit).await {
                        Ok(result) => result,
                        Err(_) => {
                            tracing::warn!(
                                operation,
                                attempt,
                                timeout_ms = timeout.as_millis() as u64,
                                "Unit of work timed out, rolled back"
                            );
                            Err(CoreError::TransientStoreFailure(format!(
                                "{operation} timed out after {}ms",
                                timeout.as_millis()
                            )))
                        }
                    }
                }
            })
            .await?;

        for event in committed.events {
            self.bus.publish(event);
        }
        Ok(committed.value)
    }
}

/// Write `event` to the outbox and queue it for publishing after commit.
///
/// An event whose idempotency key is already recorded is not published again.
async fn record(
    conn: &mut PgConnection,
    event: DomainEvent,
    actor: Option<DbId>,
    out: &mut Vec<PlatformEvent>,
) -> Result<(), CoreError> {
    let Some(outbox_id) = DomainEventRepo::insert(conn, &event, actor)
        .await
        .map_err(store_error)?
    else {
        tracing::debug!(key = %event.idempotency_key(), "Event already recorded");
        return Ok(());
    };
    let mut envelope = PlatformEvent::new(event).with_outbox_id(outbox_id);
    if let Some(actor) = actor {
        envelope = envelope.with_actor(actor);
    }
    out.push(envelope);
    Ok(())
}

/// Map a store error: aborts and timeouts are retryable, the rest internal.
fn store_error(err: sqlx::Error) -> CoreError {
    if is_transient(&err) {
        CoreError::TransientStoreFailure(err.to_string())
    } else {
        CoreError::Internal(format!("Database error: {err}"))
    }
}

fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("title must not be empty".into()));
    }
    Ok(())
}
