use std::time::Duration;

use reviewhub_core::events::DomainEvent;
use reviewhub_core::status::ApplicationStatus;
use reviewhub_db::repositories::DomainEventRepo;
use sqlx::PgPool;

fn accepted(application_id: i64) -> DomainEvent {
    DomainEvent::ApplicationStatusChanged {
        application_id,
        campaign_id: 1,
        user_id: 1,
        campaign_title: "Outbox".to_string(),
        from: ApplicationStatus::Pending,
        to: ApplicationStatus::Accepted,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_is_idempotent_per_key(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let first = DomainEventRepo::insert(&mut conn, &accepted(1), None).await.unwrap();
    let second = DomainEventRepo::insert(&mut conn, &accepted(1), None).await.unwrap();
    assert!(first.is_some());
    assert!(second.is_none());
    drop(conn);

    let stored = DomainEventRepo::find_by_id(&pool, first.unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.event_kind, "application_status_changed");
    assert_eq!(stored.event().unwrap(), accepted(1));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_claim_respects_grace_lease_and_dispatch(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let id = DomainEventRepo::insert(&mut conn, &accepted(2), None)
        .await
        .unwrap()
        .unwrap();
    drop(conn);

    let lease = Duration::from_secs(60);

    // Fresh events are left to the in-process router during the grace period.
    let claimed = DomainEventRepo::claim_pending(&pool, Duration::from_secs(3600), 5, 10, lease)
        .await
        .unwrap();
    assert!(claimed.is_empty());

    let claimed = DomainEventRepo::claim_pending(&pool, Duration::ZERO, 5, 10, lease)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, id);

    // Leased.
    assert!(DomainEventRepo::claim_pending(&pool, Duration::ZERO, 5, 10, lease)
        .await
        .unwrap()
        .is_empty());

    // A failure releases the lease and counts the attempt.
    assert_eq!(DomainEventRepo::record_failure(&pool, id, "timeout").await.unwrap(), 1);
    let claimed = DomainEventRepo::claim_pending(&pool, Duration::ZERO, 5, 10, lease)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].last_error.as_deref(), Some("timeout"));

    DomainEventRepo::mark_dispatched(&pool, id).await.unwrap();
    assert!(DomainEventRepo::claim_pending(&pool, Duration::ZERO, 5, 10, Duration::ZERO)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_exhausted_events_are_stranded(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let id = DomainEventRepo::insert(&mut conn, &accepted(3), None)
        .await
        .unwrap()
        .unwrap();
    drop(conn);

    for _ in 0..2 {
        DomainEventRepo::record_failure(&pool, id, "boom").await.unwrap();
    }
    assert!(DomainEventRepo::claim_pending(&pool, Duration::ZERO, 2, 10, Duration::from_secs(1))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(DomainEventRepo::count_stranded(&pool, 2).await.unwrap(), 1);
}
