//! Integration tests for `PgRepository` against a real PostgreSQL database.

use std::time::Duration as StdDuration;

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use sqlx::PgPool;
use trellis_core::error::CoreError;
use trellis_core::filter::Filter;
use trellis_core::repository::Repository;
use trellis_core::types::{EntityId, Timestamp};
use trellis_db::models::plan::Plan;
use trellis_db::models::session::Session;
use trellis_db::repositories::PgRepository;

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn plan(name: &str, repeat: i32, equipment_id: &str) -> Plan {
    Plan {
        id: EntityId::new_v4(),
        name: name.into(),
        repeat,
        equipment_id: equipment_id.into(),
        created_at: t0(),
        updated_at: t0(),
    }
}

async fn seed(repo: &PgRepository<Plan>) -> Vec<Plan> {
    let mut out = Vec::new();
    for p in [
        plan("Leg Day", 3, "barbell"),
        plan("Arm Day", 2, "dumbbell"),
        plan("Back Day", 4, "barbell"),
    ] {
        out.push(repo.create(&p).await.unwrap());
    }
    out
}

// ---------------------------------------------------------------------------
// Create / get
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_then_get_round_trips(pool: PgPool) {
    let repo = PgRepository::<Plan>::new(pool);
    let created = repo.create(&plan("Leg Day", 3, "barbell")).await.unwrap();

    let fetched = repo.get(created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_missing_is_not_found(pool: PgPool) {
    let repo = PgRepository::<Plan>::new(pool);
    let id = EntityId::new_v4();
    assert_eq!(repo.get(id).await.unwrap_err(), CoreError::not_found("plan", id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_id_is_unexpected(pool: PgPool) {
    let repo = PgRepository::<Plan>::new(pool);
    let p = plan("Leg Day", 3, "barbell");
    repo.create(&p).await.unwrap();

    assert_matches!(repo.create(&p).await, Err(CoreError::Unexpected(_)));
}

// ---------------------------------------------------------------------------
// List / count
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn ids_filter_limits_list_and_count(pool: PgPool) {
    let repo = PgRepository::<Plan>::new(pool);
    let plans = seed(&repo).await;
    let filter = Filter {
        ids: vec![plans[0].id, plans[1].id],
        page_size: Some(10),
        ..Filter::default()
    };

    let mut ids: Vec<EntityId> = repo.list(&filter).await.unwrap().iter().map(|p| p.id).collect();
    ids.sort();
    let mut expected = vec![plans[0].id, plans[1].id];
    expected.sort();

    assert_eq!(ids, expected);
    assert_eq!(repo.count(&filter).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_matches_prefix_terms(pool: PgPool) {
    let repo = PgRepository::<Plan>::new(pool);
    seed(&repo).await;
    let filter = Filter {
        search: Some("barb".into()),
        order_by: vec!["name".into()],
        ..Filter::default()
    };

    let names: Vec<String> = repo
        .list(&filter)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Back Day", "Leg Day"]);
    assert_eq!(repo.count(&filter).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_with_inner_punctuation_is_not_a_storage_error(pool: PgPool) {
    let repo = PgRepository::<Plan>::new(pool);
    seed(&repo).await;

    for raw in ["leg(day", "a:b", "5x5!heavy", "barbell|"] {
        let filter = Filter {
            search: Some(raw.into()),
            ..Filter::default()
        };
        assert!(repo.list(&filter).await.is_ok(), "list failed for {raw:?}");
        assert!(repo.count(&filter).await.is_ok(), "count failed for {raw:?}");
    }

    let filter = Filter {
        search: Some("leg(day".into()),
        ..Filter::default()
    };
    let found = repo.list(&filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Leg Day");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn default_order_pages_without_overlap(pool: PgPool) {
    let repo = PgRepository::<Plan>::new(pool);
    // Same created_at for every row, so only the id tie-breaker orders them.
    let mut plans = seed(&repo).await;
    for name in ["Chest Day", "Core Day"] {
        plans.push(repo.create(&plan(name, 1, "mat")).await.unwrap());
    }

    let mut seen = Vec::new();
    for page_number in 1..=3 {
        let filter = Filter {
            page_size: Some(2),
            page_number: Some(page_number),
            ..Filter::default()
        };
        seen.extend(repo.list(&filter).await.unwrap().into_iter().map(|p| p.id));
    }

    let mut expected: Vec<EntityId> = plans.iter().map(|p| p.id).collect();
    expected.sort();
    expected.reverse();
    assert_eq!(seen, expected);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pagination_and_ordering(pool: PgPool) {
    let repo = PgRepository::<Plan>::new(pool);
    seed(&repo).await;
    let filter = Filter {
        page_size: Some(2),
        page_number: Some(2),
        order_by: vec!["-repeat".into()],
        ..Filter::default()
    };

    let page = repo.list(&filter).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "Arm Day");
    assert_eq!(repo.count(&filter).await.unwrap(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_order_column_is_validation_error(pool: PgPool) {
    let repo = PgRepository::<Plan>::new(pool);
    let filter = Filter {
        order_by: vec!["name; DROP TABLE plans".into()],
        ..Filter::default()
    };

    assert_matches!(repo.list(&filter).await, Err(CoreError::Validation(_)));
}

// ---------------------------------------------------------------------------
// Update / delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_persists_full_row(pool: PgPool) {
    let repo = PgRepository::<Plan>::new(pool);
    let mut p = repo.create(&plan("Leg Day", 3, "barbell")).await.unwrap();
    p.repeat = 5;
    p.updated_at = t0() + Duration::minutes(10);

    let updated = repo.update(&p).await.unwrap();
    assert_eq!(updated, p);
    assert_eq!(repo.get(p.id).await.unwrap(), p);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_of_vanished_row_is_not_found(pool: PgPool) {
    let repo = PgRepository::<Plan>::new(pool);
    let p = repo.create(&plan("Leg Day", 3, "barbell")).await.unwrap();
    repo.delete(p.id).await.unwrap();

    assert_eq!(repo.update(&p).await.unwrap_err(), CoreError::not_found("plan", p.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_missing_is_not_found(pool: PgPool) {
    let repo = PgRepository::<Plan>::new(pool);
    let id = EntityId::new_v4();
    assert_eq!(repo.delete(id).await.unwrap_err(), CoreError::not_found("plan", id));
}

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn slow_storage_call_times_out_as_unexpected(pool: PgPool) {
    // Reads block until this lock is released.
    let mut tx = pool.begin().await.unwrap();
    sqlx::query("LOCK TABLE plans IN ACCESS EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await
        .unwrap();

    let repo = PgRepository::<Plan>::with_timeout(pool.clone(), StdDuration::from_millis(50));
    let err = repo.get(EntityId::new_v4()).await.unwrap_err();
    assert_matches!(err, CoreError::Unexpected(msg) => {
        assert_eq!(msg, "plan get: storage call timed out");
    });

    tx.rollback().await.unwrap();
    let repo = PgRepository::<Plan>::new(pool);
    assert_eq!(repo.count(&Filter::default()).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn session_nullable_columns_round_trip(pool: PgPool) {
    let repo = PgRepository::<Session>::new(pool);
    let session = Session {
        id: EntityId::new_v4(),
        title: "Morning run".into(),
        notes: None,
        duration_minutes: 45,
        completed: false,
        started_at: t0(),
        deleted_at: None,
        created_at: t0(),
        updated_at: t0(),
    };
    repo.create(&session).await.unwrap();

    let mut marked = session.clone();
    marked.deleted_at = Some(t0() + Duration::hours(1));
    marked.notes = Some("tempo".into());
    repo.update(&marked).await.unwrap();

    // deleted_at does not hide the row.
    assert_eq!(repo.get(session.id).await.unwrap(), marked);
    assert_eq!(repo.count(&Filter::default()).await.unwrap(), 1);

    let found = repo
        .list(&Filter {
            search: Some("tempo".into()),
            ..Filter::default()
        })
        .await
        .unwrap();
    assert_eq!(found, vec![marked]);
}
