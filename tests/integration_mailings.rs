mod common;

use chrono::Duration;

use common::{insert_user, seed_campaign, t0, test_pool, ScriptedMailer, FROM};
use mailora_campaigns::error::AppError;
use mailora_campaigns::models::mailing::{MailingPatch, MailingStatus, NewMailing};
use mailora_campaigns::models::user::Role;
use mailora_campaigns::services::dispatch_service::run_mailing;
use mailora_campaigns::services::mailing_service;

#[tokio::test]
async fn subsecond_start_is_not_dispatched_early() {
    let pool = test_pool().await;
    let (owner, _) = insert_user(&pool, "owner@example.com", Role::Owner).await;
    let c = seed_campaign(&pool, owner, &["r1@example.com"]).await;
    let message_id = mailing_service::get_mailing(&pool, c.mailing_id)
        .await
        .unwrap()
        .message_id;
    let start = t0() + Duration::milliseconds(700);
    let early = t0() + Duration::milliseconds(300);

    let detail = mailing_service::create_mailing(
        &pool,
        owner,
        NewMailing {
            start_time: start,
            end_time: t0() + Duration::hours(1),
            message_id,
            recipient_ids: c.recipient_ids.clone(),
        },
        early,
    )
    .await
    .unwrap();
    assert_eq!(detail.mailing.status, MailingStatus::Created);
    assert_eq!(detail.mailing.start_time, start);

    let mailer = ScriptedMailer::default();
    let err = run_mailing(&pool, &mailer, &early, FROM, detail.mailing.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(mailer.sent().is_empty());

    let report = run_mailing(&pool, &mailer, &start, FROM, detail.mailing.id)
        .await
        .unwrap();
    assert_eq!(report.succeeded, 1);
}

#[tokio::test]
async fn subsecond_window_is_stored_as_given() {
    let pool = test_pool().await;
    let (owner, _) = insert_user(&pool, "owner@example.com", Role::Owner).await;
    let start = t0() + Duration::milliseconds(100);
    let end = t0() + Duration::milliseconds(900);

    let created = mailing_service::create_mailing(
        &pool,
        owner,
        NewMailing {
            start_time: start,
            end_time: end,
            message_id: None,
            recipient_ids: vec![],
        },
        t0(),
    )
    .await
    .unwrap();

    let stored = mailing_service::get_mailing(&pool, created.mailing.id)
        .await
        .unwrap();
    assert_eq!((stored.start_time, stored.end_time), (start, end));
    assert!(stored.window_contains(t0() + Duration::milliseconds(500)));
    assert!(!stored.window_contains(t0() + Duration::milliseconds(950)));

    // microseconds below the stored precision collapse the window
    let err = mailing_service::create_mailing(
        &pool,
        owner,
        NewMailing {
            start_time: t0() + Duration::microseconds(100),
            end_time: t0() + Duration::microseconds(900),
            message_id: None,
            recipient_ids: vec![],
        },
        t0(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

async fn block_recipient_links(pool: &sqlx::SqlitePool, recipient_id: i64) {
    sqlx::query(&format!(
        "CREATE TRIGGER block_link BEFORE INSERT ON mailing_recipients \
         WHEN NEW.recipient_id = {recipient_id} \
         BEGIN SELECT RAISE(ABORT, 'link refused'); END"
    ))
    .execute(pool)
    .await
    .unwrap();
}

async fn mailing_count(pool: &sqlx::SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM mailings")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn failed_recipient_link_leaves_no_mailing_behind() {
    let pool = test_pool().await;
    let (owner, _) = insert_user(&pool, "owner@example.com", Role::Owner).await;
    let c = seed_campaign(&pool, owner, &["r1@example.com", "r2@example.com"]).await;
    block_recipient_links(&pool, c.recipient_ids[1]).await;
    let before = mailing_count(&pool).await;

    let res = mailing_service::create_mailing(
        &pool,
        owner,
        NewMailing {
            start_time: t0(),
            end_time: t0() + Duration::hours(1),
            message_id: None,
            recipient_ids: c.recipient_ids.clone(),
        },
        t0(),
    )
    .await;

    assert!(res.is_err());
    assert_eq!(mailing_count(&pool).await, before);
}

#[tokio::test]
async fn failed_recipient_update_keeps_previous_state() {
    let pool = test_pool().await;
    let (owner, _) = insert_user(&pool, "owner@example.com", Role::Owner).await;
    let c = seed_campaign(&pool, owner, &["r1@example.com", "r2@example.com"]).await;
    let original = mailing_service::get_mailing_detail(&pool, c.mailing_id, t0() - Duration::hours(1))
        .await
        .unwrap();
    mailing_service::update_mailing(
        &pool,
        c.mailing_id,
        Some(owner),
        MailingPatch {
            recipient_ids: Some(vec![c.recipient_ids[0]]),
            ..Default::default()
        },
        t0() - Duration::hours(1),
    )
    .await
    .unwrap();
    block_recipient_links(&pool, c.recipient_ids[1]).await;

    let res = mailing_service::update_mailing(
        &pool,
        c.mailing_id,
        Some(owner),
        MailingPatch {
            end_time: Some(t0() + Duration::hours(3)),
            recipient_ids: Some(c.recipient_ids.clone()),
            ..Default::default()
        },
        t0() - Duration::hours(1),
    )
    .await;
    assert!(res.is_err());

    let after = mailing_service::get_mailing_detail(&pool, c.mailing_id, t0() - Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(after.mailing.end_time, original.mailing.end_time);
    assert_eq!(after.recipient_ids, vec![c.recipient_ids[0]]);
}
