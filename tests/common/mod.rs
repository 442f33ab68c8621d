#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Mutex;

use mailora_campaigns::clock::Clock;
use mailora_campaigns::db;
use mailora_campaigns::models::mailing::NewMailing;
use mailora_campaigns::models::message::NewMessage;
use mailora_campaigns::models::recipient::NewRecipient;
use mailora_campaigns::models::user::Role;
use mailora_campaigns::services::{mailing_service, message_service, recipient_service};
use mailora_campaigns::smtp::{MailError, Mailer, OutgoingEmail};

pub const FROM: &str = "campaigns@example.com";

/// 2026-04-01 09:00 UTC; campaign windows in tests start here.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
}

pub async fn test_pool() -> SqlitePool {
    let pool = db::connect("sqlite::memory:").await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

/// Active user with a bearer token, inserted without bcrypt to keep tests fast.
pub async fn insert_user(pool: &SqlitePool, email: &str, role: Role) -> (i64, String) {
    let token = format!("token-{}", email.replace('@', "-"));
    let username = email.split('@').next().unwrap().to_string();
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (email, username, password_hash, role, is_active, email_verified, api_token, created_at) \
         VALUES (?, ?, 'unused', ?, 1, 1, ?, 0) RETURNING id",
    )
    .bind(email)
    .bind(&username)
    .bind(role)
    .bind(&token)
    .fetch_one(pool)
    .await
    .unwrap();
    (id, token)
}

pub struct Campaign {
    pub mailing_id: i64,
    pub recipient_ids: Vec<i64>,
}

/// Owner-owned mailing over [t0, t0 + 1h] with one recipient per address.
pub async fn seed_campaign(pool: &SqlitePool, owner_id: i64, addresses: &[&str]) -> Campaign {
    let message = message_service::create_message(
        pool,
        owner_id,
        NewMessage {
            subject: "Spring newsletter".into(),
            body: "Hello from the spring campaign".into(),
        },
    )
    .await
    .unwrap();

    let mut recipient_ids = Vec::new();
    for (i, addr) in addresses.iter().enumerate() {
        let r = recipient_service::create_recipient(
            pool,
            owner_id,
            NewRecipient {
                email: addr.to_string(),
                name: format!("Recipient {}", i + 1),
                comment: None,
            },
        )
        .await
        .unwrap();
        recipient_ids.push(r.id);
    }

    let detail = mailing_service::create_mailing(
        pool,
        owner_id,
        NewMailing {
            start_time: t0(),
            end_time: t0() + Duration::hours(1),
            message_id: Some(message.id),
            recipient_ids: recipient_ids.clone(),
        },
        t0() - Duration::days(1),
    )
    .await
    .unwrap();

    Campaign {
        mailing_id: detail.mailing.id,
        recipient_ids,
    }
}

/// Records every send; addresses in `failures` get a transport error with
/// the given text.
#[derive(Default)]
pub struct ScriptedMailer {
    failures: HashMap<String, String>,
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl ScriptedMailer {
    pub fn failing(address: &str, error: &str) -> Self {
        let mut failures = HashMap::new();
        failures.insert(address.to_string(), error.to_string());
        Self {
            failures,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for ScriptedMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        match self.failures.get(&email.to) {
            Some(err) => Err(MailError::Smtp(err.clone())),
            None => Ok(()),
        }
    }
}

/// Advances by `step` on every read, starting at `start`.
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + self.step;
        now
    }
}
