// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use activity_series::config::Config;
use activity_series::db::{FirestoreDb, MemoryStore};
use activity_series::middleware::auth::create_jwt;
use activity_series::models::{
    ActivityRole, ActivityTemplate, NewActivity, RecurrenceRule, RecurrenceType,
};
use activity_series::routes::create_router;
use activity_series::AppState;
use chrono::NaiveDate;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by the given in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config, store: MemoryStore) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, store));
    (create_router(state.clone()), state)
}

/// Create a test app with a fresh in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryStore) {
    let store = MemoryStore::new();
    let (app, state) = create_test_app_with(Config::test_default(), store.clone());
    (app, state, store)
}

/// Create a test JWT token.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, is_admin: bool, signing_key: &[u8]) -> String {
    create_jwt(user_id, is_admin, signing_key).unwrap()
}

#[allow(dead_code)]
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Weekly rule helper.
#[allow(dead_code)]
pub fn weekly_rule(days: &[u8], start: &str, end: Option<&str>) -> RecurrenceRule {
    RecurrenceRule {
        recurrence_type: RecurrenceType::Weekly,
        days: days.to_vec(),
        start: date(start),
        end: end.map(date),
    }
}

#[allow(dead_code)]
pub fn sample_template() -> ActivityTemplate {
    ActivityTemplate {
        title: "Sunset yoga".to_string(),
        description: Some("Bring a mat".to_string()),
        location: Some("Harbor park".to_string()),
        capacity: Some(20),
        price_cents: Some(1500),
        min_age: Some(16),
        max_age: None,
        difficulty: Some("beginner".to_string()),
        tags: vec!["outdoors".to_string(), "yoga".to_string()],
    }
}

/// Parent-shaped activity used as generator input.
#[allow(dead_code)]
pub fn sample_base(rule: &RecurrenceRule) -> NewActivity {
    NewActivity {
        owner_id: "owner-1".to_string(),
        template: sample_template(),
        date: rule.start,
        time: chrono::NaiveTime::from_hms_opt(18, 0, 0),
        duration_minutes: Some(60),
        role: ActivityRole::Parent {
            recurrence: rule.clone(),
        },
    }
}
