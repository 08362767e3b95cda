// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! The activity and image stores are traits so the series service can run
//! against Firestore in production and an in-memory store in tests. Each
//! call is atomic on its own; nothing here composes calls into a transaction.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::{FailurePlan, MemoryStore};

use crate::models::{Activity, ActivityImage, ActivityUpdate, NewActivity, NewImage};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const ACTIVITIES: &str = "activities";
    pub const ACTIVITY_IMAGES: &str = "activity_images";
}

/// Errors returned by store backends.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Write failed: {0}")]
    Write(String),
}

/// Persistence for activity records.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Persist one activity and return it with its assigned ID.
    async fn create(&self, activity: NewActivity) -> Result<Activity, StoreError>;

    /// Persist a batch of activities in one call, preserving input order.
    async fn bulk_create(&self, activities: Vec<NewActivity>) -> Result<Vec<Activity>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Activity>, StoreError>;

    /// Instances linked to `parent_id`, ascending by date.
    async fn list_by_parent(&self, parent_id: &str) -> Result<Vec<Activity>, StoreError>;

    async fn update(&self, id: &str, update: ActivityUpdate) -> Result<Activity, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Persistence for activity image references.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Images of one activity, ascending by `order`.
    async fn list_for_activity(&self, activity_id: &str) -> Result<Vec<ActivityImage>, StoreError>;

    /// Attach an ordered image set to one activity.
    async fn create_for_activity(
        &self,
        activity_id: &str,
        images: &[NewImage],
    ) -> Result<Vec<ActivityImage>, StoreError>;

    /// Remove every image of one activity. Returns how many were removed.
    async fn delete_for_activity(&self, activity_id: &str) -> Result<usize, StoreError>;
}
