// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for local development and tests.
//!
//! A [`FailurePlan`] can make specific writes fail so partial-failure paths
//! can be exercised without a real backend.

use crate::db::{ActivityStore, ImageStore, StoreError};
use crate::models::{Activity, ActivityImage, ActivityUpdate, NewActivity, NewImage};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Writes that should fail.
#[derive(Debug, Clone, Default)]
pub struct FailurePlan {
    /// Fail every single-record `create`.
    pub fail_create: bool,
    /// Fail every `bulk_create`.
    pub fail_bulk_create: bool,
    /// Fail image reads.
    pub fail_image_reads: bool,
    /// Zero-based indices of `create_for_activity` calls that fail.
    pub fail_image_write_calls: HashSet<usize>,
}

#[derive(Default)]
struct Inner {
    activities: DashMap<String, Activity>,
    images: DashMap<String, Vec<ActivityImage>>,
    failures: FailurePlan,
    image_write_calls: AtomicUsize,
}

/// DashMap-backed activity and image store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failures(failures: FailurePlan) -> Self {
        Self {
            inner: Arc::new(Inner {
                failures,
                ..Default::default()
            }),
        }
    }

    /// Number of stored activities.
    pub fn activity_count(&self) -> usize {
        self.inner.activities.len()
    }

    /// Number of stored image rows across all activities.
    pub fn image_count(&self) -> usize {
        self.inner.images.iter().map(|e| e.value().len()).sum()
    }

    fn next_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn create(&self, activity: NewActivity) -> Result<Activity, StoreError> {
        if self.inner.failures.fail_create {
            return Err(StoreError::Write("simulated create failure".to_string()));
        }
        let record = activity.into_activity(Self::next_id(), chrono::Utc::now());
        self.inner
            .activities
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn bulk_create(&self, activities: Vec<NewActivity>) -> Result<Vec<Activity>, StoreError> {
        if self.inner.failures.fail_bulk_create {
            return Err(StoreError::Write("simulated bulk create failure".to_string()));
        }
        let now = chrono::Utc::now();
        let records: Vec<Activity> = activities
            .into_iter()
            .map(|a| a.into_activity(Self::next_id(), now))
            .collect();
        for record in &records {
            self.inner
                .activities
                .insert(record.id.clone(), record.clone());
        }
        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Option<Activity>, StoreError> {
        Ok(self.inner.activities.get(id).map(|e| e.value().clone()))
    }

    async fn list_by_parent(&self, parent_id: &str) -> Result<Vec<Activity>, StoreError> {
        let mut children: Vec<Activity> = self
            .inner
            .activities
            .iter()
            .filter(|e| e.value().parent_activity_id() == Some(parent_id))
            .map(|e| e.value().clone())
            .collect();
        children.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(children)
    }

    async fn update(&self, id: &str, update: ActivityUpdate) -> Result<Activity, StoreError> {
        let mut entry = self
            .inner
            .activities
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        entry.apply(&update, chrono::Utc::now());
        Ok(entry.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.activities.remove(id);
        Ok(())
    }
}

#[async_trait]
impl ImageStore for MemoryStore {
    async fn list_for_activity(&self, activity_id: &str) -> Result<Vec<ActivityImage>, StoreError> {
        if self.inner.failures.fail_image_reads {
            return Err(StoreError::Read("simulated image read failure".to_string()));
        }
        let mut images = self
            .inner
            .images
            .get(activity_id)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        images.sort_by_key(|i| i.order);
        Ok(images)
    }

    async fn create_for_activity(
        &self,
        activity_id: &str,
        images: &[NewImage],
    ) -> Result<Vec<ActivityImage>, StoreError> {
        let call = self.inner.image_write_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.failures.fail_image_write_calls.contains(&call) {
            return Err(StoreError::Write(format!(
                "simulated image write failure for {}",
                activity_id
            )));
        }
        let rows: Vec<ActivityImage> = images.iter().map(|i| i.attach(activity_id)).collect();
        self.inner
            .images
            .entry(activity_id.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn delete_for_activity(&self, activity_id: &str) -> Result<usize, StoreError> {
        Ok(self
            .inner
            .images
            .remove(activity_id)
            .map(|(_, rows)| rows.len())
            .unwrap_or(0))
    }
}
