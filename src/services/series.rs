// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recurring series materialization.
//!
//! Handles the core workflow:
//! 1. Validate the recurrence rule
//! 2. Persist the parent activity and its images
//! 3. Generate dated instances and link them to the parent
//! 4. Bulk-persist the instances
//! 5. Copy the parent's images onto every instance
//!
//! The phases run strictly in order. There is no cross-call transaction: a
//! failed instance write leaves the parent behind unless compensation is on.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use crate::db::{ActivityStore, ImageStore, StoreError};
use crate::models::{
    Activity, ActivityRole, ActivityTemplate, NewActivity, NewImage, RecurrenceRule,
    RecurrenceSeries, ValidationError,
};
use crate::services::generator::{generate_instances, GeneratorOptions};
use crate::services::media::{MediaPropagator, PropagationReport};
use crate::time_utils::format_utc_rfc3339;

/// Everything a user submits to create a recurring activity.
#[derive(Debug, Clone)]
pub struct SeriesRequest {
    pub owner_id: String,
    pub template: ActivityTemplate,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
    pub rule: RecurrenceRule,
    /// Parent image set, in display order
    pub images: Vec<NewImage>,
}

/// Result of a successful materialization.
#[derive(Debug, Clone)]
pub struct SeriesOutcome {
    pub parent: Activity,
    pub series: RecurrenceSeries,
    pub media: PropagationReport,
}

/// Materialization failures, by phase.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("Invalid recurrence rule: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to store parent activity: {0}")]
    ParentWrite(#[source] StoreError),

    #[error("Failed to store instances for parent {parent_id}: {source}")]
    InstanceWrite {
        parent_id: String,
        /// Whether the parent was deleted again after the failure
        compensated: bool,
        #[source]
        source: StoreError,
    },
}

/// Writes a parent and its generated instances.
#[derive(Clone)]
pub struct SeriesService {
    activities: Arc<dyn ActivityStore>,
    images: Arc<dyn ImageStore>,
    propagator: MediaPropagator,
    options: GeneratorOptions,
    compensate_on_failure: bool,
}

impl SeriesService {
    pub fn new(
        activities: Arc<dyn ActivityStore>,
        images: Arc<dyn ImageStore>,
        options: GeneratorOptions,
    ) -> Self {
        Self {
            propagator: MediaPropagator::new(images.clone()),
            activities,
            images,
            options,
            compensate_on_failure: false,
        }
    }

    /// Delete the parent again when its instances cannot be written.
    pub fn with_compensation(mut self, enabled: bool) -> Self {
        self.compensate_on_failure = enabled;
        self
    }

    /// Materialize a recurring series. `today` bounds the rule's start date.
    pub async fn create_series(
        &self,
        request: SeriesRequest,
        today: NaiveDate,
    ) -> Result<SeriesOutcome, MaterializeError> {
        request.rule.validate(today)?;

        let SeriesRequest {
            owner_id,
            template,
            time,
            duration_minutes,
            rule,
            images,
        } = request;

        tracing::info!(
            owner_id = %owner_id,
            recurrence_type = rule.recurrence_type.as_str(),
            start = %rule.start,
            end = ?rule.end,
            "Materializing recurring series"
        );

        // 1. Parent
        let parent_draft = NewActivity {
            owner_id,
            template,
            date: rule.start,
            time,
            duration_minutes,
            role: ActivityRole::Parent {
                recurrence: rule.clone(),
            },
        };
        let parent = self
            .activities
            .create(parent_draft.clone())
            .await
            .map_err(MaterializeError::ParentWrite)?;

        if !images.is_empty() {
            if let Err(e) = self.images.create_for_activity(&parent.id, &images).await {
                // Parent images are part of the parent write: undo it
                self.remove_parent(&parent.id).await;
                return Err(MaterializeError::ParentWrite(e));
            }
        }

        // 2-3. Generate and link
        let drafts: Vec<NewActivity> = generate_instances(&parent_draft, &rule, self.options)
            .into_iter()
            .map(|d| d.link(&parent.id))
            .collect();

        tracing::debug!(
            parent_id = %parent.id,
            count = drafts.len(),
            "Generated instances"
        );

        // 4. Bulk write
        let instances = if drafts.is_empty() {
            Vec::new()
        } else {
            match self.activities.bulk_create(drafts).await {
                Ok(instances) => instances,
                Err(source) => {
                    tracing::error!(
                        parent_id = %parent.id,
                        error = %source,
                        compensate = self.compensate_on_failure,
                        "Instance write failed"
                    );
                    if self.compensate_on_failure {
                        self.remove_parent(&parent.id).await;
                    }
                    return Err(MaterializeError::InstanceWrite {
                        parent_id: parent.id,
                        compensated: self.compensate_on_failure,
                        source,
                    });
                }
            }
        };

        let series = RecurrenceSeries {
            parent_id: parent.id.clone(),
            instance_ids: instances.into_iter().map(|a| a.id).collect(),
        };

        // 5. Images
        let media = self
            .propagator
            .propagate(&series.parent_id, &series.instance_ids)
            .await;

        tracing::info!(
            parent_id = %series.parent_id,
            created_at = %format_utc_rfc3339(parent.created_at),
            instances = series.instance_ids.len(),
            media_complete = media.is_complete(),
            "Recurring series materialized"
        );

        Ok(SeriesOutcome {
            parent,
            series,
            media,
        })
    }

    /// Best-effort removal of a parent and its images.
    async fn remove_parent(&self, parent_id: &str) {
        if let Err(e) = self.images.delete_for_activity(parent_id).await {
            tracing::warn!(parent_id, error = %e, "Failed to remove parent images");
        }
        match self.activities.delete(parent_id).await {
            Ok(()) => tracing::info!(parent_id, "Removed parent after failed write"),
            Err(e) => tracing::error!(
                parent_id,
                error = %e,
                "Failed to remove parent; manual cleanup required"
            ),
        }
    }
}
