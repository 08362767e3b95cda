// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Media propagation: copy a parent's images onto its instances.

use std::sync::Arc;

use crate::db::{ImageStore, StoreError};
use crate::models::NewImage;

/// Copying images to one instance failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to copy images to activity {activity_id}: {source}")]
pub struct MediaPropagationError {
    pub activity_id: String,
    #[source]
    pub source: StoreError,
}

/// Outcome of one propagation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropagationReport {
    /// Number of images in the parent's set at copy time
    pub images_per_instance: usize,
    /// Instances that received the full set
    pub copied: Vec<String>,
    /// Instances left without images
    pub failed: Vec<String>,
}

impl PropagationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Copies the parent's image set to each instance as independent rows.
#[derive(Clone)]
pub struct MediaPropagator {
    images: Arc<dyn ImageStore>,
}

impl MediaPropagator {
    pub fn new(images: Arc<dyn ImageStore>) -> Self {
        Self { images }
    }

    /// Read the parent's current images and write a copy for every instance.
    ///
    /// Failures are logged and skipped; the run never aborts early.
    pub async fn propagate(&self, parent_id: &str, instance_ids: &[String]) -> PropagationReport {
        let parent_images = match self.images.list_for_activity(parent_id).await {
            Ok(images) => images,
            Err(e) => {
                tracing::error!(
                    parent_id,
                    error = %e,
                    "Failed to read parent images; instances left without images"
                );
                return PropagationReport {
                    images_per_instance: 0,
                    copied: Vec::new(),
                    failed: instance_ids.to_vec(),
                };
            }
        };

        let set: Vec<NewImage> = parent_images.iter().map(|i| i.to_new()).collect();
        let mut report = PropagationReport {
            images_per_instance: set.len(),
            ..Default::default()
        };

        if set.is_empty() {
            tracing::debug!(parent_id, "Parent has no images; nothing to propagate");
            report.copied = instance_ids.to_vec();
            return report;
        }

        for instance_id in instance_ids {
            match self.images.create_for_activity(instance_id, &set).await {
                Ok(_) => report.copied.push(instance_id.clone()),
                Err(source) => {
                    let err = MediaPropagationError {
                        activity_id: instance_id.clone(),
                        source,
                    };
                    tracing::warn!(parent_id, error = %err, "Skipping image copy");
                    report.failed.push(instance_id.clone());
                }
            }
        }

        tracing::info!(
            parent_id,
            images = report.images_per_instance,
            copied = report.copied.len(),
            failed = report.failed.len(),
            "Media propagation finished"
        );

        report
    }
}
