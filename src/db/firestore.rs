// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the production implementations of:
//! - [`ActivityStore`] (collection `activities`)
//! - [`ImageStore`] (collection `activity_images`)

use crate::db::{collections, ActivityStore, ImageStore, StoreError};
use crate::models::{Activity, ActivityImage, ActivityUpdate, NewActivity, NewImage};
use async_trait::async_trait;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns `StoreError::Unavailable`.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client.as_ref().ok_or_else(|| {
            StoreError::Unavailable("Database not connected (offline mode)".to_string())
        })
    }

    fn image_doc_id(activity_id: &str, order: u32) -> String {
        format!("{}_{}", activity_id, order)
    }

    async fn write_activity(&self, activity: &Activity) -> Result<(), StoreError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(&activity.id)
            .object(activity)
            .execute()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }

    /// Write documents in chunks, one transaction per chunk.
    ///
    /// A series never exceeds one chunk, so series writes are all-or-nothing.
    async fn batch_write<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), StoreError>
    where
        T: serde::Serialize + for<'de> serde::Deserialize<'de> + Sync + Send,
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| StoreError::Write(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(&doc_id)
                    .object(item)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        StoreError::Write(format!(
                            "Failed to add write to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction
                .commit()
                .await
                .map_err(|e| StoreError::Write(format!("Failed to commit batch write: {}", e)))?;
        }

        Ok(())
    }

    /// Delete documents in chunks, one transaction per chunk.
    async fn batch_delete(&self, doc_ids: &[String], collection: &str) -> Result<(), StoreError> {
        let client = self.get_client()?;

        for chunk in doc_ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| StoreError::Write(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        StoreError::Write(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                StoreError::Write(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl ActivityStore for FirestoreDb {
    async fn create(&self, activity: NewActivity) -> Result<Activity, StoreError> {
        let record = activity.into_activity(uuid::Uuid::new_v4().to_string(), chrono::Utc::now());
        self.write_activity(&record).await?;
        tracing::debug!(activity_id = %record.id, "Activity stored");
        Ok(record)
    }

    async fn bulk_create(&self, activities: Vec<NewActivity>) -> Result<Vec<Activity>, StoreError> {
        let now = chrono::Utc::now();
        let records: Vec<Activity> = activities
            .into_iter()
            .map(|a| a.into_activity(uuid::Uuid::new_v4().to_string(), now))
            .collect();

        self.batch_write(&records, collections::ACTIVITIES, |a: &Activity| {
            a.id.clone()
        })
        .await?;

        tracing::debug!(count = records.len(), "Activities stored in batch");
        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Option<Activity>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(id)
            .await
            .map_err(|e| StoreError::Read(e.to_string()))
    }

    async fn list_by_parent(&self, parent_id: &str) -> Result<Vec<Activity>, StoreError> {
        let parent_id = parent_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| {
                q.for_all([q
                    .field("role.parent_activity_id")
                    .eq(parent_id.clone())])
            })
            .order_by([("date", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Read(e.to_string()))
    }

    async fn update(&self, id: &str, update: ActivityUpdate) -> Result<Activity, StoreError> {
        // Read-modify-write keeps the role and unedited fields intact
        let mut activity = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        activity.apply(&update, chrono::Utc::now());
        self.write_activity(&activity).await?;
        Ok(activity)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::ACTIVITIES)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ImageStore for FirestoreDb {
    async fn list_for_activity(&self, activity_id: &str) -> Result<Vec<ActivityImage>, StoreError> {
        let activity_id = activity_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITY_IMAGES)
            .filter(move |q| q.for_all([q.field("activity_id").eq(activity_id.clone())]))
            .order_by([("order", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Read(e.to_string()))
    }

    async fn create_for_activity(
        &self,
        activity_id: &str,
        images: &[NewImage],
    ) -> Result<Vec<ActivityImage>, StoreError> {
        let rows: Vec<ActivityImage> = images.iter().map(|i| i.attach(activity_id)).collect();

        self.batch_write(&rows, collections::ACTIVITY_IMAGES, |i: &ActivityImage| {
            Self::image_doc_id(&i.activity_id, i.order)
        })
        .await?;

        Ok(rows)
    }

    async fn delete_for_activity(&self, activity_id: &str) -> Result<usize, StoreError> {
        let images = self.list_for_activity(activity_id).await?;
        let doc_ids: Vec<String> = images
            .iter()
            .map(|i| Self::image_doc_id(&i.activity_id, i.order))
            .collect();

        self.batch_delete(&doc_ids, collections::ACTIVITY_IMAGES)
            .await?;

        tracing::debug!(activity_id, count = doc_ids.len(), "Deleted activity images");
        Ok(doc_ids.len())
    }
}
