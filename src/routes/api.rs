// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    Activity, ActivityImage, ActivityTemplate, ActivityUpdate, NewImage, RecurrenceInput,
    RecurrenceRule,
};
use crate::services::SeriesRequest;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/series", post(create_series))
        .route(
            "/api/activities/{id}",
            get(get_activity)
                .patch(update_activity)
                .delete(delete_activity),
        )
        .route("/api/activities/{id}/instances", get(list_instances))
        .route("/api/activities/{id}/images", get(list_images))
}

// ─── Series Creation ─────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ImageInput {
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub url: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_age_range"))]
pub struct CreateSeriesRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    #[validate(range(min = 1, max = 10000, message = "Capacity must be at least 1"))]
    pub capacity: Option<u32>,
    pub price_cents: Option<u32>,
    #[validate(range(max = 120))]
    pub min_age: Option<u8>,
    #[validate(range(max = 120))]
    pub max_age: Option<u8>,
    #[validate(length(max = 50))]
    pub difficulty: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 tags"))]
    pub tags: Vec<String>,
    pub time: Option<NaiveTime>,
    #[validate(range(min = 1, max = 1440, message = "Duration must be 1-1440 minutes"))]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 images"))]
    #[validate(nested)]
    pub images: Vec<ImageInput>,
    #[serde(default)]
    pub recurrence: RecurrenceInput,
}

fn validate_age_range(
    req: &CreateSeriesRequest,
) -> std::result::Result<(), validator::ValidationError> {
    match (req.min_age, req.max_age) {
        (Some(min), Some(max)) if min > max => {
            Err(validator::ValidationError::new("min_age_above_max_age"))
        }
        _ => Ok(()),
    }
}

impl CreateSeriesRequest {
    /// Trim the title so length checks see what will be stored.
    fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
    }

    fn template(&self) -> ActivityTemplate {
        ActivityTemplate {
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            capacity: self.capacity,
            price_cents: self.price_cents,
            min_age: self.min_age,
            max_age: self.max_age,
            difficulty: self.difficulty.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Order images as submitted; the flagged one (or the first) is primary.
fn image_set(inputs: &[ImageInput]) -> Vec<NewImage> {
    let primary = inputs.iter().position(|i| i.is_primary).unwrap_or(0);
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| NewImage {
            url: input.url.clone(),
            order: i as u32,
            is_primary: i == primary,
        })
        .collect()
}

#[derive(Serialize)]
pub struct CreateSeriesResponse {
    pub parent: Activity,
    pub instance_ids: Vec<String>,
    pub images_per_instance: usize,
    /// Instances that did not receive the parent's images
    pub images_failed: Vec<String>,
}

/// Create a recurring activity and materialize its instances.
async fn create_series(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(mut payload): Json<CreateSeriesRequest>,
) -> Result<(StatusCode, Json<CreateSeriesResponse>)> {
    payload.normalize();
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let today = chrono::Utc::now().date_naive();
    let template = payload.template();
    let images = image_set(&payload.images);
    let rule = RecurrenceRule::parse(payload.recurrence, today)?;

    let outcome = state
        .series_service
        .create_series(
            SeriesRequest {
                owner_id: user.user_id.clone(),
                template,
                time: payload.time,
                duration_minutes: payload.duration_minutes,
                rule,
                images,
            },
            today,
        )
        .await?;

    if !outcome.media.is_complete() {
        tracing::warn!(
            parent_id = %outcome.series.parent_id,
            failed = outcome.media.failed.len(),
            "Series created with missing instance images"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateSeriesResponse {
            parent: outcome.parent,
            instance_ids: outcome.series.instance_ids,
            images_per_instance: outcome.media.images_per_instance,
            images_failed: outcome.media.failed,
        }),
    ))
}

// ─── Activities ──────────────────────────────────────────────

async fn load_activity(state: &AppState, id: &str) -> Result<Activity> {
    state
        .activities
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))
}

/// Get one activity.
async fn get_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Activity>> {
    Ok(Json(load_activity(&state, &id).await?))
}

#[derive(Serialize)]
pub struct InstancesResponse {
    pub parent_id: String,
    pub instances: Vec<Activity>,
}

/// List the instances generated from a parent, by date.
async fn list_instances(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<InstancesResponse>> {
    let parent = load_activity(&state, &id).await?;
    if !parent.is_recurring() {
        return Err(AppError::BadRequest(format!(
            "Activity {} is not a recurring parent",
            id
        )));
    }

    let instances = state.activities.list_by_parent(&parent.id).await?;
    Ok(Json(InstancesResponse {
        parent_id: parent.id,
        instances,
    }))
}

/// List an activity's images in display order.
async fn list_images(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ActivityImage>>> {
    let activity = load_activity(&state, &id).await?;
    Ok(Json(state.images.list_for_activity(&activity.id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateActivityRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    #[validate(range(min = 1, max = 10000))]
    pub capacity: Option<u32>,
    pub price_cents: Option<u32>,
    #[validate(range(max = 120))]
    pub min_age: Option<u8>,
    #[validate(range(max = 120))]
    pub max_age: Option<u8>,
    #[validate(length(max = 50))]
    pub difficulty: Option<String>,
    #[validate(length(max = 20))]
    pub tags: Option<Vec<String>>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: Option<u32>,
}

impl UpdateActivityRequest {
    fn normalize(&mut self) {
        if let Some(title) = self.title.as_mut() {
            *title = title.trim().to_string();
        }
    }
}

/// Ages must still be ordered once the update is merged onto `current`.
fn check_merged_ages(current: &ActivityTemplate, update: &UpdateActivityRequest) -> Result<()> {
    let min_age = update.min_age.or(current.min_age);
    let max_age = update.max_age.or(current.max_age);
    match (min_age, max_age) {
        (Some(min), Some(max)) if min > max => Err(AppError::Validation {
            field: "min_age".to_string(),
            message: format!("min_age {} is above max_age {}", min, max),
        }),
        _ => Ok(()),
    }
}

impl From<UpdateActivityRequest> for ActivityUpdate {
    fn from(req: UpdateActivityRequest) -> Self {
        ActivityUpdate {
            title: req.title,
            description: req.description,
            location: req.location,
            capacity: req.capacity,
            price_cents: req.price_cents,
            min_age: req.min_age,
            max_age: req.max_age,
            difficulty: req.difficulty,
            tags: req.tags,
            date: req.date,
            time: req.time,
            duration_minutes: req.duration_minutes,
        }
    }
}

/// Update an activity's template or schedule. Owner or admin only.
///
/// Recurrence is not editable here and existing instances are never
/// regenerated.
async fn update_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(mut payload): Json<UpdateActivityRequest>,
) -> Result<Json<Activity>> {
    payload.normalize();
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let activity = load_activity(&state, &id).await?;
    if !user.can_modify(&activity.owner_id) {
        tracing::warn!(user_id = %user.user_id, activity_id = %id, "Update denied");
        return Err(AppError::Forbidden);
    }
    check_merged_ages(&activity.template, &payload)?;

    let updated = state.activities.update(&id, payload.into()).await?;
    tracing::info!(user_id = %user.user_id, activity_id = %id, "Activity updated");
    Ok(Json(updated))
}

#[derive(Serialize)]
pub struct DeleteActivityResponse {
    pub success: bool,
    pub message: String,
}

/// Delete one activity and its images. Owner or admin only.
///
/// Instances of a deleted parent are left in place.
async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteActivityResponse>> {
    let activity = load_activity(&state, &id).await?;
    if !user.can_modify(&activity.owner_id) {
        tracing::warn!(user_id = %user.user_id, activity_id = %id, "Delete denied");
        return Err(AppError::Forbidden);
    }

    if activity.is_recurring() {
        let remaining = state.activities.list_by_parent(&id).await?.len();
        tracing::info!(activity_id = %id, remaining, "Deleting recurring parent; instances kept");
    }

    state.images.delete_for_activity(&id).await?;
    state.activities.delete(&id).await?;

    tracing::info!(user_id = %user.user_id, activity_id = %id, "Activity deleted");

    Ok(Json(DeleteActivityResponse {
        success: true,
        message: format!("Activity {} deleted", id),
    }))
}
