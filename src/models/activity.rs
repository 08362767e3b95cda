// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity model for storage and API.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::recurrence::RecurrenceRule;

/// Scalar fields shared verbatim by a parent and all of its instances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityTemplate {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Maximum number of participants
    pub capacity: Option<u32>,
    /// Price in cents (None = free)
    pub price_cents: Option<u32>,
    pub min_age: Option<u8>,
    pub max_age: Option<u8>,
    /// Free-form difficulty label ("beginner", "advanced", ...)
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Role an activity plays with respect to recurrence.
///
/// A record is exactly one of these, so a recurring parent can never also
/// carry a parent link and an instance can never carry a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityRole {
    Standalone,
    Parent { recurrence: RecurrenceRule },
    Instance { parent_activity_id: String },
}

/// Stored activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Store-assigned ID (also used as document ID)
    pub id: String,
    /// Owning user
    pub owner_id: String,
    pub template: ActivityTemplate,
    /// Calendar day the activity takes place
    pub date: NaiveDate,
    /// Local start time
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
    pub role: ActivityRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    pub fn is_recurring(&self) -> bool {
        matches!(self.role, ActivityRole::Parent { .. })
    }

    pub fn parent_activity_id(&self) -> Option<&str> {
        match &self.role {
            ActivityRole::Instance { parent_activity_id } => Some(parent_activity_id),
            _ => None,
        }
    }

    pub fn recurrence(&self) -> Option<&RecurrenceRule> {
        match &self.role {
            ActivityRole::Parent { recurrence } => Some(recurrence),
            _ => None,
        }
    }

    /// Apply a partial update. The role is never touched, so editing a
    /// parent does not affect the instances already generated from it.
    pub fn apply(&mut self, update: &ActivityUpdate, now: DateTime<Utc>) {
        let t = &mut self.template;
        if let Some(title) = &update.title {
            t.title = title.clone();
        }
        if let Some(description) = &update.description {
            t.description = Some(description.clone());
        }
        if let Some(location) = &update.location {
            t.location = Some(location.clone());
        }
        if let Some(capacity) = update.capacity {
            t.capacity = Some(capacity);
        }
        if let Some(price) = update.price_cents {
            t.price_cents = Some(price);
        }
        if let Some(min_age) = update.min_age {
            t.min_age = Some(min_age);
        }
        if let Some(max_age) = update.max_age {
            t.max_age = Some(max_age);
        }
        if let Some(difficulty) = &update.difficulty {
            t.difficulty = Some(difficulty.clone());
        }
        if let Some(tags) = &update.tags {
            t.tags = tags.clone();
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(time) = update.time {
            self.time = Some(time);
        }
        if let Some(duration) = update.duration_minutes {
            self.duration_minutes = Some(duration);
        }
        self.updated_at = now;
    }
}

/// Activity to be persisted; the store assigns the ID.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub owner_id: String,
    pub template: ActivityTemplate,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
    pub role: ActivityRole,
}

impl NewActivity {
    pub fn into_activity(self, id: String, now: DateTime<Utc>) -> Activity {
        Activity {
            id,
            owner_id: self.owner_id,
            template: self.template,
            date: self.date,
            time: self.time,
            duration_minutes: self.duration_minutes,
            role: self.role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of the editable fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<u32>,
    pub price_cents: Option<u32>,
    pub min_age: Option<u8>,
    pub max_age: Option<u8>,
    pub difficulty: Option<String>,
    pub tags: Option<Vec<String>>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
}

/// Image attached to one activity. Instances own their own copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityImage {
    pub activity_id: String,
    /// Opaque URL from the image store
    pub url: String,
    /// Display position, ascending
    pub order: u32,
    pub is_primary: bool,
}

impl ActivityImage {
    /// Strip the owning activity so the image can be attached elsewhere.
    pub fn to_new(&self) -> NewImage {
        NewImage {
            url: self.url.clone(),
            order: self.order,
            is_primary: self.is_primary,
        }
    }
}

/// Image to be attached to an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub url: String,
    pub order: u32,
    pub is_primary: bool,
}

impl NewImage {
    /// Build an ordered image set from URLs. The first URL is primary.
    pub fn from_urls<I, S>(urls: I) -> Vec<NewImage>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .enumerate()
            .map(|(i, url)| NewImage {
                url: url.into(),
                order: i as u32,
                is_primary: i == 0,
            })
            .collect()
    }

    pub fn attach(&self, activity_id: &str) -> ActivityImage {
        ActivityImage {
            activity_id: activity_id.to_string(),
            url: self.url.clone(),
            order: self.order,
            is_primary: self.is_primary,
        }
    }
}

/// A recurring parent together with the instances generated from it,
/// in ascending date order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecurrenceSeries {
    pub parent_id: String,
    pub instance_ids: Vec<String>,
}
