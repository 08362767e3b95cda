// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recurrence rule: how a parent activity repeats.
//!
//! Rules arrive from the client as loosely typed [`RecurrenceInput`] and are
//! turned into a [`RecurrenceRule`] by [`RecurrenceRule::parse`]. Every check
//! is pure: "today" is passed in by the caller, never read from the clock.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::time_utils::{parse_calendar_date, weekday_index};

/// How a recurring activity repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    Weekly,
    Daily,
    Monthly,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceType::Weekly => "weekly",
            RecurrenceType::Daily => "daily",
            RecurrenceType::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for RecurrenceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(RecurrenceType::Weekly),
            "daily" => Ok(RecurrenceType::Daily),
            "monthly" => Ok(RecurrenceType::Monthly),
            other => Err(ValidationError::new(
                "type",
                format!("unknown recurrence type '{}'", other),
            )),
        }
    }
}

/// A field-scoped rule validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Recurrence rule as submitted by a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecurrenceInput {
    #[serde(rename = "type")]
    pub recurrence_type: Option<String>,
    pub days: Option<Vec<i64>>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Validated recurrence rule stored on a parent activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    #[serde(rename = "type")]
    pub recurrence_type: RecurrenceType,
    /// Weekday indices, Sunday = 0. Sorted, no duplicates.
    #[serde(default)]
    pub days: Vec<u8>,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl RecurrenceRule {
    /// Parse and validate client input against `today`.
    pub fn parse(input: RecurrenceInput, today: NaiveDate) -> Result<Self, ValidationError> {
        let recurrence_type: RecurrenceType = input
            .recurrence_type
            .as_deref()
            .ok_or_else(|| ValidationError::new("type", "recurrence type is required"))?
            .parse()?;

        let start = input
            .start
            .as_deref()
            .ok_or_else(|| ValidationError::new("start", "start date is required"))
            .and_then(|raw| {
                parse_calendar_date(raw)
                    .ok_or_else(|| ValidationError::new("start", "start must be YYYY-MM-DD"))
            })?;

        let end = input
            .end
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                parse_calendar_date(raw)
                    .ok_or_else(|| ValidationError::new("end", "end must be YYYY-MM-DD"))
            })
            .transpose()?;

        let mut days = Vec::new();
        for day in input.days.unwrap_or_default() {
            let day = u8::try_from(day)
                .ok()
                .filter(|d| *d <= 6)
                .ok_or_else(|| {
                    ValidationError::new("days", format!("weekday {} is outside 0..6", day))
                })?;
            days.push(day);
        }
        days.sort_unstable();
        days.dedup();

        let rule = Self {
            recurrence_type,
            days,
            start,
            end,
        };
        rule.validate(today)?;
        Ok(rule)
    }

    /// Check the rule's invariants. Runs before anything is persisted.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        if self.recurrence_type == RecurrenceType::Weekly && self.days.is_empty() {
            return Err(ValidationError::new(
                "days",
                "at least one weekday is required for weekly recurrence",
            ));
        }
        if let Some(day) = self.days.iter().find(|d| **d > 6) {
            return Err(ValidationError::new(
                "days",
                format!("weekday {} is outside 0..6", day),
            ));
        }
        if self.start < today {
            return Err(ValidationError::new("start", "start cannot be in the past"));
        }
        if let Some(end) = self.end {
            if end < self.start {
                return Err(ValidationError::new("end", "end cannot be before start"));
            }
        }
        Ok(())
    }

    /// Last day the generator may emit: the explicit end, or start + `horizon_days`.
    pub fn horizon_end(&self, horizon_days: u32) -> NaiveDate {
        self.end.unwrap_or_else(|| {
            self.start
                .checked_add_days(Days::new(u64::from(horizon_days)))
                .unwrap_or(NaiveDate::MAX)
        })
    }

    /// Whether `date` falls on one of the selected weekdays.
    pub fn matches_weekday(&self, date: NaiveDate) -> bool {
        self.days.contains(&weekday_index(date))
    }
}
