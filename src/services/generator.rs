// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Instance generator: expands a recurrence rule into dated instances.
//!
//! Pure and synchronous. The output is a finite `Vec` because the whole set
//! is needed before the bulk write.

use chrono::{NaiveDate, NaiveTime};

use crate::models::{ActivityRole, ActivityTemplate, NewActivity, RecurrenceRule, RecurrenceType};

/// Hard ceiling on instances per series, whatever the configuration says.
pub const MAX_INSTANCES_CAP: usize = 100;

/// Horizon used when a rule has no end date.
pub const DEFAULT_HORIZON_DAYS: u32 = 365;

/// Bounds applied while expanding a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Days after `start` to stop at when the rule has no `end`.
    pub horizon_days: u32,
    /// Maximum number of instances to emit (never above [`MAX_INSTANCES_CAP`]).
    pub max_instances: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            max_instances: MAX_INSTANCES_CAP,
        }
    }
}

impl GeneratorOptions {
    pub fn new(horizon_days: u32, max_instances: usize) -> Self {
        Self {
            horizon_days,
            max_instances: max_instances.min(MAX_INSTANCES_CAP),
        }
    }
}

/// A dated instance that is not yet linked to its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDraft {
    pub owner_id: String,
    pub template: ActivityTemplate,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
}

impl InstanceDraft {
    /// Link the draft to its persisted parent.
    pub fn link(self, parent_id: &str) -> NewActivity {
        NewActivity {
            owner_id: self.owner_id,
            template: self.template,
            date: self.date,
            time: self.time,
            duration_minutes: self.duration_minutes,
            role: ActivityRole::Instance {
                parent_activity_id: parent_id.to_string(),
            },
        }
    }
}

/// Expand `rule` against `base` (the parent's template and schedule).
///
/// Weekly rules walk every day from `start` to the horizon end inclusive and
/// keep the selected weekdays, stopping at `options.max_instances`. Daily and
/// monthly rules have no expansion and yield nothing.
pub fn generate_instances(
    base: &NewActivity,
    rule: &RecurrenceRule,
    options: GeneratorOptions,
) -> Vec<InstanceDraft> {
    let limit = options.max_instances.min(MAX_INSTANCES_CAP);

    match rule.recurrence_type {
        RecurrenceType::Weekly => {
            let end = rule.horizon_end(options.horizon_days);
            rule.start
                .iter_days()
                .take_while(|day| *day <= end)
                .filter(|day| rule.matches_weekday(*day))
                .take(limit)
                .map(|date| InstanceDraft {
                    owner_id: base.owner_id.clone(),
                    template: base.template.clone(),
                    date,
                    time: base.time,
                    duration_minutes: base.duration_minutes,
                })
                .collect()
        }
        RecurrenceType::Daily | RecurrenceType::Monthly => {
            tracing::warn!(
                recurrence_type = rule.recurrence_type.as_str(),
                "No expansion defined for recurrence type; no instances generated"
            );
            Vec::new()
        }
    }
}
