// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod recurrence;

pub use activity::{
    Activity, ActivityImage, ActivityRole, ActivityTemplate, ActivityUpdate, NewActivity,
    NewImage, RecurrenceSeries,
};
pub use recurrence::{RecurrenceInput, RecurrenceRule, RecurrenceType, ValidationError};
