// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod generator;
pub mod media;
pub mod series;

pub use generator::{generate_instances, GeneratorOptions, InstanceDraft};
pub use media::{MediaPropagationError, MediaPropagator, PropagationReport};
pub use series::{MaterializeError, SeriesOutcome, SeriesRequest, SeriesService};
