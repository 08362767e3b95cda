// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity-Series: recurring activity materialization for the community platform
//!
//! This crate provides the backend API that expands a recurring activity
//! template into dated instances, links them to their parent, and copies
//! the parent's images onto every instance.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{ActivityStore, ImageStore};
use services::SeriesService;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub activities: Arc<dyn ActivityStore>,
    pub images: Arc<dyn ImageStore>,
    pub series_service: SeriesService,
}

impl AppState {
    /// Build state around a store that backs both activities and images.
    pub fn new<S>(config: Config, store: S) -> Self
    where
        S: ActivityStore + ImageStore + 'static,
    {
        let store = Arc::new(store);
        let activities: Arc<dyn ActivityStore> = store.clone();
        let images: Arc<dyn ImageStore> = store;
        let series_service = SeriesService::new(
            activities.clone(),
            images.clone(),
            config.series.generator_options(),
        )
        .with_compensation(config.series.compensate_on_failure);

        Self {
            config,
            activities,
            images,
            series_service,
        }
    }
}
