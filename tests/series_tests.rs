// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Series materialization and media propagation tests (in-memory store).
//!
//! These tests verify that:
//! 1. A valid rule produces a parent, linked instances, and copied images
//! 2. Invalid rules are rejected before any write
//! 3. Write failures leave the documented partial states

use activity_series::db::{ActivityStore, FailurePlan, ImageStore, MemoryStore};
use activity_series::models::{ActivityRole, NewImage, RecurrenceRule, RecurrenceType};
use activity_series::services::{GeneratorOptions, MaterializeError, SeriesRequest, SeriesService};
use std::sync::Arc;

mod common;
use common::{date, sample_template, weekly_rule};

fn service(store: &MemoryStore) -> SeriesService {
    SeriesService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        GeneratorOptions::default(),
    )
}

fn request(rule: RecurrenceRule, images: &[&str]) -> SeriesRequest {
    SeriesRequest {
        owner_id: "owner-1".to_string(),
        template: sample_template(),
        time: chrono::NaiveTime::from_hms_opt(9, 0, 0),
        duration_minutes: Some(45),
        rule,
        images: NewImage::from_urls(images.iter().copied()),
    }
}

fn today() -> chrono::NaiveDate {
    date("2024-01-01")
}

#[tokio::test]
async fn test_series_links_instances_to_parent() {
    let store = MemoryStore::new();
    let rule = weekly_rule(&[1, 3, 5], "2024-01-01", Some("2024-01-15"));

    let outcome = service(&store)
        .create_series(request(rule.clone(), &[]), today())
        .await
        .unwrap();

    let parent = store.get(&outcome.series.parent_id).await.unwrap().unwrap();
    assert!(parent.is_recurring());
    assert_eq!(parent.parent_activity_id(), None);
    assert_eq!(parent.recurrence(), Some(&rule));
    assert_eq!(parent.date, date("2024-01-01"));

    let instances = store.list_by_parent(&parent.id).await.unwrap();
    assert_eq!(instances.len(), 7);
    let ids: Vec<String> = instances.iter().map(|a| a.id.clone()).collect();
    assert_eq!(ids, outcome.series.instance_ids);

    for instance in &instances {
        assert!(!instance.is_recurring());
        assert!(instance.recurrence().is_none());
        assert_eq!(instance.parent_activity_id(), Some(parent.id.as_str()));
        assert_eq!(instance.template, parent.template);
        assert_eq!(instance.owner_id, "owner-1");
    }
    assert_eq!(store.activity_count(), 8);
}

#[tokio::test]
async fn test_images_copied_to_every_instance() {
    let store = MemoryStore::new();
    let rule = weekly_rule(&[2, 4], "2024-01-01", Some("2024-01-31"));

    let outcome = service(&store)
        .create_series(
            request(rule, &["https://img/a.jpg", "https://img/b.jpg", "https://img/c.jpg"]),
            today(),
        )
        .await
        .unwrap();

    assert!(outcome.media.is_complete());
    assert_eq!(outcome.media.images_per_instance, 3);

    let parent_images: Vec<NewImage> = store
        .list_for_activity(&outcome.series.parent_id)
        .await
        .unwrap()
        .iter()
        .map(|i| i.to_new())
        .collect();
    assert_eq!(parent_images.len(), 3);
    assert!(parent_images[0].is_primary);

    for id in &outcome.series.instance_ids {
        let images = store.list_for_activity(id).await.unwrap();
        assert!(images.iter().all(|i| &i.activity_id == id));
        let copied: Vec<NewImage> = images.iter().map(|i| i.to_new()).collect();
        assert_eq!(copied, parent_images);
    }
}

#[tokio::test]
async fn test_instance_images_independent_of_parent() {
    let store = MemoryStore::new();
    let rule = weekly_rule(&[1], "2024-01-01", Some("2024-01-14"));

    let outcome = service(&store)
        .create_series(request(rule, &["https://img/a.jpg"]), today())
        .await
        .unwrap();

    // Later edits to the parent's images do not reach the instances
    store
        .delete_for_activity(&outcome.series.parent_id)
        .await
        .unwrap();
    for id in &outcome.series.instance_ids {
        assert_eq!(store.list_for_activity(id).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_empty_weekday_set_writes_nothing() {
    let store = MemoryStore::new();
    let rule = weekly_rule(&[], "2024-01-01", None);

    let err = service(&store)
        .create_series(request(rule, &["https://img/a.jpg"]), today())
        .await
        .unwrap_err();

    match err {
        MaterializeError::Validation(e) => assert_eq!(e.field, "days"),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(store.activity_count(), 0);
    assert_eq!(store.image_count(), 0);
}

#[tokio::test]
async fn test_start_in_past_writes_nothing() {
    let store = MemoryStore::new();
    let rule = weekly_rule(&[1], "2023-12-25", None);

    let err = service(&store)
        .create_series(request(rule, &[]), today())
        .await
        .unwrap_err();

    assert!(matches!(err, MaterializeError::Validation(ref e) if e.field == "start"));
    assert_eq!(store.activity_count(), 0);
}

#[tokio::test]
async fn test_parent_write_failure_persists_nothing() {
    let store = MemoryStore::with_failures(FailurePlan {
        fail_create: true,
        ..Default::default()
    });
    let rule = weekly_rule(&[1], "2024-01-01", None);

    let err = service(&store)
        .create_series(request(rule, &["https://img/a.jpg"]), today())
        .await
        .unwrap_err();

    assert!(matches!(err, MaterializeError::ParentWrite(_)));
    assert_eq!(store.activity_count(), 0);
    assert_eq!(store.image_count(), 0);
}

#[tokio::test]
async fn test_parent_image_failure_removes_parent() {
    let store = MemoryStore::with_failures(FailurePlan {
        fail_image_write_calls: [0].into_iter().collect(),
        ..Default::default()
    });
    let rule = weekly_rule(&[1], "2024-01-01", None);

    let err = service(&store)
        .create_series(request(rule, &["https://img/a.jpg"]), today())
        .await
        .unwrap_err();

    assert!(matches!(err, MaterializeError::ParentWrite(_)));
    assert_eq!(store.activity_count(), 0);
}

#[tokio::test]
async fn test_instance_write_failure_leaves_orphan_parent() {
    let store = MemoryStore::with_failures(FailurePlan {
        fail_bulk_create: true,
        ..Default::default()
    });
    let rule = weekly_rule(&[1, 3], "2024-01-01", None);

    let err = service(&store)
        .create_series(request(rule, &[]), today())
        .await
        .unwrap_err();

    let parent_id = match err {
        MaterializeError::InstanceWrite {
            parent_id,
            compensated,
            ..
        } => {
            assert!(!compensated);
            parent_id
        }
        other => panic!("expected instance write error, got {:?}", other),
    };

    let parent = store.get(&parent_id).await.unwrap();
    assert!(parent.is_some(), "parent should remain in the store");
    assert!(store.list_by_parent(&parent_id).await.unwrap().is_empty());
    assert_eq!(store.activity_count(), 1);
}

#[tokio::test]
async fn test_instance_write_failure_with_compensation() {
    let store = MemoryStore::with_failures(FailurePlan {
        fail_bulk_create: true,
        ..Default::default()
    });
    let rule = weekly_rule(&[1, 3], "2024-01-01", None);

    let err = service(&store)
        .with_compensation(true)
        .create_series(request(rule, &["https://img/a.jpg"]), today())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MaterializeError::InstanceWrite {
            compensated: true,
            ..
        }
    ));
    assert_eq!(store.activity_count(), 0);
    assert_eq!(store.image_count(), 0);
}

#[tokio::test]
async fn test_partial_media_failure_is_skipped() {
    // Call 0 is the parent's own image set; fail the copies to instances 2 and 4
    let store = MemoryStore::with_failures(FailurePlan {
        fail_image_write_calls: [2, 4].into_iter().collect(),
        ..Default::default()
    });
    let rule = weekly_rule(&[1], "2024-01-01", Some("2024-02-05"));

    let outcome = service(&store)
        .create_series(request(rule, &["https://img/a.jpg", "https://img/b.jpg"]), today())
        .await
        .unwrap();

    let ids = &outcome.series.instance_ids;
    assert_eq!(ids.len(), 6);
    assert_eq!(outcome.media.failed, vec![ids[1].clone(), ids[3].clone()]);
    assert_eq!(outcome.media.copied.len(), 4);

    assert!(store.list_for_activity(&ids[1]).await.unwrap().is_empty());
    assert_eq!(store.list_for_activity(&ids[0]).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_dense_rule_is_capped() {
    let store = MemoryStore::new();
    let rule = weekly_rule(&[0, 1, 2, 3, 4, 5, 6], "2024-01-01", None);

    let outcome = service(&store)
        .create_series(request(rule, &["https://img/a.jpg"]), today())
        .await
        .unwrap();

    assert_eq!(outcome.series.instance_ids.len(), 100);
    // Parent + 100 instances, each with one image
    assert_eq!(store.activity_count(), 101);
    assert_eq!(store.image_count(), 101);
}

#[tokio::test]
async fn test_unexpanded_type_creates_parent_only() {
    let store = MemoryStore::new();
    let rule = RecurrenceRule {
        recurrence_type: RecurrenceType::Daily,
        days: vec![],
        start: date("2024-01-01"),
        end: None,
    };

    let outcome = service(&store)
        .create_series(request(rule, &[]), today())
        .await
        .unwrap();

    assert!(outcome.series.instance_ids.is_empty());
    let parent = store.get(&outcome.series.parent_id).await.unwrap().unwrap();
    assert!(matches!(parent.role, ActivityRole::Parent { .. }));
}

#[tokio::test]
async fn test_repeat_submissions_create_independent_parents() {
    let store = MemoryStore::new();
    let svc = service(&store);
    let rule = weekly_rule(&[1], "2024-01-01", Some("2024-01-08"));

    let a = svc.create_series(request(rule.clone(), &[]), today()).await.unwrap();
    let b = svc.create_series(request(rule, &[]), today()).await.unwrap();

    assert_ne!(a.series.parent_id, b.series.parent_id);
    assert_eq!(store.list_by_parent(&a.series.parent_id).await.unwrap().len(), 2);
    assert_eq!(store.list_by_parent(&b.series.parent_id).await.unwrap().len(), 2);
}
