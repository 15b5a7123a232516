//! End-to-end scenarios S1 and S2 from the shared-context spec, plus the
//! testable properties that exercise version reconstruction, subscribe
//! idempotence, access monotonicity, fork independence, and merge
//! convergence.

use std::sync::Arc;

use accord_context::ContextEngine;
use accord_core::{AccessLevel, ContextConfig, SharedClock, SystemClock, Value};
use accord_storage::{ContextRepository, ContextVersionRepository, NoopSink};
use uuid::Uuid;

fn engine() -> ContextEngine {
    let clock: SharedClock = Arc::new(SystemClock);
    ContextEngine::new(
        ContextRepository::new(),
        ContextVersionRepository::new(),
        ContextConfig::default(),
        clock,
        Arc::new(NoopSink),
        Arc::new(NoopSink),
        Arc::new(NoopSink),
    )
}

fn tree(pairs: &[(&str, Value)]) -> Value {
    let mut map = std::collections::BTreeMap::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v.clone());
    }
    Value::Tree(map)
}

/// S1 — Context lifecycle.
#[tokio::test]
async fn s1_context_lifecycle() {
    let engine = engine();
    let a1 = Uuid::new_v4();

    let created = engine
        .create_context("ctx", "general", a1, tree(&[("x", Value::number(1.0))]), Vec::new())
        .await
        .unwrap();
    let v0 = created.current_version_id;

    engine
        .update_context(created.id, a1, vec![("/x".to_string(), Value::number(2.0))], Default::default())
        .await
        .unwrap();

    let after_y = engine
        .update_context(
            created.id,
            a1,
            vec![("/y".to_string(), Value::string("hello"))],
            Default::default(),
        )
        .await
        .unwrap();
    let v2 = after_y.current_version_id;

    assert_eq!(after_y.content.get_path("/x"), Some(&Value::number(2.0)));
    assert_eq!(after_y.content.get_path("/y"), Some(&Value::string("hello")));

    let diff = engine.compare_versions(created.id, v0, v2, a1).unwrap();
    let modified = diff
        .modified
        .iter()
        .find(|(path, _)| path == "/x")
        .expect("x should be modified");
    assert_eq!(modified.1.from, Value::number(1.0));
    assert_eq!(modified.1.to, Value::number(2.0));
    let added = diff.added.iter().find(|(path, _)| path == "/y").expect("y should be added");
    assert_eq!(added.1, Value::string("hello"));
}

/// S2 — Access denied.
#[tokio::test]
async fn s2_access_denied() {
    let engine = engine();
    let a1 = Uuid::new_v4();
    let a2 = Uuid::new_v4();

    let created = engine
        .create_context("ctx", "general", a1, Value::tree(), Vec::new())
        .await
        .unwrap();

    let err = engine.get_context(created.id, a2).unwrap_err();
    assert!(err.is_permission_denied());

    engine
        .grant_access(created.id, a1, a2, AccessLevel::ReadOnly, None)
        .unwrap();
    engine.get_context(created.id, a2).expect("a2 can now read");

    let err = engine
        .update_context(created.id, a2, vec![("/z".to_string(), Value::number(3.0))], Default::default())
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());
}

/// Property 1 — version reconstruction round-trip; comparing a version
/// with itself yields no differences.
#[tokio::test]
async fn property_version_reconstruction_round_trip() {
    let engine = engine();
    let a1 = Uuid::new_v4();
    let created = engine
        .create_context("ctx", "general", a1, tree(&[("a", Value::number(1.0))]), Vec::new())
        .await
        .unwrap();
    let updated = engine
        .update_context(created.id, a1, vec![("/b".to_string(), Value::number(2.0))], Default::default())
        .await
        .unwrap();

    let reconstructed = engine
        .get_context_version(created.id, updated.current_version_id, a1)
        .unwrap();
    assert_eq!(reconstructed, updated.content);

    let diff = engine
        .compare_versions(created.id, updated.current_version_id, updated.current_version_id, a1)
        .unwrap();
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
    assert!(diff.modified.is_empty());
}

/// Property 2 — idempotent subscribe.
#[tokio::test]
async fn property_idempotent_subscribe() {
    let engine = engine();
    let a1 = Uuid::new_v4();
    let a2 = Uuid::new_v4();
    let created = engine
        .create_context("ctx", "general", a1, Value::tree(), Vec::new())
        .await
        .unwrap();
    engine
        .grant_access(created.id, a1, a2, AccessLevel::ReadOnly, None)
        .unwrap();

    engine.subscribe(created.id, a2).unwrap();
    let after = engine.subscribe(created.id, a2).unwrap();
    assert_eq!(after.subscribers.iter().filter(|s| **s == a2).count(), 1);
}

/// Property 3 — access monotonicity: without a matching grant, no
/// operation sequence reveals data to an unauthorized agent.
#[tokio::test]
async fn property_access_monotonicity() {
    let engine = engine();
    let a1 = Uuid::new_v4();
    let a2 = Uuid::new_v4();
    let created = engine
        .create_context("ctx", "general", a1, tree(&[("secret", Value::number(1.0))]), Vec::new())
        .await
        .unwrap();

    assert!(engine.get_context(created.id, a2).is_err());
    assert!(engine.subscribe(created.id, a2).is_err());
    assert!(engine
        .get_context_version(created.id, created.current_version_id, a2)
        .is_err());
    let visible = engine.search_contexts("ctx", None, Some(a2));
    assert!(visible.is_empty());
}

/// Property 4 — fork independence.
#[tokio::test]
async fn property_fork_independence() {
    let engine = engine();
    let a1 = Uuid::new_v4();
    let created = engine
        .create_context("ctx", "general", a1, tree(&[("x", Value::number(1.0))]), Vec::new())
        .await
        .unwrap();

    let forked = engine.fork_context(created.id, a1, None).await.unwrap();
    assert_eq!(forked.content.get_path("/x"), Some(&Value::number(1.0)));

    engine
        .update_context(created.id, a1, vec![("/x".to_string(), Value::number(99.0))], Default::default())
        .await
        .unwrap();
    let forked_again = engine.get_context(forked.id, a1).unwrap();
    assert_eq!(forked_again.content.get_path("/x"), Some(&Value::number(1.0)));

    engine
        .update_context(forked.id, a1, vec![("/x".to_string(), Value::number(-1.0))], Default::default())
        .await
        .unwrap();
    let original_again = engine.get_context(created.id, a1).unwrap();
    assert_eq!(original_again.content.get_path("/x"), Some(&Value::number(99.0)));
}

/// Property 5 — merge convergence: merging the same source twice with
/// "source" resolution is idempotent.
#[tokio::test]
async fn property_merge_convergence() {
    let engine = engine();
    let a1 = Uuid::new_v4();
    let target = engine
        .create_context("target", "general", a1, tree(&[("x", Value::number(1.0))]), Vec::new())
        .await
        .unwrap();
    let source = engine
        .create_context("source", "general", a1, tree(&[("x", Value::number(2.0))]), Vec::new())
        .await
        .unwrap();

    let once = engine
        .merge_contexts(target.id, source.id, a1, "source")
        .await
        .unwrap();
    let v_once = once.current_version_id;

    let twice = engine
        .merge_contexts(target.id, source.id, a1, "source")
        .await
        .unwrap();
    let v_twice = twice.current_version_id;

    let diff = engine.compare_versions(target.id, v_once, v_twice, a1).unwrap();
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
    assert!(diff.modified.is_empty());
}
