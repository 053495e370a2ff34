#![cfg(test)]

use std::sync::Arc;

use crate::patch::error::PatchError;
use crate::patch::{HookTransform, PatchKind, PatchManager, PatchOrdering};

struct NamedTransform(&'static str);

impl HookTransform for NamedTransform {
    fn describe(&self) -> &str {
        self.0
    }
}

fn transform(name: &'static str) -> Arc<dyn HookTransform> {
    Arc::new(NamedTransform(name))
}

#[tokio::test]
async fn test_apply_records_are_attributed() {
    let manager = PatchManager::new();
    let mut session = manager.begin_session("rebalance", 0).await.unwrap();

    session
        .apply(
            "battle.calc_damage",
            PatchKind::After,
            PatchOrdering::LoadOrder,
            transform("soften damage spikes"),
        )
        .await
        .unwrap();

    assert_eq!(
        manager.modification_chain("battle.calc_damage").await,
        vec!["rebalance"]
    );
    assert_eq!(manager.record_count("rebalance").await, 1);
    assert_eq!(manager.targets().await, vec!["battle.calc_damage"]);
}

#[tokio::test]
async fn test_double_begin_session_is_rejected() {
    let manager = PatchManager::new();
    let _session = manager.begin_session("one", 0).await.unwrap();

    assert!(matches!(
        manager.begin_session("one", 0).await,
        Err(PatchError::SessionAlreadyActive(id)) if id == "one"
    ));
}

#[tokio::test]
async fn test_apply_after_end_session_is_rejected() {
    let manager = PatchManager::new();
    let mut session = manager.begin_session("gone", 0).await.unwrap();
    manager.end_session("gone").await;

    let result = session
        .apply(
            "battle.calc_damage",
            PatchKind::Before,
            PatchOrdering::LoadOrder,
            transform("too late"),
        )
        .await;

    assert!(matches!(
        result,
        Err(PatchError::NoActiveSession(id)) if id == "gone"
    ));
}

#[tokio::test]
async fn test_self_referencing_hint_is_a_conflict() {
    let manager = PatchManager::new();
    let mut session = manager.begin_session("vain", 0).await.unwrap();

    let result = session
        .apply(
            "menu.draw",
            PatchKind::Before,
            PatchOrdering::After("vain".to_string()),
            transform("loop"),
        )
        .await;

    assert!(matches!(result, Err(PatchError::OrderingConflict { .. })));
    assert!(manager.modification_chain("menu.draw").await.is_empty());
}

#[tokio::test]
async fn test_applied_at_is_monotonic() {
    let manager = PatchManager::new();
    let mut session = manager.begin_session("p", 0).await.unwrap();

    let first = session
        .apply(
            "a",
            PatchKind::After,
            PatchOrdering::LoadOrder,
            transform("one"),
        )
        .await
        .unwrap();
    let second = session
        .apply(
            "b",
            PatchKind::After,
            PatchOrdering::LoadOrder,
            transform("two"),
        )
        .await
        .unwrap();

    assert!(second > first);
}

#[tokio::test]
async fn test_end_all_sessions_drops_everything() {
    let manager = PatchManager::new();
    let mut a = manager.begin_session("a", 0).await.unwrap();
    let mut b = manager.begin_session("b", 1).await.unwrap();

    a.apply("t", PatchKind::After, PatchOrdering::LoadOrder, transform("a"))
        .await
        .unwrap();
    b.apply("t", PatchKind::After, PatchOrdering::LoadOrder, transform("b"))
        .await
        .unwrap();

    manager.end_all_sessions().await;

    assert!(manager.active_sessions().await.is_empty());
    assert!(manager.targets().await.is_empty());
}
