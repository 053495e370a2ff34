#![cfg(test)]

use std::sync::Arc;

use crate::patch::error::PatchError;
use crate::patch::{HookTransform, PatchKind, PatchManager, PatchOrdering, PatchSession};

struct NamedTransform(&'static str);

impl HookTransform for NamedTransform {
    fn describe(&self) -> &str {
        self.0
    }
}

fn transform(name: &'static str) -> Arc<dyn HookTransform> {
    Arc::new(NamedTransform(name))
}

const TARGET: &str = "battle.turn_order";

async fn apply(session: &mut PatchSession, ordering: PatchOrdering) -> Result<(), PatchError> {
    session
        .apply(TARGET, PatchKind::After, ordering, transform("t"))
        .await
        .map(|_| ())
}

#[tokio::test]
async fn test_stacking_follows_load_order() {
    let manager = PatchManager::new();
    let mut a = manager.begin_session("a", 0).await.unwrap();
    let mut b = manager.begin_session("b", 1).await.unwrap();

    // Apply in reverse of load order; the chain must still follow it.
    apply(&mut b, PatchOrdering::LoadOrder).await.unwrap();
    apply(&mut a, PatchOrdering::LoadOrder).await.unwrap();

    assert_eq!(manager.modification_chain(TARGET).await, vec!["a", "b"]);
}

#[tokio::test]
async fn test_before_hint_overrides_load_order() {
    let manager = PatchManager::new();
    let mut a = manager.begin_session("a", 0).await.unwrap();
    let mut b = manager.begin_session("b", 1).await.unwrap();

    apply(&mut a, PatchOrdering::LoadOrder).await.unwrap();
    apply(&mut b, PatchOrdering::Before("a".to_string()))
        .await
        .unwrap();

    assert_eq!(manager.modification_chain(TARGET).await, vec!["b", "a"]);
}

#[tokio::test]
async fn test_after_hint_is_inert_until_target_modifies() {
    let manager = PatchManager::new();
    let mut early = manager.begin_session("early", 0).await.unwrap();
    let mut late = manager.begin_session("late", 1).await.unwrap();

    // "early" wants to run after "late", which has not touched the target
    // yet; the hint stays dormant.
    apply(&mut early, PatchOrdering::After("late".to_string()))
        .await
        .unwrap();
    assert_eq!(manager.modification_chain(TARGET).await, vec!["early"]);

    // Once "late" modifies the target, the dormant hint takes effect.
    apply(&mut late, PatchOrdering::LoadOrder).await.unwrap();
    assert_eq!(manager.modification_chain(TARGET).await, vec!["late", "early"]);
}

#[tokio::test]
async fn test_contradictory_hints_reject_incoming_record_only() {
    let manager = PatchManager::new();
    let mut a = manager.begin_session("a", 0).await.unwrap();
    let mut b = manager.begin_session("b", 1).await.unwrap();

    apply(&mut a, PatchOrdering::Before("b".to_string()))
        .await
        .unwrap();

    // b insisting on preceding a closes a hint cycle; the incoming record
    // is rejected and the existing chain is untouched.
    let result = apply(&mut b, PatchOrdering::Before("a".to_string())).await;
    assert!(matches!(result, Err(PatchError::OrderingConflict { .. })));
    assert_eq!(manager.modification_chain(TARGET).await, vec!["a"]);

    // The rejection is kept as a warning diagnostic for the load report.
    let conflicts = manager.take_conflicts().await;
    assert_eq!(conflicts.len(), 1);
    assert!(manager.take_conflicts().await.is_empty());
}

#[tokio::test]
async fn test_multiple_records_of_one_plugin_stay_contiguous() {
    let manager = PatchManager::new();
    let mut a = manager.begin_session("a", 0).await.unwrap();
    let mut b = manager.begin_session("b", 1).await.unwrap();

    apply(&mut a, PatchOrdering::LoadOrder).await.unwrap();
    apply(&mut b, PatchOrdering::LoadOrder).await.unwrap();
    apply(&mut a, PatchOrdering::LoadOrder).await.unwrap();

    // Chain is plugin-grouped: a's two records, then b's one.
    assert_eq!(manager.modification_chain(TARGET).await, vec!["a", "b"]);
    let transforms = manager.chain_transforms(TARGET).await;
    assert_eq!(transforms.len(), 3);
    assert_eq!(transforms[0].0, "a");
    assert_eq!(transforms[1].0, "a");
    assert_eq!(transforms[2].0, "b");
}

#[tokio::test]
async fn test_revocation_removes_exactly_one_plugins_records() {
    let manager = PatchManager::new();
    let mut a = manager.begin_session("a", 0).await.unwrap();
    let mut b = manager.begin_session("b", 1).await.unwrap();
    let mut c = manager.begin_session("c", 2).await.unwrap();

    apply(&mut a, PatchOrdering::LoadOrder).await.unwrap();
    apply(&mut b, PatchOrdering::LoadOrder).await.unwrap();
    apply(&mut c, PatchOrdering::Before("a".to_string()))
        .await
        .unwrap();
    b.apply(
        "menu.draw",
        PatchKind::Replace,
        PatchOrdering::LoadOrder,
        transform("menu skin"),
    )
    .await
    .unwrap();

    // c must precede a; b is unconstrained and keeps the earliest load
    // index among the available candidates.
    assert_eq!(manager.modification_chain(TARGET).await, vec!["b", "c", "a"]);

    let revoked = manager.end_session("b").await;
    assert_eq!(revoked, 2);

    // Other plugins' records remain, still correctly ordered.
    assert_eq!(manager.modification_chain(TARGET).await, vec!["c", "a"]);
    assert!(manager.modification_chain("menu.draw").await.is_empty());
    assert_eq!(manager.record_count("a").await, 1);
    assert_eq!(manager.record_count("c").await, 1);
}

#[tokio::test]
async fn test_hints_fall_back_to_load_order_among_unconstrained() {
    let manager = PatchManager::new();
    let mut a = manager.begin_session("a", 0).await.unwrap();
    let mut b = manager.begin_session("b", 1).await.unwrap();
    let mut c = manager.begin_session("c", 2).await.unwrap();

    apply(&mut c, PatchOrdering::LoadOrder).await.unwrap();
    apply(&mut b, PatchOrdering::LoadOrder).await.unwrap();
    apply(&mut a, PatchOrdering::After("c".to_string()))
        .await
        .unwrap();

    // b and c are unconstrained (load order), a must follow c.
    assert_eq!(manager.modification_chain(TARGET).await, vec!["b", "c", "a"]);
}
