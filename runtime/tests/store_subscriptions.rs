//! Integration tests for Store observation
//!
//! Covers the two ways a view follows the store: the action broadcast carrying
//! effect results and the state version channel that ticks after every
//! reduction.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use graphql_todo_core::{effect::Effect, environment::Clock, reducer::Reducer, smallvec, SmallVec};
use graphql_todo_core::{DateTime, Utc};
use graphql_todo_runtime::{Store, StoreConfig, StoreError};
use graphql_todo_testing::{init_test_tracing, test_clock, FixedClock};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, Default)]
struct NotesState {
    notes: Vec<(u64, DateTime<Utc>)>,
    requests: u32,
}

#[derive(Debug, Clone, PartialEq)]
enum NotesAction {
    /// Ask for a note; the effect answers with `Saved`
    Request { id: u64 },
    /// Ask for a note that never arrives
    RequestLost,
    /// Effect result
    Saved { id: u64, at: DateTime<Utc> },
    /// Local edit, no effects
    Touch,
}

#[derive(Clone)]
struct NotesEnv {
    clock: FixedClock,
}

#[derive(Clone)]
struct NotesReducer;

impl Reducer for NotesReducer {
    type State = NotesState;
    type Action = NotesAction;
    type Environment = NotesEnv;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            NotesAction::Request { id } => {
                state.requests += 1;
                let at = env.clock.now();
                smallvec![Effect::future(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Some(NotesAction::Saved { id, at })
                })]
            },
            NotesAction::RequestLost => smallvec![Effect::future(async { None })],
            NotesAction::Saved { id, at } => {
                state.notes.push((id, at));
                SmallVec::new()
            },
            NotesAction::Touch => SmallVec::new(),
        }
    }
}

fn store() -> Store<NotesState, NotesAction, NotesEnv, NotesReducer> {
    init_test_tracing();
    Store::with_config(
        NotesState::default(),
        NotesReducer,
        NotesEnv { clock: test_clock() },
        StoreConfig::default().with_broadcast_capacity(8),
    )
}

// ============================================================================
// Action broadcast
// ============================================================================

#[tokio::test]
async fn effect_results_are_broadcast() {
    let store = store();
    let mut rx = store.subscribe_actions();

    assert_ok!(store.send(NotesAction::Request { id: 1 }).await);

    let action = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out")
        .expect("channel closed");
    assert_eq!(
        action,
        NotesAction::Saved {
            id: 1,
            at: test_clock().now()
        }
    );
}

#[tokio::test]
async fn sent_actions_are_not_broadcast() {
    let store = store();
    let mut rx = store.subscribe_actions();

    assert_ok!(store.send(NotesAction::Touch).await);

    let received = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
    assert!(received.is_err(), "direct actions must not be echoed");
}

#[tokio::test]
async fn multiple_observers_see_the_same_result() {
    let store = store();
    let mut first = store.subscribe_actions();
    let mut second = store.subscribe_actions();

    assert_ok!(store.send(NotesAction::Request { id: 7 }).await);

    let a = first.recv().await.unwrap();
    let b = second.recv().await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn send_and_wait_for_matches_by_predicate() {
    let store = store();

    let result = store
        .send_and_wait_for(
            NotesAction::Request { id: 3 },
            |a| matches!(a, NotesAction::Saved { id: 3, .. }),
            Duration::from_secs(1),
        )
        .await;

    let action = assert_ok!(result);
    assert!(matches!(action, NotesAction::Saved { id: 3, .. }));
    assert_eq!(store.state(|s| s.notes.len()).await, 1);
}

#[tokio::test]
async fn send_and_wait_for_times_out_without_result() {
    let store = store();

    let result = store
        .send_and_wait_for(
            NotesAction::RequestLost,
            |a| matches!(a, NotesAction::Saved { .. }),
            Duration::from_millis(50),
        )
        .await;

    assert!(matches!(assert_err!(result), StoreError::Timeout));
}

// ============================================================================
// State versions
// ============================================================================

#[tokio::test]
async fn state_version_ticks_for_request_and_result() {
    let store = store();
    let mut versions = store.subscribe_state();

    let mut handle = assert_ok!(store.send(NotesAction::Request { id: 1 }).await);
    assert_ok!(handle.wait_with_timeout(Duration::from_secs(1)).await);

    // One tick for the request, one for the fed-back result
    assert_eq!(*versions.borrow_and_update(), 2);
    assert_eq!(store.state(|s| s.requests).await, 1);
}

#[tokio::test]
async fn state_subscriber_wakes_on_change() {
    let store = store();
    let mut versions = store.subscribe_state();

    let waiter = tokio::spawn(async move {
        versions.changed().await.unwrap();
        *versions.borrow()
    });

    assert_ok!(store.send(NotesAction::Touch).await);

    let version = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .unwrap()
        .unwrap();
    assert!(version >= 1);
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn shutdown_waits_for_running_effects() {
    let store = store();

    assert_ok!(store.send(NotesAction::Request { id: 1 }).await);
    assert_ok!(store.shutdown(Duration::from_secs(1)).await);

    assert_eq!(store.pending_effects(), 0);
    assert!(matches!(
        store.send(NotesAction::Touch).await,
        Err(StoreError::ShutdownInProgress)
    ));
}
