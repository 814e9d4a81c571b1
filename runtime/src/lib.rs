//! # GraphQL Todo Runtime
//!
//! Runtime for the GraphQL Todo client.
//!
//! The [`Store`] owns client state (filter, search keyword, selection, fetched
//! query data), runs the reducer for every action and executes the effects
//! the reducer describes. It is the only writer of that state.
//!
//! ## Core Components
//!
//! - **Store**: manages state and executes effects
//! - **Effect execution**: spawned tasks whose resulting actions are fed back to the reducer
//! - **Subscriptions**: an action broadcast for effect results and a state
//!   version channel that ticks after every reduction
//!
//! ## Example
//!
//! ```ignore
//! use graphql_todo_runtime::Store;
//!
//! let store = Store::new(TodoListState::default(), TodoListReducer::new(), env);
//!
//! // Send an action
//! store.send(TodoListAction::LoadTodos).await?;
//!
//! // Read state
//! let visible = store.state(|s| s.visible().filtered_count).await;
//! ```

use graphql_todo_core::{effect::Effect, reducer::Reducer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

/// Metric registration and the Prometheus recorder
pub mod metrics;

/// Store failures
pub mod error {
    use thiserror::Error;

    /// Why a store call did not complete
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// `send()` was called after `shutdown()` began
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Effects were still running when the shutdown timeout elapsed;
        /// carries how many
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// No matching result action arrived in time (`send_and_wait_for`),
        /// or an [`EffectHandle`](crate::EffectHandle) wait expired
        #[error("Timeout waiting for action")]
        Timeout,

        /// Every sender of the action broadcast is gone
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Store tuning knobs
///
/// # Example
///
/// ```
/// use graphql_todo_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of effect-produced actions buffered for slow observers
    pub broadcast_capacity: usize,
    /// Default timeout used by [`Store::shutdown_default`]
    pub shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Config with explicit values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            shutdown_timeout,
        }
    }

    /// Override the broadcast buffer size
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Override the timeout used by `shutdown_default`
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Completion tracker for the effects of one action
///
/// Returned by [`Store::send()`] to allow waiting for the effects of one
/// action to finish. Actions those effects feed back into the store get
/// their own handles; waiting here does not follow them.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(TodoListAction::LoadTodos).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // the GetTodos request has settled and its result action was reduced
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// Handle with nothing to wait for
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Resolve once every tracked effect has finished
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracker is gone, so nothing can still be running
                break;
            }
        }
    }

    /// [`EffectHandle::wait`] bounded by `timeout`
    ///
    /// # Errors
    ///
    /// [`StoreError::Timeout`] when effects are still running at the deadline.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Counter shared between an [`EffectHandle`] and the tasks it tracks
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Releases both effect counters when an effect task ends, panics included
struct DecrementGuard {
    tracking: EffectTracking,
    pending: Arc<AtomicUsize>,
}

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        self.tracking.decrement();
    }
}

/// The store and its effect executor
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicUsize, DecrementGuard, Duration, Effect, EffectHandle,
        EffectTracking, Ordering, Reducer, RwLock, StoreConfig, StoreError,
    };
    use std::future::Future;
    use std::pin::Pin;
    use tokio::sync::{broadcast, watch};

    /// Single owner of client state
    ///
    /// Actions go in through [`Store::send`]. The reducer runs under the state
    /// write lock, one action at a time, and the effects it returns run as
    /// tokio tasks. An effect's result action is sent back into the store and,
    /// once reduced, broadcast to observers.
    ///
    /// `S`, `A`, `E` and `R` are the state, action, environment and reducer
    /// types.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Actions produced by effects (operation results), for observers
        action_broadcast: broadcast::Sender<A>,
        /// Incremented after every reduction; subscribers re-read state on change
        state_version: Arc<watch::Sender<u64>>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Store with [`StoreConfig::default`]
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Store with explicit configuration
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));
            let (state_version, _) = watch::channel(0);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
                state_version: Arc::new(state_version),
            }
        }

        /// Active configuration
        #[must_use]
        pub const fn config(&self) -> &StoreConfig {
            &self.config
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::SeqCst)
        }

        /// Reduce `action`, bump the state version and start its effects
        ///
        /// Returns as soon as the effects are spawned. The [`EffectHandle`]
        /// resolves when they finish, which includes reducing the result
        /// actions they feed back.
        ///
        /// # Errors
        ///
        /// [`StoreError::ShutdownInProgress`] once shutdown has begun.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Store shutting down, action rejected");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.actions.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!(effects = effects.len(), "Action reduced");
                effects
            };

            self.state_version.send_modify(|version| *version += 1);

            for effect in effects {
                self.spawn_effect(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Send `action` and return the first effect result matching `predicate`
        ///
        /// Subscribes to the action broadcast before sending, so a fast effect
        /// cannot slip past. The returned action has already been reduced, so
        /// [`Store::state`] reflects it as soon as this returns.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action before the timeout
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged, {} actions skipped", skipped);
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to actions produced by effects
        ///
        /// Only effect results are broadcast, not actions passed to `send`
        /// directly. An action is broadcast after the store has reduced it.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Subscribe to state changes
        ///
        /// The receiver yields a version number that increases after every
        /// reduction. Read the new values with [`Store::state`].
        #[must_use]
        pub fn subscribe_state(&self) -> watch::Receiver<u64> {
            self.state_version.subscribe()
        }

        /// Project a value out of the current state
        ///
        /// ```ignore
        /// let filter = store.state(|s| s.ui.filter).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Stop accepting actions and wait for running effects to drain
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when the timeout expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Store shutdown requested");
            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("Store drained, shutdown complete");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Store shutdown timed out");
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Shut down using the configured timeout
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.shutdown_timeout).await
        }

        /// Spawn one top-level effect as a tracked task
        fn spawn_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            if effect.is_none() {
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                return;
            }

            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let guard = DecrementGuard {
                tracking,
                pending: Arc::clone(&self.pending_effects),
            };

            let store = self.clone();
            tokio::spawn(async move {
                let _guard = guard;
                store.run_effect(effect).await;
            });
        }

        /// Execute an effect to completion
        ///
        /// A `Future` is awaited and a produced action is reduced through
        /// `send` before it is broadcast. A panicking effect task is isolated
        /// by tokio; the guard in [`Store::spawn_effect`] still releases its
        /// counters.
        fn run_effect(self, effect: Effect<A>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
            Box::pin(async move {
                match effect {
                    Effect::None => {
                        metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                    },
                    Effect::Future(fut) => {
                        metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect produced a result action");
                            match self.send(action.clone()).await {
                                Ok(_) => {
                                    let _ = self.action_broadcast.send(action);
                                },
                                Err(error) => tracing::warn!(error = %error, "Dropped effect result"),
                            }
                        }
                    },
                }
            })
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
                state_version: Arc::clone(&self.state_version),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)] // Test code can use unwrap/panic
mod tests {
    use super::*;
    use graphql_todo_core::{smallvec, SmallVec};

    #[derive(Debug, Clone, Default)]
    struct CellState {
        keyword: String,
        results: Vec<String>,
        fetches: u32,
    }

    #[derive(Debug, Clone)]
    enum CellAction {
        Search(String),
        Fetch,
        FetchBoth,
        Fetched(String),
        Panic,
    }

    #[derive(Debug, Clone)]
    struct CellEnv;

    #[derive(Debug, Clone)]
    struct CellReducer;

    impl Reducer for CellReducer {
        type State = CellState;
        type Action = CellAction;
        type Environment = CellEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                CellAction::Search(keyword) => {
                    state.keyword = keyword;
                    SmallVec::new()
                },
                CellAction::Fetch => {
                    state.fetches += 1;
                    smallvec![Effect::future(async { Some(CellAction::Fetched("a".into())) })]
                },
                CellAction::FetchBoth => smallvec![
                    Effect::future(async { Some(CellAction::Fetched("a".into())) }),
                    Effect::future(async { Some(CellAction::Fetched("b".into())) }),
                ],
                CellAction::Fetched(result) => {
                    state.results.push(result);
                    SmallVec::new()
                },
                CellAction::Panic => smallvec![Effect::future(async {
                    panic!("Intentional panic in effect for testing");
                })],
            }
        }
    }

    fn store() -> Store<CellState, CellAction, CellEnv, CellReducer> {
        Store::new(CellState::default(), CellReducer, CellEnv)
    }

    #[tokio::test]
    async fn send_updates_state() {
        let store = store();
        let _ = store.send(CellAction::Search("milk".into())).await;
        assert_eq!(store.state(|s| s.keyword.clone()).await, "milk");
    }

    #[tokio::test]
    async fn future_effect_feeds_action_back() {
        let store = store();
        let mut handle = store.send(CellAction::Fetch).await.unwrap();
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

        let results = store.state(|s| s.results.clone()).await;
        assert_eq!(results, vec!["a".to_string()]);
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn every_effect_of_an_action_completes() {
        let store = store();
        let mut handle = store.send(CellAction::FetchBoth).await.unwrap();
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

        let mut results = store.state(|s| s.results.clone()).await;
        results.sort();
        assert_eq!(results, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn state_subscribers_see_every_reduction() {
        let store = store();
        let mut rx = store.subscribe_state();
        assert_eq!(*rx.borrow_and_update(), 0);

        let _ = store.send(CellAction::Search("a".into())).await;
        let _ = store.send(CellAction::Search("ab".into())).await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 2);
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_result_action() {
        let store = store();
        let result = store
            .send_and_wait_for(
                CellAction::Fetch,
                |a| matches!(a, CellAction::Fetched(_)),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert!(matches!(result, CellAction::Fetched(ref r) if r == "a"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn waited_result_is_already_reduced() {
        for _ in 0..200 {
            let store = store();
            store
                .send_and_wait_for(
                    CellAction::Fetch,
                    |a| matches!(a, CellAction::Fetched(_)),
                    Duration::from_secs(1),
                )
                .await
                .unwrap();

            let results = store.state(|s| s.results.clone()).await;
            assert_eq!(results, vec!["a".to_string()]);
        }
    }

    #[tokio::test]
    async fn broadcast_follows_reduction() {
        let store = store();
        let mut rx = store.subscribe_actions();
        let _ = store.send(CellAction::Fetch).await.unwrap();

        let action = rx.recv().await.unwrap();
        assert!(matches!(action, CellAction::Fetched(_)));
        assert_eq!(store.state(|s| s.results.len()).await, 1);
    }

    #[tokio::test]
    async fn panicking_effect_releases_counters() {
        let store = store();
        let mut handle = store.send(CellAction::Panic).await.unwrap();
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = store();
        store.shutdown(Duration::from_secs(1)).await.unwrap();

        let result = store.send(CellAction::Fetch).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
    }

    #[tokio::test]
    async fn completed_handle_does_not_block() {
        let mut handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
        handle.wait_with_timeout(Duration::from_millis(10)).await.unwrap();
    }
}
