//! Client state and the reducer that drives it.
//!
//! The state splits into two parts. [`UiState`] holds the cells the user
//! sets directly: filter, keyword and selection, plus the stats derived from
//! them. The rest is the fetched list and the last error. Each part has its own
//! reducer; [`TodoListReducer`] combines them. Network work is returned as
//! effects that call [`TodoApi`] and feed a result action back.

use crate::api::TodoApi;
use crate::filtering::{filter_todos, FilteredTodos};
use crate::selection::toggle_selection;
use crate::selectors::FilterStats;
use crate::types::{validate_title, Todo, TodoFilter, TodoId};
use graphql_todo_core::composition::{combine_reducers, scope_reducer, CombinedReducer};
use graphql_todo_core::{
    effect::Effect, environment::Clock, reducer::Reducer, smallvec, ClientError, DateTime, QueryState, SmallVec, Utc,
};
use std::sync::Arc;

/// Cells the user sets directly, plus their derived stats
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiState {
    /// Active completion filter
    pub filter: TodoFilter,
    /// Search keyword as typed
    pub search_keyword: String,
    /// Selected row, if any
    pub selected_id: Option<TodoId>,
    /// Derived from `filter` and `search_keyword`
    pub filter_stats: FilterStats,
}

/// Complete client state owned by the store
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoListState {
    /// Filter, search and selection
    pub ui: UiState,
    /// The list-all query
    pub todos: QueryState<Vec<Todo>>,
    /// Message of the most recent failure, until dismissed
    pub last_error: Option<String>,
    /// When the list last came back from the server
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl TodoListState {
    /// Creates the initial state: all todos, no search, nothing loaded
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded todos, if any
    #[must_use]
    pub fn todo_list(&self) -> Option<&[Todo]> {
        self.todos.data().map(Vec::as_slice)
    }

    /// The list as currently filtered and searched
    ///
    /// Empty while the list is not loaded.
    #[must_use]
    pub fn visible(&self) -> FilteredTodos {
        filter_todos(
            self.todo_list().unwrap_or_default(),
            self.ui.filter,
            &self.ui.search_keyword,
        )
    }

    /// The selected todo, if it is in the loaded list
    #[must_use]
    pub fn selected(&self) -> Option<&Todo> {
        let id = self.ui.selected_id.as_ref()?;
        self.todo_list()?.iter().find(|t| &t.id == id)
    }
}

/// Actions: user intents followed by operation results
#[derive(Clone, Debug, PartialEq)]
pub enum TodoListAction {
    // ========== Intents ==========
    /// Change the completion filter
    SetFilter(TodoFilter),
    /// Change the search keyword
    SetSearchKeyword(String),
    /// Click a row
    SelectTodo(TodoId),
    /// Load the list (cache first)
    LoadTodos,
    /// Reload the list from the server
    RefetchTodos,
    /// Create a todo
    AddTodo {
        /// Title as entered
        title: String,
    },
    /// Flip a todo's completion state
    ToggleTodo {
        /// Target todo
        id: TodoId,
    },
    /// Delete a todo
    DeleteTodo {
        /// Target todo
        id: TodoId,
    },
    /// Clear `last_error`
    DismissError,

    // ========== Results ==========
    /// The list arrived
    TodosLoaded(Vec<Todo>),
    /// The list request failed
    TodosFailed(ClientError),
    /// A todo was created
    TodoAdded {
        /// The created record
        todo: Todo,
        /// The list from the follow-up refetch, or why it failed
        list: Result<Vec<Todo>, ClientError>,
    },
    /// A todo was toggled
    TodoToggled {
        /// The server's copy
        todo: Todo,
        /// Cached list after the patch
        list: Option<Vec<Todo>>,
    },
    /// A todo was deleted
    TodoDeleted {
        /// Id of the removed record
        id: TodoId,
        /// Cached list after the patch
        list: Option<Vec<Todo>>,
    },
    /// A mutation failed; nothing was patched
    MutationFailed {
        /// Operation name
        operation: &'static str,
        /// Why it failed
        error: ClientError,
    },
}

/// Environment dependencies for the list reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Typed todo operations
    pub api: TodoApi,
    /// Clock for sync timestamps
    pub clock: Arc<dyn Clock>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(api: TodoApi, clock: Arc<dyn Clock>) -> Self {
        Self { api, clock }
    }
}

/// Reducer for the user-set cells
#[derive(Clone, Copy, Debug, Default)]
pub struct UiReducer;

impl Reducer for UiReducer {
    type State = UiState;
    type Action = TodoListAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TodoListAction::SetFilter(filter) => {
                state.filter = filter;
                state.filter_stats = FilterStats::derive(state.filter, &state.search_keyword);
            },
            TodoListAction::SetSearchKeyword(keyword) => {
                state.search_keyword = keyword;
                state.filter_stats = FilterStats::derive(state.filter, &state.search_keyword);
            },
            TodoListAction::SelectTodo(id) => {
                state.selected_id = toggle_selection(state.selected_id.as_ref(), &id);
            },
            TodoListAction::TodoDeleted { id, .. } => {
                if state.selected_id.as_ref() == Some(&id) {
                    state.selected_id = None;
                }
            },
            _ => {},
        }
        SmallVec::new()
    }
}

/// Reducer for the fetched list and its mutations
#[derive(Clone, Copy, Debug, Default)]
pub struct DataReducer;

impl DataReducer {
    fn load(api: TodoApi, refetch: bool) -> Effect<TodoListAction> {
        Effect::future(async move {
            let result = if refetch {
                api.refetch_todos().await
            } else {
                api.todos().await
            };
            Some(match result {
                Ok(todos) => TodoListAction::TodosLoaded(todos),
                Err(error) => TodoListAction::TodosFailed(error),
            })
        })
    }

    /// Show the patched list, or reload when nothing was cached
    fn apply_list(
        state: &mut TodoListState,
        list: Option<Vec<Todo>>,
        env: &TodoEnvironment,
    ) -> SmallVec<[Effect<TodoListAction>; 4]> {
        state.last_error = None;
        match list {
            Some(todos) => {
                state.todos = QueryState::Ready(todos);
                state.last_synced_at = Some(env.clock.now());
                SmallVec::new()
            },
            None => smallvec![Effect::future(async { Some(TodoListAction::LoadTodos) })],
        }
    }
}

impl Reducer for DataReducer {
    type State = TodoListState;
    type Action = TodoListAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TodoListAction::LoadTodos => {
                if state.todos.data().is_none() {
                    state.todos = QueryState::Loading;
                }
                smallvec![Self::load(env.api.clone(), false)]
            },

            TodoListAction::RefetchTodos => smallvec![Self::load(env.api.clone(), true)],

            TodoListAction::AddTodo { title } => {
                if let Err(error) = validate_title(&title) {
                    state.last_error = Some(error.to_string());
                    return SmallVec::new();
                }
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.add_todo(&title).await {
                        Ok(created) => TodoListAction::TodoAdded {
                            todo: created.todo,
                            list: created.refetch,
                        },
                        Err(error) => TodoListAction::MutationFailed {
                            operation: "AddTodo",
                            error,
                        },
                    })
                })]
            },

            TodoListAction::ToggleTodo { id } => {
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.toggle_todo(&id).await {
                        Ok(todo) => TodoListAction::TodoToggled {
                            todo,
                            list: api.cached_todos(),
                        },
                        Err(error) => TodoListAction::MutationFailed {
                            operation: "ToggleTodo",
                            error,
                        },
                    })
                })]
            },

            TodoListAction::DeleteTodo { id } => {
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.delete_todo(&id).await {
                        Ok(id) => TodoListAction::TodoDeleted {
                            id,
                            list: api.cached_todos(),
                        },
                        Err(error) => TodoListAction::MutationFailed {
                            operation: "DeleteTodo",
                            error,
                        },
                    })
                })]
            },

            TodoListAction::DismissError => {
                state.last_error = None;
                SmallVec::new()
            },

            TodoListAction::TodosLoaded(todos) => {
                state.todos = QueryState::Ready(todos);
                state.last_error = None;
                state.last_synced_at = Some(env.clock.now());
                SmallVec::new()
            },

            TodoListAction::TodosFailed(error) => {
                state.last_error = Some(error.to_string());
                // A failed refresh keeps the list already on screen
                if state.todos.data().is_none() {
                    state.todos = QueryState::Failed(error);
                }
                SmallVec::new()
            },

            TodoListAction::TodoAdded { todo, list } => match list {
                Ok(todos) => Self::apply_list(state, Some(todos), env),
                Err(error) => {
                    // The record exists on the server but the list on screen predates it
                    tracing::warn!(id = %todo.id, error = %error, "Created todo missing from stale list");
                    state.last_error = Some(format!("AddTodo succeeded but the list refetch failed: {error}"));
                    SmallVec::new()
                },
            },

            TodoListAction::TodoToggled { list, .. } | TodoListAction::TodoDeleted { list, .. } => {
                Self::apply_list(state, list, env)
            },

            TodoListAction::MutationFailed { operation, error } => {
                tracing::warn!(operation, error = %error, "Mutation failed");
                state.last_error = Some(format!("{operation} failed: {error}"));
                SmallVec::new()
            },

            TodoListAction::SetFilter(_) | TodoListAction::SetSearchKeyword(_) | TodoListAction::SelectTodo(_) => {
                SmallVec::new()
            },
        }
    }
}

fn ui_state(state: &TodoListState) -> &UiState {
    &state.ui
}

fn set_ui_state(state: &mut TodoListState, ui: UiState) {
    state.ui = ui;
}

/// The list reducer: [`UiReducer`] scoped to `ui`, then [`DataReducer`]
#[derive(Clone)]
pub struct TodoListReducer {
    inner: CombinedReducer<TodoListState, TodoListAction, TodoEnvironment>,
}

impl TodoListReducer {
    /// Creates a new `TodoListReducer`
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: combine_reducers(vec![
                Box::new(scope_reducer(UiReducer, ui_state, set_ui_state)),
                Box::new(DataReducer),
            ]),
        }
    }
}

impl Default for TodoListReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TodoListReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoListReducer")
            .field("reducers", &self.inner.len())
            .finish()
    }
}

impl Reducer for TodoListReducer {
    type State = TodoListState;
    type Action = TodoListAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.inner.reduce(state, action, env)
    }
}
