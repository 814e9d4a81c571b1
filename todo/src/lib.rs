//! Todo client built on typed GraphQL operations.
//!
//! The client reads a todo list through a query cache, mutates it through
//! five GraphQL operations and derives what the user sees from three cells
//! (filter, search keyword, selection). It demonstrates:
//!
//! - Typed operations and a cache keyed by query identity
//! - Rewriting the cached list after toggle and delete mutations
//! - A pure filter/search function and derived header stats
//! - A [`Store`](graphql_todo_runtime::Store) owning the client state
//! - An in-process mock server standing in for the network
//!
//! # Quick Start
//!
//! ```no_run
//! use graphql_todo::{MockTodoServer, TodoApi, TodoEnvironment, TodoListAction, TodoListReducer, TodoListState};
//! use graphql_todo_core::{environment::SystemClock, InMemoryCache, QueryClient};
//! use graphql_todo_runtime::Store;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = Arc::new(MockTodoServer::seeded(SystemClock));
//! let api = TodoApi::new(QueryClient::new(server, Arc::new(InMemoryCache::new())));
//! let env = TodoEnvironment::new(api, Arc::new(SystemClock));
//! let store = Store::new(TodoListState::new(), TodoListReducer::new(), env);
//!
//! // Load the list and wait for the result
//! let mut handle = store.send(TodoListAction::LoadTodos).await?;
//! handle.wait().await;
//!
//! let visible = store.state(TodoListState::visible).await;
//! println!("{} of {} todos", visible.filtered_count, visible.total_count);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache_patch;
pub mod filtering;
pub mod mock;
pub mod operations;
pub mod reducer;
pub mod selection;
pub mod selectors;
pub mod types;

// Re-export commonly used types
pub use api::{CreatedTodo, TodoApi};
pub use cache_patch::{patch_deleted, patch_toggled, toggled_list, without_todo, PatchOutcome};
pub use filtering::{filter_todos, FilteredTodos};
pub use mock::{sample_todos, MockTodoServer};
pub use reducer::{TodoEnvironment, TodoListAction, TodoListReducer, TodoListState, UiState};
pub use selection::toggle_selection;
pub use selectors::FilterStats;
pub use types::{validate_title, Todo, TodoFilter, TodoId, UnknownFilter};
