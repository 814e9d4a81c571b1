//! In-process Todo server for development and tests.
//!
//! [`MockTodoServer`] answers the five todo operations from an in-memory list,
//! dispatching on `operationName`. It honors each document's selection: list
//! and mutation results carry `id`, `title` and `completed`, only `GetTodo`
//! returns timestamps.

use crate::operations::{
    AddTodo, AddTodoData, DeleteTodo, DeleteTodoData, GetTodo, GetTodos, IdVariables, TitleVariables, TodoData,
    TodosData, ToggleTodo, ToggleTodoData,
};
use crate::types::{Todo, TodoId};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use graphql_todo_core::environment::Clock;
use graphql_todo_core::{GraphQlError, GraphQlRequest, GraphQlResponse, Operation, Transport, TransportError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use uuid::Uuid;

/// The four todos a fresh server starts with
#[must_use]
pub fn sample_todos() -> Vec<Todo> {
    let at = |d, h, m| Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).single();
    vec![
        Todo {
            created_at: at(15, 10, 0),
            updated_at: at(15, 10, 0),
            ..Todo::new("1", "Learn GraphQL", false)
        },
        Todo {
            created_at: at(14, 9, 30),
            updated_at: at(14, 15, 45),
            ..Todo::new("2", "Build Todo App", true)
        },
        Todo {
            created_at: at(13, 14, 20),
            updated_at: at(13, 14, 20),
            ..Todo::new("3", "Setup MSW", false)
        },
        Todo {
            created_at: at(12, 16, 10),
            updated_at: at(12, 16, 10),
            ..Todo::new("4", "Write Tests", false)
        },
    ]
}

/// Mock GraphQL endpoint backed by an in-memory todo list
pub struct MockTodoServer {
    todos: Mutex<Vec<Todo>>,
    clock: Arc<dyn Clock>,
    online: AtomicBool,
    latency: Option<Duration>,
}

impl MockTodoServer {
    /// Empty server
    #[must_use]
    pub fn new<C: Clock + 'static>(clock: C) -> Self {
        Self::with_todos(clock, Vec::new())
    }

    /// Server holding `todos`
    #[must_use]
    pub fn with_todos<C: Clock + 'static>(clock: C, todos: Vec<Todo>) -> Self {
        Self {
            todos: Mutex::new(todos),
            clock: Arc::new(clock),
            online: AtomicBool::new(true),
            latency: None,
        }
    }

    /// Server holding [`sample_todos`]
    #[must_use]
    pub fn seeded<C: Clock + 'static>(clock: C) -> Self {
        Self::with_todos(clock, sample_todos())
    }

    /// Delay every response by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulate losing or regaining the network
    ///
    /// While offline every request fails with [`TransportError::Unreachable`].
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Whether requests currently reach the server
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Snapshot of the server-side list, with timestamps
    #[must_use]
    pub fn todos(&self) -> Vec<Todo> {
        self.todos.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn handle(&self, request: &GraphQlRequest) -> GraphQlResponse {
        match request.operation_name.as_str() {
            GetTodos::NAME => respond(&TodosData {
                todos: self.todos().iter().map(list_fields).collect(),
            }),
            GetTodo::NAME => with_variables::<IdVariables>(request, |vars| {
                let todo = self.todos().into_iter().find(|t| t.id == vars.id);
                respond(&TodoData { todo })
            }),
            AddTodo::NAME => with_variables::<TitleVariables>(request, |vars| {
                let created = self.add(vars.title);
                respond(&AddTodoData {
                    add_todo: list_fields(&created),
                })
            }),
            ToggleTodo::NAME => with_variables::<IdVariables>(request, |vars| match self.toggle(&vars.id) {
                Some(toggled) => respond(&ToggleTodoData {
                    toggle_todo: list_fields(&toggled),
                }),
                None => not_found(&vars.id, "toggleTodo"),
            }),
            DeleteTodo::NAME => with_variables::<IdVariables>(request, |vars| {
                if self.remove(&vars.id) {
                    respond(&DeleteTodoData { delete_todo: vars.id })
                } else {
                    not_found(&vars.id, "deleteTodo")
                }
            }),
            other => GraphQlResponse::error(GraphQlError::new(format!("Unknown operation: {other}"))),
        }
    }

    fn add(&self, title: String) -> Todo {
        let now = self.clock.now();
        let todo = Todo::new(Uuid::new_v4().to_string(), title, false).with_timestamps(now, now);
        self.todos
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(todo.clone());
        tracing::debug!(id = %todo.id, title = %todo.title, "Mock server created todo");
        todo
    }

    fn toggle(&self, id: &TodoId) -> Option<Todo> {
        let now: DateTime<Utc> = self.clock.now();
        let mut todos = self.todos.lock().unwrap_or_else(PoisonError::into_inner);
        let todo = todos.iter_mut().find(|t| &t.id == id)?;
        todo.completed = !todo.completed;
        todo.updated_at = Some(now);
        tracing::debug!(id = %id, completed = todo.completed, "Mock server toggled todo");
        Some(todo.clone())
    }

    fn remove(&self, id: &TodoId) -> bool {
        let mut todos = self.todos.lock().unwrap_or_else(PoisonError::into_inner);
        let before = todos.len();
        todos.retain(|t| &t.id != id);
        let removed = todos.len() < before;
        if removed {
            tracing::debug!(id = %id, "Mock server deleted todo");
        }
        removed
    }
}

impl std::fmt::Debug for MockTodoServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTodoServer")
            .field("todos", &self.todos.lock().unwrap_or_else(PoisonError::into_inner).len())
            .field("online", &self.is_online())
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for MockTodoServer {
    async fn execute(&self, request: GraphQlRequest) -> Result<GraphQlResponse, TransportError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if !self.is_online() {
            return Err(TransportError::Unreachable(format!(
                "mock server offline, {} not delivered",
                request.operation_name
            )));
        }

        tracing::debug!(operation = %request.operation_name, "Mock server handling request");
        Ok(self.handle(&request))
    }
}

/// The fields selected by the list and mutation documents
fn list_fields(todo: &Todo) -> Todo {
    Todo::new(todo.id.clone(), todo.title.clone(), todo.completed)
}

fn with_variables<V: DeserializeOwned>(
    request: &GraphQlRequest,
    f: impl FnOnce(V) -> GraphQlResponse,
) -> GraphQlResponse {
    match request.variables_as::<V>() {
        Ok(vars) => f(vars),
        Err(error) => GraphQlResponse::error(GraphQlError::new(format!(
            "Invalid variables for {}: {error}",
            request.operation_name
        ))),
    }
}

fn respond<T: Serialize>(data: &T) -> GraphQlResponse {
    match serde_json::to_value(data) {
        Ok(value) => GraphQlResponse::data(value),
        Err(error) => GraphQlResponse::error(GraphQlError::new(format!("Failed to encode response: {error}"))),
    }
}

fn not_found(id: &TodoId, field: &str) -> GraphQlResponse {
    GraphQlResponse::error(GraphQlError::new(format!("Todo not found: {id}")).at(field))
}
