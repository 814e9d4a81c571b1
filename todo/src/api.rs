//! Typed Todo operations on top of the query client.
//!
//! [`TodoApi`] is what the rest of the client calls. It picks the operation,
//! builds the variables and keeps the cached list in step with mutations:
//! toggles and deletes patch it, creations refetch it.

use crate::cache_patch::{patch_deleted, patch_toggled};
use crate::operations::{AddTodo, DeleteTodo, GetTodo, GetTodos, IdVariables, TitleVariables, ToggleTodo};
use crate::types::{Todo, TodoId};
use graphql_todo_core::{ClientError, QueryClient};

/// A created todo and what came of the list refetch that followed it
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedTodo {
    /// The record as the server created it
    pub todo: Todo,
    /// The refreshed list, or why the refetch failed; in that case the
    /// cached list is the one from before the creation
    pub refetch: Result<Vec<Todo>, ClientError>,
}

/// Todo operations bound to one [`QueryClient`]
#[derive(Debug, Clone)]
pub struct TodoApi {
    client: QueryClient,
}

impl TodoApi {
    /// Wrap a query client
    #[must_use]
    pub const fn new(client: QueryClient) -> Self {
        Self { client }
    }

    /// The underlying client
    #[must_use]
    pub const fn client(&self) -> &QueryClient {
        &self.client
    }

    /// List all todos, honoring the client's fetch policy
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the `GetTodos` request.
    pub async fn todos(&self) -> Result<Vec<Todo>, ClientError> {
        Ok(self.client.query::<GetTodos>(&()).await?.todos)
    }

    /// List all todos from the server and refresh the cached list
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the `GetTodos` request.
    pub async fn refetch_todos(&self) -> Result<Vec<Todo>, ClientError> {
        Ok(self.client.refetch::<GetTodos>(&()).await?.todos)
    }

    /// Fetch one todo; `Ok(None)` means the server does not know the id
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the `GetTodo` request.
    pub async fn todo(&self, id: &TodoId) -> Result<Option<Todo>, ClientError> {
        let vars = IdVariables::new(id.clone());
        Ok(self.client.query::<GetTodo>(&vars).await?.todo)
    }

    /// Create a todo, then refetch the list so it includes the new record
    ///
    /// The title is sent as given; callers check it with
    /// [`validate_title`](crate::validate_title) first. A failed refetch does
    /// not fail the creation; it is reported in [`CreatedTodo::refetch`].
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the `AddTodo` mutation.
    pub async fn add_todo(&self, title: &str) -> Result<CreatedTodo, ClientError> {
        let vars = TitleVariables {
            title: title.to_string(),
        };
        let todo = self.client.run_mutation::<AddTodo>(&vars).await?.add_todo;

        let refetch = self.client.refetch::<GetTodos>(&()).await.map(|data| data.todos);
        if let Err(error) = &refetch {
            tracing::warn!(id = %todo.id, error = %error, "Todo created but list refetch failed");
        }

        Ok(CreatedTodo { todo, refetch })
    }

    /// Flip a todo's completion state and patch the cached list
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the `ToggleTodo` mutation, including
    /// [`ClientError::Server`] for an id the server does not know.
    pub async fn toggle_todo(&self, id: &TodoId) -> Result<Todo, ClientError> {
        let vars = IdVariables::new(id.clone());
        let data = self
            .client
            .mutate::<ToggleTodo, _>(&vars, |cache, data| {
                if let Err(error) = patch_toggled(cache, &data.toggle_todo) {
                    tracing::warn!(id = %data.toggle_todo.id, error = %error, "Toggle cache patch failed");
                }
            })
            .await?;
        Ok(data.toggle_todo)
    }

    /// Delete a todo and drop it from the cached list
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the `DeleteTodo` mutation, including
    /// [`ClientError::Server`] for an id the server does not know.
    pub async fn delete_todo(&self, id: &TodoId) -> Result<TodoId, ClientError> {
        let vars = IdVariables::new(id.clone());
        let data = self
            .client
            .mutate::<DeleteTodo, _>(&vars, |cache, data| {
                if let Err(error) = patch_deleted(cache, &data.delete_todo) {
                    tracing::warn!(id = %data.delete_todo, error = %error, "Delete cache patch failed");
                }
            })
            .await?;
        Ok(data.delete_todo)
    }

    /// The cached list, without touching the network
    #[must_use]
    pub fn cached_todos(&self) -> Option<Vec<Todo>> {
        self.client.read_query::<GetTodos>(&()).map(|data| data.todos)
    }
}
