//! The five GraphQL operations the client speaks.
//!
//! Each unit struct binds a document to its variables and `data` shapes.
//! These are the whole wire contract between the client and a Todo server.

use crate::types::{Todo, TodoId};
use graphql_todo_core::{Operation, OperationKind};
use serde::{Deserialize, Serialize};

/// `{ id }` variables shared by get-by-id, toggle and delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdVariables {
    /// Target todo
    pub id: TodoId,
}

impl IdVariables {
    /// Variables for one todo id
    #[must_use]
    pub const fn new(id: TodoId) -> Self {
        Self { id }
    }
}

/// `{ title }` variables for creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleVariables {
    /// Title of the new todo
    pub title: String,
}

/// List-all query
#[derive(Debug, Clone, Copy)]
pub struct GetTodos;

/// `data` of [`GetTodos`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodosData {
    /// Todos in server order
    pub todos: Vec<Todo>,
}

impl Operation for GetTodos {
    const NAME: &'static str = "GetTodos";
    const DOCUMENT: &'static str = "query GetTodos {\n  todos {\n    id\n    title\n    completed\n  }\n}";
    const KIND: OperationKind = OperationKind::Query;
    type Variables = ();
    type Data = TodosData;
}

/// Get-by-id query
#[derive(Debug, Clone, Copy)]
pub struct GetTodo;

/// `data` of [`GetTodo`]; `None` means not found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoData {
    /// The todo, if it exists
    pub todo: Option<Todo>,
}

impl Operation for GetTodo {
    const NAME: &'static str = "GetTodo";
    const DOCUMENT: &'static str = "query GetTodo($id: ID!) {\n  todo(id: $id) {\n    id\n    title\n    completed\n    createdAt\n    updatedAt\n  }\n}";
    const KIND: OperationKind = OperationKind::Query;
    type Variables = IdVariables;
    type Data = TodoData;
}

/// Create mutation
#[derive(Debug, Clone, Copy)]
pub struct AddTodo;

/// `data` of [`AddTodo`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTodoData {
    /// The created record
    pub add_todo: Todo,
}

impl Operation for AddTodo {
    const NAME: &'static str = "AddTodo";
    const DOCUMENT: &'static str = "mutation AddTodo($title: String!) {\n  addTodo(title: $title) {\n    id\n    title\n    completed\n  }\n}";
    const KIND: OperationKind = OperationKind::Mutation;
    type Variables = TitleVariables;
    type Data = AddTodoData;
}

/// Toggle mutation
#[derive(Debug, Clone, Copy)]
pub struct ToggleTodo;

/// `data` of [`ToggleTodo`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleTodoData {
    /// The record with `completed` flipped
    pub toggle_todo: Todo,
}

impl Operation for ToggleTodo {
    const NAME: &'static str = "ToggleTodo";
    const DOCUMENT: &'static str = "mutation ToggleTodo($id: ID!) {\n  toggleTodo(id: $id) {\n    id\n    title\n    completed\n  }\n}";
    const KIND: OperationKind = OperationKind::Mutation;
    type Variables = IdVariables;
    type Data = ToggleTodoData;
}

/// Delete mutation
#[derive(Debug, Clone, Copy)]
pub struct DeleteTodo;

/// `data` of [`DeleteTodo`]: the deleted id as a plain string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTodoData {
    /// Id of the removed record
    pub delete_todo: TodoId,
}

impl Operation for DeleteTodo {
    const NAME: &'static str = "DeleteTodo";
    const DOCUMENT: &'static str = "mutation DeleteTodo($id: ID!) {\n  deleteTodo(id: $id)\n}";
    const KIND: OperationKind = OperationKind::Mutation;
    type Variables = IdVariables;
    type Data = DeleteTodoData;
}
