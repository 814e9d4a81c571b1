//! Domain types for the Todo client.
//!
//! A [`Todo`] is the record the server hands out; the client never invents
//! one. Everything the UI layer chooses on its own (the active filter, the
//! search keyword, the selected row) lives in [`UiState`](crate::reducer::UiState).

use chrono::{DateTime, Utc};
use graphql_todo_core::ClientError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Opaque, server-assigned todo identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Wraps a raw identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TodoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single todo record
///
/// Timestamps are optional because the list query does not select them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier
    pub id: TodoId,
    /// Title, fixed at creation
    pub title: String,
    /// Whether the todo is done
    pub completed: bool,
    /// When the server created the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the server last changed the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Todo {
    /// Creates a todo without timestamps
    #[must_use]
    pub fn new(id: impl Into<TodoId>, title: impl Into<String>, completed: bool) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets both timestamps
    #[must_use]
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        self
    }
}

/// Completion-state filter for the visible list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoFilter {
    /// Every todo
    #[default]
    All,
    /// Todos that are not completed
    Active,
    /// Todos that are completed
    Completed,
}

impl TodoFilter {
    /// All filters, in display order
    pub const ALL: [Self; 3] = [Self::All, Self::Active, Self::Completed];

    /// Returns true if the todo passes this filter
    #[must_use]
    pub const fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }

    /// Wire and text form: `all`, `active` or `completed`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Human-readable label shown when no search is active
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All todos",
            Self::Active => "Active todos",
            Self::Completed => "Completed todos",
        }
    }

    /// Parses a filter, falling back to [`TodoFilter::All`] for anything unrecognized
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for TodoFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter string that is not one of `all`, `active`, `completed`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown todo filter: {0:?}")]
pub struct UnknownFilter(pub String);

impl FromStr for TodoFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(UnknownFilter(s.to_string())),
        }
    }
}

/// Checks a title before it is sent to the server
///
/// Returns the title unchanged when it has visible content.
///
/// # Errors
///
/// Returns [`ClientError::Validation`] if the title is empty after trimming.
pub fn validate_title(title: &str) -> Result<&str, ClientError> {
    if title.trim().is_empty() {
        return Err(ClientError::Validation("todo title cannot be empty".to_string()));
    }
    Ok(title)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn todo_wire_format_is_camel_case() {
        let created = DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let todo = Todo::new("1", "Learn GraphQL", false).with_timestamps(created, created);

        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["createdAt"], "2024-01-15T10:00:00Z");
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn missing_timestamps_are_omitted_and_accepted() {
        let todo: Todo = serde_json::from_str(r#"{"id":"2","title":"Build Todo App","completed":true}"#).unwrap();
        assert_eq!(todo, Todo::new("2", "Build Todo App", true));

        let json = serde_json::to_string(&todo).unwrap();
        assert!(!json.contains("updatedAt"));
    }

    #[test]
    fn filter_parsing() {
        assert_eq!("active".parse::<TodoFilter>(), Ok(TodoFilter::Active));
        assert_eq!(" Completed ".parse::<TodoFilter>(), Ok(TodoFilter::Completed));
        assert!("done".parse::<TodoFilter>().is_err());
        assert_eq!(TodoFilter::parse_lenient("done"), TodoFilter::All);
        assert_eq!(TodoFilter::default(), TodoFilter::All);
    }

    #[test]
    fn filter_matches_completion_state() {
        let open = Todo::new("1", "a", false);
        let done = Todo::new("2", "b", true);
        assert!(TodoFilter::All.matches(&open) && TodoFilter::All.matches(&done));
        assert!(TodoFilter::Active.matches(&open) && !TodoFilter::Active.matches(&done));
        assert!(!TodoFilter::Completed.matches(&open) && TodoFilter::Completed.matches(&done));
    }

    #[test]
    fn blank_titles_are_rejected() {
        assert!(validate_title("Buy milk").is_ok());
        assert!(matches!(validate_title("   "), Err(ClientError::Validation(_))));
        assert!(validate_title("").is_err());
    }
}
