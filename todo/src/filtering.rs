//! Filter and search over a todo list.

use crate::types::{Todo, TodoFilter};
use serde::{Deserialize, Serialize};

/// Result of [`filter_todos`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredTodos {
    /// Todos passing both the filter and the search, in input order
    pub filtered: Vec<Todo>,
    /// `filtered.len()`
    pub filtered_count: usize,
    /// Length of the input list
    pub total_count: usize,
}

/// Apply the completion filter and the keyword search
///
/// The keyword is trimmed; a non-empty keyword keeps todos whose title
/// contains it, ignoring case. The filter is applied independently and both
/// must pass. Input order is preserved. Total over every input, including an
/// empty list and an empty keyword.
///
/// # Example
///
/// ```
/// use graphql_todo::{filter_todos, Todo, TodoFilter};
///
/// let todos = vec![Todo::new("1", "Buy milk", false), Todo::new("2", "Walk dog", true)];
/// let result = filter_todos(&todos, TodoFilter::Active, "milk");
/// assert_eq!(result.filtered, vec![todos[0].clone()]);
/// assert_eq!((result.filtered_count, result.total_count), (1, 2));
/// ```
#[must_use]
pub fn filter_todos(todos: &[Todo], filter: TodoFilter, keyword: &str) -> FilteredTodos {
    let needle = keyword.trim().to_lowercase();

    let filtered: Vec<Todo> = todos
        .iter()
        .filter(|todo| needle.is_empty() || todo.title.to_lowercase().contains(&needle))
        .filter(|todo| filter.matches(todo))
        .cloned()
        .collect();

    FilteredTodos {
        filtered_count: filtered.len(),
        total_count: todos.len(),
        filtered,
    }
}
