//! Rewrites the cached todo list after a successful mutation.
//!
//! The list-all query result is the one piece of shared mutable state in the
//! client. After a toggle or delete the server's answer is folded into that
//! cached list so the next read reflects the change without a refetch.
//!
//! The pure list transforms ([`toggled_list`], [`without_todo`]) are kept
//! apart from the functions that go through the [`QueryCache`]
//! ([`patch_toggled`], [`patch_deleted`]). Each patch is one atomic cache
//! update that either replaces the whole cached list or leaves it alone.

use crate::operations::{GetTodos, TodosData};
use crate::types::{Todo, TodoId};
use graphql_todo_core::cache::update_query;
use graphql_todo_core::{ClientError, QueryCache};

/// What a cache patch did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The cached list was rewritten
    Applied,
    /// A list is cached but has no todo with that id; cache untouched
    NotInList,
    /// No list is cached yet; cache untouched
    NothingCached,
}

/// Returns `todos` with `completed` of the matching entry taken from `toggled`
///
/// Only `completed` is copied; title, timestamps and position keep their
/// cached values. Entries with other ids are unchanged.
#[must_use]
pub fn toggled_list(todos: &[Todo], toggled: &Todo) -> Vec<Todo> {
    todos
        .iter()
        .map(|todo| {
            if todo.id == toggled.id {
                Todo {
                    completed: toggled.completed,
                    ..todo.clone()
                }
            } else {
                todo.clone()
            }
        })
        .collect()
}

/// Returns `todos` without the entry whose id is `id`, order preserved
#[must_use]
pub fn without_todo(todos: &[Todo], id: &TodoId) -> Vec<Todo> {
    todos.iter().filter(|todo| &todo.id != id).cloned().collect()
}

/// Fold a toggle result into the cached list
///
/// The read and the write happen as one cache update, so a concurrent patch
/// on the same list is never overwritten with a stale copy.
///
/// # Errors
///
/// Returns [`ClientError::Decode`] if the patched list cannot be encoded; the
/// cache is untouched in that case.
pub fn patch_toggled(cache: &dyn QueryCache, toggled: &Todo) -> Result<PatchOutcome, ClientError> {
    let mut outcome = PatchOutcome::NothingCached;
    update_query::<GetTodos, _>(cache, &(), |cached| {
        let cached = cached?;
        if !cached.todos.iter().any(|todo| todo.id == toggled.id) {
            outcome = PatchOutcome::NotInList;
            return None;
        }
        outcome = PatchOutcome::Applied;
        Some(TodosData {
            todos: toggled_list(&cached.todos, toggled),
        })
    })?;

    match outcome {
        PatchOutcome::Applied => {
            tracing::debug!(id = %toggled.id, completed = toggled.completed, "Patched cached todo list after toggle");
            metrics::counter!("client.cache.patches", "mutation" => "toggle").increment(1);
        },
        PatchOutcome::NotInList => tracing::debug!(id = %toggled.id, "Toggled todo not in cached list, skipping patch"),
        PatchOutcome::NothingCached => tracing::debug!(id = %toggled.id, "No cached todo list, skipping toggle patch"),
    }
    Ok(outcome)
}

/// Remove a deleted todo from the cached list
///
/// Repeating the same patch is a no-op. Like [`patch_toggled`] it runs as a
/// single cache update.
///
/// # Errors
///
/// Returns [`ClientError::Decode`] if the patched list cannot be encoded; the
/// cache is untouched in that case.
pub fn patch_deleted(cache: &dyn QueryCache, id: &TodoId) -> Result<PatchOutcome, ClientError> {
    let mut outcome = PatchOutcome::NothingCached;
    update_query::<GetTodos, _>(cache, &(), |cached| {
        let cached = cached?;
        let remaining = without_todo(&cached.todos, id);
        if remaining.len() == cached.todos.len() {
            outcome = PatchOutcome::NotInList;
            return None;
        }
        outcome = PatchOutcome::Applied;
        Some(TodosData { todos: remaining })
    })?;

    match outcome {
        PatchOutcome::Applied => {
            tracing::debug!(id = %id, "Patched cached todo list after delete");
            metrics::counter!("client.cache.patches", "mutation" => "delete").increment(1);
        },
        PatchOutcome::NotInList => tracing::debug!(id = %id, "Deleted todo not in cached list, skipping patch"),
        PatchOutcome::NothingCached => tracing::debug!(id = %id, "No cached todo list, skipping delete patch"),
    }
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use graphql_todo_core::cache::{read_query, write_query};
    use graphql_todo_core::InMemoryCache;

    fn seed(cache: &InMemoryCache, todos: Vec<Todo>) {
        write_query::<GetTodos>(cache, &(), &TodosData { todos }).unwrap();
    }

    fn cached(cache: &InMemoryCache) -> Vec<Todo> {
        read_query::<GetTodos>(cache, &()).unwrap().todos
    }

    #[test]
    fn toggle_copies_only_completed() {
        let list = vec![Todo::new("1", "Buy milk", false), Todo::new("2", "Walk dog", true)];
        // Server echo with a different title must not leak into the cache
        let toggled = Todo::new("1", "renamed on server", true);

        let patched = toggled_list(&list, &toggled);
        assert_eq!(patched[0], Todo::new("1", "Buy milk", true));
        assert_eq!(patched[1], list[1]);
    }

    #[test]
    fn toggle_scenario() {
        let cache = InMemoryCache::new();
        seed(&cache, vec![Todo::new("1", "Buy milk", false)]);

        let outcome = patch_toggled(&cache, &Todo::new("1", "Buy milk", true)).unwrap();
        assert_eq!(outcome, PatchOutcome::Applied);
        assert_eq!(cached(&cache), vec![Todo::new("1", "Buy milk", true)]);
    }

    #[test]
    fn delete_scenario_is_idempotent() {
        let cache = InMemoryCache::new();
        seed(&cache, vec![Todo::new("1", "a", false), Todo::new("2", "b", false)]);
        let id = TodoId::from("2");

        assert_eq!(patch_deleted(&cache, &id).unwrap(), PatchOutcome::Applied);
        assert_eq!(cached(&cache), vec![Todo::new("1", "a", false)]);

        assert_eq!(patch_deleted(&cache, &id).unwrap(), PatchOutcome::NotInList);
        assert_eq!(cached(&cache), vec![Todo::new("1", "a", false)]);
    }

    #[test]
    fn empty_cache_is_a_no_op() {
        let cache = InMemoryCache::new();
        assert_eq!(
            patch_toggled(&cache, &Todo::new("1", "a", true)).unwrap(),
            PatchOutcome::NothingCached
        );
        assert_eq!(patch_deleted(&cache, &TodoId::from("1")).unwrap(), PatchOutcome::NothingCached);
        assert!(cache.is_empty());
    }

    #[test]
    fn interleaved_patches_from_threads_all_land() {
        let cache = std::sync::Arc::new(InMemoryCache::new());
        seed(&cache, (0..40).map(|i| Todo::new(i.to_string(), format!("t{i}"), false)).collect());

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let cache = std::sync::Arc::clone(&cache);
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        patch_deleted(&*cache, &TodoId::new(i.to_string())).unwrap()
                    } else {
                        patch_toggled(&*cache, &Todo::new(i.to_string(), "", true)).unwrap()
                    }
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), PatchOutcome::Applied);
        }

        let list = cached(&cache);
        assert_eq!(list.len(), 20);
        assert!(list.iter().all(|todo| todo.completed));
    }

    #[test]
    fn unknown_id_leaves_cache_untouched() {
        let cache = InMemoryCache::new();
        let list = vec![Todo::new("1", "a", false)];
        seed(&cache, list.clone());

        assert_eq!(
            patch_toggled(&cache, &Todo::new("9", "x", true)).unwrap(),
            PatchOutcome::NotInList
        );
        assert_eq!(cached(&cache), list);
    }
}
