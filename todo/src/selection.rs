//! Row selection.

use crate::types::TodoId;

/// Next selection after clicking `clicked`
///
/// Clicking the selected row clears the selection; clicking any other row
/// selects it.
#[must_use]
pub fn toggle_selection(current: Option<&TodoId>, clicked: &TodoId) -> Option<TodoId> {
    if current == Some(clicked) {
        None
    } else {
        Some(clicked.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_twice_deselects() {
        let a = TodoId::from("A");
        let first = toggle_selection(None, &a);
        assert_eq!(first, Some(a.clone()));
        assert_eq!(toggle_selection(first.as_ref(), &a), None);
    }

    #[test]
    fn click_other_switches() {
        let a = TodoId::from("A");
        let b = TodoId::from("B");
        assert_eq!(toggle_selection(Some(&a), &b), Some(b));
    }
}
