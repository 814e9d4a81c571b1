//! Building one reducer out of several.
//!
//! Client state is made of small independent cells (active filter, search
//! keyword, selection) next to the fetched query data. Each cell can get its
//! own reducer. [`scope_reducer`] narrows a reducer to one field of a larger
//! state, and [`combine_reducers`] feeds every action to a list of reducers.
//!
//! # Examples
//!
//! ```
//! use graphql_todo_core::{Effect, Reducer, SmallVec};
//! use graphql_todo_core::composition::{combine_reducers, scope_reducer};
//!
//! #[derive(Clone, Default)]
//! struct Cells {
//!     keyword: String,
//!     selected: Option<String>,
//! }
//!
//! #[derive(Clone)]
//! enum CellAction {
//!     Search(String),
//!     Select(String),
//! }
//!
//! struct KeywordReducer;
//! struct SelectionReducer;
//!
//! impl Reducer for KeywordReducer {
//!     type State = String;
//!     type Action = CellAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut String, action: CellAction, _env: &()) -> SmallVec<[Effect<CellAction>; 4]> {
//!         if let CellAction::Search(keyword) = action {
//!             *state = keyword;
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! impl Reducer for SelectionReducer {
//!     type State = Cells;
//!     type Action = CellAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Cells, action: CellAction, _env: &()) -> SmallVec<[Effect<CellAction>; 4]> {
//!         if let CellAction::Select(id) = action {
//!             state.selected = if state.selected.as_deref() == Some(id.as_str()) { None } else { Some(id) };
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! fn keyword(cells: &Cells) -> &String {
//!     &cells.keyword
//! }
//!
//! fn set_keyword(cells: &mut Cells, keyword: String) {
//!     cells.keyword = keyword;
//! }
//!
//! let keyword = scope_reducer(KeywordReducer, keyword, set_keyword);
//! let combined = combine_reducers(vec![Box::new(keyword), Box::new(SelectionReducer)]);
//!
//! let mut cells = Cells::default();
//! let _ = combined.reduce(&mut cells, CellAction::Search("milk".into()), &());
//! let _ = combined.reduce(&mut cells, CellAction::Select("1".into()), &());
//! assert_eq!(cells.keyword, "milk");
//! assert_eq!(cells.selected.as_deref(), Some("1"));
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::sync::Arc;

/// Boxed reducer that can be shared with the runtime's effect tasks
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Run `reducers` in list order for every action
///
/// Each one sees the state left by the previous one. Their effects are
/// concatenated with `Effect::None` dropped. The list sits behind an [`Arc`]
/// so clones share it.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer {
        reducers: Arc::new(reducers),
    }
}

/// Output of [`combine_reducers`]
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Arc<Vec<BoxedReducer<S, A, E>>>,
}

impl<S, A, E> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    /// Number of reducers in the combination
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Returns true if no reducers were combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Clone for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    fn clone(&self) -> Self {
        Self {
            reducers: Arc::clone(&self.reducers),
        }
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in self.reducers.iter() {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects.into_iter().filter(|e| !e.is_none()));
        }

        all_effects
    }
}

/// Run `reducer` against the `SubS` part of a larger `S`
///
/// The part is cloned out with `get_state`, reduced, and written back whole
/// with `set_state`.
pub fn scope_reducer<S, SubS, A, E, R>(
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
) -> ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        _phantom: std::marker::PhantomData,
    }
}

/// Output of [`scope_reducer`]
pub struct ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    _phantom: std::marker::PhantomData<fn() -> (A, E)>,
}

impl<S, SubS, A, E, R> Reducer for ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut sub_state = (self.get_state)(state).clone();

        let effects = self.reducer.reduce(&mut sub_state, action, env);

        (self.set_state)(state, sub_state);

        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smallvec;

    #[derive(Clone, Debug, Default, PartialEq)]
    enum Filter {
        #[default]
        All,
        Active,
    }

    #[derive(Clone, Default)]
    struct Cells {
        filter: Filter,
        keyword: String,
    }

    #[derive(Clone)]
    enum CellAction {
        SetFilter(Filter),
        Search(String),
        Refetch,
    }

    struct FilterReducer;

    impl Reducer for FilterReducer {
        type State = Cells;
        type Action = CellAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                CellAction::SetFilter(filter) => {
                    state.filter = filter;
                    smallvec![Effect::None]
                },
                CellAction::Refetch => smallvec![Effect::future(async { None })],
                CellAction::Search(_) => smallvec![Effect::None],
            }
        }
    }

    struct KeywordReducer;

    impl Reducer for KeywordReducer {
        type State = String;
        type Action = CellAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            if let CellAction::Search(keyword) = action {
                *state = keyword;
            }
            SmallVec::new()
        }
    }

    fn keyword_of(cells: &Cells) -> &String {
        &cells.keyword
    }

    fn set_keyword(cells: &mut Cells, keyword: String) {
        cells.keyword = keyword;
    }

    #[test]
    fn test_combine_reducers() {
        let combined = combine_reducers(vec![
            Box::new(FilterReducer),
            Box::new(scope_reducer(KeywordReducer, keyword_of, set_keyword)),
        ]);
        assert_eq!(combined.len(), 2);

        let mut state = Cells::default();

        let _ = combined.reduce(&mut state, CellAction::SetFilter(Filter::Active), &());
        assert_eq!(state.filter, Filter::Active);

        let _ = combined.reduce(&mut state, CellAction::Search("milk".to_string()), &());
        assert_eq!(state.keyword, "milk");
        assert_eq!(state.filter, Filter::Active);
    }

    #[test]
    fn combined_reducer_drops_noop_effects() {
        let combined = combine_reducers(vec![Box::new(FilterReducer)]);
        let mut state = Cells::default();

        let effects = combined.reduce(&mut state, CellAction::SetFilter(Filter::All), &());
        assert!(effects.is_empty());

        let effects = combined.reduce(&mut state, CellAction::Refetch, &());
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn combined_reducer_clones_share_reducers() {
        let combined = combine_reducers(vec![Box::new(FilterReducer)]);
        let clone = combined.clone();
        assert_eq!(clone.len(), combined.len());
        assert!(!clone.is_empty());
    }

    #[test]
    fn test_scope_reducer() {
        let scoped = scope_reducer(
            KeywordReducer,
            |parent: &Cells| &parent.keyword,
            |parent: &mut Cells, keyword: String| {
                parent.keyword = keyword;
            },
        );

        let mut state = Cells {
            filter: Filter::Active,
            keyword: String::new(),
        };

        let _ = scoped.reduce(&mut state, CellAction::Search("dog".to_string()), &());
        assert_eq!(state.keyword, "dog");
        assert_eq!(state.filter, Filter::Active);
    }
}
