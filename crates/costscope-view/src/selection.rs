use std::collections::BTreeSet;

use costscope_analysis::{SortColumn, SortState};
use costscope_core::{DateRange, platform_key};
use serde::{Deserialize, Serialize};

/// What the user has chosen on one page.
///
/// Transitions are pure: each returns the next state and leaves `self` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub selected_keys: BTreeSet<String>,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(flatten)]
    pub sort: SortState,
    #[serde(default)]
    pub grouped: bool,
    #[serde(default)]
    pub search: String,
}

impl SelectionState {
    /// Everything in `universe` selected, every other field at its default.
    pub fn for_universe(universe: &BTreeSet<String>, date_range: DateRange) -> Self {
        Self {
            selected_keys: universe.clone(),
            date_range,
            sort: SortState::default(),
            grouped: false,
            search: String::new(),
        }
    }

    /// Keys are canonicalized and restricted to `universe`.
    pub fn with_selected_keys<I, S>(&self, keys: I, universe: &BTreeSet<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selected_keys = keys
            .into_iter()
            .map(|key| platform_key(Some(key.as_ref())))
            .filter(|key| universe.contains(key))
            .collect();
        Self {
            selected_keys,
            ..self.clone()
        }
    }

    pub fn toggled(&self, key: &str, universe: &BTreeSet<String>) -> Self {
        let key = platform_key(Some(key));
        if !universe.contains(&key) {
            return self.clone();
        }

        let mut selected_keys = self.selected_keys.clone();
        if !selected_keys.remove(&key) {
            selected_keys.insert(key);
        }
        Self {
            selected_keys,
            ..self.clone()
        }
    }

    pub fn with_date_range(&self, date_range: DateRange) -> Self {
        Self {
            date_range,
            ..self.clone()
        }
    }

    pub fn sorted_by(&self, column: SortColumn) -> Self {
        Self {
            sort: self.sort.sort_by(column),
            ..self.clone()
        }
    }

    pub fn with_grouped(&self, grouped: bool) -> Self {
        Self {
            grouped,
            ..self.clone()
        }
    }

    pub fn with_search(&self, search: &str) -> Self {
        Self {
            search: search.to_owned(),
            ..self.clone()
        }
    }

    /// Selection and date range decide what is fetched; the rest is local.
    pub fn needs_reload_from(&self, previous: &Self) -> bool {
        self.selected_keys != previous.selected_keys || self.date_range != previous.date_range
    }
}

#[cfg(test)]
mod tests {
    use costscope_analysis::SortOrder;

    use super::*;

    fn universe() -> BTreeSet<String> {
        BTreeSet::from(["github".to_owned(), "gitlab".to_owned()])
    }

    #[test]
    fn defaults_select_whole_universe() {
        let state = SelectionState::for_universe(&universe(), DateRange::default());

        assert_eq!(state.selected_keys, universe());
        assert_eq!(state.date_range, DateRange::Last30Days);
        assert_eq!(state.sort.sort_key, SortColumn::TotalCost);
        assert_eq!(state.sort.sort_order, SortOrder::Desc);
        assert!(!state.grouped);
        assert!(state.search.is_empty());
    }

    #[test]
    fn selected_keys_are_canonical_and_bounded_by_universe() {
        let state = SelectionState::for_universe(&universe(), DateRange::default());

        let next = state.with_selected_keys([" GitHub ", "bitbucket"], &universe());

        assert_eq!(next.selected_keys, BTreeSet::from(["github".to_owned()]));
        assert!(next.needs_reload_from(&state));
        assert_eq!(state.selected_keys, universe());
    }

    #[test]
    fn toggle_flips_membership() {
        let state = SelectionState::for_universe(&universe(), DateRange::default());

        let without = state.toggled("gitlab", &universe());
        let with = without.toggled("GitLab", &universe());

        assert!(!without.selected_keys.contains("gitlab"));
        assert_eq!(with, state);
        assert_eq!(state.toggled("bitbucket", &universe()), state);
    }

    #[test]
    fn local_changes_do_not_need_reload() {
        let state = SelectionState::for_universe(&universe(), DateRange::default());

        let local = state
            .sorted_by(SortColumn::Name)
            .with_grouped(true)
            .with_search("api");

        assert!(!local.needs_reload_from(&state));
        assert!(state.with_date_range(DateRange::Last7Days).needs_reload_from(&state));
    }

    #[test]
    fn serializes_as_flat_camel_case_object() {
        let state = SelectionState::for_universe(&universe(), DateRange::Last6Months);

        let value = serde_json::to_value(&state).expect("serialize selection");

        assert_eq!(value["selectedKeys"], serde_json::json!(["github", "gitlab"]));
        assert_eq!(value["dateRange"], "6m");
        assert_eq!(value["sortKey"], "totalCost");
        assert_eq!(value["sortOrder"], "desc");
        assert_eq!(value["grouped"], false);

        let back: SelectionState = serde_json::from_value(value).expect("deserialize selection");
        assert_eq!(back, state);
    }
}
