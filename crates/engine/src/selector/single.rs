use std::time::{Duration, Instant};

use inview_types::{CatalogEntity, SelectionOption};
use tracing::debug;

use super::{OptionsStatus, detached_option, find_by_value};
use crate::debounce::Debouncer;
use crate::filter::matches_search;

/// Current value of a single-choice selector.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorValue<E> {
    /// A catalog entity, identified by id.
    Entity(E),
    /// Raw text with no numeric identity.
    Custom(String),
}

impl<E: CatalogEntity> SelectorValue<E> {
    pub fn id(&self) -> Option<i64> {
        match self {
            SelectorValue::Entity(entity) => Some(entity.id()),
            SelectorValue::Custom(_) => None,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            SelectorValue::Entity(entity) => entity.display_name(),
            SelectorValue::Custom(raw) => raw,
        }
    }
}

/// Emission of a committed single-choice selection: `(entityId | null, displayName?)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SingleCommit {
    pub id: Option<i64>,
    pub display_name: Option<String>,
}

impl SingleCommit {
    pub fn cleared() -> Self {
        Self::default()
    }
}

/// Single-choice selector over a catalog of entities.
#[derive(Debug, Clone)]
pub struct SingleSelector<E> {
    catalog: Vec<E>,
    value: Option<SelectorValue<E>>,
    allow_custom_value: bool,
    input: String,
    debouncer: Debouncer,
    loading: bool,
}

impl<E: CatalogEntity> SingleSelector<E> {
    pub fn new(allow_custom_value: bool, debounce: Duration) -> Self {
        Self {
            catalog: Vec::new(),
            value: None,
            allow_custom_value,
            input: String::new(),
            debouncer: Debouncer::new(debounce),
            loading: false,
        }
    }

    pub fn catalog(&self) -> &[E] {
        &self.catalog
    }

    pub fn value(&self) -> Option<&SelectorValue<E>> {
        self.value.as_ref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn allows_custom_value(&self) -> bool {
        self.allow_custom_value
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Every catalog entry as an option.
    pub fn options(&self) -> Vec<SelectionOption<E>> {
        self.catalog.iter().map(SelectionOption::from_entity).collect()
    }

    /// Options matching the current input text.
    pub fn visible_options(&self) -> Vec<SelectionOption<E>> {
        self.options()
            .into_iter()
            .filter(|option| matches_search(&option.label, &option.value, &self.input))
            .collect()
    }

    /// Resolve the current value to the option that renders it.
    ///
    /// A catalog match by stringified id always wins over an ad-hoc label.
    pub fn selected_option(&self) -> Option<SelectionOption<E>> {
        match self.value.as_ref()? {
            SelectorValue::Entity(entity) => Some(
                find_by_value(&self.catalog, &entity.option_value())
                    .map(SelectionOption::from_entity)
                    .unwrap_or_else(|| detached_option(entity)),
            ),
            SelectorValue::Custom(raw) => match find_by_value(&self.catalog, raw) {
                Some(entity) => Some(SelectionOption::from_entity(entity)),
                None if self.allow_custom_value && !raw.is_empty() => Some(SelectionOption::ad_hoc(raw)),
                None => None,
            },
        }
    }

    /// Commit the option carrying `value`.
    ///
    /// An option whose entity has left the catalog becomes an ad-hoc value when
    /// custom values are allowed; otherwise the selection is cleared.
    pub fn commit(&mut self, value: &str) -> SingleCommit {
        if let Some(entity) = find_by_value(&self.catalog, value).cloned() {
            let commit = SingleCommit {
                id: Some(entity.id()),
                display_name: Some(entity.display_name().to_string()),
            };
            self.value = Some(SelectorValue::Entity(entity));
            return commit;
        }
        if self.allow_custom_value && !value.is_empty() {
            debug!(value, "committed value has no catalog entry; keeping it as custom text");
            self.value = Some(SelectorValue::Custom(value.to_string()));
            return SingleCommit {
                id: None,
                display_name: Some(value.to_string()),
            };
        }
        self.clear()
    }

    /// Create an ad-hoc value from typed text.
    ///
    /// Text naming a catalog entry (by id or label) selects that entry instead.
    /// Returns `None` when the text is rejected.
    pub fn create(&mut self, raw: &str) -> Option<SingleCommit> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let existing = self
            .catalog
            .iter()
            .find(|entity| entity.option_value() == raw || entity.display_name().eq_ignore_ascii_case(raw))
            .map(|entity| entity.option_value());
        if let Some(value) = existing {
            return Some(self.commit(&value));
        }
        if !self.allow_custom_value {
            return None;
        }
        self.value = Some(SelectorValue::Custom(raw.to_string()));
        Some(SingleCommit {
            id: None,
            display_name: Some(raw.to_string()),
        })
    }

    pub fn clear(&mut self) -> SingleCommit {
        self.value = None;
        SingleCommit::cleared()
    }

    pub fn set_value(&mut self, value: Option<SelectorValue<E>>) {
        self.value = value;
    }

    /// Replace the catalog with a fresh lookup result.
    pub fn set_catalog(&mut self, catalog: Vec<E>) {
        self.catalog = catalog;
        self.loading = false;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn status(&self) -> OptionsStatus {
        OptionsStatus::of(self.visible_options().len(), self.loading)
    }

    /// Update the search input. The text-change signal fires from [`Self::poll_text_change`].
    pub fn type_text(&mut self, text: impl Into<String>, now: Instant) {
        self.input = text.into();
        self.debouncer.input(self.input.clone(), now);
    }

    pub fn poll_text_change(&mut self, now: Instant) -> Option<String> {
        self.debouncer.poll(now)
    }

    pub fn has_pending_text(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn unmount(&mut self) {
        self.debouncer.cancel();
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inview_types::Connection;

    fn selector(allow_custom: bool) -> SingleSelector<Connection> {
        let mut selector = SingleSelector::new(allow_custom, Duration::from_millis(500));
        selector.set_catalog(vec![Connection::new(1, "PLC-A"), Connection::new(2, "PLC-B")]);
        selector
    }

    #[test]
    fn catalog_match_wins_over_ad_hoc_label() {
        let mut selector = selector(true);
        selector.set_value(Some(SelectorValue::Custom("2".into())));
        let option = selector.selected_option().expect("resolved option");
        assert_eq!(option.label, "PLC-B");
        assert!(!option.is_ad_hoc());
    }

    #[test]
    fn unmatched_custom_value_renders_only_when_allowed() {
        let mut allowed = selector(true);
        allowed.set_value(Some(SelectorValue::Custom("plc-x".into())));
        assert_eq!(allowed.selected_option().map(|option| option.label), Some("plc-x".to_string()));

        let mut denied = selector(false);
        denied.set_value(Some(SelectorValue::Custom("plc-x".into())));
        assert_eq!(denied.selected_option(), None);
    }

    #[test]
    fn commit_and_clear_emit_id_and_name() {
        let mut selector = selector(true);
        assert_eq!(
            selector.commit("1"),
            SingleCommit {
                id: Some(1),
                display_name: Some("PLC-A".into())
            }
        );
        assert_eq!(selector.clear(), SingleCommit { id: None, display_name: None });
        assert_eq!(selector.value(), None);
    }

    #[test]
    fn vanished_entity_becomes_custom_or_is_dropped() {
        let mut allowed = selector(true);
        allowed.set_catalog(vec![]);
        assert_eq!(allowed.commit("2").display_name.as_deref(), Some("2"));
        assert_eq!(allowed.value(), Some(&SelectorValue::Custom("2".into())));

        let mut denied = selector(false);
        denied.set_catalog(vec![]);
        assert_eq!(denied.commit("2"), SingleCommit::cleared());
    }

    #[test]
    fn create_prefers_existing_entries() {
        let mut selector = selector(true);
        assert_eq!(selector.create("plc-b").and_then(|commit| commit.id), Some(2));
        let custom = selector.create("plc-x").expect("custom value accepted");
        assert_eq!(custom, SingleCommit { id: None, display_name: Some("plc-x".into()) });
        assert_eq!(self::selector(false).create("plc-x"), None);
    }

    #[test]
    fn visible_options_follow_input() {
        let mut selector = selector(true);
        selector.type_text("plc-b", Instant::now());
        let labels: Vec<_> = selector.visible_options().into_iter().map(|option| option.label).collect();
        assert_eq!(labels, vec!["PLC-B"]);
    }

    #[test]
    fn selected_entity_missing_from_catalog_keeps_its_name() {
        let mut selector = selector(false);
        selector.commit("1");
        selector.set_catalog(vec![Connection::new(2, "PLC-B")]);
        assert_eq!(selector.selected_option().map(|option| option.label), Some("PLC-A".to_string()));
    }
}
