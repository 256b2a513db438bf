use std::time::{Duration, Instant};

use indexmap::IndexMap;
use inview_types::{CatalogEntity, SelectionOption};
use tracing::debug;

use super::{OptionsStatus, detached_option, find_by_value};
use crate::debounce::Debouncer;
use crate::filter::matches_search;

/// Multi-choice selector. The selection is keyed by entity id and keeps insertion order.
#[derive(Debug, Clone)]
pub struct MultiSelector<E> {
    catalog: Vec<E>,
    selected: IndexMap<i64, E>,
    allow_custom_value: bool,
    input: String,
    debouncer: Debouncer,
    loading: bool,
}

impl<E: CatalogEntity> MultiSelector<E> {
    pub fn new(allow_custom_value: bool, debounce: Duration) -> Self {
        Self {
            catalog: Vec::new(),
            selected: IndexMap::new(),
            allow_custom_value,
            input: String::new(),
            debouncer: Debouncer::new(debounce),
            loading: false,
        }
    }

    pub fn catalog(&self) -> &[E] {
        &self.catalog
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn selected(&self) -> Vec<E> {
        self.selected.values().cloned().collect()
    }

    pub fn selected_ids(&self) -> Vec<i64> {
        self.selected.keys().copied().collect()
    }

    pub fn selected_names(&self) -> Vec<String> {
        self.selected.values().map(|entity| entity.display_name().to_string()).collect()
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selected.contains_key(&id)
    }

    /// Catalog options followed by selected entities the catalog does not carry.
    pub fn options(&self) -> Vec<SelectionOption<E>> {
        self.union_with_selection(self.catalog.iter())
    }

    /// Catalog options matching the input, plus every selected entity.
    ///
    /// A selection never drops out of the option list because of a search.
    pub fn visible_options(&self) -> Vec<SelectionOption<E>> {
        let matching = self
            .catalog
            .iter()
            .filter(|entity| matches_search(entity.display_name(), &entity.option_value(), &self.input));
        self.union_with_selection(matching)
    }

    fn union_with_selection<'a>(&'a self, catalog: impl Iterator<Item = &'a E>) -> Vec<SelectionOption<E>> {
        let mut options: Vec<SelectionOption<E>> = catalog.map(SelectionOption::from_entity).collect();
        for entity in self.selected.values() {
            let value = entity.option_value();
            if !options.iter().any(|option| option.value == value) {
                options.push(detached_option(entity));
            }
        }
        options
    }

    /// Replace the selection with the options carrying `values`, in order.
    ///
    /// Values are resolved against the catalog, then the current selection,
    /// then (when allowed) parsed as ad-hoc ids. Anything else is dropped.
    pub fn commit(&mut self, values: &[String]) -> Vec<E> {
        let mut next = IndexMap::new();
        for value in values {
            match self.resolve(value) {
                Some(entity) => {
                    next.entry(entity.id()).or_insert(entity);
                }
                None => debug!(value = %value, "dropping unresolvable selection value"),
            }
        }
        self.selected = next;
        self.selected()
    }

    /// Add or remove the option carrying `value`.
    pub fn toggle(&mut self, value: &str) -> Vec<E> {
        let existing = self.selected.values().find(|entity| entity.option_value() == value).map(|entity| entity.id());
        match existing {
            Some(id) => {
                self.selected.shift_remove(&id);
            }
            None => {
                if let Some(entity) = self.resolve(value) {
                    self.selected.insert(entity.id(), entity);
                }
            }
        }
        self.selected()
    }

    pub fn remove(&mut self, id: i64) -> Vec<E> {
        self.selected.shift_remove(&id);
        self.selected()
    }

    /// Always emits an empty list, never nothing.
    pub fn clear(&mut self) -> Vec<E> {
        self.selected.clear();
        Vec::new()
    }

    /// Add typed text as a selection. Only integer ids are accepted as ad-hoc values.
    pub fn create(&mut self, raw: &str) -> Option<Vec<E>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let entity = self
            .catalog
            .iter()
            .find(|entity| entity.option_value() == raw || entity.display_name().eq_ignore_ascii_case(raw))
            .cloned()
            .or_else(|| self.ad_hoc(raw))?;
        self.selected.insert(entity.id(), entity);
        Some(self.selected())
    }

    fn resolve(&self, value: &str) -> Option<E> {
        find_by_value(&self.catalog, value)
            .or_else(|| self.selected.values().find(|entity| entity.option_value() == value))
            .cloned()
            .or_else(|| self.ad_hoc(value))
    }

    fn ad_hoc(&self, raw: &str) -> Option<E> {
        if !self.allow_custom_value {
            return None;
        }
        raw.parse::<i64>().ok().map(|id| E::ad_hoc(id, raw.to_string()))
    }

    pub fn set_value(&mut self, selected: Vec<E>) {
        self.selected = selected.into_iter().map(|entity| (entity.id(), entity)).collect();
    }

    pub fn set_catalog(&mut self, catalog: Vec<E>) {
        self.catalog = catalog;
        self.loading = false;
    }

    /// Fold a lookup result into the catalog: same-id entries are refreshed, new ones appended.
    pub fn merge_catalog(&mut self, items: Vec<E>) {
        let mut merged: IndexMap<i64, E> = self.catalog.drain(..).map(|entity| (entity.id(), entity)).collect();
        for entity in items {
            merged.insert(entity.id(), entity);
        }
        self.catalog = merged.into_values().collect();
        self.loading = false;
    }

    /// Drop selected entities the catalog does not carry. Returns whether the selection changed.
    pub fn retain_selected_in_catalog(&mut self) -> bool {
        let before = self.selected.len();
        let catalog = &self.catalog;
        self.selected.retain(|id, _| catalog.iter().any(|entity| entity.id() == *id));
        before != self.selected.len()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn status(&self) -> OptionsStatus {
        OptionsStatus::of(self.visible_options().len(), self.loading)
    }

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
