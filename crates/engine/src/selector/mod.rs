//! Selector control state.
//!
//! A selector holds a catalog, the current value, the search input and its
//! debouncer. Option lists are derived on demand and never stored.

mod multi;
mod single;

pub use multi::MultiSelector;
pub use single::{SelectorValue, SingleCommit, SingleSelector};

use inview_types::{CatalogEntity, SelectionOption};

/// What an option list shows when it has nothing to offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsStatus {
    /// No options yet and a lookup is outstanding.
    Loading,
    /// The lookup finished with nothing to show.
    Empty,
    Ready,
}

impl OptionsStatus {
    pub(crate) fn of(option_count: usize, loading: bool) -> Self {
        match (option_count, loading) {
            (0, true) => OptionsStatus::Loading,
            (0, false) => OptionsStatus::Empty,
            _ => OptionsStatus::Ready,
        }
    }
}

/// Option for an entity the catalog no longer carries.
///
/// Uses the known name, or the raw id when the name is empty.
pub(crate) fn detached_option<E: CatalogEntity>(entity: &E) -> SelectionOption<E> {
    let mut option = SelectionOption::from_entity(entity);
    if option.label.is_empty() {
        option.label = option.value.clone();
    }
    option
}

pub(crate) fn find_by_value<'a, E: CatalogEntity>(catalog: &'a [E], value: &str) -> Option<&'a E> {
    catalog.iter().find(|entity| entity.option_value() == value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inview_types::Variable;

    #[test]
    fn status_distinguishes_loading_from_empty() {
        assert_eq!(OptionsStatus::of(0, true), OptionsStatus::Loading);
        assert_eq!(OptionsStatus::of(0, false), OptionsStatus::Empty);
        assert_eq!(OptionsStatus::of(3, true), OptionsStatus::Ready);
    }

    #[test]
    fn detached_option_falls_back_to_id() {
        let option = detached_option(&Variable::new(9, ""));
        assert_eq!(option.label, "9");
        assert_eq!(detached_option(&Variable::new(9, "Flow")).label, "Flow");
    }
}
