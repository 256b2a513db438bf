use inview_types::CatalogEntity;

/// Case-insensitive substring match of `search_text` against an option's label or value.
///
/// An empty search text matches everything.
pub fn matches_search(label: &str, value: &str, search_text: &str) -> bool {
    if search_text.is_empty() {
        return true;
    }
    let needle = search_text.to_lowercase();
    label.to_lowercase().contains(&needle) || value.to_lowercase().contains(&needle)
}

/// Catalog entries whose label or stringified id contains `search_text`.
pub fn filter_catalog<E: CatalogEntity>(catalog: &[E], search_text: &str) -> Vec<E> {
    catalog
        .iter()
        .filter(|entity| matches_search(entity.display_name(), &entity.option_value(), search_text))
        .cloned()
        .collect()
}
