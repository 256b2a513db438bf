use std::fmt;

use serde::{Deserialize, Serialize};

/// Resource endpoints exposed under the data source base path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Connections,
    Variables,
}

impl Resource {
    /// Path segment appended to the base path.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Connections => "Connections",
            Resource::Variables => "Variables",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Paginated, text-filtered lookup against either resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupQuery {
    /// Scope for variable lookups. Ignored by the connections endpoint.
    pub connection_id: Option<i64>,
    pub skip_connection_filter: bool,
    pub search_text: String,
    pub page_index: u32,
    pub page_size: u32,
    pub skip_pagination: bool,
}

impl Default for LookupQuery {
    fn default() -> Self {
        Self {
            connection_id: None,
            skip_connection_filter: true,
            search_text: String::new(),
            page_index: 0,
            page_size: 50,
            skip_pagination: true,
        }
    }
}

impl LookupQuery {
    /// Query parameters for the given endpoint, in the names that endpoint expects.
    ///
    /// `connId` is omitted when no connection is selected so an unscoped lookup
    /// is never mistaken for a lookup scoped to connection `0`.
    pub fn to_query_pairs(&self, resource: Resource) -> Vec<(&'static str, String)> {
        match resource {
            Resource::Connections => vec![
                ("skipConnectionFilter", self.skip_connection_filter.to_string()),
                ("searchText", self.search_text.clone()),
                ("pageIndex", self.page_index.to_string()),
                ("pageSize", self.page_size.to_string()),
            ],
            Resource::Variables => {
                let mut pairs = Vec::with_capacity(6);
                if let Some(connection_id) = self.connection_id {
                    pairs.push(("connId", connection_id.to_string()));
                }
                pairs.push(("skipFilterConns", self.skip_connection_filter.to_string()));
                pairs.push(("likeParam", self.search_text.clone()));
                pairs.push(("page", self.page_index.to_string()));
                pairs.push(("itemsPerPage", self.page_size.to_string()));
                pairs.push(("skipPagination", self.skip_pagination.to_string()));
                pairs
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(pairs: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        pairs.iter().find(|(name, _)| *name == key).map(|(_, value)| value.as_str())
    }

    #[test]
    fn unscoped_variable_lookup_omits_connection_id() {
        let pairs = LookupQuery::default().to_query_pairs(Resource::Variables);
        assert_eq!(value(&pairs, "connId"), None);
        assert_eq!(value(&pairs, "skipFilterConns"), Some("true"));
        assert_eq!(value(&pairs, "skipPagination"), Some("true"));
    }

    #[test]
    fn scoped_variable_lookup_uses_endpoint_names() {
        let query = LookupQuery {
            connection_id: Some(7),
            skip_connection_filter: false,
            search_text: "temp".into(),
            page_index: 2,
            page_size: 25,
            skip_pagination: false,
        };
        let pairs = query.to_query_pairs(Resource::Variables);
        assert_eq!(value(&pairs, "connId"), Some("7"));
        assert_eq!(value(&pairs, "skipFilterConns"), Some("false"));
        assert_eq!(value(&pairs, "likeParam"), Some("temp"));
        assert_eq!(value(&pairs, "page"), Some("2"));
        assert_eq!(value(&pairs, "itemsPerPage"), Some("25"));
    }

    #[test]
    fn connection_lookup_ignores_scope() {
        let query = LookupQuery {
            connection_id: Some(3),
            search_text: "plc".into(),
            ..LookupQuery::default()
        };
        let pairs = query.to_query_pairs(Resource::Connections);
        assert_eq!(value(&pairs, "connId"), None);
        assert_eq!(value(&pairs, "searchText"), Some("plc"));
        assert_eq!(value(&pairs, "pageSize"), Some("50"));
    }
}
