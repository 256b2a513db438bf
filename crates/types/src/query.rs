use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{Connection, Variable};

/// What the host should fetch for the selected variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryMode {
    /// Logged history values.
    #[default]
    Live,
    Alarm,
    Event,
}

impl QueryMode {
    pub const ALL: [QueryMode; 3] = [QueryMode::Live, QueryMode::Alarm, QueryMode::Event];

    /// Next mode in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            QueryMode::Live => QueryMode::Alarm,
            QueryMode::Alarm => QueryMode::Event,
            QueryMode::Event => QueryMode::Live,
        }
    }

    /// Previous mode in display order, wrapping around.
    pub fn previous(self) -> Self {
        match self {
            QueryMode::Live => QueryMode::Event,
            QueryMode::Alarm => QueryMode::Live,
            QueryMode::Event => QueryMode::Alarm,
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QueryMode::Live => "Live",
            QueryMode::Alarm => "Alarm",
            QueryMode::Event => "Event",
        };
        f.write_str(label)
    }
}

/// One complete, immutable emission of the assembled editor state.
///
/// Invariants: `page_size > 0`; `page_index` is never negative by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySnapshot {
    pub connection_id: Option<i64>,
    pub connection_text: String,
    pub variable_ids: Vec<i64>,
    pub variable_names: Vec<String>,
    pub mode: QueryMode,
    pub prefix: String,
    pub tag_list: String,
    pub page_index: u32,
    pub page_size: u32,
}

impl Default for QuerySnapshot {
    fn default() -> Self {
        Self {
            connection_id: None,
            connection_text: String::new(),
            variable_ids: Vec::new(),
            variable_names: Vec::new(),
            mode: QueryMode::default(),
            prefix: String::new(),
            tag_list: String::new(),
            page_index: 0,
            page_size: 10,
        }
    }
}

impl QuerySnapshot {
    /// Comma-joined variable ids; the backend reads this as its variable filter.
    pub fn query_text(&self) -> String {
        self.variable_ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// A live query without variables has nothing to fetch.
    pub fn is_runnable(&self) -> bool {
        !(self.mode == QueryMode::Live && self.variable_ids.is_empty())
    }
}

/// Query object handed to the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostQuery {
    pub query_text: String,
    pub connection_id: Option<i64>,
    pub connection_text: String,
    pub variable_ids: Vec<i64>,
    pub variable_names: Vec<String>,
    pub is_live: bool,
    pub is_alarm: bool,
    pub is_event: bool,
    pub prefix: String,
    pub opc_tags: String,
    pub page_index: u32,
    pub page_size: u32,
    /// Connection catalog in effect when the query was emitted.
    pub connections: Vec<Connection>,
    /// Selected variables, used by the backend to label result frames.
    pub variables: Vec<Variable>,
}

impl HostQuery {
    pub fn from_snapshot(snapshot: &QuerySnapshot, connections: &[Connection], variables: &[Variable]) -> Self {
        Self {
            query_text: snapshot.query_text(),
            connection_id: snapshot.connection_id,
            connection_text: snapshot.connection_text.clone(),
            variable_ids: snapshot.variable_ids.clone(),
            variable_names: snapshot.variable_names.clone(),
            is_live: snapshot.mode == QueryMode::Live,
            is_alarm: snapshot.mode == QueryMode::Alarm,
            is_event: snapshot.mode == QueryMode::Event,
            prefix: snapshot.prefix.clone(),
            opc_tags: snapshot.tag_list.clone(),
            page_index: snapshot.page_index,
            page_size: snapshot.page_size,
            connections: connections.to_vec(),
            variables: variables.to_vec(),
        }
    }

    /// Mode encoded by the boolean flags. Live wins when several are set.
    pub fn mode(&self) -> QueryMode {
        if self.is_live {
            QueryMode::Live
        } else if self.is_alarm {
            QueryMode::Alarm
        } else if self.is_event {
            QueryMode::Event
        } else {
            QueryMode::default()
        }
    }

    /// Whether the host should run this query at all.
    pub fn is_runnable(&self) -> bool {
        !(self.is_live && self.query_text.trim().is_empty())
    }

    /// Rebuild the snapshot a previously emitted query was produced from.
    ///
    /// A page size of zero (an absent field) falls back to the snapshot default.
    pub fn to_snapshot(&self) -> QuerySnapshot {
        let defaults = QuerySnapshot::default();
        QuerySnapshot {
            connection_id: self.connection_id,
            connection_text: self.connection_text.clone(),
            variable_ids: self.variable_ids.clone(),
            variable_names: self.variable_names.clone(),
            mode: self.mode(),
            prefix: self.prefix.clone(),
            tag_list: self.opc_tags.clone(),
            page_index: self.page_index,
            page_size: if self.page_size == 0 {
                defaults.page_size
            } else {
                self.page_size
            },
        }
    }
}
