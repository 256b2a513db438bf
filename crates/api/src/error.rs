//! Error types for resource lookups.

use inview_types::Resource;
use thiserror::Error;

/// Failure of a single lookup. The original cause is preserved as the source.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The request never produced a readable response.
    #[error("{resource} lookup failed: {source}")]
    Network {
        resource: Resource,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("{resource} lookup returned HTTP {status}: {body}")]
    Status { resource: Resource, status: u16, body: String },

    /// The body was not a JSON array of the expected records.
    #[error("{resource} lookup returned a malformed body: {source}")]
    Decode {
        resource: Resource,
        #[source]
        source: serde_json::Error,
    },
}

impl LookupError {
    pub fn resource(&self) -> Resource {
        match self {
            LookupError::Network { resource, .. } | LookupError::Status { resource, .. } | LookupError::Decode { resource, .. } => {
                *resource
            }
        }
    }

    /// Whether the failure happened before a response could be read.
    pub fn is_network(&self) -> bool {
        matches!(self, LookupError::Network { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, LookupError::Decode { .. })
    }
}
