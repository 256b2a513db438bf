use async_trait::async_trait;
use inview_types::{Connection, LookupQuery, Variable};

use crate::LookupError;

/// Anything that can answer catalog lookups for the editor.
///
/// [`crate::InviewClient`] is the HTTP implementation; tests and offline front
/// ends can provide their own.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn connections(&self, query: &LookupQuery) -> Result<Vec<Connection>, LookupError>;

    async fn variables(&self, query: &LookupQuery) -> Result<Vec<Variable>, LookupError>;
}
