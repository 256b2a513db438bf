//! Shared type definitions for the InView query editor.
//!
//! The types in this crate cross crate boundaries: catalog entities returned by
//! the resource endpoints, the lookup query sent to them, and the query objects
//! produced by the editor for the host runtime.

mod entity;
mod lookup;
mod query;

pub use entity::{CatalogEntity, Connection, SelectionOption, Variable};
pub use lookup::{LookupQuery, Resource};
pub use query::{HostQuery, QueryMode, QuerySnapshot};
