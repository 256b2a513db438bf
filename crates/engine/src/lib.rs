//! Selection and query assembly engine for the InView query editor.
//!
//! Modules:
//! - `filter`: case-insensitive substring matching for option lists
//! - `debounce`: trailing-edge debounce for search text
//! - `sequence`: per-field request tokens that recognise stale responses
//! - `selector`: single- and multi-choice selector state
//! - `coordinator`: connection → variable dependent selection and lookups
//! - `assembly`: query form fields and the pure snapshot assembly
//! - `editor`: the editor facade that notifies the host on every change
//! - `dispatch`: executes lookup requests against a catalog source
//!
//! The engine never performs I/O on its own. Transitions return
//! [`LookupRequest`]s; the front end executes them (see [`execute_lookup`])
//! and feeds the [`LookupResponse`]s back through `apply`.

pub mod assembly;
pub mod coordinator;
pub mod debounce;
mod dispatch;
pub mod editor;
pub mod filter;
pub mod selector;
pub mod sequence;

pub use assembly::{QueryForm, Selection, assemble};
pub use coordinator::{
    ApplyOutcome, CoordinatorOptions, FetchReason, LookupRequest, LookupResponse, Notice, SelectionCoordinator, Transition,
};
pub use debounce::Debouncer;
pub use dispatch::execute_lookup;
pub use editor::{QueryEditor, QuerySink};
pub use filter::{filter_catalog, matches_search};
pub use selector::{MultiSelector, OptionsStatus, SelectorValue, SingleCommit, SingleSelector};
pub use sequence::{RequestSequence, RequestToken};
