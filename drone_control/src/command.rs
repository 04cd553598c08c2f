//! Operator command handling root.
//!
//! Directive parsing and the ingestion activity that applies directives to
//! the shared control state.

pub mod directive;
pub mod ingest;
