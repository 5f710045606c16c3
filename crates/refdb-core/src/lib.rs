//! Core runtime for refdb: the registry object model, reverse reference
//! index, reference trees, exclusivity analysis and the two-phase cascading
//! delete executor.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod analyze;
pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod graph;
pub mod index;
pub mod model;
pub mod obs;
pub mod session;
pub mod store;
pub mod tree;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, executors, stores, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        analyze::{DeleteDecision, Rejection, RejectionKind, SupportSet},
        auth::Credentials,
        model::{ObjectType, PrimaryKey, Record, RecordRef},
        tree::ReferenceTreeNode,
    };
}
