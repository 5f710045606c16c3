//! ## Crate layout
//! - `core`: the engine (object model, store capability, trees, analysis,
//!   two-phase cascading delete, authorization, config, observability).
//! - `error`: public error taxonomy and caller status mapping.
//! - `service`: request operations returning public errors.
//!
//! The `prelude` module mirrors the vocabulary callers need to issue
//! requests and read responses.

pub use refdb_core as core;

pub mod error;
pub mod service;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{Error, ErrorKind};
pub use service::{DeletedRecords, ReferencesService};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        core::{
            auth::Credentials,
            model::{ObjectType, PrimaryKey, RecordRef},
            tree::ReferenceTreeNode,
        },
        error::{Error, ErrorKind},
        service::{DeletedRecords, ReferencesService},
    };
}
