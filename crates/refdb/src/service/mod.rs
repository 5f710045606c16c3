//! Request-level surface over a [`RegistrySession`].
//!
//! Engine outcomes are folded into the public [`Error`] taxonomy here so that
//! transports only have to render a body and a status code.

#[cfg(test)]
mod tests;

use crate::error::{Error, ErrorKind};
use candid::CandidType;
use refdb_core::{
    analyze::DeleteDecision,
    auth::{AuthorizationGate, Credentials},
    error::InternalError,
    model::RecordRef,
    session::RegistrySession,
    store::RecordStore,
    tree::ReferenceTreeNode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

///
/// DeletedRecords
///
/// Response body of a successful cascading delete, in canonical order.
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRecords {
    pub deleted: Vec<RecordRef>,
}

///
/// ReferencesService
///

pub struct ReferencesService<'a, S: RecordStore + ?Sized, G: AuthorizationGate + ?Sized> {
    session: RegistrySession<'a, S, G>,
}

impl<'a, S, G> ReferencesService<'a, S, G>
where
    S: RecordStore + ?Sized,
    G: AuthorizationGate + ?Sized,
{
    #[must_use]
    pub const fn new(session: RegistrySession<'a, S, G>) -> Self {
        Self { session }
    }

    pub fn reference_tree(
        &self,
        source: &str,
        object_type: &str,
        primary_key: &str,
    ) -> Result<ReferenceTreeNode, Error> {
        self.session
            .reference_tree(source, object_type, primary_key)
            .map_err(public_error)
    }

    pub fn delete_references(
        &self,
        source: &str,
        object_type: &str,
        primary_key: &str,
        credentials: &Credentials,
    ) -> Result<DeletedRecords, Error> {
        let decision = self
            .session
            .delete_references(source, object_type, primary_key, credentials)
            .map_err(public_error)?;

        into_deleted(decision)
    }

    /// Delete several roots at once; all of them go or none do.
    pub fn delete_many(
        &self,
        source: &str,
        roots: &[(&str, &str)],
        credentials: &Credentials,
    ) -> Result<DeletedRecords, Error> {
        let decision = self
            .session
            .delete_many(source, roots, credentials)
            .map_err(public_error)?;

        into_deleted(decision)
    }
}

fn into_deleted(decision: DeleteDecision) -> Result<DeletedRecords, Error> {
    let err = match decision {
        DeleteDecision::Approved(support) => {
            return Ok(DeletedRecords {
                deleted: support.keys().cloned().collect(),
            });
        }
        DeleteDecision::Rejected(rejection) => Error::rejected(&rejection),
        DeleteDecision::Unauthorized => Error::unauthorized(),
        DeleteDecision::UnsupportedObjectType(object_type) => {
            Error::unsupported_object_type(object_type)
        }
    };
    info!(kind = %err.kind, message = %err.message, "cascading delete declined");

    Err(err)
}

// Internal failures and lookup misses keep their detail in the logs only.
fn public_error(err: InternalError) -> Error {
    let detail = err.display_with_class();
    let public = Error::from(err);
    match public.kind {
        ErrorKind::Internal => error!(error = %detail, "reference request failed"),
        ErrorKind::NotFound => debug!(error = %detail, "record not found"),
        _ => {}
    }

    public
}
