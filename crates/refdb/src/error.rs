use candid::CandidType;
use derive_more::Display;
use refdb_core::{
    analyze::Rejection,
    error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError, RequestError},
    model::ObjectType,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Generic denial text; the real reason only goes to the logs.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Generic lookup-miss text; the missing key stays in the logs.
pub const NOT_FOUND_MESSAGE: &str = "Not Found";

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Caller-facing status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// An outside record still depends on the support set.
    #[must_use]
    pub fn rejected(rejection: &Rejection) -> Self {
        Self::new(ErrorKind::Rejected, ErrorOrigin::Analyzer, rejection.to_string())
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, ErrorOrigin::Auth, UNAUTHORIZED_MESSAGE)
    }

    #[must_use]
    pub fn unsupported_object_type(object_type: ObjectType) -> Self {
        Self::new(
            ErrorKind::UnsupportedObjectType,
            ErrorOrigin::Request,
            format!("Object type {} is not supported.", object_type.label()),
        )
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let origin = err.origin.into();

        if let Some(request) = err.request_error() {
            let kind = match request {
                RequestError::InvalidObjectType { .. } => ErrorKind::InvalidObjectType,
                RequestError::InvalidPrimaryKey { .. } => ErrorKind::InvalidPrimaryKey,
                RequestError::InvalidSource { .. } => ErrorKind::InvalidSource,
            };
            return Self::new(kind, origin, err.message);
        }

        let kind = match err.class {
            ErrorClass::NotFound => ErrorKind::NotFound,
            ErrorClass::Conflict => ErrorKind::Conflict,
            ErrorClass::Unsupported => ErrorKind::LimitExceeded,
            ErrorClass::Invalid | ErrorClass::Internal | ErrorClass::InvariantViolation => {
                ErrorKind::Internal
            }
        };

        if kind == ErrorKind::NotFound {
            return Self::new(kind, origin, NOT_FOUND_MESSAGE);
        }

        Self::new(kind, origin, err.message)
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(CandidType, Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    InvalidObjectType,
    InvalidPrimaryKey,
    InvalidSource,

    /// The addressed record does not exist.
    NotFound,

    /// Root type never cascades.
    UnsupportedObjectType,

    /// An outside record still depends on the support set.
    Rejected,

    /// Support set larger than the configured bound.
    LimitExceeded,

    Unauthorized,

    /// The store changed underneath the delete; retry.
    Conflict,

    /// The caller cannot remediate this.
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::InvalidObjectType
            | Self::InvalidPrimaryKey
            | Self::InvalidSource
            | Self::UnsupportedObjectType
            | Self::Rejected
            | Self::LimitExceeded => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::Internal => 500,
            Self::Conflict => 503,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Conflict)
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(CandidType, Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Analyzer,
    Auth,
    Config,
    Executor,
    Graph,
    Request,
    Store,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Analyzer => Self::Analyzer,
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Executor => Self::Executor,
            CoreErrorOrigin::Graph => Self::Graph,
            CoreErrorOrigin::Request => Self::Request,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use refdb_core::{
        analyze::RejectionKind,
        model::{PrimaryKey, RecordRef},
    };

    fn rref(object_type: ObjectType, key: &str) -> RecordRef {
        RecordRef::new(object_type, PrimaryKey::try_new(key).unwrap())
    }

    #[test]
    fn request_errors_keep_their_message() {
        let err = Error::from(InternalError::from(RequestError::InvalidObjectType {
            name: "invalid".to_string(),
        }));

        assert_eq!(err.kind, ErrorKind::InvalidObjectType);
        assert_eq!(err.origin, ErrorOrigin::Request);
        assert_eq!(err.message, "Invalid object type: invalid");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn store_classes_map_to_statuses() {
        let not_found = Error::from(InternalError::store_not_found("[mntner] GONE-MNT"));
        assert_eq!(not_found.kind, ErrorKind::NotFound);
        assert_eq!(not_found.status_code(), 404);
        assert_eq!(not_found.message, NOT_FOUND_MESSAGE);

        let conflict = Error::from(InternalError::store_conflict("[person] TP1-TEST", "stale"));
        assert_eq!(conflict.kind, ErrorKind::Conflict);
        assert_eq!(conflict.status_code(), 503);
        assert!(conflict.is_retryable());

        let internal = Error::from(InternalError::store_internal("disk on fire"));
        assert_eq!(internal.kind, ErrorKind::Internal);
        assert!(!internal.is_retryable());
    }

    #[test]
    fn core_origins_keep_their_public_name() {
        let graph = Error::from(InternalError::new(
            ErrorClass::InvariantViolation,
            CoreErrorOrigin::Graph,
            "dangling node id",
        ));
        assert_eq!(graph.kind, ErrorKind::Internal);
        assert_eq!(graph.origin, ErrorOrigin::Graph);

        let store = Error::from(InternalError::store_internal("disk on fire"));
        assert_eq!(store.origin, ErrorOrigin::Store);
    }

    #[test]
    fn declined_deletes_become_client_errors() {
        let unsupported = Error::unsupported_object_type(ObjectType::Organisation);
        assert_eq!(unsupported.message, "Object type ORGANISATION is not supported.");
        assert_eq!(unsupported.status_code(), 400);

        let rejected = Error::rejected(&Rejection {
            blocking: rref(ObjectType::Mntner, "ANOTHER-MNT"),
            blocked: rref(ObjectType::Person, "TP1-TEST"),
            kind: RejectionKind::ReferencedDependent,
        });
        assert_eq!(rejected.kind, ErrorKind::Rejected);
        assert_eq!(
            rejected.message,
            "Referencing object TP1-TEST itself is referenced by ANOTHER-MNT"
        );

        let denied = Error::unauthorized();
        assert_eq!(denied.status_code(), 401);
        assert_eq!(denied.message, UNAUTHORIZED_MESSAGE);
    }

    #[test]
    fn public_error_serializes_kind_and_origin() {
        let err = Error::new(ErrorKind::Conflict, ErrorOrigin::Store, "retry");

        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({ "kind": "Conflict", "origin": "Store", "message": "retry" })
        );
    }
}
