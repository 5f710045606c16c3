use crate::{
    error::RequestError,
    model::{
        attribute::{Attribute, AttributeType},
        object_type::ObjectType,
    },
};
use candid::CandidType;
use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest primary key accepted by the registry.
pub const MAX_PRIMARY_KEY_LEN: usize = 254;

///
/// PrimaryKey
///
/// Validated record key: non-empty, no whitespace, bounded length.
///

#[derive(
    CandidType,
    Clone,
    Debug,
    Deref,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct PrimaryKey(String);

impl PrimaryKey {
    pub fn try_new(key: impl Into<String>) -> Result<Self, RequestError> {
        let key = key.into();
        let valid = !key.is_empty()
            && key.len() <= MAX_PRIMARY_KEY_LEN
            && !key.chars().any(char::is_whitespace);

        if valid {
            Ok(Self(key))
        } else {
            Err(RequestError::InvalidPrimaryKey { key })
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PrimaryKey {
    type Error = RequestError;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        Self::try_new(key)
    }
}

impl From<PrimaryKey> for String {
    fn from(key: PrimaryKey) -> Self {
        key.0
    }
}

///
/// RecordRef
///
/// Identity of a record. Ordered by object type, then primary key.
///

#[derive(
    CandidType, Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct RecordRef {
    pub object_type: ObjectType,
    pub primary_key: PrimaryKey,
}

impl RecordRef {
    #[must_use]
    pub const fn new(object_type: ObjectType, primary_key: PrimaryKey) -> Self {
        Self {
            object_type,
            primary_key,
        }
    }

    /// Parse an `(objectType, primaryKey)` request pair.
    pub fn parse(object_type: &str, primary_key: &str) -> Result<Self, RequestError> {
        Ok(Self::new(
            object_type.parse()?,
            PrimaryKey::try_new(primary_key)?,
        ))
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.object_type, self.primary_key)
    }
}

///
/// Revision
///
/// Store-assigned write counter for one record.
///

#[derive(
    CandidType,
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct Revision(pub u64);

///
/// Record
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Record {
    pub key: RecordRef,
    pub attributes: Vec<Attribute>,
}

impl Record {
    #[must_use]
    pub const fn new(key: RecordRef) -> Self {
        Self {
            key,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    #[must_use]
    pub const fn object_type(&self) -> ObjectType {
        self.key.object_type
    }

    /// All list items of attributes named `name`, in record order.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.attributes
            .iter()
            .filter(move |attr| attr.is_named(name))
            .flat_map(Attribute::items)
    }

    /// Reference slots and the keys they name, limited to the slots this
    /// record's type declares. Malformed keys are skipped.
    pub fn references(&self) -> impl Iterator<Item = (AttributeType, PrimaryKey)> + '_ {
        let object_type = self.object_type();

        self.attributes.iter().flat_map(move |attr| {
            let slot = AttributeType::from_name(&attr.name).filter(|slot| object_type.declares(*slot));

            slot.into_iter().flat_map(move |slot| {
                attr.items()
                    .filter_map(move |item| PrimaryKey::try_new(item).ok().map(|key| (slot, key)))
            })
        })
    }

    /// Every record this one could point at: one candidate per slot target
    /// type. The store resolves which candidates actually exist.
    pub fn reference_candidates(&self) -> impl Iterator<Item = (AttributeType, RecordRef)> + '_ {
        self.references().flat_map(|(slot, key)| {
            slot.targets()
                .iter()
                .map(move |target| (slot, RecordRef::new(*target, key.clone())))
        })
    }

    /// Maintainer keys listed in `mnt-by`.
    pub fn maintainers(&self) -> impl Iterator<Item = PrimaryKey> + '_ {
        self.references()
            .filter(|(slot, _)| *slot == AttributeType::MntBy)
            .map(|(_, key)| key)
    }
}

///
/// StoredRecord
///
/// A record together with the revision it was read at.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredRecord {
    pub record: Record,
    pub revision: Revision,
}

///
/// ReferenceEdge
///
/// `from` names `to` in its `via` attribute.
///

#[derive(
    CandidType, Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct ReferenceEdge {
    pub from: RecordRef,
    pub to: RecordRef,
    pub via: AttributeType,
}

///
/// TESTS
///
