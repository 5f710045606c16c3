use crate::model::object_type::ObjectType;
use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute holding maintainer credentials.
pub const AUTH_ATTRIBUTE: &str = "auth";

///
/// AttributeType
///
/// Reference-bearing attribute slots. Each slot names the object types its
/// values may resolve to.
///

#[derive(
    CandidType, Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeType {
    AdminC,
    TechC,
    ZoneC,
    AbuseC,
    MntBy,
    MntLower,
    MntRoutes,
    MntDomains,
    MntRef,
    MntIrt,
    Org,
    Origin,
}

impl AttributeType {
    pub const ALL: [Self; 12] = [
        Self::AdminC,
        Self::TechC,
        Self::ZoneC,
        Self::AbuseC,
        Self::MntBy,
        Self::MntLower,
        Self::MntRoutes,
        Self::MntDomains,
        Self::MntRef,
        Self::MntIrt,
        Self::Org,
        Self::Origin,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AdminC => "admin-c",
            Self::TechC => "tech-c",
            Self::ZoneC => "zone-c",
            Self::AbuseC => "abuse-c",
            Self::MntBy => "mnt-by",
            Self::MntLower => "mnt-lower",
            Self::MntRoutes => "mnt-routes",
            Self::MntDomains => "mnt-domains",
            Self::MntRef => "mnt-ref",
            Self::MntIrt => "mnt-irt",
            Self::Org => "org",
            Self::Origin => "origin",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Object types a value in this slot may resolve to.
    #[must_use]
    pub const fn targets(self) -> &'static [ObjectType] {
        match self {
            Self::AdminC | Self::TechC | Self::ZoneC => &[ObjectType::Person, ObjectType::Role],
            Self::AbuseC => &[ObjectType::Role],
            Self::MntBy
            | Self::MntLower
            | Self::MntRoutes
            | Self::MntDomains
            | Self::MntRef => &[ObjectType::Mntner],
            Self::MntIrt => &[ObjectType::Irt],
            Self::Org => &[ObjectType::Organisation],
            Self::Origin => &[ObjectType::AutNum],
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

///
/// Attribute
///
/// One `name: value` line of a record, kept verbatim.
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name)
    }

    /// Split the value into its list items, dropping any trailing `#` comment.
    pub fn items(&self) -> impl Iterator<Item = &str> {
        let value = self
            .value
            .split_once('#')
            .map_or(self.value.as_str(), |(head, _)| head);

        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
    }
}

///
/// TESTS
///
