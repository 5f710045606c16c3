use crate::{error::RequestError, model::attribute::AttributeType};
use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

///
/// ObjectType
///
/// Closed set of registry object types.
/// Declaration order is the canonical ordering used for deterministic output.
///

#[derive(
    CandidType, Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectType {
    AsBlock,
    AsSet,
    AutNum,
    Domain,
    FilterSet,
    Inet6num,
    Inetnum,
    InetRtr,
    Irt,
    KeyCert,
    Mntner,
    Organisation,
    PeeringSet,
    Person,
    Role,
    Route,
    Route6,
    RouteSet,
    RtrSet,
}

impl ObjectType {
    pub const ALL: [Self; 19] = [
        Self::AsBlock,
        Self::AsSet,
        Self::AutNum,
        Self::Domain,
        Self::FilterSet,
        Self::Inet6num,
        Self::Inetnum,
        Self::InetRtr,
        Self::Irt,
        Self::KeyCert,
        Self::Mntner,
        Self::Organisation,
        Self::PeeringSet,
        Self::Person,
        Self::Role,
        Self::Route,
        Self::Route6,
        Self::RouteSet,
        Self::RtrSet,
    ];

    /// Registry name, as it appears in requests and serialized trees.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AsBlock => "as-block",
            Self::AsSet => "as-set",
            Self::AutNum => "aut-num",
            Self::Domain => "domain",
            Self::FilterSet => "filter-set",
            Self::Inet6num => "inet6num",
            Self::Inetnum => "inetnum",
            Self::InetRtr => "inet-rtr",
            Self::Irt => "irt",
            Self::KeyCert => "key-cert",
            Self::Mntner => "mntner",
            Self::Organisation => "organisation",
            Self::PeeringSet => "peering-set",
            Self::Person => "person",
            Self::Role => "role",
            Self::Route => "route",
            Self::Route6 => "route6",
            Self::RouteSet => "route-set",
            Self::RtrSet => "rtr-set",
        }
    }

    /// Upper-case label used in user-facing rejection messages.
    #[must_use]
    pub fn label(self) -> String {
        self.name().replace('-', "_").to_ascii_uppercase()
    }

    /// Whether a record of this type may be the root of (or be swept into)
    /// a cascading delete.
    #[must_use]
    pub const fn is_cascade_eligible(self) -> bool {
        matches!(self, Self::Mntner | Self::Person | Self::Role)
    }

    /// Reference-bearing attribute slots declared by this type.
    #[must_use]
    pub const fn reference_attributes(self) -> &'static [AttributeType] {
        use AttributeType::*;

        match self {
            Self::Mntner => &[AdminC, TechC, MntBy, Org],
            Self::Person => &[MntBy, Org],
            Self::Role => &[AdminC, TechC, AbuseC, MntBy, Org],
            Self::Organisation => &[AdminC, TechC, AbuseC, MntBy, MntRef, Org],
            Self::Inetnum | Self::Inet6num => &[
                AdminC, TechC, AbuseC, MntBy, MntLower, MntRoutes, MntDomains, MntIrt, Org,
            ],
            Self::AutNum => &[AdminC, TechC, AbuseC, MntBy, MntLower, MntRoutes, Org],
            Self::Route | Self::Route6 => &[MntBy, MntLower, MntRoutes, Org, Origin],
            Self::Domain => &[AdminC, TechC, ZoneC, MntBy, Org],
            Self::Irt | Self::KeyCert | Self::PeeringSet | Self::FilterSet => {
                &[AdminC, TechC, MntBy, Org]
            }
            Self::AsBlock | Self::AsSet | Self::InetRtr | Self::RouteSet | Self::RtrSet => {
                &[AdminC, TechC, MntBy, MntLower, Org]
            }
        }
    }

    /// Whether `attribute` is a reference slot on this type.
    #[must_use]
    pub fn declares(self, attribute: AttributeType) -> bool {
        self.reference_attributes().contains(&attribute)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObjectType {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RequestError::InvalidObjectType {
                name: s.to_string(),
            })
    }
}

///
/// TESTS
///
