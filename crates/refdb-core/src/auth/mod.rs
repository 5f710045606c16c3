//! Authorization gate.
//!
//! The engine asks one question per record: may these credentials modify
//! it? Credential verification itself is a pluggable capability
//! ([`CredentialMatcher`]); [`MaintainerGate`] supplies the registry rule
//! that a record is authorized through the maintainers in its `mnt-by`.


use crate::{
    error::InternalError,
    model::{AUTH_ATTRIBUTE, ObjectType, PrimaryKey, Record, RecordRef},
    store::RecordStore,
};
use sha2::{Digest, Sha256};
use std::{collections::BTreeSet, fmt};

/// Scheme prefix for SHA-256 password digests in `auth` attributes.
pub const SHA256_PW_SCHEME: &str = "SHA256-PW";

/// Render `password` as an `auth` attribute value.
#[must_use]
pub fn password_digest(password: &str) -> String {
    format!("{SHA256_PW_SCHEME} {}", sha256_hex(password))
}

fn sha256_hex(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

// Key-based auth schemes are named by the key id itself.
const KEY_PREFIXES: [&str; 2] = ["PGPKEY-", "X509-"];

///
/// Credentials
///
/// Caller-supplied secrets. Passwords never appear in `Debug` output.
///

#[derive(Clone, Default, Eq, PartialEq)]
pub struct Credentials {
    passwords: Vec<String>,
    key_refs: Vec<String>,
}

impl Credentials {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn password(password: impl Into<String>) -> Self {
        Self::default().with_password(password)
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.passwords.push(password.into());
        self
    }

    /// Add a reference to a key the caller has signed with (e.g. `PGPKEY-28F6CD6C`).
    #[must_use]
    pub fn with_key_ref(mut self, key_ref: impl Into<String>) -> Self {
        self.key_refs.push(key_ref.into());
        self
    }

    pub fn passwords(&self) -> impl Iterator<Item = &str> {
        self.passwords.iter().map(String::as_str)
    }

    pub fn key_refs(&self) -> impl Iterator<Item = &str> {
        self.key_refs.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passwords.is_empty() && self.key_refs.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("passwords", &self.passwords.len())
            .field("key_refs", &self.key_refs)
            .finish()
    }
}

///
/// AuthDecision
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AuthDecision {
    Granted,
    Denied(DenialReason),
}

impl AuthDecision {
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

///
/// DenialReason
///
/// Kept for logs only; callers see a generic denial.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DenialReason {
    NoCredentials,
    NoMaintainer,
    NotAuthenticated { maintainers: Vec<PrimaryKey> },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => f.write_str("no credentials supplied"),
            Self::NoMaintainer => f.write_str("record has no maintainer"),
            Self::NotAuthenticated { maintainers } => {
                let names = maintainers
                    .iter()
                    .map(PrimaryKey::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "not authenticated by: {names}")
            }
        }
    }
}

///
/// AuthorizationGate
///

pub trait AuthorizationGate: Send + Sync {
    fn authorize(
        &self,
        record: &Record,
        credentials: &Credentials,
    ) -> Result<AuthDecision, InternalError>;
}

///
/// CredentialMatcher
///
/// Decides whether one `auth` attribute value is satisfied by the supplied
/// credentials.
///

pub trait CredentialMatcher: Send + Sync {
    fn matches(&self, auth: &str, credentials: &Credentials) -> bool;
}

///
/// DigestMatcher
///
/// `SHA256-PW <hex>` against supplied passwords; `PGPKEY-*` and `X509-*`
/// against supplied key references (signature checking happens upstream).
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DigestMatcher;

impl CredentialMatcher for DigestMatcher {
    fn matches(&self, auth: &str, credentials: &Credentials) -> bool {
        let mut parts = auth.split_whitespace();
        let (Some(scheme), rest) = (parts.next(), parts.next()) else {
            return false;
        };

        if scheme.eq_ignore_ascii_case(SHA256_PW_SCHEME) {
            let Some(expected) = rest else {
                return false;
            };
            return credentials
                .passwords()
                .any(|password| sha256_hex(password).eq_ignore_ascii_case(expected));
        }

        let is_key = KEY_PREFIXES.iter().any(|prefix| {
            scheme.len() > prefix.len()
                && scheme
                    .get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        });

        is_key
            && credentials
                .key_refs()
                .any(|key_ref| key_ref.eq_ignore_ascii_case(scheme))
    }
}

///
/// MaintainerGate
///
/// A record is authorized when any maintainer named in its `mnt-by` carries
/// an `auth` value matched by the credentials. Maintainers authorize through
/// their own `mnt-by`.
///

pub struct MaintainerGate<'a, S: RecordStore + ?Sized, M = DigestMatcher> {
    store: &'a S,
    matcher: M,
}

impl<'a, S: RecordStore + ?Sized> MaintainerGate<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self {
            store,
            matcher: DigestMatcher,
        }
    }
}

impl<'a, S: RecordStore + ?Sized, M: CredentialMatcher> MaintainerGate<'a, S, M> {
    #[must_use]
    pub const fn with_matcher(store: &'a S, matcher: M) -> Self {
        Self { store, matcher }
    }
}

impl<S: RecordStore + ?Sized, M: CredentialMatcher> AuthorizationGate for MaintainerGate<'_, S, M> {
    fn authorize(
        &self,
        record: &Record,
        credentials: &Credentials,
    ) -> Result<AuthDecision, InternalError> {
        let maintainers = record.maintainers().collect::<BTreeSet<_>>();
        if maintainers.is_empty() {
            return Ok(AuthDecision::Denied(DenialReason::NoMaintainer));
        }
        if credentials.is_empty() {
            return Ok(AuthDecision::Denied(DenialReason::NoCredentials));
        }

        for name in &maintainers {
            let key = RecordRef::new(ObjectType::Mntner, name.clone());
            let Some(maintainer) = self.store.get(&key)? else {
                continue;
            };

            if maintainer
                .record
                .values(AUTH_ATTRIBUTE)
                .any(|auth| self.matcher.matches(auth, credentials))
            {
                return Ok(AuthDecision::Granted);
            }
        }

        Ok(AuthDecision::Denied(DenialReason::NotAuthenticated {
            maintainers: maintainers.into_iter().collect(),
        }))
    }
}
