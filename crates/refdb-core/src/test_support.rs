//! Record fixtures shared by unit tests.

use crate::{
    auth::password_digest,
    model::{AUTH_ATTRIBUTE, ObjectType, PrimaryKey, Record, RecordRef},
    store::MemoryStore,
};

/// Password accepted by every fixture maintainer.
pub(crate) const PASSWORD: &str = "test";

pub(crate) fn key(value: &str) -> PrimaryKey {
    PrimaryKey::try_new(value).expect("fixture key must be valid")
}

pub(crate) fn rref(object_type: ObjectType, value: &str) -> RecordRef {
    RecordRef::new(object_type, key(value))
}

pub(crate) fn mntner(name: &str, admin_c: &[&str], mnt_by: &str) -> Record {
    let mut record = Record::new(rref(ObjectType::Mntner, name))
        .with_attribute("descr", "Maintainer")
        .with_attribute(AUTH_ATTRIBUTE, format!("{} #test", password_digest(PASSWORD)));
    for contact in admin_c {
        record = record.with_attribute("admin-c", *contact);
    }

    record.with_attribute("mnt-by", mnt_by)
}

pub(crate) fn person(nic_hdl: &str, mnt_by: &str) -> Record {
    Record::new(rref(ObjectType::Person, nic_hdl))
        .with_attribute("address", "Singel 258")
        .with_attribute("mnt-by", mnt_by)
}

pub(crate) fn role(nic_hdl: &str, mnt_by: &str) -> Record {
    Record::new(rref(ObjectType::Role, nic_hdl))
        .with_attribute("address", "Singel 258")
        .with_attribute("mnt-by", mnt_by)
}

pub(crate) fn organisation(org: &str, mnt_by: &str) -> Record {
    Record::new(rref(ObjectType::Organisation, org))
        .with_attribute("org-type", "other")
        .with_attribute("mnt-by", mnt_by)
}

/// `OWNER-MNT <-> TP1-TEST` plus two unreferenced roles.
///
/// OWNER-MNT names TP1-TEST as admin-c and maintains itself; TP1-TEST is
/// maintained by OWNER-MNT.
pub(crate) fn owner_fixture() -> MemoryStore {
    let store = MemoryStore::new();
    store.put(Record::new(rref(ObjectType::Role, "DR1-TEST")));
    store.put(Record::new(rref(ObjectType::Role, "TR1-TEST")));
    store.put(mntner("OWNER-MNT", &["TP1-TEST"], "OWNER-MNT"));
    store.put(person("TP1-TEST", "OWNER-MNT"));

    store
}
