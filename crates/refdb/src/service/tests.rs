use super::*;
use crate::error::ErrorKind;
use refdb_core::{
    auth::{MaintainerGate, password_digest},
    config::RegistryConfig,
    model::{AUTH_ATTRIBUTE, ObjectType, PrimaryKey, Record},
    store::MemoryStore,
};

const PASSWORD: &str = "test";

fn rref(object_type: ObjectType, key: &str) -> RecordRef {
    RecordRef::new(object_type, PrimaryKey::try_new(key).unwrap())
}

fn mntner(name: &str, admin_c: &str) -> Record {
    Record::new(rref(ObjectType::Mntner, name))
        .with_attribute("admin-c", admin_c)
        .with_attribute(AUTH_ATTRIBUTE, password_digest(PASSWORD))
        .with_attribute("mnt-by", name)
}

fn maintained(object_type: ObjectType, key: &str, mnt_by: &str) -> Record {
    Record::new(rref(object_type, key))
        .with_attribute("address", "Singel 258")
        .with_attribute("mnt-by", mnt_by)
}

// OWNER-MNT and TP1-TEST reference each other; DR1-TEST stands alone.
fn registry() -> MemoryStore {
    let store = MemoryStore::new();
    store.put(Record::new(rref(ObjectType::Role, "DR1-TEST")));
    store.put(mntner("OWNER-MNT", "TP1-TEST"));
    store.put(maintained(ObjectType::Person, "TP1-TEST", "OWNER-MNT"));

    store
}

fn with_service<T>(
    store: &MemoryStore,
    f: impl FnOnce(&ReferencesService<'_, MemoryStore, MaintainerGate<'_, MemoryStore>>) -> T,
) -> T {
    let gate = MaintainerGate::new(store);
    let config = RegistryConfig::default();

    f(&ReferencesService::new(RegistrySession::new(
        store, &gate, &config,
    )))
}

fn delete(store: &MemoryStore, object_type: &str, key: &str) -> Result<DeletedRecords, Error> {
    with_service(store, |service| {
        service.delete_references("TEST", object_type, key, &Credentials::password(PASSWORD))
    })
}

#[test]
fn reference_tree_serializes_nested_nodes() {
    let store = registry();
    let tree = with_service(&store, |service| {
        service.reference_tree("TEST", "person", "TP1-TEST")
    })
    .unwrap();

    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json["primaryKey"], "TP1-TEST");
    assert_eq!(json["objectType"], "person");
    assert_eq!(json["incoming"][0]["primaryKey"], "OWNER-MNT");
    assert_eq!(json["outgoing"][0]["objectType"], "mntner");
}

#[test]
fn reference_tree_of_missing_record_is_404() {
    let store = registry();
    let err = with_service(&store, |service| {
        service.reference_tree("TEST", "mntner", "invalid")
    })
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.status_code(), 404);
    assert_eq!(err.message, "Not Found");
}

#[test]
fn invalid_object_type_is_400_with_name() {
    let store = registry();
    let err = with_service(&store, |service| {
        service.reference_tree("TEST", "invalid", "OWNER-MNT")
    })
    .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.message, "Invalid object type: invalid");
}

#[test]
fn deleting_mntner_removes_its_contact() {
    let store = registry();
    let deleted = delete(&store, "mntner", "OWNER-MNT").unwrap();

    assert_eq!(
        deleted.deleted,
        vec![
            rref(ObjectType::Mntner, "OWNER-MNT"),
            rref(ObjectType::Person, "TP1-TEST"),
        ]
    );
    assert_eq!(store.keys(), vec![rref(ObjectType::Role, "DR1-TEST")]);
}

#[test]
fn deleting_person_removes_its_maintainer() {
    let store = registry();
    delete(&store, "person", "TP1-TEST").unwrap();

    assert!(!store.exists(&rref(ObjectType::Mntner, "OWNER-MNT")));
    assert!(!store.exists(&rref(ObjectType::Person, "TP1-TEST")));
}

#[test]
fn deleting_mntner_takes_all_exclusive_dependents() {
    let store = registry();
    store.put(maintained(ObjectType::Person, "TP2-TEST", "OWNER-MNT"));
    store.put(maintained(ObjectType::Role, "TR2-TEST", "OWNER-MNT"));

    let deleted = delete(&store, "mntner", "OWNER-MNT").unwrap();

    assert_eq!(deleted.deleted.len(), 4);
    assert_eq!(store.len(), 1);
}

#[test]
fn deleting_outgoing_only_record_leaves_its_targets() {
    let store = registry();
    store.put(maintained(ObjectType::Role, "TR2-TEST", "OWNER-MNT"));

    let deleted = delete(&store, "role", "TR2-TEST").unwrap();

    assert_eq!(deleted.deleted, vec![rref(ObjectType::Role, "TR2-TEST")]);
    assert!(store.exists(&rref(ObjectType::Mntner, "OWNER-MNT")));
}

#[test]
fn organisation_root_is_not_supported() {
    let store = registry();
    store.put(maintained(ObjectType::Organisation, "ORG-TO1-TEST", "OWNER-MNT"));

    let err = delete(&store, "organisation", "ORG-TO1-TEST").unwrap_err();

    assert_eq!(err.kind, ErrorKind::UnsupportedObjectType);
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.message, "Object type ORGANISATION is not supported.");
}

#[test]
fn dependent_used_by_another_maintainer_is_rejected() {
    let store = registry();
    store.put(mntner("ANOTHER-MNT", "TP1-TEST"));

    let err = delete(&store, "mntner", "OWNER-MNT").unwrap_err();

    assert_eq!(err.kind, ErrorKind::Rejected);
    assert_eq!(err.status_code(), 400);
    assert_eq!(
        err.message,
        "Referencing object TP1-TEST itself is referenced by ANOTHER-MNT"
    );
    assert_eq!(store.len(), 4);
}

#[test]
fn rejection_wins_over_missing_password() {
    let store = registry();
    store.put(mntner("ANOTHER-MNT", "TP1-TEST"));

    let err = with_service(&store, |service| {
        service.delete_references("TEST", "mntner", "OWNER-MNT", &Credentials::none())
    })
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Rejected);
    assert_eq!(err.status_code(), 400);
    assert_eq!(
        err.message,
        "Referencing object TP1-TEST itself is referenced by ANOTHER-MNT"
    );
    assert_eq!(store.len(), 4);
}

#[test]
fn missing_password_is_401() {
    let store = registry();
    let err = with_service(&store, |service| {
        service.delete_references("TEST", "mntner", "OWNER-MNT", &Credentials::none())
    })
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unauthorized);
    assert_eq!(err.status_code(), 401);
    assert_eq!(store.len(), 3);
}

#[test]
fn deleting_missing_record_is_404() {
    let store = registry();
    let err = delete(&store, "mntner", "invalid").unwrap_err();

    assert_eq!(err.status_code(), 404);
    assert_eq!(err.message, "Not Found");
}

#[test]
fn delete_many_removes_every_root() {
    let store = registry();
    let deleted = with_service(&store, |service| {
        service.delete_many(
            "TEST",
            &[("mntner", "OWNER-MNT"), ("person", "TP1-TEST")],
            &Credentials::password(PASSWORD),
        )
    })
    .unwrap();

    assert_eq!(deleted.deleted.len(), 2);
}

#[test]
fn oversized_support_set_is_a_client_error() {
    let store = registry();
    let gate = MaintainerGate::new(&store);
    let mut config = RegistryConfig::default();
    config.delete.max_support_set = 1;
    let service = ReferencesService::new(RegistrySession::new(&store, &gate, &config));

    let err = service
        .delete_references("TEST", "mntner", "OWNER-MNT", &Credentials::password(PASSWORD))
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::LimitExceeded);
    assert_eq!(err.status_code(), 400);
    assert_eq!(store.len(), 3);
}
