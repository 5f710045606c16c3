use super::*;
use crate::{
    config::TreeConfig,
    model::Record,
    obs::{CounterMetricsSink, NOOP_SINK},
    store::MemoryStore,
    test_support::{key, mntner, owner_fixture, person, rref},
};
use proptest::prelude::*;

fn node(
    object_type: ObjectType,
    primary_key: &str,
    incoming: Vec<ReferenceTreeNode>,
    outgoing: Vec<ReferenceTreeNode>,
) -> ReferenceTreeNode {
    ReferenceTreeNode {
        primary_key: key(primary_key),
        object_type,
        incoming,
        outgoing,
    }
}

fn leaf(object_type: ObjectType, primary_key: &str) -> ReferenceTreeNode {
    node(object_type, primary_key, Vec::new(), Vec::new())
}

fn build(store: &MemoryStore, root: &RecordRef) -> ReferenceTreeNode {
    TreeBuilder::new(store, &TreeConfig::default())
        .build(root, &NOOP_SINK)
        .unwrap()
}

#[test]
fn mntner_tree_expands_both_directions_and_cuts_cycles() {
    let store = owner_fixture();
    let tree = build(&store, &rref(ObjectType::Mntner, "OWNER-MNT"));

    let contact = || {
        node(
            ObjectType::Person,
            "TP1-TEST",
            vec![leaf(ObjectType::Mntner, "OWNER-MNT")],
            vec![leaf(ObjectType::Mntner, "OWNER-MNT")],
        )
    };
    // OWNER-MNT maintains itself; that edge is not rendered.
    let expected = node(
        ObjectType::Mntner,
        "OWNER-MNT",
        vec![contact()],
        vec![contact()],
    );

    assert_eq!(tree, expected);
}

#[test]
fn self_reference_is_not_a_child() {
    let store = MemoryStore::new();
    store.put(mntner("SELF-MNT", &[], "SELF-MNT"));

    let tree = build(&store, &rref(ObjectType::Mntner, "SELF-MNT"));

    assert_eq!(tree, leaf(ObjectType::Mntner, "SELF-MNT"));
}

#[test]
fn unreferenced_record_is_a_single_leaf() {
    let store = owner_fixture();
    let tree = build(&store, &rref(ObjectType::Role, "DR1-TEST"));

    assert_eq!(tree, leaf(ObjectType::Role, "DR1-TEST"));
    assert!(tree.is_leaf());
}

#[test]
fn serialized_leaves_keep_empty_lists() {
    let store = owner_fixture();
    let tree = build(&store, &rref(ObjectType::Role, "DR1-TEST"));

    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        serde_json::json!({
            "primaryKey": "DR1-TEST",
            "objectType": "role",
            "incoming": [],
            "outgoing": [],
        })
    );
}

#[test]
fn missing_root_is_not_found() {
    let store = owner_fixture();
    let err = TreeBuilder::new(&store, &TreeConfig::default())
        .build(&rref(ObjectType::Mntner, "invalid"), &NOOP_SINK)
        .unwrap_err();

    assert!(err.is_not_found());
}

#[test]
fn depth_limit_renders_children_as_leaves() {
    let store = owner_fixture();
    let config = TreeConfig {
        max_depth: 1,
        ..TreeConfig::default()
    };
    let tree = TreeBuilder::new(&store, &config)
        .build(&rref(ObjectType::Mntner, "OWNER-MNT"), &NOOP_SINK)
        .unwrap();

    assert_eq!(tree.incoming.len(), 1);
    assert!(tree.incoming.iter().chain(&tree.outgoing).all(ReferenceTreeNode::is_leaf));
}

#[test]
fn long_cycle_terminates() {
    // A-MNT -> B-MNT -> C-MNT -> A-MNT via mnt-by.
    let store = MemoryStore::new();
    store.put(mntner("A-MNT", &[], "B-MNT"));
    store.put(mntner("B-MNT", &[], "C-MNT"));
    store.put(mntner("C-MNT", &[], "A-MNT"));

    let tree = build(&store, &rref(ObjectType::Mntner, "A-MNT"));

    // incoming: C -> B -> (A leaf); outgoing: B -> C -> (A leaf); plus the
    // reverse hops at each level.
    assert_eq!(tree.incoming[0].primary_key, key("C-MNT"));
    assert_eq!(tree.outgoing[0].primary_key, key("B-MNT"));
    assert!(tree.node_count() < 64);
}

#[test]
fn node_budget_renders_pending_children_as_leaves() {
    let store = owner_fixture();
    let config = TreeConfig {
        max_nodes: 2,
        ..TreeConfig::default()
    };
    let tree = TreeBuilder::new(&store, &config)
        .build(&rref(ObjectType::Mntner, "OWNER-MNT"), &NOOP_SINK)
        .unwrap();

    assert_eq!(
        tree,
        node(
            ObjectType::Mntner,
            "OWNER-MNT",
            vec![leaf(ObjectType::Person, "TP1-TEST")],
            vec![leaf(ObjectType::Person, "TP1-TEST")],
        )
    );
}

#[test]
fn densely_maintained_mntners_stay_within_node_budget() {
    // Eight maintainers, each maintained by the seven others. Unbounded,
    // this expands to millions of nodes at the default depth.
    let names = (0..8).map(|i| format!("M{i}-MNT")).collect::<Vec<_>>();
    let store = MemoryStore::new();
    for name in &names {
        let others = names
            .iter()
            .filter(|other| *other != name)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        store.put(mntner(name, &[], &others));
    }

    let config = TreeConfig::default();
    let sink = CounterMetricsSink::new();
    let tree = TreeBuilder::new(&store, &config)
        .build(&rref(ObjectType::Mntner, "M0-MNT"), &sink)
        .unwrap();

    // Past the budget only siblings already pending on the current path are
    // emitted, as leaves: at most 14 per level.
    let slack = config.max_depth * 14;
    assert!(tree.node_count() <= config.max_nodes + slack);
    assert_eq!(tree.incoming.len(), 7);
    assert_eq!(tree.outgoing.len(), 7);
    assert_eq!(sink.snapshot().tree_nodes, tree.node_count() as u64);
}

#[test]
fn tree_build_reports_node_count() {
    let store = owner_fixture();
    let sink = CounterMetricsSink::new();
    let tree = TreeBuilder::new(&store, &TreeConfig::default())
        .build(&rref(ObjectType::Mntner, "OWNER-MNT"), &sink)
        .unwrap();

    let snapshot = sink.snapshot();
    assert_eq!(snapshot.trees_built, 1);
    assert_eq!(snapshot.tree_nodes, tree.node_count() as u64);
}

// Random small registries: maintainers and persons with arbitrary mnt-by /
// admin-c links, including self-links and dangling keys.
fn arb_store() -> impl Strategy<Value = Vec<Record>> {
    let names = ["A", "B", "C", "D"];
    prop::collection::vec(
        (0usize..4, any::<bool>(), 0usize..5, 0usize..5),
        1..8,
    )
    .prop_map(move |specs| {
        specs
            .into_iter()
            .map(|(name, is_person, mnt, contact)| {
                let mnt_by = format!("{}-MNT", names.get(mnt).copied().unwrap_or("GONE"));
                if is_person {
                    person(&format!("{}-TEST", names[name]), &mnt_by)
                } else {
                    let contact = format!("{}-TEST", names.get(contact).copied().unwrap_or("GONE"));
                    mntner(&format!("{}-MNT", names[name]), &[contact.as_str()], &mnt_by)
                }
            })
            .collect()
    })
}

fn assert_sorted(tree: &ReferenceTreeNode) {
    for children in [&tree.incoming, &tree.outgoing] {
        let order = children
            .iter()
            .map(|child| (child.object_type, child.primary_key.clone()))
            .collect::<Vec<_>>();
        let mut sorted = order.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(order, sorted);
        children.iter().for_each(assert_sorted);
    }
}

proptest! {
    #[test]
    fn tree_build_is_deterministic_and_ordered(records in arb_store()) {
        let store = MemoryStore::new();
        let root = records[0].key.clone();
        for record in records {
            store.put(record);
        }
        prop_assume!(store.exists(&root));

        let first = serde_json::to_string(&build(&store, &root)).unwrap();
        let second = serde_json::to_string(&build(&store, &root)).unwrap();
        prop_assert_eq!(&first, &second);

        assert_sorted(&build(&store, &root));
    }
}
