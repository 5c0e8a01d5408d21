//! Property tests for the universal invariants (P1-P16).
//!
//! Trees are generated over a five-value alphabet (`0u8..5`) so that
//! same-headed siblings arise often enough for the distinctness properties
//! to actually exercise merging, not just pass vacuously.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use proptest::prelude::*;

use lintree::node::{NodeTree, Order};
use lintree::{from_arrays, Tree};

fn node_strategy() -> impl Strategy<Value = NodeTree<u8>> {
    let leaf = (0u8..5).prop_map(NodeTree::leaf);
    leaf.prop_recursive(4, 64, 4, |inner| {
        (0u8..5, prop::collection::vec(inner, 0..4))
            .prop_map(|(head, children)| NodeTree::with_children(head, children))
    })
}

fn count_leaves<T>(node: &NodeTree<T>) -> usize {
    if node.children.is_empty() {
        1
    } else {
        node.children.iter().map(count_leaves).sum()
    }
}

fn hash_of<T: Hash>(tree: &Tree<T>) -> u64 {
    let mut hasher = DefaultHasher::new();
    tree.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    /// P1: structure and values have equal, nonzero length; every child
    /// count is nonnegative; the root's declared subtree exhausts the
    /// whole array.
    #[test]
    fn p1_encoding_validity(node in node_strategy()) {
        let tree = Tree::from_node(node);
        let (structure, values) = tree.to_arrays();
        prop_assert_eq!(structure.len(), values.len());
        prop_assert!(!structure.is_empty());
        prop_assert!(structure.iter().all(|&c| c >= 0));
        let root = structure.len() as i32 - 1;
        prop_assert_eq!(lintree::linear::subtree_size(root, &structure).unwrap(), structure.len());
    }

    /// P2: `from_arrays(tree.to_arrays())` reproduces the same tree, and a
    /// tree's inflated and deflated forms compare equal through the facade.
    #[test]
    fn p2_round_trip(node in node_strategy()) {
        let inflated = Tree::from_node(node);
        let (structure, values) = inflated.to_arrays();
        let deflated = from_arrays(structure, values).unwrap();
        prop_assert_eq!(&deflated, &inflated);
    }

    /// P3: equality and hashing agree across representations.
    #[test]
    fn p3_equality_and_hash_are_representation_independent(node in node_strategy()) {
        let inflated = Tree::from_node(node);
        let (structure, values) = inflated.to_arrays();
        let deflated = from_arrays(structure, values).unwrap();
        prop_assert_eq!(&inflated, &deflated);
        prop_assert_eq!(hash_of(&inflated), hash_of(&deflated));
    }

    /// P4/P5: both iteration orders agree between the node form and the
    /// tree facade, inflated or deflated.
    #[test]
    fn p4_p5_iteration_orders_match(node in node_strategy()) {
        let expected_df: Vec<u8> = node.values(Order::DepthFirst).into_iter().copied().collect();
        let expected_bf: Vec<u8> = node.values(Order::BreadthFirst).into_iter().copied().collect();

        let inflated = Tree::from_node(node);
        let actual_df: Vec<u8> = inflated.values(Order::DepthFirst).into_iter().copied().collect();
        let actual_bf: Vec<u8> = inflated.values(Order::BreadthFirst).into_iter().copied().collect();
        prop_assert_eq!(&actual_df, &expected_df);
        prop_assert_eq!(&actual_bf, &expected_bf);

        let (structure, values) = inflated.to_arrays();
        let deflated = from_arrays(structure, values).unwrap();
        let deflated_df: Vec<u8> = deflated.values(Order::DepthFirst).into_iter().copied().collect();
        let deflated_bf: Vec<u8> = deflated.values(Order::BreadthFirst).into_iter().copied().collect();
        prop_assert_eq!(deflated_df, expected_df);
        prop_assert_eq!(deflated_bf, expected_bf);
    }

    /// P6: one branch per leaf, regardless of representation.
    #[test]
    fn p6_branch_count_matches_leaf_count(node in node_strategy()) {
        let expected = count_leaves(&node);
        let tree = Tree::from_node(node);
        prop_assert_eq!(tree.branches(None).len(), expected);
    }

    /// P7: `paths` visits exactly one prefix per node (pre-order), so its
    /// length always equals the tree's size.
    #[test]
    fn p7_path_count_matches_size(node in node_strategy()) {
        let tree = Tree::from_node(node);
        prop_assert_eq!(tree.paths().len(), tree.size());
    }

    /// P9: two lax insertions of the same subtree leave two identical
    /// direct-child subtrees, unmerged.
    #[test]
    fn p9_lax_insertion_does_not_merge(node in node_strategy()) {
        let subtree = Tree::from_node(node);
        let built = Tree::leaf(9u8).insert_child_lax(subtree.clone(), true).insert_child_lax(subtree.clone(), true);
        let children = built.children();
        prop_assert_eq!(children.len(), 2);
        prop_assert_eq!(&children[0], &children[1]);
    }

    /// P13: a path that does not fully match returns the original tree,
    /// untouched.
    #[test]
    fn p13_unchanged_on_miss(node in node_strategy()) {
        let tree = Tree::from_node(node);
        // 250/251 fall outside the 0..5 alphabet `node_strategy` uses, so
        // this path can never match.
        match tree.clone().update_value_at(&[250u8, 251u8], 1) {
            Err(unchanged) => prop_assert_eq!(unchanged, tree),
            Ok(_) => prop_assert!(false, "path should not have matched"),
        }
    }

    /// P15: height is 1 + the tallest child, 0 only for the empty tree.
    #[test]
    fn p15_height_invariant(node in node_strategy()) {
        let expected = node.height();
        let tree = Tree::from_node(node);
        prop_assert_eq!(tree.height(), expected);
        prop_assert!(tree.height() > 0);
    }

    /// P16: size is 1 + the sum of children's sizes, 0 only for the empty
    /// tree.
    #[test]
    fn p16_size_additivity(node in node_strategy()) {
        let expected = node.size();
        let tree = Tree::from_node(node);
        prop_assert_eq!(tree.size(), expected);
    }
}

#[test]
fn p15_p16_empty_tree_is_zero() {
    let empty: Tree<u8> = Tree::empty();
    assert_eq!(empty.height(), 0);
    assert_eq!(empty.size(), 0);
}

/// P8: an operation without the `Lax` suffix leaves the result distinct —
/// no two direct children share a head.
#[test]
fn p8_distinct_insertion_preserves_distinctness() {
    let t = Tree::leaf("a")
        .insert_leaf("b", true)
        .insert_leaf("b", true)
        .insert_leaf("c", true)
        .insert_leaf("b", false);
    let heads: HashSet<&&str> = t.children_values().into_iter().collect();
    assert_eq!(heads.len(), t.children_values().len());
}

/// P10: distinctifying an already-distinct tree is a no-op; applying it
/// twice to a tree with duplicates agrees with applying it once.
#[test]
fn p10_make_distinct_is_idempotent() {
    let dup = NodeTree::with_children(
        "a",
        vec![
            NodeTree::with_children("b", vec![NodeTree::leaf("x")]),
            NodeTree::with_children("b", vec![NodeTree::leaf("y")]),
        ],
    );
    let once = dup.clone().make_distinct(u32::MAX);
    let twice = once.clone().make_distinct(u32::MAX);
    assert_eq!(once, twice);
}

/// P11: inserting a subtree whose head collides with an existing child is
/// equivalent to folding the existing child's children and the incoming
/// subtree's children together under the existing head, merged distinct.
#[test]
fn p11_merge_absorbs_duplicates() {
    let t = Tree::leaf("a").insert_child(Tree::leaf("b").insert_leaf("c", true), true);
    let merged = t.insert_child(Tree::leaf("b").insert_leaf("d", true), true);
    let children = merged.children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].root_value(), Some(&"b"));
    assert_eq!(children[0].children_values(), vec![&"c", &"d"]);
}

/// P12: updating the value at a path that fully matches applies the
/// change and leaves the rest of the tree intact.
#[test]
fn p12_path_matched_update_applies() {
    let t = Tree::leaf("a").insert_child(Tree::leaf("b").insert_leaf("c", true), true);
    let updated = t.update_value_at(&["a", "b", "c"], "z").expect("path exists");
    let b = &updated.children()[0];
    assert_eq!(b.children_values(), vec![&"z"]);
}

/// P14: removing a matched node re-parents its children onto its former
/// parent, merging with any same-headed sibling that results.
#[test]
fn p14_remove_value_reparents_children() {
    let t = Tree::leaf("a").insert_child(
        Tree::leaf("b").insert_child(Tree::leaf("c"), true),
        true,
    );
    let removed = t.remove_value_at(&["a", "b"]).expect("path exists");
    assert_eq!(removed.children_values(), vec![&"c"]);
}
