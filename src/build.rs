//! C5 — builders that materialize a [`Tree`] from external inputs: raw
//! arrays (the wire format of spec §6), or a depth-annotated partial stack.

use crate::error::{Result, TreeError};
use crate::linear::subtree_size;
use crate::node::NodeTree;
use crate::tree::Tree;

/// Validates `(structure, values)` against I1–I5 and wraps them as a
/// `Deflated` tree, in storage order (children before parent, rightmost
/// sibling before leftmost — spec §3.2, §6).
pub fn from_arrays<T>(structure: Vec<i32>, values: Vec<T>) -> Result<Tree<T>> {
    if structure.len() != values.len() {
        return Err(TreeError::InvalidStructure {
            index: -1,
            reason: "structure and values arrays have different lengths",
        });
    }
    if structure.is_empty() {
        return Ok(Tree::empty());
    }
    let n = structure.len();
    let root = (n - 1) as i32;
    if subtree_size(root, &structure)? != n {
        return Err(TreeError::InvalidStructure {
            index: root,
            reason: "root's declared children do not exhaust the whole array",
        });
    }
    Ok(Tree::from_deflated(structure, values))
}

/// As [`from_arrays`], but `structure`/`values` are supplied in head-first
/// order (root at position 0). Reversing a storage-order array yields
/// exactly the head-first array and vice versa — both the per-node child
/// counts and the relative sibling order invert consistently under a
/// whole-array reversal — so this is a plain reversal followed by
/// [`from_arrays`]'s validation.
pub fn from_arrays_head<T>(mut structure: Vec<i32>, mut values: Vec<T>) -> Result<Tree<T>> {
    structure.reverse();
    values.reverse();
    from_arrays(structure, values)
}

/// A single entry of the partial-construction stack accepted by
/// [`build_tree_from_partials`]: a node's depth, its head value, and any
/// children already attached to it before it was pushed.
pub type Partial<T> = (u32, T, Vec<NodeTree<T>>);

/// Merges a depth-annotated stack of partially constructed nodes into
/// whole trees.
///
/// `triples` is read in depth-first pre-order — a node followed by its
/// descendants, the way an indented outline reads top to bottom (spec
/// §4.5's "leftmost triples are deepest leaves" describes the *stack*
/// built while scanning this order, not the scan order itself: earlier
/// triples accumulate on the stack and the deepest ones sit closest to the
/// top, i.e. leftmost-pushed-so-far). On each new triple, every
/// previously pushed entry whose depth cannot still be an ancestor of it
/// (`stacked.depth >= incoming.depth`) is popped and wired in as a child
/// of whatever is left on the stack — its real parent — or promoted to a
/// top-level result if the stack empties out. This is the standard
/// indentation-stack algorithm, expressed iteratively (spec §9's
/// "explicit stack" guidance) rather than recursively so it tolerates
/// arbitrarily deep input.
///
/// Once `triples` is exhausted, the stack is flushed the same way against
/// a depth below any real node, and `tail` (already-built top-level
/// trees, e.g. a trailing fragment carried over from an earlier partial
/// parse) is appended after the roots this produces.
pub fn build_tree_from_partials<T>(triples: Vec<Partial<T>>, tail: Vec<NodeTree<T>>) -> Vec<NodeTree<T>> {
    let mut stack: Vec<Partial<T>> = Vec::new();
    let mut roots: Vec<NodeTree<T>> = Vec::new();
    for (depth, head, ready_children) in triples {
        close_out(&mut stack, &mut roots, depth);
        stack.push((depth, head, ready_children));
    }
    close_out(&mut stack, &mut roots, 0);
    roots.extend(tail);
    roots
}

/// Pops every stack entry whose depth is `>= depth`, attaching it as a
/// child of the new stack top (its parent) or, once the stack empties,
/// recording it as a completed top-level tree.
fn close_out<T>(stack: &mut Vec<Partial<T>>, roots: &mut Vec<NodeTree<T>>, depth: u32) {
    while let Some(&(top_depth, _, _)) = stack.last() {
        if top_depth < depth {
            break;
        }
        let (_, h, c) = stack.pop().unwrap();
        let node = NodeTree::with_children(h, c);
        match stack.last_mut() {
            Some((_, _, parent_children)) => parent_children.push(node),
            None => roots.push(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_from_arrays_builds_the_right_tree() {
        let tree = from_arrays(vec![0, 0, 0, 3], vec!["d", "c", "b", "a"]).unwrap();
        assert_eq!(tree.size(), 4);
        assert_eq!(tree.root_value(), Some(&"a"));
        assert_eq!(
            tree.children_values(),
            vec![&"b", &"c", &"d"]
        );
    }

    #[test]
    fn from_arrays_rejects_length_mismatch() {
        assert!(from_arrays(vec![0, 0], vec!["a"]).is_err());
    }

    #[test]
    fn from_arrays_rejects_overrun_structure() {
        assert!(from_arrays(vec![5], vec!["a"]).is_err());
    }

    #[test]
    fn from_arrays_head_reverses_into_storage_order() {
        let tree = from_arrays_head(vec![3, 0, 0, 0], vec!["a", "b", "c", "d"]).unwrap();
        assert_eq!(tree.root_value(), Some(&"a"));
        assert_eq!(tree.children_values(), vec![&"b", &"c", &"d"]);
    }

    #[test]
    fn empty_arrays_build_the_empty_tree() {
        let tree: Tree<&str> = from_arrays(vec![], vec![]).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn build_tree_from_partials_nests_deeper_depths_under_shallower() {
        // Outline reading:  a / -b / --c / -d  => a(b(c), d)
        let triples: Vec<Partial<&str>> = vec![
            (0, "a", vec![]),
            (1, "b", vec![]),
            (2, "c", vec![]),
            (1, "d", vec![]),
        ];
        let roots = build_tree_from_partials(triples, vec![]);
        assert_eq!(roots.len(), 1);
        let root = &roots[0];
        assert_eq!(root.head, "a");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].head, "b");
        assert_eq!(root.children[0].children[0].head, "c");
        assert_eq!(root.children[1].head, "d");
    }

    #[test]
    fn build_tree_from_partials_keeps_separate_roots_at_equal_depth() {
        let triples: Vec<Partial<&str>> = vec![(0, "a", vec![]), (0, "b", vec![])];
        let roots = build_tree_from_partials(triples, vec![]);
        assert_eq!(roots.iter().map(|r| r.head).collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
