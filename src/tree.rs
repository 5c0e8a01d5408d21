//! C4 — the tree facade: a tagged variant over the two interchangeable
//! representations (§4.4). Every public operation here dispatches to
//! [`crate::linear`] (C2) when the backing store is the dual-array
//! encoding, or to [`crate::node`] (C3) when it is the recursive node
//! form; both paths must agree on every query (§9 "equality across
//! representations").

use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::{instrument, Level};

use crate::buffer::{Buffer, IntBuffer};
use crate::error::PathResult;
use crate::linear;
use crate::node::{NodeTree, Order};

#[derive(Debug, Clone)]
enum Repr<T> {
    Empty,
    Inflated(NodeTree<T>),
    Deflated(Vec<i32>, Vec<T>),
}

/// An immutable rooted ordered tree (§3.1). Every operation that
/// "changes" a tree returns a new one; `self` is conceptually untouched
/// (§3.5).
#[derive(Debug, Clone)]
pub struct Tree<T>(Repr<T>);

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Tree::empty()
    }
}

impl<T> Tree<T> {
    /// The empty tree (size 0).
    pub fn empty() -> Self {
        Tree(Repr::Empty)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.0, Repr::Empty)
    }

    pub(crate) fn from_deflated(structure: Vec<i32>, values: Vec<T>) -> Self {
        if structure.is_empty() {
            Tree(Repr::Empty)
        } else {
            Tree(Repr::Deflated(structure, values))
        }
    }

    pub fn from_node(node: NodeTree<T>) -> Self {
        Tree(Repr::Inflated(node))
    }

    /// `1 + Σ size(child)` for a non-empty tree, `0` for the empty tree
    /// (P16).
    pub fn size(&self) -> usize {
        match &self.0 {
            Repr::Empty => 0,
            Repr::Inflated(n) => n.size(),
            Repr::Deflated(s, _) => s.len(),
        }
    }

    /// Number of direct children of the root.
    pub fn width(&self) -> usize {
        match &self.0 {
            Repr::Empty => 0,
            Repr::Inflated(n) => n.width(),
            Repr::Deflated(s, _) => s[s.len() - 1] as usize,
        }
    }

    /// Longest root-to-leaf path length in nodes; `0` for the empty tree
    /// (P15).
    pub fn height(&self) -> usize {
        match &self.0 {
            Repr::Empty => 0,
            Repr::Inflated(n) => n.height(),
            Repr::Deflated(s, _) => linear::calculate_height(root_index(s), s),
        }
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_empty() && self.width() == 0
    }

    pub fn root_value(&self) -> Option<&T> {
        match &self.0 {
            Repr::Empty => None,
            Repr::Inflated(n) => Some(&n.head),
            Repr::Deflated(_, v) => v.last(),
        }
    }
}

fn root_index(structure: &[i32]) -> i32 {
    structure.len() as i32 - 1
}

impl<T: Clone> Tree<T> {
    /// Converts this tree to the recursive node form, consuming it.
    /// `None` only for the empty tree.
    fn into_node_opt(self) -> Option<NodeTree<T>> {
        match self.0 {
            Repr::Empty => None,
            Repr::Inflated(n) => Some(n),
            Repr::Deflated(s, v) => {
                Some(NodeTree::from_linear(root_index(&s), &s, &v).expect("deflated tree invariants hold by construction"))
            }
        }
    }

    /// Materializes the array interchange format of §6 (storage order:
    /// children before parent, rightmost sibling before leftmost).
    pub fn to_arrays(&self) -> (Vec<i32>, Vec<T>) {
        match &self.0 {
            Repr::Empty => (Vec::new(), Vec::new()),
            Repr::Inflated(n) => n.to_arrays(),
            Repr::Deflated(s, v) => (s.clone(), v.clone()),
        }
    }

    /// The direct children, left to right, as standalone trees.
    pub fn children(&self) -> Vec<Tree<T>> {
        match &self.0 {
            Repr::Empty => Vec::new(),
            Repr::Inflated(n) => n.children.iter().cloned().map(Tree::from_node).collect(),
            Repr::Deflated(s, v) => {
                let root = root_index(s);
                let roots = linear::children_indexes(root, s).expect("deflated tree invariants hold by construction");
                roots
                    .into_iter()
                    .map(|c| {
                        let size = linear::subtree_size(c, s).expect("deflated tree invariants hold by construction") as i32;
                        let lo = (c + 1 - size) as usize;
                        let hi = (c + 1) as usize;
                        Tree::from_deflated(s[lo..hi].to_vec(), v[lo..hi].to_vec())
                    })
                    .collect()
            }
        }
    }

    /// The direct children's head values, left to right.
    pub fn children_values(&self) -> Vec<&T> {
        match &self.0 {
            Repr::Empty => Vec::new(),
            Repr::Inflated(n) => n.children.iter().map(|c| &c.head).collect(),
            Repr::Deflated(s, v) => {
                let root = root_index(s);
                linear::children_indexes(root, s)
                    .expect("deflated tree invariants hold by construction")
                    .into_iter()
                    .map(|c| &v[c as usize])
                    .collect()
            }
        }
    }

    /// Depth-first or breadth-first head values (P4/P5).
    pub fn values(&self, order: Order) -> Vec<&T> {
        match &self.0 {
            Repr::Empty => Vec::new(),
            Repr::Inflated(n) => n.values(order),
            Repr::Deflated(s, v) => deflated_values(s, v, order),
        }
    }

    /// Depth-first head values matching `filter`.
    pub fn values_with_filter(&self, filter: impl Fn(&T) -> bool) -> Vec<&T> {
        self.values(Order::DepthFirst).into_iter().filter(|v| filter(v)).collect()
    }

    /// Depth-first head values, cut off at `max_depth` (root is depth 1).
    pub fn values_with_limit(&self, max_depth: u32) -> Vec<&T> {
        match &self.0 {
            Repr::Empty => Vec::new(),
            Repr::Inflated(n) => n.values_with_limit(max_depth),
            Repr::Deflated(s, v) => {
                let root = root_index(s);
                linear::NodeIndexIterWithLimit::new(root, s, max_depth).map(|i| &v[i as usize]).collect()
            }
        }
    }

    /// Every root-to-leaf path of head values, depth-first (P6). When
    /// `max_depth` is set, a node at that depth is treated as a leaf.
    pub fn branches(&self, max_depth: Option<usize>) -> Vec<Vec<&T>> {
        match &self.0 {
            Repr::Empty => Vec::new(),
            Repr::Inflated(n) => n.branches(max_depth),
            Repr::Deflated(s, v) => {
                let root = root_index(s);
                linear::BranchesIndexListIter::new(root, s, max_depth)
                    .map(|branch| branch.into_iter().map(|i| &v[i as usize]).collect())
                    .collect()
            }
        }
    }

    /// Every non-empty prefix of every branch, depth-first (P7).
    pub fn paths(&self) -> Vec<Vec<&T>> {
        match &self.0 {
            Repr::Empty => Vec::new(),
            Repr::Inflated(n) => n.paths(),
            Repr::Deflated(..) => {
                // Paths are prefixes of branches; reuse the branch walk and
                // emit every prefix, matching NodeTree::paths exactly.
                let mut out = Vec::new();
                for branch in self.branches(None) {
                    for len in 1..=branch.len() {
                        out.push(branch[..len].to_vec());
                    }
                }
                out
            }
        }
    }
}

fn deflated_values<'a, T>(structure: &[i32], values: &'a [T], order: Order) -> Vec<&'a T> {
    let root = root_index(structure);
    match order {
        Order::DepthFirst => linear::NodeIndexIter::new(root, structure).map(|i| &values[i as usize]).collect(),
        Order::BreadthFirst => {
            let mut out = Vec::new();
            let mut frontier = vec![root];
            while !frontier.is_empty() {
                let mut next = Vec::new();
                for i in frontier {
                    out.push(&values[i as usize]);
                    let children =
                        linear::children_indexes(i, structure).expect("deflated tree invariants hold by construction");
                    next.extend(children);
                }
                frontier = next;
            }
            out
        }
    }
}

impl<T: Clone + PartialEq> Tree<T> {
    /// Whether `path` matches a prefix of some branch (a *path*, §3.4).
    pub fn contains_path(&self, path: &[T]) -> bool {
        self.paths().iter().any(|p| p.len() == path.len() && p.iter().zip(path).all(|(a, b)| *a == b))
    }

    /// Whether `path` matches a branch exactly (root to leaf, §3.4).
    pub fn contains_branch(&self, path: &[T]) -> bool {
        self.branches(None).iter().any(|b| b.len() == path.len() && b.iter().zip(path).all(|(a, b2)| *a == b2))
    }

    /// Replaces the root's head value; structure is unchanged. The empty
    /// tree stays empty.
    pub fn update_head(self, new_head: T) -> Tree<T> {
        match self.0 {
            Repr::Empty => Tree::empty(),
            Repr::Inflated(mut n) => {
                n.head = new_head;
                Tree::from_node(n)
            }
            Repr::Deflated(s, mut v) => {
                let last = v.len() - 1;
                v[last] = new_head;
                Tree::from_deflated(s, v)
            }
        }
    }

    /// Replaces `f(value)` for every node's head, structure preserved
    /// (§4.4.6).
    pub fn map<U>(self, f: impl Fn(T) -> U) -> Tree<U> {
        match self.0 {
            Repr::Empty => Tree::empty(),
            Repr::Inflated(n) => Tree::from_node(map_node(n, &f)),
            Repr::Deflated(s, v) => Tree::from_deflated(s, v.into_iter().map(f).collect()),
        }
    }

    /// Inserts `subtree` as a new direct child (front if `append ==
    /// false`, back if `true`), merging with a same-headed existing
    /// sibling (§4.2.4, §4.4.5). Empty `subtree` is a no-op; an empty
    /// receiver becomes `subtree`.
    #[instrument(level = Level::DEBUG, skip(self, subtree))]
    pub fn insert_child(self, subtree: Tree<T>, append: bool) -> Tree<T> {
        if subtree.is_empty() {
            return self;
        }
        match self.0 {
            Repr::Empty => subtree,
            Repr::Inflated(n) => {
                let child = subtree.into_node_opt().expect("checked non-empty above");
                Tree::from_node(n.insert_child_distinct(child, append))
            }
            Repr::Deflated(s, v) => {
                let (sub_s, sub_v) = subtree.to_arrays();
                let mut structure_buf = IntBuffer::from_slice(&s);
                let mut values_buf = Buffer::from_slice(&v);
                let root = root_index(&s);
                linear::insert_subtree_as_child(&sub_s, &sub_v, root, &mut structure_buf, &mut values_buf, append)
                    .expect("deflated tree invariants hold by construction");
                let new_root = root_index(structure_buf.as_slice());
                linear::make_children_distinct(new_root, &mut structure_buf, &mut values_buf)
                    .expect("deflated tree invariants hold by construction");
                Tree::from_deflated(structure_buf.into_frozen(), values_buf.into_frozen())
            }
        }
    }

    pub fn insert_child_lax(self, subtree: Tree<T>, append: bool) -> Tree<T> {
        if subtree.is_empty() {
            return self;
        }
        match self.0 {
            Repr::Empty => subtree,
            Repr::Inflated(n) => {
                let child = subtree.into_node_opt().expect("checked non-empty above");
                Tree::from_node(n.insert_child_lax(child, append))
            }
            Repr::Deflated(s, v) => {
                let (sub_s, sub_v) = subtree.to_arrays();
                let mut structure_buf = IntBuffer::from_slice(&s);
                let mut values_buf = Buffer::from_slice(&v);
                let root = root_index(&s);
                linear::insert_subtree_as_child(&sub_s, &sub_v, root, &mut structure_buf, &mut values_buf, append)
                    .expect("deflated tree invariants hold by construction");
                Tree::from_deflated(structure_buf.into_frozen(), values_buf.into_frozen())
            }
        }
    }

    /// Folds [`Tree::insert_child`]/[`Tree::insert_child_lax`] over
    /// `subtrees`, in order. Empty subtrees are skipped.
    pub fn insert_children(mut self, subtrees: Vec<Tree<T>>, append: bool) -> Tree<T> {
        for subtree in subtrees {
            self = self.insert_child(subtree, append);
        }
        self
    }

    pub fn insert_children_lax(mut self, subtrees: Vec<Tree<T>>, append: bool) -> Tree<T> {
        for subtree in subtrees {
            self = self.insert_child_lax(subtree, append);
        }
        self
    }

    /// Inserts `v` as a new single-node child (front if `append ==
    /// false`, back if `true`), merging with an existing same-headed
    /// sibling.
    pub fn insert_leaf(self, v: T, append: bool) -> Tree<T> {
        self.insert_child(Tree::from_node(NodeTree::leaf(v)), append)
    }

    pub fn insert_leaf_lax(self, v: T, append: bool) -> Tree<T> {
        self.insert_child_lax(Tree::from_node(NodeTree::leaf(v)), append)
    }

    pub fn insert_leaves(self, values: Vec<T>, append: bool) -> Tree<T> {
        self.insert_children(values.into_iter().map(|v| Tree::from_node(NodeTree::leaf(v))).collect(), append)
    }

    pub fn insert_leaves_lax(self, values: Vec<T>, append: bool) -> Tree<T> {
        self.insert_children_lax(values.into_iter().map(|v| Tree::from_node(NodeTree::leaf(v))).collect(), append)
    }

    /// Inserts `path` at its first point of divergence from the existing
    /// tree, bootstrapping a whole new tree if the receiver is empty (S7).
    #[instrument(level = Level::DEBUG, skip(self, path))]
    pub fn insert_branch(self, path: Vec<T>) -> Tree<T> {
        if path.is_empty() {
            return self;
        }
        match self.0 {
            Repr::Empty => Tree::from_node(crate::node::build_chain(path[0].clone(), &path[1..])),
            Repr::Inflated(n) => Tree::from_node(n.insert_branch(&path)),
            Repr::Deflated(s, v) => {
                let mut structure_buf = IntBuffer::from_slice(&s);
                let mut values_buf = Buffer::from_slice(&v);
                let root = root_index(&s);
                linear::insert_branch(&path, root, &mut structure_buf, &mut values_buf)
                    .expect("deflated tree invariants hold by construction");
                Tree::from_deflated(structure_buf.into_frozen(), values_buf.into_frozen())
            }
        }
    }

    /// Replaces the first direct child whose head equals `old` with
    /// `new_subtree`, de-duplicating the result.
    pub fn update_child(self, old: &T, new_subtree: Tree<T>) -> Tree<T> {
        let node = match self.into_node_opt() {
            Some(n) => n,
            None => return Tree::empty(),
        };
        let new_child = new_subtree.into_node_opt();
        match new_child {
            Some(child) => Tree::from_node(node.update_child_distinct(old, child)),
            None => Tree::from_node(node), // no-op: an empty replacement leaves the tree unchanged
        }
    }

    pub fn update_child_lax(self, old: &T, new_subtree: Tree<T>) -> Tree<T> {
        let node = match self.into_node_opt() {
            Some(n) => n,
            None => return Tree::empty(),
        };
        match new_subtree.into_node_opt() {
            Some(child) => Tree::from_node(node.update_child_lax(old, child)),
            None => Tree::from_node(node),
        }
    }

    /// Replaces the head of a direct child whose head equals `old` with
    /// `new`, merging on collision (§4.4.4).
    pub fn update_child_value(self, old: &T, new: T) -> Tree<T> {
        match self.0 {
            Repr::Empty => Tree::empty(),
            Repr::Inflated(n) => Tree::from_node(n.update_child_value_distinct(old, new)),
            Repr::Deflated(s, v) => match linear::leftmost_index_of_child_value(old, root_index(&s), &s, &v) {
                Ok(Some(idx)) => {
                    let mut structure_buf = IntBuffer::from_slice(&s);
                    let mut values_buf = Buffer::from_slice(&v);
                    values_buf.set(idx, new).expect("index located above");
                    let root = root_index(structure_buf.as_slice());
                    linear::make_children_distinct(root, &mut structure_buf, &mut values_buf)
                        .expect("deflated tree invariants hold by construction");
                    Tree::from_deflated(structure_buf.into_frozen(), values_buf.into_frozen())
                }
                _ => Tree::from_deflated(s, v),
            },
        }
    }

    pub fn update_child_value_lax(self, old: &T, new: T) -> Tree<T> {
        match self.0 {
            Repr::Empty => Tree::empty(),
            Repr::Inflated(n) => Tree::from_node(n.update_child_value_lax(old, new)),
            Repr::Deflated(s, v) => match linear::leftmost_index_of_child_value(old, root_index(&s), &s, &v) {
                Ok(Some(idx)) => {
                    let mut values_buf = Buffer::from_slice(&v);
                    values_buf.set(idx, new).expect("index located above");
                    Tree::from_deflated(s, values_buf.into_frozen())
                }
                _ => Tree::from_deflated(s, v),
            },
        }
    }

    /// Applies `f` to the head of a direct child whose head equals `old`.
    pub fn modify_child_value(self, old: &T, f: impl FnOnce(T) -> T) -> Tree<T> {
        let node = match self.into_node_opt() {
            Some(n) => n,
            None => return Tree::empty(),
        };
        Tree::from_node(node.modify_child_value_distinct(old, f))
    }

    pub fn modify_child_value_lax(self, old: &T, f: impl FnOnce(T) -> T) -> Tree<T> {
        let node = match self.into_node_opt() {
            Some(n) => n,
            None => return Tree::empty(),
        };
        Tree::from_node(node.modify_child_value_lax(old, f))
    }

    /// Removes one direct child whose head equals `value`, re-parenting
    /// its children (§4.4.4). Operates on direct children only, so
    /// `remove_value` shares this contract exactly.
    #[instrument(level = Level::DEBUG, skip(self))]
    pub fn remove_child_value(self, value: &T) -> Tree<T> {
        match self.0 {
            Repr::Empty => Tree::empty(),
            Repr::Inflated(n) => Tree::from_node(n.remove_child_value_distinct(value)),
            Repr::Deflated(s, v) => match linear::leftmost_index_of_child_value(value, root_index(&s), &s, &v) {
                Ok(Some(idx)) => {
                    let mut structure_buf = IntBuffer::from_slice(&s);
                    let mut values_buf = Buffer::from_slice(&v);
                    let root = root_index(&s);
                    linear::remove_value(idx, root, &mut structure_buf, &mut values_buf)
                        .expect("deflated tree invariants hold by construction");
                    let new_root = root_index(structure_buf.as_slice());
                    linear::make_children_distinct(new_root, &mut structure_buf, &mut values_buf)
                        .expect("deflated tree invariants hold by construction");
                    Tree::from_deflated(structure_buf.into_frozen(), values_buf.into_frozen())
                }
                _ => Tree::from_deflated(s, v),
            },
        }
    }

    pub fn remove_child_value_lax(self, value: &T) -> Tree<T> {
        match self.0 {
            Repr::Empty => Tree::empty(),
            Repr::Inflated(n) => Tree::from_node(n.remove_child_value_lax(value)),
            Repr::Deflated(s, v) => match linear::leftmost_index_of_child_value(value, root_index(&s), &s, &v) {
                Ok(Some(idx)) => {
                    let mut structure_buf = IntBuffer::from_slice(&s);
                    let mut values_buf = Buffer::from_slice(&v);
                    let root = root_index(&s);
                    linear::remove_value(idx, root, &mut structure_buf, &mut values_buf)
                        .expect("deflated tree invariants hold by construction");
                    Tree::from_deflated(structure_buf.into_frozen(), values_buf.into_frozen())
                }
                _ => Tree::from_deflated(s, v),
            },
        }
    }

    pub fn remove_value(self, value: &T) -> Tree<T> {
        self.remove_child_value(value)
    }

    pub fn remove_value_lax(self, value: &T) -> Tree<T> {
        self.remove_child_value_lax(value)
    }

    /// Every node's value `v` is replaced by the tree `f(v)`, spliced in
    /// per §4.4.6's rule: `f(head)` is the new root; each child's
    /// `flat_map`-transformed subtree is inserted as a new leftmost child
    /// of that root, in the original left-to-right child order,
    /// de-duplicating collisions along the way.
    #[instrument(level = Level::DEBUG, skip(self, f))]
    pub fn flat_map<U: Clone + PartialEq>(self, f: impl Fn(T) -> Tree<U> + Copy) -> Tree<U> {
        match self.into_node_opt() {
            None => Tree::empty(),
            Some(n) => Tree::from_node(flat_map_node(n, f)),
        }
    }

    /// Replaces the subtree at `path` with `f(subtree)`, de-duplicating
    /// the parent's children afterward (§4.4.5).
    pub fn modify_tree_at(self, path: &[T], f: impl FnOnce(Tree<T>) -> Tree<T>) -> PathResult<Tree<T>> {
        self.modify_tree_at_by(path, |v| v.clone(), f, true)
    }

    pub fn modify_tree_at_lax(self, path: &[T], f: impl FnOnce(Tree<T>) -> Tree<T>) -> PathResult<Tree<T>> {
        self.modify_tree_at_by(path, |v| v.clone(), f, false)
    }

    /// Extractor form of [`Tree::modify_tree_at`]/[`Tree::modify_tree_at_lax`]:
    /// `path` elements are compared against `key(&node.head)` rather than
    /// the head values directly.
    pub fn modify_tree_at_by<K: PartialEq>(
        self,
        path: &[K],
        key: impl Fn(&T) -> K,
        f: impl FnOnce(Tree<T>) -> Tree<T>,
        distinct: bool,
    ) -> PathResult<Tree<T>> {
        let node = match self.into_node_opt() {
            Some(n) => n,
            None => return Err(Tree::empty()),
        };
        let mut f = Some(f);
        let eq = |v: &T, p: &K| &key(v) == p;
        match transform_at(node, path, &eq, &mut |n| {
            // A replacement that collapses to the empty tree has no head of
            // its own to offer, so the matched node degrades to a
            // childless copy of itself rather than vanishing outright —
            // `remove_tree_at` is the operation for actually deleting a node.
            let head_backup = n.head.clone();
            let replaced = (f.take().expect("applied exactly once"))(Tree::from_node(n));
            replaced.into_node_opt().unwrap_or_else(|| NodeTree::leaf(head_backup))
        }) {
            Ok(n) => Ok(Tree::from_node(if distinct { n.make_distinct(2) } else { n })),
            Err(n) => Err(Tree::from_node(n)),
        }
    }

    /// Replaces the value at `path` with `new_value` (value-form);
    /// de-duplicates the parent's children afterward.
    pub fn update_value_at(self, path: &[T], new_value: T) -> PathResult<Tree<T>> {
        self.modify_value_at(path, move |_| new_value)
    }

    pub fn update_value_at_lax(self, path: &[T], new_value: T) -> PathResult<Tree<T>> {
        self.modify_value_at_lax(path, move |_| new_value)
    }

    /// Applies `f` to the value at `path`.
    pub fn modify_value_at(self, path: &[T], f: impl FnOnce(T) -> T) -> PathResult<Tree<T>> {
        self.modify_value_at_by(path, |v| v.clone(), f, true)
    }

    pub fn modify_value_at_lax(self, path: &[T], f: impl FnOnce(T) -> T) -> PathResult<Tree<T>> {
        self.modify_value_at_by(path, |v| v.clone(), f, false)
    }

    pub fn modify_value_at_by<K: PartialEq>(
        self,
        path: &[K],
        key: impl Fn(&T) -> K,
        f: impl FnOnce(T) -> T,
        distinct: bool,
    ) -> PathResult<Tree<T>> {
        let node = match self.into_node_opt() {
            Some(n) => n,
            None => return Err(Tree::empty()),
        };
        let mut f = Some(f);
        let eq = |v: &T, p: &K| &key(v) == p;
        match transform_at(node, path, &eq, &mut |mut n| {
            n.head = (f.take().expect("applied exactly once"))(n.head);
            n
        }) {
            Ok(n) => Ok(Tree::from_node(if distinct { n.make_distinct(2) } else { n })),
            Err(n) => Err(Tree::from_node(n)),
        }
    }

    /// Replaces the subtree at `path` with `new_subtree`.
    pub fn update_tree_at(self, path: &[T], new_subtree: Tree<T>) -> PathResult<Tree<T>> {
        self.modify_tree_at(path, move |_| new_subtree)
    }

    pub fn update_tree_at_lax(self, path: &[T], new_subtree: Tree<T>) -> PathResult<Tree<T>> {
        self.modify_tree_at_lax(path, move |_| new_subtree)
    }

    /// Inserts `subtree` as a new child of the node at `path`.
    pub fn insert_child_at(self, path: &[T], subtree: Tree<T>, append: bool) -> PathResult<Tree<T>> {
        self.modify_tree_at(path, move |t| t.insert_child(subtree, append))
    }

    pub fn insert_child_lax_at(self, path: &[T], subtree: Tree<T>, append: bool) -> PathResult<Tree<T>> {
        self.modify_tree_at_lax(path, move |t| t.insert_child_lax(subtree, append))
    }

    /// Clears the children of the node at `path`.
    pub fn remove_children_at(self, path: &[T]) -> PathResult<Tree<T>> {
        self.modify_tree_at(path, |t| {
            let head = t.root_value().cloned();
            match head {
                Some(h) => Tree::from_node(NodeTree::leaf(h)),
                None => Tree::empty(),
            }
        })
    }

    /// Removes the node at `path` (keeping its children, re-parented onto
    /// its parent) — `path` must have at least two elements (root plus
    /// the node to remove); removing the root itself is not addressable
    /// this way (use `remove_tree_at` with a length-1 path, which empties
    /// the tree).
    pub fn remove_value_at(self, path: &[T]) -> PathResult<Tree<T>> {
        if path.len() < 2 {
            return self.remove_tree_at(path);
        }
        let node = match self.into_node_opt() {
            Some(n) => n,
            None => return Err(Tree::empty()),
        };
        let eq = |v: &T, p: &T| v == p;
        match transform_parent(node, path, &eq, &mut |parent, idx| parent.remove_child_at_lax(idx)) {
            Ok(n) => Ok(Tree::from_node(n.make_distinct(2))),
            Err(n) => Err(Tree::from_node(n)),
        }
    }

    /// Removes the whole subtree at `path`. A length-1 path (the root
    /// itself) empties the tree.
    pub fn remove_tree_at(self, path: &[T]) -> PathResult<Tree<T>> {
        let node = match self.into_node_opt() {
            Some(n) => n,
            None => return Err(Tree::empty()),
        };
        if path.is_empty() {
            return Err(Tree::from_node(node));
        }
        if path.len() == 1 {
            return if node.head == path[0] { Ok(Tree::empty()) } else { Err(Tree::from_node(node)) };
        }
        let eq = |v: &T, p: &T| v == p;
        match transform_parent(node, path, &eq, &mut |mut parent, idx| {
            parent.children.remove(idx);
            parent
        }) {
            Ok(n) => Ok(Tree::from_node(n)),
            Err(n) => Err(Tree::from_node(n)),
        }
    }

    /// Inserts `leaf` at the end of `path`: any missing intermediate
    /// nodes along `path` are synthesized (§4.4.3's documented partial
    /// exception).
    #[instrument(level = Level::DEBUG, skip(self, path, leaf))]
    pub fn insert_leaf_at(self, path: &[T], leaf: T) -> Tree<T> {
        self.insert_leaf_at_impl(path, leaf, true)
    }

    pub fn insert_leaf_lax_at(self, path: &[T], leaf: T) -> Tree<T> {
        self.insert_leaf_at_impl(path, leaf, false)
    }

    fn insert_leaf_at_impl(self, path: &[T], leaf: T, distinct: bool) -> Tree<T> {
        match self.0 {
            Repr::Empty => {
                if path.is_empty() {
                    Tree::from_node(NodeTree::leaf(leaf))
                } else {
                    let mut chain: Vec<T> = path.to_vec();
                    chain.push(leaf);
                    Tree::from_node(crate::node::build_chain(chain[0].clone(), &chain[1..]))
                }
            }
            Repr::Inflated(n) => Tree::from_node(insert_leaf_at_rec(n, path, leaf, distinct)),
            Repr::Deflated(s, v) => {
                let node = NodeTree::from_linear(root_index(&s), &s, &v).expect("deflated tree invariants hold by construction");
                Tree::from_node(insert_leaf_at_rec(node, path, leaf, distinct))
            }
        }
    }

    /// Extractor form: path is matched against `key(&node.head)` and
    /// cannot synthesize missing nodes (returns `Err(unchanged)` instead).
    pub fn insert_leaf_at_by<K: PartialEq>(self, path: &[K], leaf: T, key: impl Fn(&T) -> K) -> PathResult<Tree<T>> {
        self.insert_child_at_by(path, NodeTree::leaf(leaf), key, true)
    }

    fn insert_child_at_by<K: PartialEq>(
        self,
        path: &[K],
        child: NodeTree<T>,
        key: impl Fn(&T) -> K,
        append: bool,
    ) -> PathResult<Tree<T>> {
        let node = match self.into_node_opt() {
            Some(n) => n,
            None => return Err(Tree::empty()),
        };
        let mut child = Some(child);
        let eq = |v: &T, p: &K| &key(v) == p;
        match transform_at(node, path, &eq, &mut |n| n.insert_child_distinct(child.take().expect("applied exactly once"), append)) {
            Ok(n) => Ok(Tree::from_node(n)),
            Err(n) => Err(Tree::from_node(n)),
        }
    }
}

fn map_node<T, U>(node: NodeTree<T>, f: &impl Fn(T) -> U) -> NodeTree<U> {
    NodeTree { head: f(node.head), children: node.children.into_iter().map(|c| map_node(c, f)).collect() }
}

fn flat_map_node<T: Clone, U: Clone + PartialEq>(node: NodeTree<T>, f: impl Fn(T) -> Tree<U> + Copy) -> NodeTree<U> {
    let NodeTree { head, children } = node;
    let mut root = f(head)
        .into_node_opt()
        .expect("flat_map's function must produce a non-empty tree for every value, as in flatMap: A => Tree[B]");
    for child in children {
        let mapped_child = flat_map_node(child, f);
        root = root.insert_child_distinct(mapped_child, false);
    }
    root
}

/// Walks `path` from `node`'s own head (`path[0]` must match it),
/// applying `apply` to the matched node once the whole path is consumed.
/// Returns `Err(node)`, structurally unchanged, on any mismatch.
fn transform_at<T, P>(
    node: NodeTree<T>,
    path: &[P],
    eq: &impl Fn(&T, &P) -> bool,
    apply: &mut dyn FnMut(NodeTree<T>) -> NodeTree<T>,
) -> Result<NodeTree<T>, NodeTree<T>> {
    if path.is_empty() || !eq(&node.head, &path[0]) {
        return Err(node);
    }
    if path.len() == 1 {
        return Ok(apply(node));
    }
    let NodeTree { head, mut children } = node;
    let rest = &path[1..];
    match children.iter().position(|c| eq(&c.head, &rest[0])) {
        Some(idx) => {
            let child = children.remove(idx);
            match transform_at(child, rest, eq, apply) {
                Ok(new_child) => {
                    children.insert(idx, new_child);
                    Ok(NodeTree { head, children })
                }
                Err(old_child) => {
                    children.insert(idx, old_child);
                    Err(NodeTree { head, children })
                }
            }
        }
        None => Err(NodeTree { head, children }),
    }
}

/// As [`transform_at`], but `apply` operates on the *parent* of the
/// matched node, given the matched node's index among its siblings —
/// used by operations that remove or replace the matched node itself
/// rather than transforming its contents.
fn transform_parent<T, P>(
    node: NodeTree<T>,
    path: &[P],
    eq: &impl Fn(&T, &P) -> bool,
    apply: &mut dyn FnMut(NodeTree<T>, usize) -> NodeTree<T>,
) -> Result<NodeTree<T>, NodeTree<T>> {
    if path.len() < 2 || !eq(&node.head, &path[0]) {
        return Err(node);
    }
    let NodeTree { head, mut children } = node;
    let rest = &path[1..];
    match children.iter().position(|c| eq(&c.head, &rest[0])) {
        Some(idx) if rest.len() == 1 => {
            let parent = NodeTree { head, children };
            Ok(apply(parent, idx))
        }
        Some(idx) => {
            let child = children.remove(idx);
            match transform_parent(child, rest, eq, apply) {
                Ok(new_child) => {
                    children.insert(idx, new_child);
                    Ok(NodeTree { head, children })
                }
                Err(old_child) => {
                    children.insert(idx, old_child);
                    Err(NodeTree { head, children })
                }
            }
        }
        None => Err(NodeTree { head, children }),
    }
}

fn insert_leaf_at_rec<T: Clone + PartialEq>(node: NodeTree<T>, path: &[T], leaf: T, distinct: bool) -> NodeTree<T> {
    if path.is_empty() || node.head != path[0] {
        return node;
    }
    insert_leaf_at_matched(node, &path[1..], leaf, distinct)
}

fn insert_leaf_at_matched<T: Clone + PartialEq>(node: NodeTree<T>, rest: &[T], leaf: T, distinct: bool) -> NodeTree<T> {
    if rest.is_empty() {
        return if distinct {
            node.insert_child_distinct(NodeTree::leaf(leaf), false)
        } else {
            node.insert_child_lax(NodeTree::leaf(leaf), false)
        };
    }
    let NodeTree { head, mut children } = node;
    match children.iter().position(|c| c.head == rest[0]) {
        Some(idx) => {
            let child = children.remove(idx);
            children.insert(idx, insert_leaf_at_matched(child, &rest[1..], leaf, distinct));
        }
        None => {
            let mut chain: Vec<T> = rest.to_vec();
            chain.push(leaf);
            children.insert(0, crate::node::build_chain(chain[0].clone(), &chain[1..]));
        }
    }
    NodeTree { head, children }
}

impl<T: PartialEq> PartialEq for Tree<T> {
    /// Structural equality (P3): same root value, same-length children,
    /// recursively equal in order — never raw array-level comparison
    /// (§9's "equality across representations").
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Repr::Empty, Repr::Empty) => true,
            (Repr::Empty, _) | (_, Repr::Empty) => false,
            _ => tree_eq(self, other),
        }
    }
}

fn tree_eq<T: PartialEq>(a: &Tree<T>, b: &Tree<T>) -> bool {
    if a.root_value() != b.root_value() {
        return false;
    }
    let (a_children, b_children) = (node_children_refs(a), node_children_refs(b));
    a_children.len() == b_children.len() && a_children.iter().zip(b_children.iter()).all(|(x, y)| x == y)
}

/// Borrowed view of a tree's direct children as `Tree<&T>`-free structural
/// comparisons, without cloning `T`: compares heads then recurses.
fn node_children_refs<T: PartialEq>(t: &Tree<T>) -> Vec<ChildView<'_, T>> {
    match &t.0 {
        Repr::Empty => Vec::new(),
        Repr::Inflated(n) => n.children.iter().map(ChildView::Node).collect(),
        Repr::Deflated(s, v) => {
            let root = root_index(s);
            linear::children_indexes(root, s)
                .expect("deflated tree invariants hold by construction")
                .into_iter()
                .map(|c| ChildView::Deflated(s, v, c))
                .collect()
        }
    }
}

enum ChildView<'a, T> {
    Node(&'a NodeTree<T>),
    Deflated(&'a [i32], &'a [T], i32),
}

impl<'a, T: PartialEq> PartialEq for ChildView<'a, T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ChildView::Node(a), ChildView::Node(b)) => node_eq(a, b),
            (ChildView::Deflated(s1, v1, i1), ChildView::Deflated(s2, v2, i2)) => deflated_eq(s1, v1, *i1, s2, v2, *i2),
            (ChildView::Node(a), ChildView::Deflated(s, v, i)) | (ChildView::Deflated(s, v, i), ChildView::Node(a)) => {
                cross_eq(a, s, v, *i)
            }
        }
    }
}

fn node_eq<T: PartialEq>(a: &NodeTree<T>, b: &NodeTree<T>) -> bool {
    a.head == b.head
        && a.children.len() == b.children.len()
        && a.children.iter().zip(b.children.iter()).all(|(x, y)| node_eq(x, y))
}

fn deflated_eq<T: PartialEq>(s1: &[i32], v1: &[T], i1: i32, s2: &[i32], v2: &[T], i2: i32) -> bool {
    if v1[i1 as usize] != v2[i2 as usize] {
        return false;
    }
    let c1 = linear::children_indexes(i1, s1).expect("deflated tree invariants hold by construction");
    let c2 = linear::children_indexes(i2, s2).expect("deflated tree invariants hold by construction");
    c1.len() == c2.len() && c1.iter().zip(c2.iter()).all(|(&x, &y)| deflated_eq(s1, v1, x, s2, v2, y))
}

fn cross_eq<T: PartialEq>(a: &NodeTree<T>, s: &[i32], v: &[T], i: i32) -> bool {
    if a.head != v[i as usize] {
        return false;
    }
    let c = linear::children_indexes(i, s).expect("deflated tree invariants hold by construction");
    a.children.len() == c.len()
        && a.children.iter().zip(c.iter()).all(|(child, &idx)| cross_eq(child, s, v, idx))
}

impl<T: Eq> Eq for Tree<T> {}

impl<T: Hash> Hash for Tree<T> {
    /// Consistent with [`PartialEq`]: hashes the root value then each
    /// child recursively, independent of representation.
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            Repr::Empty => 0u8.hash(state),
            Repr::Inflated(n) => hash_node(n, state),
            Repr::Deflated(s, v) => hash_deflated(s, v, root_index(s), state),
        }
    }
}

fn hash_node<T: Hash, H: Hasher>(node: &NodeTree<T>, state: &mut H) {
    node.head.hash(state);
    node.children.len().hash(state);
    for child in &node.children {
        hash_node(child, state);
    }
}

fn hash_deflated<T: Hash, H: Hasher>(structure: &[i32], values: &[T], i: i32, state: &mut H) {
    values[i as usize].hash(state);
    let children = linear::children_indexes(i, structure).expect("deflated tree invariants hold by construction");
    children.len().hash(state);
    for &c in children.iter() {
        hash_deflated(structure, values, c, state);
    }
}

impl<T: fmt::Display> fmt::Display for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::fmt::write_bracketed(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::from_arrays;

    fn leaf(v: &'static str) -> Tree<&'static str> {
        Tree::from_node(NodeTree::leaf(v))
    }

    #[test]
    fn size_width_height_match_across_representations() {
        let inflated = Tree::from_node(NodeTree::with_children(
            "a",
            vec![NodeTree::with_children("b", vec![NodeTree::leaf("c")]), NodeTree::leaf("d")],
        ));
        let (s, v) = inflated.to_arrays();
        let deflated = from_arrays(s, v).unwrap();
        assert_eq!(inflated.size(), deflated.size());
        assert_eq!(inflated.width(), deflated.width());
        assert_eq!(inflated.height(), deflated.height());
        assert_eq!(inflated, deflated);
    }

    #[test]
    fn s4_insert_leaf_prepend_and_append() {
        let t = leaf("a").insert_child(leaf("b"), false);
        let unchanged = t.clone().insert_leaf("b", false);
        assert_eq!(unchanged, t);

        let prepended = t.clone().insert_leaf("c", false);
        assert_eq!(prepended.children_values(), vec![&"c", &"b"]);

        let appended = t.insert_leaf("c", true);
        assert_eq!(appended.children_values(), vec![&"b", &"c"]);
    }

    #[test]
    fn s5_path_not_found_returns_unchanged() {
        let t = leaf("a").insert_child(leaf("b").insert_child(leaf("c"), true), true);
        let result = t.clone().modify_value_at(&["a", "c"], |v| v);
        match result {
            Err(unchanged) => assert_eq!(unchanged, t),
            Ok(_) => panic!("expected Err for an unmatched path"),
        }
    }

    #[test]
    fn s7_branch_insert_on_empty() {
        let t: Tree<&str> = Tree::empty().insert_branch(vec!["a", "b", "c", "d"]);
        assert_eq!(t.root_value(), Some(&"a"));
        assert_eq!(t.branches(None), vec![vec![&"a", &"b", &"c", &"d"]]);
    }

    #[test]
    fn p12_path_matched_update_applies() {
        let t = leaf("a").insert_child(leaf("b"), true);
        let updated = t.update_value_at(&["a", "b"], "z").expect("path exists");
        assert_eq!(updated.children_values(), vec![&"z"]);
    }

    #[test]
    fn p13_unchanged_on_miss() {
        let t = leaf("a").insert_child(leaf("b"), true);
        match t.clone().update_value_at(&["a", "x"], "z") {
            Err(unchanged) => assert_eq!(unchanged, t),
            Ok(_) => panic!("expected a miss"),
        }
    }

    #[test]
    fn p14_remove_value_reparents_children() {
        let t = leaf("a").insert_child(leaf("b").insert_child(leaf("c"), true), true);
        let removed = t.remove_value_at(&["a", "b"]).expect("path exists");
        assert_eq!(removed.children_values(), vec![&"c"]);
    }

    #[test]
    fn flat_map_splices_and_deduplicates() {
        let t = leaf("a").insert_children(vec![leaf("b"), leaf("c")], true);
        let mapped = t.flat_map(|v| leaf("b").insert_child(leaf(v), true));
        // b( b(b,c), a )
        assert_eq!(mapped.root_value(), Some(&"b"));
        let children = mapped.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].root_value(), Some(&"b"));
        assert_eq!(children[0].children_values(), vec![&"b", &"c"]);
        assert_eq!(children[1].root_value(), Some(&"a"));
    }

    #[test]
    fn map_preserves_structure() {
        let t = leaf(1 as i32).insert_children(vec![leaf(2), leaf(3)], true);
        let t = t.map(|v: i32| v * 10);
        assert_eq!(t.root_value(), Some(&10));
        assert_eq!(t.children_values(), vec![&20, &30]);
    }
}
