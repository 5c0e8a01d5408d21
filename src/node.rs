//! C3 — the recursive node form: head value plus an ordered list of child
//! trees. This is the reference semantics for every structural operation
//! (§4.3) and backs the `Inflated` variant of [`crate::tree::Tree`].
//!
//! Every operation here consumes and returns whole [`NodeTree`] values —
//! "trees are values" (spec §3.5) — rather than mutating in place. This
//! mirrors the linear algorithms of [`crate::linear`] one level up, on
//! `Vec<NodeTree<T>>` child lists instead of index arithmetic.

use crate::buffer::Buffer;

/// A single node: a head value and its ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeTree<T> {
    pub head: T,
    pub children: Vec<NodeTree<T>>,
}

/// Traversal order requested by the tree facade's `values`/`trees` methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    DepthFirst,
    BreadthFirst,
}

impl<T> NodeTree<T> {
    pub fn leaf(head: T) -> Self {
        NodeTree { head, children: Vec::new() }
    }

    pub fn with_children(head: T, children: Vec<NodeTree<T>>) -> Self {
        NodeTree { head, children }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn width(&self) -> usize {
        self.children.len()
    }

    /// `1 + Σ size(child)` (P16).
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(NodeTree::size).sum::<usize>()
    }

    /// `1 + max(height(children))`, or `1` for a leaf (P15).
    pub fn height(&self) -> usize {
        1 + self.children.iter().map(NodeTree::height).max().unwrap_or(0)
    }

    /// Values in the order requested (P4/P5).
    pub fn values(&self, order: Order) -> Vec<&T> {
        self.trees(order).into_iter().map(|t| &t.head).collect()
    }

    /// Subtrees in the order requested (P4/P5); depth-first visits the root
    /// first, then each child's subtree left to right; breadth-first visits
    /// strictly by increasing depth, left to right within a depth.
    pub fn trees(&self, order: Order) -> Vec<&NodeTree<T>> {
        match order {
            Order::DepthFirst => {
                let mut out = Vec::new();
                self.push_depth_first(&mut out);
                out
            }
            Order::BreadthFirst => {
                let mut out = Vec::new();
                let mut frontier = vec![self];
                while !frontier.is_empty() {
                    let mut next = Vec::new();
                    for node in frontier {
                        out.push(node);
                        next.extend(node.children.iter());
                    }
                    frontier = next;
                }
                out
            }
        }
    }

    fn push_depth_first<'a>(&'a self, out: &mut Vec<&'a NodeTree<T>>) {
        out.push(self);
        for child in &self.children {
            child.push_depth_first(out);
        }
    }

    /// Depth-first values, cut off at `max_depth` (root is depth 1).
    pub fn values_with_limit(&self, max_depth: u32) -> Vec<&T> {
        self.trees_with_limit(max_depth).into_iter().map(|t| &t.head).collect()
    }

    pub fn trees_with_limit(&self, max_depth: u32) -> Vec<&NodeTree<T>> {
        let mut out = Vec::new();
        if max_depth > 0 {
            self.push_depth_first_limited(1, max_depth, &mut out);
        }
        out
    }

    fn push_depth_first_limited<'a>(&'a self, depth: u32, max_depth: u32, out: &mut Vec<&'a NodeTree<T>>) {
        out.push(self);
        if depth < max_depth {
            for child in &self.children {
                child.push_depth_first_limited(depth + 1, max_depth, out);
            }
        }
    }

    /// Depth-first values matching `filter`.
    pub fn values_with_filter(&self, filter: impl Fn(&T) -> bool) -> Vec<&T> {
        self.trees(Order::DepthFirst).into_iter().map(|t| &t.head).filter(|v| filter(v)).collect()
    }

    /// Every root-to-leaf path of values, depth-first (P6). With
    /// `max_depth` set, a node at that depth is treated as a leaf.
    pub fn branches(&self, max_depth: Option<usize>) -> Vec<Vec<&T>> {
        let mut out = Vec::new();
        let mut path = vec![&self.head];
        self.collect_branches(max_depth, &mut path, &mut out);
        out
    }

    fn collect_branches<'a>(&'a self, max_depth: Option<usize>, path: &mut Vec<&'a T>, out: &mut Vec<Vec<&'a T>>) {
        let at_limit = max_depth.map_or(false, |m| path.len() >= m);
        if self.children.is_empty() || at_limit {
            out.push(path.clone());
            return;
        }
        for child in &self.children {
            path.push(&child.head);
            child.collect_branches(max_depth, path, out);
            path.pop();
        }
    }

    /// Every non-empty prefix of every branch, depth-first (P7).
    pub fn paths(&self) -> Vec<Vec<&T>> {
        let mut out = Vec::new();
        let mut path = vec![&self.head];
        self.collect_paths(&mut path, &mut out);
        out
    }

    fn collect_paths<'a>(&'a self, path: &mut Vec<&'a T>, out: &mut Vec<Vec<&'a T>>) {
        out.push(path.clone());
        for child in &self.children {
            path.push(&child.head);
            child.collect_paths(path, out);
            path.pop();
        }
    }
}

impl<T: Clone> NodeTree<T> {
    /// Materializes the linear (storage-order) encoding of this tree:
    /// children before parent, rightmost sibling emitted before leftmost.
    pub fn to_arrays(&self) -> (Vec<i32>, Vec<T>) {
        let mut structure = Vec::with_capacity(self.size());
        let mut values = Vec::with_capacity(self.size());
        self.encode(&mut structure, &mut values);
        (structure, values)
    }

    fn encode(&self, structure: &mut Vec<i32>, values: &mut Vec<T>) {
        for child in self.children.iter().rev() {
            child.encode(structure, values);
        }
        structure.push(self.children.len() as i32);
        values.push(self.head.clone());
    }

    /// Inflates the subtree rooted at `i` in a linear encoding into a
    /// `NodeTree`, the inverse of [`NodeTree::to_arrays`].
    pub fn from_linear(i: i32, structure: &[i32], values: &[T]) -> crate::error::Result<NodeTree<T>> {
        let child_roots = crate::linear::children_indexes(i, structure)?;
        let mut children = Vec::with_capacity(child_roots.len());
        for &c in child_roots.iter() {
            children.push(NodeTree::from_linear(c, structure, values)?);
        }
        Ok(NodeTree { head: values[i as usize].clone(), children })
    }
}

impl<T: Clone + PartialEq> NodeTree<T> {
    /// Merges `incoming` into `existing`, the same-headed sibling it
    /// collided with: `incoming`'s head is discarded and its children join
    /// `existing`'s, then the combined list is de-duplicated (§4.2.6),
    /// mirroring `merge_two_trees` one level up — `merge_two_trees` puts a
    /// dissolved node's children on the side of its surviving partner
    /// *opposite* to where the dissolved node sat, so here, where
    /// `incoming` was heading for the right end (`append == true`) of the
    /// parent's child list, i.e. sits to the right of `existing`, its
    /// children become `existing`'s new *leftmost* children; heading for
    /// the left end, they become `existing`'s new *rightmost* children.
    fn merge_into(existing: &mut NodeTree<T>, incoming: NodeTree<T>, append: bool) {
        let merged = if append {
            let mut combined = incoming.children;
            combined.append(&mut existing.children);
            combined
        } else {
            let mut combined = std::mem::take(&mut existing.children);
            combined.extend(incoming.children);
            combined
        };
        existing.children = Self::dedupe_children(merged);
    }

    /// Inserts `child` as a new direct child of `parent`, at the front
    /// (`append == false`) or back (`append == true`), merging it with any
    /// existing same-headed sibling per §4.2.6. The sibling consulted is
    /// the one closest to the insertion end: leftmost (first match) for a
    /// front insert, rightmost (last match) for a back insert.
    fn insert_child_distinct_into(parent: &mut NodeTree<T>, child: NodeTree<T>, append: bool) {
        let existing_index = if append {
            parent.children.iter().rposition(|c| c.head == child.head)
        } else {
            parent.children.iter().position(|c| c.head == child.head)
        };
        match existing_index {
            None => {
                if append {
                    parent.children.push(child);
                } else {
                    parent.children.insert(0, child);
                }
            }
            Some(idx) => {
                let existing = &mut parent.children[idx];
                Self::merge_into(existing, child, append);
            }
        }
    }

    /// Rebuilds `children` with every direct child's head made unique,
    /// merging left to right (earlier-scanned child survives).
    fn dedupe_children(children: Vec<NodeTree<T>>) -> Vec<NodeTree<T>> {
        let mut result: Vec<NodeTree<T>> = Vec::with_capacity(children.len());
        for child in children {
            match result.iter().position(|c| c.head == child.head) {
                None => result.push(child),
                Some(idx) => {
                    let mut merged_children = std::mem::take(&mut result[idx].children);
                    merged_children.extend(child.children);
                    result[idx].children = Self::dedupe_children(merged_children);
                }
            }
        }
        result
    }

    /// Applies the distinctification rule to `self` and, when
    /// `max_lookup_level` permits, to descendants: level `0` or `1` leaves
    /// the tree unchanged, level `2` de-duplicates only the root's direct
    /// children, and so on.
    pub fn make_distinct(self, max_lookup_level: u32) -> NodeTree<T> {
        if max_lookup_level < 2 {
            return self;
        }
        let deduped = Self::dedupe_children(self.children);
        let children = deduped
            .into_iter()
            .map(|c| c.make_distinct(max_lookup_level - 1))
            .collect();
        NodeTree { head: self.head, children }
    }

    /// Inserts `child` as a direct child of `self`, merging with an
    /// existing same-headed sibling (§4.2.6). `insert_child_lax` performs
    /// the same placement without merging.
    pub fn insert_child_distinct(mut self, child: NodeTree<T>, append: bool) -> NodeTree<T> {
        Self::insert_child_distinct_into(&mut self, child, append);
        self
    }

    pub fn insert_child_lax(mut self, child: NodeTree<T>, append: bool) -> NodeTree<T> {
        if append {
            self.children.push(child);
        } else {
            self.children.insert(0, child);
        }
        self
    }

    /// Batch insert: folds `insert_child_distinct`/`insert_child_lax` over
    /// `children_to_add`, in order.
    pub fn insert_children_distinct(mut self, children_to_add: Vec<NodeTree<T>>, append: bool) -> NodeTree<T> {
        for child in children_to_add {
            self = self.insert_child_distinct(child, append);
        }
        self
    }

    pub fn insert_children_lax(mut self, children_to_add: Vec<NodeTree<T>>, append: bool) -> NodeTree<T> {
        for child in children_to_add {
            self = self.insert_child_lax(child, append);
        }
        self
    }

    /// Same as [`NodeTree::insert_children_distinct`] with `append = false`
    /// — each subtree lands as a new leftmost child, earliest-supplied
    /// ending up leftmost of the batch.
    pub fn insert_children_before_distinct(self, children_to_add: Vec<NodeTree<T>>) -> NodeTree<T> {
        // Inserting in reverse order as repeated prepends reproduces the
        // caller's left-to-right order for the batch as a whole.
        let mut tree = self;
        for child in children_to_add.into_iter().rev() {
            tree = tree.insert_child_distinct(child, false);
        }
        tree
    }

    pub fn insert_children_after_distinct(self, children_to_add: Vec<NodeTree<T>>) -> NodeTree<T> {
        self.insert_children_distinct(children_to_add, true)
    }

    /// Ensures the direct child at `child_index` does not share its head
    /// with any other direct child, merging duplicates into it.
    /// `preserve_existing` controls which survives when exactly two share a
    /// head: `true` keeps the node already at `child_index`; `false` lets
    /// the other (necessarily earlier- or later-positioned) sibling absorb
    /// it instead, mirroring `expand_value_into_tree`'s "old value of
    /// `at_i` is preserved" default of favoring the addressed node.
    pub fn ensure_child_distinct(mut self, child_index: usize, preserve_existing: bool) -> NodeTree<T> {
        if child_index >= self.children.len() {
            return self;
        }
        let dup_index = (0..self.children.len())
            .find(|&j| j != child_index && self.children[j].head == self.children[child_index].head);
        if let Some(j) = dup_index {
            let (keep, drop) = if preserve_existing { (child_index, j) } else { (j, child_index) };
            let removed = self.children.remove(drop);
            let keep_idx = if drop < keep { keep - 1 } else { keep };
            let mut merged_children = std::mem::take(&mut self.children[keep_idx].children);
            merged_children.extend(removed.children);
            self.children[keep_idx].children = Self::dedupe_children(merged_children);
        }
        self
    }

    /// Inserts `path` as a branch, diverging from `self` at the first
    /// unmatched element: existing matching nodes are walked (via the
    /// leftmost same-headed child at each step), and the unmatched suffix
    /// is appended as a brand-new leftmost descendant chain.
    pub fn insert_branch(self, path: &[T]) -> NodeTree<T> {
        if path.is_empty() || self.head != path[0] {
            return self;
        }
        self.insert_branch_matched(&path[1..])
    }

    fn insert_branch_matched(mut self, rest: &[T]) -> NodeTree<T> {
        let Some((next, tail)) = rest.split_first() else { return self };
        match self.children.iter().position(|c| &c.head == next) {
            Some(idx) => {
                let child = self.children.remove(idx);
                self.children.insert(idx, child.insert_branch_matched(tail));
                self
            }
            None => {
                let chain = build_chain(next.clone(), tail);
                self.children.insert(0, chain);
                self
            }
        }
    }

    /// Replaces a direct child whose head equals `old` with `new_subtree`,
    /// de-duplicating the result against the remaining siblings.
    pub fn update_child_distinct(mut self, old: &T, new_subtree: NodeTree<T>) -> NodeTree<T> {
        if let Some(idx) = self.children.iter().position(|c| &c.head == old) {
            self.children.remove(idx);
            Self::insert_child_distinct_into(&mut self, new_subtree, false);
        }
        self
    }

    pub fn update_child_lax(mut self, old: &T, new_subtree: NodeTree<T>) -> NodeTree<T> {
        if let Some(idx) = self.children.iter().position(|c| &c.head == old) {
            self.children[idx] = new_subtree;
        }
        self
    }

    /// Replaces the head of a child whose head equals `old`, merging the
    /// result with any sibling it now collides with.
    pub fn update_child_value_distinct(mut self, old: &T, new: T) -> NodeTree<T> {
        if let Some(idx) = self.children.iter().position(|c| &c.head == old) {
            let mut child = self.children.remove(idx);
            child.head = new;
            Self::insert_child_distinct_into(&mut self, child, false);
        }
        self
    }

    pub fn update_child_value_lax(mut self, old: &T, new: T) -> NodeTree<T> {
        if let Some(child) = self.children.iter_mut().find(|c| &c.head == old) {
            child.head = new;
        }
        self
    }

    pub fn modify_child_value_distinct(mut self, old: &T, f: impl FnOnce(T) -> T) -> NodeTree<T> {
        if let Some(idx) = self.children.iter().position(|c| &c.head == old) {
            let mut child = self.children.remove(idx);
            child.head = f(child.head);
            Self::insert_child_distinct_into(&mut self, child, false);
        }
        self
    }

    pub fn modify_child_value_lax(mut self, old: &T, f: impl FnOnce(T) -> T) -> NodeTree<T> {
        if let Some(idx) = self.children.iter().position(|c| &c.head == old) {
            let mut child = self.children.remove(idx);
            child.head = f(child.head);
            self.children.insert(idx, child);
        }
        self
    }

    /// Removes one direct child whose head equals `value`, re-parenting
    /// its children onto `self` in its place, then de-duplicating the
    /// whole child list against the remaining siblings.
    pub fn remove_child_value_distinct(mut self, value: &T) -> NodeTree<T> {
        if let Some(idx) = self.children.iter().position(|c| &c.head == value) {
            let removed = self.children.remove(idx);
            let mut spliced = self.children;
            for (offset, grandchild) in removed.children.into_iter().enumerate() {
                spliced.insert(idx + offset, grandchild);
            }
            self.children = Self::dedupe_children(spliced);
        }
        self
    }

    pub fn remove_child_value_lax(mut self, value: &T) -> NodeTree<T> {
        if let Some(idx) = self.children.iter().position(|c| &c.head == value) {
            let removed = self.children.remove(idx);
            for (offset, grandchild) in removed.children.into_iter().enumerate() {
                self.children.insert(idx + offset, grandchild);
            }
        }
        self
    }

    /// Removes the direct child at `idx`, re-parenting its children in
    /// its place (without de-duplication).
    pub fn remove_child_at_lax(mut self, idx: usize) -> NodeTree<T> {
        if idx >= self.children.len() {
            return self;
        }
        let removed = self.children.remove(idx);
        for (offset, grandchild) in removed.children.into_iter().enumerate() {
            self.children.insert(idx + offset, grandchild);
        }
        self
    }
}

/// Builds a standalone chain `head -> rest[0] -> rest[1] -> ...`, the node
/// form of `linear::insert::build_chain`, used to splice a fresh branch
/// suffix into an existing tree (`insert_branch`) or to bootstrap one from
/// empty (`build::from_branch`).
pub fn build_chain<T>(head: T, rest: &[T]) -> NodeTree<T>
where
    T: Clone,
{
    if rest.is_empty() {
        return NodeTree::leaf(head);
    }
    NodeTree::with_children(head, vec![build_chain(rest[0].clone(), &rest[1..])])
}

/// Collects the values of `iter` into a [`Buffer`], a small convenience
/// used by the builders that accept branch iterators (C5).
pub fn collect_branch<T, I: IntoIterator<Item = T>>(iter: I) -> Buffer<T> {
    Buffer::from_iter(iter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(v: &'static str) -> NodeTree<&'static str> {
        NodeTree::leaf(v)
    }

    #[test]
    fn size_and_height() {
        let t = NodeTree::with_children("a", vec![
            NodeTree::with_children("b", vec![leaf("c")]),
            NodeTree::with_children("d", vec![NodeTree::with_children("e", vec![leaf("f")])]),
            leaf("g"),
        ]);
        assert_eq!(t.size(), 7);
        assert_eq!(t.height(), 4);
    }

    #[test]
    fn s3_depth_and_breadth_first() {
        let t = NodeTree::with_children("a", vec![
            NodeTree::with_children("b", vec![leaf("c")]),
            NodeTree::with_children("d", vec![NodeTree::with_children("e", vec![leaf("f")])]),
            leaf("g"),
        ]);
        assert_eq!(t.values(Order::DepthFirst), vec![&"a", &"b", &"c", &"d", &"e", &"f", &"g"]);
        assert_eq!(t.values(Order::BreadthFirst), vec![&"a", &"b", &"d", &"g", &"c", &"e", &"f"]);
    }

    #[test]
    fn to_arrays_matches_s1() {
        let t = NodeTree::with_children("a", vec![leaf("b"), leaf("c"), leaf("d")]);
        let (structure, values) = t.to_arrays();
        assert_eq!(structure, vec![0, 0, 0, 3]);
        assert_eq!(values, vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn from_linear_round_trips() {
        let structure = [0, 0, 0, 3];
        let values = ["d", "c", "b", "a"];
        let t = NodeTree::from_linear(3, &structure, &values).unwrap();
        assert_eq!(t.head, "a");
        assert_eq!(t.children.iter().map(|c| c.head).collect::<Vec<_>>(), vec!["b", "c", "d"]);
    }

    #[test]
    fn s4_insert_leaf_prepend_and_append() {
        let t = NodeTree::with_children("a", vec![leaf("b")]);
        let unchanged = t.clone().insert_child_distinct(leaf("b"), false);
        assert_eq!(unchanged, t);

        let prepended = t.clone().insert_child_distinct(leaf("c"), false);
        assert_eq!(prepended.children.iter().map(|c| c.head).collect::<Vec<_>>(), vec!["c", "b"]);

        let appended = t.insert_child_distinct(leaf("c"), true);
        assert_eq!(appended.children.iter().map(|c| c.head).collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn s6_make_distinct_merges_same_headed_siblings() {
        let t = NodeTree::with_children("a", vec![
            NodeTree::with_children("b", vec![leaf("c")]),
            NodeTree::with_children("b", vec![leaf("d")]),
            NodeTree::with_children("b", vec![leaf("e")]),
        ]);
        let distinct = t.make_distinct(u32::MAX);
        assert_eq!(distinct.children.len(), 1);
        assert_eq!(distinct.children[0].head, "b");
        assert_eq!(
            distinct.children[0].children.iter().map(|c| c.head).collect::<Vec<_>>(),
            vec!["c", "d", "e"]
        );
    }

    #[test]
    fn s7_branch_insert_on_empty_chain() {
        let chain = build_chain("a", &["b", "c", "d"]);
        assert_eq!(chain.head, "a");
        assert_eq!(chain.children[0].head, "b");
        assert_eq!(chain.children[0].children[0].head, "c");
        assert_eq!(chain.children[0].children[0].children[0].head, "d");
    }

    #[test]
    fn p10_make_distinct_is_idempotent() {
        let t = NodeTree::with_children("a", vec![
            NodeTree::with_children("b", vec![leaf("x")]),
            NodeTree::with_children("b", vec![leaf("y")]),
        ]);
        let once = t.make_distinct(u32::MAX);
        let twice = once.clone().make_distinct(u32::MAX);
        assert_eq!(once, twice);
    }
}
