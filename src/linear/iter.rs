//! Lazy, single-pass iteration over the linear encoding (§4.2.2).
//!
//! All iterators here are depth-first, top-down, left-to-right, and use an
//! explicit stack proportional to the current frontier rather than
//! recursion, so that dropping an iterator mid-traversal simply drops its
//! stack.

use super::lookup::children_indexes;

/// Depth-first, top-down, left-to-right iteration over the indices of the
/// subtree rooted at `root`.
pub struct NodeIndexIter<'a> {
    structure: &'a [i32],
    stack: Vec<i32>,
}

impl<'a> NodeIndexIter<'a> {
    pub fn new(root: i32, structure: &'a [i32]) -> Self {
        let stack = if root < 0 { Vec::new() } else { vec![root] };
        NodeIndexIter { structure, stack }
    }
}

impl<'a> Iterator for NodeIndexIter<'a> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let i = self.stack.pop()?;
        // children_indexes yields left-to-right; push in reverse so the
        // leftmost sibling ends up on top of the stack and pops next.
        if let Ok(children) = children_indexes(i, self.structure) {
            for c in children.into_iter().rev() {
                self.stack.push(c);
            }
        }
        Some(i)
    }
}

/// As [`NodeIndexIter`], but cut off at `max_depth` (root is depth 1;
/// `max_depth == 0` yields nothing).
pub struct NodeIndexIterWithLimit<'a> {
    structure: &'a [i32],
    stack: Vec<(i32, u32)>,
    max_depth: u32,
}

impl<'a> NodeIndexIterWithLimit<'a> {
    pub fn new(root: i32, structure: &'a [i32], max_depth: u32) -> Self {
        let stack = if root < 0 || max_depth == 0 { Vec::new() } else { vec![(root, 1)] };
        NodeIndexIterWithLimit { structure, stack, max_depth }
    }
}

impl<'a> Iterator for NodeIndexIterWithLimit<'a> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let (i, depth) = self.stack.pop()?;
        if depth < self.max_depth {
            if let Ok(children) = children_indexes(i, self.structure) {
                for c in children.into_iter().rev() {
                    self.stack.push((c, depth + 1));
                }
            }
        }
        Some(i)
    }
}

/// Yields each root-to-leaf index list (a *branch*) of the subtree rooted
/// at `root`, in depth-first order. When `max_depth` is set, nodes at that
/// depth are treated as leaves (their children are pruned).
pub struct BranchesIndexListIter<'a> {
    structure: &'a [i32],
    stack: Vec<Vec<i32>>,
    max_depth: Option<usize>,
}

impl<'a> BranchesIndexListIter<'a> {
    pub fn new(root: i32, structure: &'a [i32], max_depth: Option<usize>) -> Self {
        let stack = if root < 0 { Vec::new() } else { vec![vec![root]] };
        BranchesIndexListIter { structure, stack, max_depth }
    }
}

impl<'a> Iterator for BranchesIndexListIter<'a> {
    type Item = Vec<i32>;

    fn next(&mut self) -> Option<Vec<i32>> {
        while let Some(path) = self.stack.pop() {
            let last = *path.last().expect("branch paths are never empty");
            let at_limit = self.max_depth.map_or(false, |m| path.len() >= m);
            let children = if at_limit {
                Vec::new()
            } else {
                children_indexes(last, self.structure).unwrap_or_default()
            };
            if children.is_empty() {
                return Some(path);
            }
            for c in children.into_iter().rev() {
                let mut extended = path.clone();
                extended.push(c);
                self.stack.push(extended);
            }
        }
        None
    }
}

/// Strict left fold over the branches of the subtree rooted at `root`.
pub fn fold_left_branches_index_lists<B>(
    root: i32,
    structure: &[i32],
    init: B,
    max_depth: Option<usize>,
    mut fold_fn: impl FnMut(B, &[i32]) -> B,
) -> B {
    let mut acc = init;
    for branch in BranchesIndexListIter::new(root, structure, max_depth) {
        acc = fold_fn(acc, &branch);
    }
    acc
}

/// As [`fold_left_branches_index_lists`], but passes only each branch's
/// length — cheaper when the fold does not need the indices themselves.
pub fn fold_left_branches_lengths<B>(
    root: i32,
    structure: &[i32],
    init: B,
    mut fold_fn: impl FnMut(B, usize) -> B,
) -> B {
    let mut acc = init;
    for branch in BranchesIndexListIter::new(root, structure, None) {
        acc = fold_fn(acc, branch.len());
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    // a(b(c), d(e(f)), g) — storage order (children before parent, rightmost
    // sibling first): c b f e g d a? Let's build by hand via NodeTree instead
    // in node.rs tests; here we only sanity-check a trivial case.

    #[test]
    fn single_leaf() {
        let structure = [0];
        let indices: Vec<i32> = NodeIndexIter::new(0, &structure).collect();
        assert_eq!(indices, vec![0]);
    }

    #[test]
    fn depth_limit_zero_yields_nothing() {
        let structure = [0];
        let indices: Vec<i32> = NodeIndexIterWithLimit::new(0, &structure, 0).collect();
        assert!(indices.is_empty());
    }

    #[test]
    fn branches_of_a_leaf_is_itself() {
        let structure = [0];
        let branches: Vec<Vec<i32>> = BranchesIndexListIter::new(0, &structure, None).collect();
        assert_eq!(branches, vec![vec![0]]);
    }
}
