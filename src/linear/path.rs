//! Path and value lookup over the linear encoding (§4.2.3).

use super::lookup::children_indexes;
use crate::error::Result;

/// The leftmost (first, left to right) direct child of `parent_i` whose
/// head equals `value`.
pub fn leftmost_index_of_child_value<T: PartialEq>(
    value: &T,
    parent_i: i32,
    structure: &[i32],
    values: &[T],
) -> Result<Option<i32>> {
    let children = children_indexes(parent_i, structure)?;
    Ok(children.into_iter().find(|&c| &values[c as usize] == value))
}

/// The rightmost (last, left to right) direct child of `parent_i` whose
/// head equals `value`.
pub fn rightmost_index_of_child_value<T: PartialEq>(
    value: &T,
    parent_i: i32,
    structure: &[i32],
    values: &[T],
) -> Result<Option<i32>> {
    let children = children_indexes(parent_i, structure)?;
    Ok(children.into_iter().rev().find(|&c| &values[c as usize] == value))
}

/// All children of `parent_i` whose head equals `value`, left to right.
pub fn children_indexes_for<T: PartialEq>(
    value: &T,
    parent_i: i32,
    structure: &[i32],
    values: &[T],
) -> Result<Vec<i32>> {
    let children = children_indexes(parent_i, structure)?;
    Ok(children.into_iter().filter(|&c| &values[c as usize] == value).collect())
}

/// The result of walking a path from the root of a linear tree.
pub struct FollowResult<'p, T> {
    /// Indices successfully matched, root first, deepest last.
    pub matched_indices: Vec<i32>,
    /// The path element that failed to match, if any.
    pub next_unmatched: Option<&'p T>,
    /// The unmatched suffix of `path`, after `next_unmatched`.
    pub remaining: &'p [T],
    /// `true` iff the whole path matched and terminated at a tree node.
    pub fully_matched: bool,
}

/// Walks `path` from `root`, matching `path[0]` against the root's head and
/// each subsequent element against a child of the previously matched node.
pub fn follow_path<'p, T: PartialEq>(
    path: &'p [T],
    root: i32,
    structure: &[i32],
    values: &[T],
) -> Result<FollowResult<'p, T>> {
    if root < 0 {
        return Ok(if path.is_empty() {
            FollowResult { matched_indices: vec![], next_unmatched: None, remaining: &path[0..0], fully_matched: true }
        } else {
            FollowResult {
                matched_indices: vec![],
                next_unmatched: Some(&path[0]),
                remaining: &path[1..],
                fully_matched: false,
            }
        });
    }

    let mut matched = Vec::new();
    let mut cur = root;
    let mut idx = 0usize;

    while idx < path.len() {
        if idx == 0 {
            if values[cur as usize] != path[0] {
                return Ok(FollowResult {
                    matched_indices: matched,
                    next_unmatched: Some(&path[0]),
                    remaining: &path[1..],
                    fully_matched: false,
                });
            }
            matched.push(cur);
            idx += 1;
            continue;
        }
        match leftmost_index_of_child_value(&path[idx], cur, structure, values)? {
            Some(child) => {
                matched.push(child);
                cur = child;
                idx += 1;
            }
            None => {
                return Ok(FollowResult {
                    matched_indices: matched,
                    next_unmatched: Some(&path[idx]),
                    remaining: &path[idx + 1..],
                    fully_matched: false,
                });
            }
        }
    }

    Ok(FollowResult { matched_indices: matched, next_unmatched: None, remaining: &path[idx..], fully_matched: true })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_path_on_empty_tree() {
        let structure: [i32; 0] = [];
        let values: [&str; 0] = [];
        let path = ["a", "b"];
        let r = follow_path(&path, -1, &structure, &values).unwrap();
        assert!(r.matched_indices.is_empty());
        assert_eq!(r.next_unmatched, Some(&"a"));
        assert_eq!(r.remaining, &["b"]);
        assert!(!r.fully_matched);
    }

    #[test]
    fn s5_path_not_found() {
        // a(b(c)): storage order c,b,a
        let structure = [0, 1, 1];
        let values = ["c", "b", "a"];
        let path = ["a", "c"];
        let r = follow_path(&path, 2, &structure, &values).unwrap();
        assert!(!r.fully_matched);
        assert_eq!(r.next_unmatched, Some(&"c"));
    }
}
