//! Insertion helpers over the linear encoding (§4.2.4).
//!
//! Every helper here mutates a `(structure_buf, values_buf)` pair in place
//! and reports a signed size delta, preserving invariants I1–I5 on
//! success, per the spec's buffer-renting contract (§3.5).

use super::distinct::make_children_distinct;
use super::lookup::{children_indexes, subtree_size};
use super::path::leftmost_index_of_child_value;
use crate::buffer::{Buffer, IntBuffer};
use crate::error::Result;

/// Encodes `suffix` as a standalone chain (leaf first, root last — the
/// storage order of a single-child-per-node path), the way
/// `Empty.insertBranch([..])` bootstraps a whole tree from nothing (S7).
fn build_chain<T: Clone>(suffix: &[T]) -> (Vec<i32>, Vec<T>) {
    let mut structure = Vec::with_capacity(suffix.len());
    let mut values = Vec::with_capacity(suffix.len());
    for (idx, v) in suffix.iter().rev().enumerate() {
        structure.push(if idx == 0 { 0 } else { 1 });
        values.push(v.clone());
    }
    (structure, values)
}

/// Splices a contiguous, already-encoded block of `child_count` top-level
/// subtrees in as new children of `parent_i`, either at the front
/// (`append == false`, prepend/leftmost) or the back
/// (`append == true`, rightmost).
///
/// Returns `(size delta, parent's new index, the array position the block
/// was spliced at)` — the latter two let batch callers keep their own
/// bookkeeping of indices that moved.
pub fn insert_children_block<T: Clone>(
    sub_structure: &[i32],
    sub_values: &[T],
    parent_i: i32,
    child_count: i32,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
    append: bool,
) -> Result<(i32, i32, i32)> {
    let k = sub_structure.len() as i32;
    if k == 0 {
        return Ok((0, parent_i, parent_i));
    }
    let insertion_at = if append {
        let existing_size = subtree_size(parent_i, structure_buf.as_slice())? as i32 - 1;
        parent_i - existing_size
    } else {
        parent_i
    };
    values_buf.insert_slice_at(insertion_at, sub_values)?;
    structure_buf.insert_slice_at(insertion_at, sub_structure)?;
    let new_parent_i = parent_i + k;
    let cur = *structure_buf.get(new_parent_i)?;
    structure_buf.set(new_parent_i, cur + child_count)?;
    Ok((k, new_parent_i, insertion_at))
}

/// Splices a single already-encoded subtree in as one new child of
/// `parent_i`.
pub fn insert_subtree_as_child<T: Clone>(
    sub_structure: &[i32],
    sub_values: &[T],
    parent_i: i32,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
    append: bool,
) -> Result<(i32, i32)> {
    let (delta, new_parent_i, _) =
        insert_children_block(sub_structure, sub_values, parent_i, 1, structure_buf, values_buf, append)?;
    Ok((delta, new_parent_i))
}

/// Inserts the chain described by `path`, rooted at `parent_i`.
///
/// An empty tree with `parent_i == -1` bootstraps a whole new tree out of
/// the chain (S7). Otherwise `path[0]` must equal `values[parent_i]`; the
/// path is then followed as far as it already exists, and the first
/// unmatched suffix is spliced in as a brand new leftmost descendant chain
/// under the deepest matched node — "inserts at the first point of
/// divergence".
pub fn insert_branch<T: PartialEq + Clone>(
    path: &[T],
    parent_i: i32,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
) -> Result<i32> {
    if path.is_empty() {
        return Ok(0);
    }

    if values_buf.is_empty() {
        let (structure, values) = build_chain(path);
        let delta = structure.len() as i32;
        structure_buf.append_all(&structure);
        values_buf.append_all(&values);
        return Ok(delta);
    }

    if values_buf.get(parent_i)? != &path[0] {
        return Ok(0);
    }

    let mut cur = parent_i;
    let mut idx = 1usize;
    while idx < path.len() {
        match leftmost_index_of_child_value(&path[idx], cur, structure_buf.as_slice(), values_buf.as_slice())? {
            Some(child) => {
                cur = child;
                idx += 1;
            }
            None => break,
        }
    }

    if idx == path.len() {
        return Ok(0);
    }

    let suffix = &path[idx..];
    let (chain_structure, chain_values) = build_chain(suffix);
    let (delta, _) = insert_subtree_as_child(&chain_structure, &chain_values, cur, structure_buf, values_buf, false)?;
    Ok(delta)
}

/// Replaces the single node at `at_i` with the subtree described by
/// `(sub_structure, sub_values)`: `at_i`'s own head is preserved, and the
/// given subtree's top-level children (i.e. everything but its own root,
/// which is discarded in favor of `at_i`'s existing head) are appended, in
/// their original left-to-right order, as new children of `at_i`.
pub fn expand_value_into_tree<T: Clone + PartialEq>(
    sub_structure: &[i32],
    sub_values: &[T],
    at_i: i32,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
) -> Result<i32> {
    Ok(expand_value_into_tree_impl(sub_structure, sub_values, at_i, structure_buf, values_buf)?.0)
}

fn expand_value_into_tree_impl<T: Clone + PartialEq>(
    sub_structure: &[i32],
    sub_values: &[T],
    at_i: i32,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
) -> Result<(i32, i32)> {
    if sub_structure.is_empty() {
        return Ok((0, at_i));
    }
    let sub_root = (sub_structure.len() - 1) as i32;
    let children = children_indexes(sub_root, sub_structure)?; // rightmost-first, within sub_structure's own indexing
    let mut delta = 0i32;
    let mut parent = at_i;
    for &child_local in children.iter().rev() {
        // leftmost-first, so repeated appends reproduce the original order
        let child_size = subtree_size(child_local, sub_structure)? as i32;
        let lo = (child_local + 1 - child_size) as usize;
        let hi = (child_local + 1) as usize;
        let (d, new_parent) = insert_subtree_as_child(
            &sub_structure[lo..hi],
            &sub_values[lo..hi],
            parent,
            structure_buf,
            values_buf,
            true,
        )?;
        delta += d;
        parent = new_parent;
    }
    Ok((delta, parent))
}

/// As [`expand_value_into_tree`], but de-duplicates `at_i`'s new siblings
/// under `parent_i` afterwards, merging any same-headed siblings produced
/// by the expansion (§4.2.6).
pub fn expand_value_into_tree_distinct<T: Clone + PartialEq>(
    sub_structure: &[i32],
    sub_values: &[T],
    at_i: i32,
    parent_i: i32,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
) -> Result<i32> {
    let (d1, _new_at_i) = expand_value_into_tree_impl(sub_structure, sub_values, at_i, structure_buf, values_buf)?;
    let new_parent_i = if parent_i > at_i { parent_i + d1 } else { parent_i };
    let d2 = if new_parent_i >= 0 {
        make_children_distinct(new_parent_i, structure_buf, values_buf)?
    } else {
        0
    };
    Ok(d1 + d2)
}

/// Batch-inserts several subtrees, each as the leftmost (`append = false`)
/// or rightmost (`append = true`) child of its named parent, then makes
/// every affected parent's children distinct.
///
/// `list` is `(parent_i, sub_structure, sub_values)` triples. Parent
/// indices are corrected for shifts caused by earlier entries in the same
/// call, so `list` may be supplied in any order.
pub fn insert_subtree_list_distinct<T: Clone + PartialEq>(
    list: Vec<(i32, Vec<i32>, Vec<T>)>,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
    append: bool,
) -> Result<i32> {
    use std::collections::VecDeque;
    let mut queue: VecDeque<(i32, Vec<i32>, Vec<T>)> = list.into_iter().collect();
    let mut total = 0i32;
    while let Some((parent, sub_s, sub_v)) = queue.pop_front() {
        let child_count = if sub_s.is_empty() { 0 } else { 1 };
        let (d1, new_parent, insertion_at) =
            insert_children_block(&sub_s, &sub_v, parent, child_count, structure_buf, values_buf, append)?;
        adjust_remaining(&mut queue, insertion_at, d1);
        let threshold = new_parent;
        let d2 = make_children_distinct(new_parent, structure_buf, values_buf)?;
        adjust_remaining(&mut queue, threshold, d2);
        total += d1 + d2;
    }
    Ok(total)
}

fn adjust_remaining<T>(queue: &mut std::collections::VecDeque<(i32, Vec<i32>, Vec<T>)>, threshold: i32, delta: i32) {
    if delta == 0 {
        return;
    }
    for entry in queue.iter_mut() {
        if entry.0 >= threshold {
            entry.0 += delta;
        }
    }
}

/// Inserts several subtrees as the new leftmost child of their respective
/// parents.
pub fn insert_left_subtree_list_distinct<T: Clone + PartialEq>(
    list: Vec<(i32, Vec<i32>, Vec<T>)>,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
) -> Result<i32> {
    insert_subtree_list_distinct(list, structure_buf, values_buf, false)
}

/// Inserts several subtrees as the new rightmost child of their respective
/// parents.
pub fn insert_right_subtree_list_distinct<T: Clone + PartialEq>(
    list: Vec<(i32, Vec<i32>, Vec<T>)>,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
) -> Result<i32> {
    insert_subtree_list_distinct(list, structure_buf, values_buf, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s7_branch_insert_on_empty() {
        let mut structure = IntBuffer::new();
        let mut values: Buffer<&str> = Buffer::new();
        let path = ["a", "b", "c", "d"];
        let delta = insert_branch(&path, -1, &mut structure, &mut values).unwrap();
        assert_eq!(delta, 4);
        assert_eq!(structure.as_slice(), &[0, 1, 1, 1]);
        assert_eq!(values.as_slice(), &["d", "c", "b", "a"]);
    }

    #[test]
    fn insert_branch_extends_existing_chain() {
        let mut structure = IntBuffer::from_slice(&[0, 1]); // a(b)
        let mut values: Buffer<&str> = Buffer::from_slice(&["b", "a"]);
        let delta = insert_branch(&["a", "b", "c"], 1, &mut structure, &mut values).unwrap();
        assert_eq!(delta, 1);
        assert_eq!(structure.as_slice(), &[0, 1, 1]);
        assert_eq!(values.as_slice(), &["c", "b", "a"]);
    }
}
