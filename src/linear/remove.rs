//! Removal over the linear encoding (§4.2.5).

use super::lookup::subtree_size;
use crate::buffer::{Buffer, IntBuffer};
use crate::error::Result;

/// Removes the single node at `at_i`, promoting its children (if any) to
/// take its place among its former parent's children, preserving their
/// relative order. Returns the size delta (always `<= 0`).
///
/// `parent_i` must be the (already-known) parent of `at_i`, or `-1` if
/// `at_i` is the root; passing it avoids a re-scan the caller has
/// typically already done.
pub fn remove_value<T: Clone>(
    at_i: i32,
    parent_i: i32,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
) -> Result<i32> {
    let own_children = *structure_buf.get(at_i)?;
    values_buf.remove_range(at_i, at_i + 1)?;
    structure_buf.remove_range(at_i, at_i + 1)?;
    if parent_i >= 0 {
        let new_parent_i = parent_i - 1;
        let cur = *structure_buf.get(new_parent_i)?;
        structure_buf.set(new_parent_i, cur - 1 + own_children)?;
    }
    Ok(-1)
}

/// Removes the whole subtree rooted at `at_i`. Returns the size delta
/// (always `<= 0`).
pub fn remove_tree<T: Clone>(
    at_i: i32,
    parent_i: i32,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
) -> Result<i32> {
    let size = subtree_size(at_i, structure_buf.as_slice())? as i32;
    let lo = at_i + 1 - size;
    values_buf.remove_range(lo, at_i + 1)?;
    structure_buf.remove_range(lo, at_i + 1)?;
    if parent_i >= 0 {
        let new_parent_i = parent_i - size;
        let cur = *structure_buf.get(new_parent_i)?;
        structure_buf.set(new_parent_i, cur - 1)?;
    }
    Ok(-size)
}
