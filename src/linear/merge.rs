//! Merging two sibling subtrees into one (§4.2.6).

use super::insert::insert_children_block;
use super::lookup::subtree_size;
use super::remove::remove_tree;
use crate::buffer::{Buffer, IntBuffer};
use crate::error::Result;

/// Dissolves the single node at `from_i`, grafting its children onto
/// `into_i`'s child list, and discarding `from_i`'s own head.
///
/// The side `from`'s children land on is determined by `from`'s storage
/// position relative to `into`: a lower index is the conceptually more
/// rightward sibling (storage order runs children-before-parent, rightmost
/// child first), so if `from` sits to the right of `into` (`from_i <
/// into_i`), its children become `into`'s new leftmost children
/// (prepended); if `from` sits to the left (`from_i > into_i`), they
/// become `into`'s new rightmost children (appended). This keeps the
/// merged child list in the same left-to-right order the two original
/// subtrees appeared in.
///
/// `from_parent_i` is `from_i`'s current parent (`-1` if `from_i` is a
/// root), needed to correct its former parent's child count.
///
/// A no-op — `(0, from_i)` — is returned when `from_i == into_i`, either
/// index is out of range, or `into_i` falls within `from_i`'s own
/// subtree (merging a node into its own descendant is not meaningful).
pub fn merge_two_trees<T: Clone + PartialEq>(
    from_i: i32,
    into_i: i32,
    from_parent_i: i32,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
) -> Result<(i32, i32)> {
    let n = structure_buf.len() as i32;
    if from_i == into_i || from_i < 0 || into_i < 0 || from_i >= n || into_i >= n {
        return Ok((0, from_i));
    }

    let from_size = subtree_size(from_i, structure_buf.as_slice())? as i32;
    let from_lo = from_i + 1 - from_size;
    if into_i >= from_lo && into_i <= from_i {
        // into lies within from's own subtree (possibly from itself, already excluded above).
        return Ok((0, from_i));
    }

    let child_count = *structure_buf.get(from_i)?;
    let block_lo = from_lo as usize;
    let block_hi = from_i as usize; // from_i's own slot excluded: its head is dissolved, not moved.
    let sub_structure = structure_buf.as_slice()[block_lo..block_hi].to_vec();
    let sub_values = values_buf.as_slice()[block_lo..block_hi].to_vec();

    let delta_remove = remove_tree(from_i, from_parent_i, structure_buf, values_buf)?;

    let into_shifted = if into_i > from_i { into_i + delta_remove } else { into_i };
    let append = from_i > into_i;

    let (delta_insert, new_into_i, _) = insert_children_block(
        &sub_structure,
        &sub_values,
        into_shifted,
        child_count,
        structure_buf,
        values_buf,
        append,
    )?;

    Ok((delta_remove + delta_insert, new_into_i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_right_sibling_into_left_sibling_prepends() {
        // root(left, right(x)) — storage: x, right, left, root
        // structure: x=0, right=1, left=0, root=2
        let mut structure = IntBuffer::from_slice(&[0, 1, 0, 2]);
        let mut values = Buffer::from_slice(&["x", "right", "left", "root"]);
        // from = right(index1), into = left(index2): from is to the RIGHT of into -> prepend x under left.
        let (delta, new_into) = merge_two_trees(1, 2, 3, &mut structure, &mut values).unwrap();
        assert_eq!(delta, -1);
        assert_eq!(values.get(new_into).unwrap(), &"left");
        assert_eq!(structure.as_slice(), &[0, 1, 1]);
        assert_eq!(values.as_slice(), &["x", "left", "root"]);
    }

    #[test]
    fn merge_into_own_descendant_is_noop() {
        // a(b(c)): storage [0,1,1] values [c,b,a]
        let mut structure = IntBuffer::from_slice(&[0, 1, 1]);
        let mut values = Buffer::from_slice(&["c", "b", "a"]);
        let (delta, idx) = merge_two_trees(1, 0, 2, &mut structure, &mut values).unwrap();
        assert_eq!(delta, 0);
        assert_eq!(idx, 1);
        assert_eq!(structure.as_slice(), &[0, 1, 1]);
    }
}
