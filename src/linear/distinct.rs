//! Sibling de-duplication over the linear encoding (§4.2.7, §4.2.8).

use super::lookup::children_indexes;
use super::merge::merge_two_trees;
use crate::buffer::{Buffer, IntBuffer};
use crate::error::Result;

/// The first pair of same-valued siblings among `parent_i`'s direct
/// children, scanning left to right: `(into_i, from_i)` where `into_i` is
/// the earlier (leftmost) occurrence and `from_i` the next child sharing
/// its value. `None` if all children are already distinct.
pub fn find_first_duplicate_pair<T: PartialEq>(
    parent_i: i32,
    structure: &[i32],
    values: &[T],
) -> Result<Option<(i32, i32)>> {
    let children = children_indexes(parent_i, structure)?;
    for i in 0..children.len() {
        for j in (i + 1)..children.len() {
            let (a, b) = (children[i], children[j]);
            if values[a as usize] == values[b as usize] {
                return Ok(Some((a, b)));
            }
        }
    }
    Ok(None)
}

/// Repeatedly merges same-valued siblings of `parent_i` until all of its
/// direct children have distinct heads, recursively folding each
/// duplicate's own children into the surviving sibling (§4.2.6).
///
/// Returns the total size delta, always `<= 0`.
pub fn make_children_distinct<T: Clone + PartialEq>(
    parent_i: i32,
    structure_buf: &mut IntBuffer,
    values_buf: &mut Buffer<T>,
) -> Result<i32> {
    let mut total = 0i32;
    let mut parent = parent_i;
    while let Some((into_i, from_i)) =
        find_first_duplicate_pair(parent, structure_buf.as_slice(), values_buf.as_slice())?
    {
        let (delta, _new_into) = merge_two_trees(from_i, into_i, parent, structure_buf, values_buf)?;
        total += delta;
        parent += delta;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_leftmost_duplicate_pair() {
        // root(x, y, x): storage x=0, y=0, x=0, root=3 -> indices 0,1,2 children, root=3
        let structure = [0, 0, 0, 3];
        let values = ["x", "y", "x", "root"];
        let pair = find_first_duplicate_pair(3, &structure, &values).unwrap();
        assert_eq!(pair, Some((2, 0)));
    }

    #[test]
    fn make_children_distinct_merges_duplicates() {
        // root(x(q), y, x(p)): leftmost-first children are x(q), y, x(p).
        // storage: p=0, x1=1, y=0, q=0, x2=1, root=3
        let mut structure = IntBuffer::from_slice(&[0, 1, 0, 0, 1, 3]);
        let mut values = Buffer::from_slice(&["p", "x", "y", "q", "x", "root"]);
        let delta = make_children_distinct(5, &mut structure, &mut values).unwrap();
        assert_eq!(delta, -1);
        assert_eq!(values.as_slice(), &["y", "q", "p", "x", "root"]);
        assert_eq!(structure.as_slice(), &[0, 0, 0, 2, 2]);
    }

    #[test]
    fn no_duplicates_is_noop() {
        let structure = [0, 0, 2];
        let values = ["a", "b", "root"];
        assert_eq!(find_first_duplicate_pair(2, &structure, &values).unwrap(), None);
    }
}
