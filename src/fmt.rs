//! C6 — textual rendering of a tree (§4.6). Two forms: a flat array-style
//! rendering driven by [`show_as_arrays`], and the bracketed,
//! human-readable form used by `Tree`'s [`std::fmt::Display`] impl.

use std::fmt;

use crate::tree::Tree;

/// Renders the storage-order array encoding as `"v1<sep>v2<sep>...<sep>vn"`,
/// one element per slot, left to right as stored (children before parent,
/// rightmost sibling before leftmost) — a debugging aid for inspecting the
/// wire format directly rather than the tree it encodes.
pub fn show_as_arrays<T: fmt::Display + Clone>(tree: &Tree<T>, separator: &str) -> String {
    let (_, values) = tree.to_arrays();
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(separator)
}

/// Writes `tree` as a bracketed expression: `head` for a leaf, or
/// `head(child1 child2 ...)` otherwise, children left to right — the same
/// shape the spec's own worked examples use to describe a tree in prose.
pub(crate) fn write_bracketed<T: fmt::Display + Clone>(tree: &Tree<T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match tree.root_value() {
        None => write!(f, "()"),
        Some(head) => {
            write!(f, "{}", head)?;
            let children = tree.children();
            if !children.is_empty() {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write_bracketed(child, f)?;
                }
                write!(f, ")")?;
            }
            Ok(())
        }
    }
}

/// Renders every depth-first head value in order, one per line, indented
/// two spaces per depth level — the outline form accepted back by
/// [`crate::build::build_tree_from_partials`].
pub fn show_as_outline<T: fmt::Display + Clone>(tree: &Tree<T>) -> String {
    let mut out = String::new();
    write_outline(tree, 0, &mut out);
    out
}

fn write_outline<T: fmt::Display + Clone>(tree: &Tree<T>, depth: usize, out: &mut String) {
    if let Some(head) = tree.root_value() {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&head.to_string());
        out.push('\n');
        for child in tree.children() {
            write_outline(&child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::from_arrays;

    #[test]
    fn show_as_arrays_matches_storage_order() {
        let tree = from_arrays(vec![0, 0, 0, 3], vec!["d", "c", "b", "a"]).unwrap();
        assert_eq!(show_as_arrays(&tree, ","), "d,c,b,a");
    }

    #[test]
    fn display_renders_bracketed_form() {
        let tree = from_arrays(vec![0, 0, 0, 3], vec!["d", "c", "b", "a"]).unwrap();
        assert_eq!(tree.to_string(), "a(b c d)");
    }

    #[test]
    fn display_of_a_leaf_has_no_parens() {
        let tree = from_arrays(vec![0], vec!["a"]).unwrap();
        assert_eq!(tree.to_string(), "a");
    }

    #[test]
    fn show_as_outline_indents_by_depth() {
        let tree = from_arrays(vec![0, 0, 0, 3], vec!["d", "c", "b", "a"]).unwrap();
        assert_eq!(show_as_outline(&tree), "a\n  b\n  c\n  d\n");
    }
}
