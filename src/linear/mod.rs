//! C2 — pure functions over the linear (deflated) dual-array encoding.
//!
//! Every function in this module takes buffers or slices directly and is
//! free of any notion of "the current tree" — [`crate::node::NodeTree`]
//! and [`crate::tree::Tree`] are the stateful facades built on top of
//! these.

pub mod distinct;
pub mod insert;
pub mod iter;
pub mod lookup;
pub mod merge;
pub mod path;
pub mod remove;

pub use distinct::{find_first_duplicate_pair, make_children_distinct};
pub use insert::{
    expand_value_into_tree, expand_value_into_tree_distinct, insert_branch, insert_children_block,
    insert_left_subtree_list_distinct, insert_right_subtree_list_distinct, insert_subtree_as_child,
    insert_subtree_list_distinct,
};
pub use iter::{
    fold_left_branches_index_lists, fold_left_branches_lengths, BranchesIndexListIter, NodeIndexIter,
    NodeIndexIterWithLimit,
};
pub use lookup::{calculate_height, children_indexes, parent_index, subtree_size, write_children_indexes};
pub use merge::merge_two_trees;
pub use path::{children_indexes_for, follow_path, leftmost_index_of_child_value, rightmost_index_of_child_value, FollowResult};
pub use remove::{remove_tree, remove_value};
