//! Tree walking that crosses shadow-root boundaries.
//!
//! A shadow root has no parent; the only way out of it is through its host.
//! [`composed_parent`] takes one step outwards, choosing the parent where there
//! is one and the host otherwise, so repeated steps escape nested shadow trees
//! of any depth.

use std::hash::Hash;

/// The minimal view of a node tree needed to walk outwards from a node.
pub trait TreeWalk {
    type Node: Copy + Eq + Hash;

    /// The light-tree parent. `None` for the document root, shadow roots and
    /// detached nodes.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The host element if `node` is a shadow root.
    fn shadow_host(&self, node: Self::Node) -> Option<Self::Node>;
}

pub fn composed_parent<T: TreeWalk + ?Sized>(tree: &T, node: T::Node) -> Option<T::Node> {
    tree.parent(node).or_else(|| tree.shadow_host(node))
}

/// Iterates over `start` and then all of its composed ancestors.
pub fn composed_ancestors<T: TreeWalk + ?Sized>(
    tree: &T,
    start: T::Node,
) -> ComposedAncestors<'_, T> {
    ComposedAncestors {
        tree,
        next: Some(start),
    }
}

pub struct ComposedAncestors<'a, T: TreeWalk + ?Sized> {
    tree: &'a T,
    next: Option<T::Node>,
}

impl<T: TreeWalk + ?Sized> Iterator for ComposedAncestors<'_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = composed_parent(self.tree, current);
        Some(current)
    }
}

/// The outermost node reachable from `node`, usually the document.
pub fn composed_root<T: TreeWalk + ?Sized>(tree: &T, node: T::Node) -> T::Node {
    composed_ancestors(tree, node).last().unwrap_or(node)
}

/// Whether `ancestor` is `node` itself or one of its composed ancestors.
pub fn is_composed_inclusive_ancestor<T: TreeWalk + ?Sized>(
    tree: &T,
    ancestor: T::Node,
    node: T::Node,
) -> bool {
    composed_ancestors(tree, node).any(|n| n == ancestor)
}
