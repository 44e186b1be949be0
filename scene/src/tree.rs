use std::collections::VecDeque;

use crate::host::GraphAccess;
use crate::node::{NodeId, NodeKind};
use crate::TransformError;

/// Trait for implementing tree traversal operations.
///
/// The visitor receives callbacks when entering and exiting nodes.
pub trait TreeVisitor {
    /// Called when entering a node (before processing its children).
    ///
    /// `depth` is zero for the node the walk started from. Returns true to
    /// continue traversing children, false to skip the subtree.
    fn enter_node(&mut self, node: NodeId, kind: &NodeKind, depth: usize) -> bool;

    /// Called when exiting a node (after processing its children).
    fn exit_node(&mut self, _node: NodeId) {}
}

/// Walks the tree depth-first starting from a given node.
pub fn walk_tree<G, V>(graph: &G, node: NodeId, visitor: &mut V) -> Result<(), TransformError>
where
    G: GraphAccess + ?Sized,
    V: TreeVisitor,
{
    walk(graph, node, 0, visitor)
}

fn walk<G, V>(graph: &G, node: NodeId, depth: usize, visitor: &mut V) -> Result<(), TransformError>
where
    G: GraphAccess + ?Sized,
    V: TreeVisitor,
{
    let kind = graph.kind(node)?;

    if visitor.enter_node(node, &kind, depth) {
        for child in graph.children(node)? {
            walk(graph, child, depth + 1, visitor)?;
        }
    }

    visitor.exit_node(node);
    Ok(())
}

/// Collects every descendant of `root` whose kind passes `filter`.
///
/// The order is breadth-first, so a node always comes after its parent.
/// `root` itself is not included. Nodes rejected by the filter are still
/// descended into.
pub fn descendants<G, F>(graph: &G, root: NodeId, filter: F) -> Result<Vec<NodeId>, TransformError>
where
    G: GraphAccess + ?Sized,
    F: Fn(&NodeKind) -> bool,
{
    let mut queue: VecDeque<NodeId> = graph.children(root)?.into();
    let mut found = Vec::new();

    while let Some(node) = queue.pop_front() {
        if filter(&graph.kind(node)?) {
            found.push(node);
        }
        queue.extend(graph.children(node)?);
    }

    Ok(found)
}
