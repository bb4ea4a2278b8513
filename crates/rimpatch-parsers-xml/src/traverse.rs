use crate::tree::{Document, NodeId};

/// What a visitor wants done with the node it was handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    Keep,
    /// Put another node in this node's slot.
    Replace(NodeId),
    /// Put a run of nodes in this node's slot, in order.
    Splice(Vec<NodeId>),
}

/// Walk the subtree under `start` children-first and let `visit` rewrite each
/// node. A node's child list is captured before its children are visited;
/// children that a sibling's rewrite moved away are skipped. Nodes spliced
/// in by a rewrite are not visited again.
///
/// Returns how many nodes were replaced.
pub fn rewrite_post_order<F>(doc: &mut Document, start: NodeId, visit: &mut F) -> usize
where
    F: FnMut(&mut Document, NodeId) -> Rewrite,
{
    let mut replaced = 0;
    let snapshot = doc.children(start).to_vec();
    for child in snapshot {
        if doc.parent(child) != Some(start) {
            continue;
        }
        replaced += rewrite_post_order(doc, child, visit);
    }
    match visit(doc, start) {
        Rewrite::Keep => {}
        Rewrite::Replace(with) => {
            doc.replace_with(start, &[with]);
            replaced += 1;
        }
        Rewrite::Splice(with) => {
            doc.replace_with(start, &with);
            replaced += 1;
        }
    }
    replaced
}

/// Nodes under `start` (inclusive) that match `pred` and have no matching
/// ancestor inside the walked subtree, in document order.
pub fn outermost<P>(doc: &Document, start: NodeId, pred: P) -> Vec<NodeId>
where
    P: Fn(&Document, NodeId) -> bool,
{
    let mut found = Vec::new();
    let mut stack = vec![start];
    while let Some(n) = stack.pop() {
        if pred(doc, n) {
            found.push(n);
            continue;
        }
        stack.extend(doc.children(n).iter().rev().copied());
    }
    found
}
