//! Predicates deciding which operations can be flattened.

use rimpatch_parsers_xml::{Document, NodeId, OperationKind};

pub const MODS: &str = "mods";
pub const MATCH: &str = "match";
pub const NOMATCH: &str = "nomatch";
pub const OPERATIONS: &str = "operations";

const LOAD_GATES: [&str; 2] = ["MayRequire", "MayRequireAnyOf"];

/// Where the slot being flattened into sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Directly under the document's root element.
    TopLevel,
    /// An item of another Sequence's `operations` list.
    InSequence,
}

pub fn placement(doc: &Document, target: NodeId) -> Option<Placement> {
    let parent = doc.parent(target)?;
    if Some(parent) == doc.root_element() {
        return Some(Placement::TopLevel);
    }
    if doc.tag_name(parent) != Some(OPERATIONS) {
        return None;
    }
    let owner = doc.parent(parent)?;
    doc.is_operation(owner, OperationKind::Sequence)
        .then_some(Placement::InSequence)
}

/// `seq` is a Sequence whose items can be spliced into `target`'s slot.
pub fn is_unpackable_sequence(doc: &Document, seq: NodeId, target: NodeId) -> bool {
    if !doc.is_operation(seq, OperationKind::Sequence) {
        return false;
    }
    let Some(ops) = doc.child_element(seq, OPERATIONS) else {
        return false;
    };
    let Some(placement) = placement(doc, target) else {
        return false;
    };
    let items = doc.element_children(ops);
    if items
        .iter()
        .any(|item| doc.is_operation(*item, OperationKind::Test))
    {
        return false;
    }
    if placement == Placement::TopLevel
        && items
            .iter()
            .any(|item| LOAD_GATES.iter().any(|gate| doc.has_attribute(*item, gate)))
    {
        return false;
    }
    true
}

fn inside_find_mod(doc: &Document, node: NodeId) -> bool {
    doc.ancestors(node)
        .any(|a| doc.is_operation(a, OperationKind::FindMod))
}

/// Outermost FindMod declaring `mods` and `match`. Other children, such as
/// `success` or a `nomatch` branch, do not disqualify it.
pub fn is_find_mod_candidate(doc: &Document, node: NodeId) -> bool {
    doc.is_operation(node, OperationKind::FindMod)
        && !inside_find_mod(doc, node)
        && doc.child_element(node, MODS).is_some()
        && doc.child_element(node, MATCH).is_some()
}

/// Candidate FindMod without a `nomatch` branch.
pub fn is_unpackable_find_mod(doc: &Document, node: NodeId) -> bool {
    is_find_mod_candidate(doc, node) && doc.child_element(node, NOMATCH).is_none()
}
