use rimpatch_parsers_xml::{Document, NodeId, Rewrite};

use super::indent::subtract_indent;
use super::matchers::{is_unpackable_sequence, MATCH, OPERATIONS};

fn target_tag(doc: &Document, target: NodeId) -> String {
    doc.tag_name(target).unwrap_or_default().to_string()
}

/// Trim whitespace at the start of the first child and the end of the last
/// child when those are text, then drop text nodes left empty.
pub(crate) fn trim_boundaries(doc: &mut Document, container: NodeId) {
    let children = doc.children(container).to_vec();
    if let Some(&first) = children.first() {
        if doc.text(first).is_some() {
            if let Some(text) = doc.text_mut(first) {
                *text = text.trim_start().to_string();
            }
        }
    }
    if let Some(&last) = children.last() {
        if doc.text(last).is_some() {
            if let Some(text) = doc.text_mut(last) {
                *text = text.trim_end().to_string();
            }
        }
    }
    doc.prune_empty_text(container);
}

/// Flatten `seq`'s operations into `target`'s slot. `target` is `seq` itself,
/// or the FindMod whose `match` branch `seq` is.
pub fn unpack_sequence(doc: &mut Document, seq: NodeId, target: NodeId) -> Rewrite {
    let Some(ops) = doc.child_element(seq, OPERATIONS) else {
        return Rewrite::Keep;
    };
    let tag = target_tag(doc, target);
    for item in doc.element_children(ops) {
        doc.set_tag_name(item, &tag);
    }
    trim_boundaries(doc, ops);
    let amount = doc.depth_below(target, ops).unwrap_or(0) + 1;
    subtract_indent(doc, ops, amount);
    Rewrite::Splice(doc.children(ops).to_vec())
}

/// Replace a FindMod with the contents of its `match` branch.
pub fn unpack_find_mod(doc: &mut Document, find_mod: NodeId) -> Rewrite {
    let Some(branch) = doc.child_element(find_mod, MATCH) else {
        return Rewrite::Keep;
    };
    if is_unpackable_sequence(doc, branch, find_mod) {
        return unpack_sequence(doc, branch, find_mod);
    }
    let tag = target_tag(doc, find_mod);
    doc.set_tag_name(branch, &tag);
    subtract_indent(doc, branch, 1);
    Rewrite::Replace(branch)
}
