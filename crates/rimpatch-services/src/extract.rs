use rimpatch_core::{ModName, ModSet, ModSetCollection};
use rimpatch_parsers_xml::{outermost, Document, NodeId, OperationKind};

use crate::patcher::matchers::{is_find_mod_candidate, MODS};

/// Trimmed, non-empty `mods/li` entries of one FindMod.
pub fn mod_set_of(doc: &Document, find_mod: NodeId) -> ModSet {
    let Some(mods) = doc.child_element(find_mod, MODS) else {
        return ModSet::new();
    };
    doc.child_elements_named(mods, "li")
        .into_iter()
        .map(|li| ModName::new(doc.text_content(li)))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Mod sets declared by the outermost FindMods of an unmodified document.
pub fn extract_mod_sets(doc: &Document) -> ModSetCollection {
    let mut sets = ModSetCollection::new();
    let Some(root) = doc.root_element() else {
        return sets;
    };
    let find_mods = outermost(doc, root, |d, n| d.is_operation(n, OperationKind::FindMod));
    for fm in find_mods {
        if !is_find_mod_candidate(doc, fm) {
            continue;
        }
        let set = mod_set_of(doc, fm);
        if set.is_empty() {
            tracing::debug!(event = "find_mod_without_mods");
            continue;
        }
        sets.add(set);
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rimpatch_parsers_xml::parse_document;

    fn names(set: &ModSet) -> Vec<&str> {
        set.iter().map(ModName::as_str).collect()
    }

    #[test]
    fn collects_outermost_find_mods_only() {
        let doc = parse_document(
            r#"<Patch>
	<Operation Class="PatchOperationFindMod">
		<mods>
			<li> Harmony </li>
			<li>HugsLib</li>
		</mods>
		<match Class="PatchOperationFindMod">
			<mods><li>Inner</li></mods>
			<match Class="PatchOperationAdd"/>
		</match>
	</Operation>
	<Operation Class="PatchOperationSequence">
		<operations>
			<li Class="PatchOperationFindMod">
				<mods><li>HugsLib</li><li>Harmony</li></mods>
				<match Class="PatchOperationAdd"/>
				<nomatch Class="PatchOperationAdd"/>
			</li>
		</operations>
	</Operation>
</Patch>"#,
        )
        .unwrap();
        let sets = extract_mod_sets(&doc);
        assert_eq!(sets.size(), 1);
        let only = sets.iter().next().unwrap();
        assert_eq!(names(only), ["Harmony", "HugsLib"]);
    }

    #[test]
    fn blank_entries_and_empty_sets_are_dropped() {
        let doc = parse_document(
            r#"<Patch>
	<Operation Class="PatchOperationFindMod"><mods><li>  </li></mods><match Class="PatchOperationAdd"/></Operation>
	<Operation Class="PatchOperationFindMod"><mods><li>A</li><li/></mods><match Class="PatchOperationAdd"/></Operation>
	<Operation Class="PatchOperationFindMod"><mods><li>B</li></mods></Operation>
</Patch>"#,
        )
        .unwrap();
        let sets = extract_mod_sets(&doc);
        assert_eq!(sets.size(), 1);
        assert_eq!(names(sets.iter().next().unwrap()), ["A"]);
    }

    #[test]
    fn success_child_does_not_hide_the_mod_set() {
        let doc = parse_document(
            r#"<Patch><Operation Class="PatchOperationFindMod"><success>Always</success><mods><li>Harmony</li></mods><match Class="PatchOperationAdd"/></Operation></Patch>"#,
        )
        .unwrap();
        let sets = extract_mod_sets(&doc);
        assert_eq!(sets.size(), 1);
        assert_eq!(names(sets.iter().next().unwrap()), ["Harmony"]);
    }

    #[test]
    fn documents_without_find_mods_yield_nothing() {
        let doc = parse_document(r#"<Patch><Operation Class="PatchOperationAdd"/></Patch>"#).unwrap();
        assert!(extract_mod_sets(&doc).is_empty());
    }
}
