use rimpatch_core::{ModName, PackageId};

use crate::parse::XmlError;

/// Identity read from a mod's `About/About.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModMeta {
    pub name: Option<ModName>,
    pub package_id: Option<PackageId>,
}

impl ModMeta {
    /// Both fields present and non-empty.
    pub fn complete(self) -> Option<(ModName, PackageId)> {
        match (self.name, self.package_id) {
            (Some(n), Some(p)) if !n.is_empty() && !p.is_empty() => Some((n, p)),
            _ => None,
        }
    }
}

pub fn read_mod_metadata(xml: &str) -> Result<ModMeta, XmlError> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    let field = |tag: &str| {
        root.children()
            .find(|n| n.is_element() && n.tag_name().name() == tag)
            .map(|n| {
                n.descendants()
                    .filter(|d| d.is_text())
                    .filter_map(|d| d.text())
                    .collect::<String>()
            })
    };
    Ok(ModMeta {
        name: field("name").map(ModName::new),
        package_id: field("packageId").map(PackageId::new),
    })
}
