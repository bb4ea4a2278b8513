use indexmap::IndexSet;
use rimpatch_core::{ModSetCollection, PackageId};
use rimpatch_domain::{CollectionGroup, DirIssues};

use crate::known_mods::KnownMods;

/// Mod sets declared by one file of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileModSets {
    pub subpath: String,
    pub mod_sets: ModSetCollection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// One fully known mod set; load the directory when any of these is active.
    Migratable { package_ids: Vec<PackageId> },
    Issues(DirIssues),
}

/// Group files by the exact collection of mod sets they declare.
pub fn group_files(files: &[FileModSets]) -> Vec<CollectionGroup> {
    let mut groups: Vec<CollectionGroup> = Vec::new();
    for file in files {
        match groups
            .iter_mut()
            .find(|g| g.mod_sets.is_equal_to(&file.mod_sets))
        {
            Some(group) => group.files.push(file.subpath.clone()),
            None => groups.push(CollectionGroup {
                mod_sets: file.mod_sets.clone(),
                files: vec![file.subpath.clone()],
            }),
        }
    }
    groups
}

pub fn classify_dir(
    merged: &ModSetCollection,
    files: &[FileModSets],
    known: &KnownMods,
) -> Classification {
    if merged.is_empty() {
        return Classification::Issues(DirIssues::no_patches());
    }

    let names = merged.all_names();
    let mut issues = DirIssues {
        unidentified_mods: names
            .iter()
            .filter(|name| !known.contains(name))
            .cloned()
            .collect(),
        ..DirIssues::default()
    };
    if merged.size() > 1 {
        issues.is_collection = group_files(files);
    }
    if !issues.is_empty() {
        return Classification::Issues(issues);
    }

    let package_ids: IndexSet<PackageId> = names
        .iter()
        .filter_map(|name| known.get(name))
        .flat_map(|ids| ids.iter().cloned())
        .collect();
    Classification::Migratable {
        package_ids: package_ids.into_iter().collect(),
    }
}
