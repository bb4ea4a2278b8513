use indexmap::IndexMap;
use rimpatch_core::{ModName, ModSetCollection, PackageId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Issues report: directory name → issues found in that directory.
pub type MigrationIssues = IndexMap<String, DirIssues>;

/// Files of a directory that declare the same mod sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionGroup {
    pub mod_sets: ModSetCollection,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DirIssues {
    /// No conditional operations at all; the directory is left for plain copying.
    #[serde(rename = "NO_PATCHES", default, skip_serializing_if = "is_false")]
    pub no_patches: bool,
    #[serde(
        rename = "UNIDENT_MODS_FOUND",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub unidentified_mods: Vec<ModName>,
    /// Files grouped by the mod sets they target, present when more than one set is in use.
    #[serde(rename = "IS_COLLECTION", default, skip_serializing_if = "Vec::is_empty")]
    pub is_collection: Vec<CollectionGroup>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl DirIssues {
    pub fn no_patches() -> Self {
        Self {
            no_patches: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.no_patches && self.unidentified_mods.is_empty() && self.is_collection.is_empty()
    }

    /// Issues that need an operator (unknown mods, mixed targets). `NO_PATCHES` is not one.
    pub fn needs_attention(&self) -> bool {
        !self.unidentified_mods.is_empty() || !self.is_collection.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FailureEntry {
    pub path: String,
    pub error: String,
}

/// What happened to one source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum DirOutcome {
    Migrated {
        package_ids: Vec<PackageId>,
        load_folder: String,
        files_written: usize,
        source_deleted: bool,
    },
    Skipped,
    Flagged {
        issues: DirIssues,
    },
    ParseFailed {
        failures: Vec<FailureEntry>,
    },
    IoFailed {
        error: String,
    },
}

impl DirOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DirOutcome::ParseFailed { .. } | DirOutcome::IoFailed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DirReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: DirOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MigrationSummary {
    pub schema_version: u32,
    pub dirs: Vec<DirReport>,
    pub migrated: usize,
    pub skipped: usize,
    pub flagged: usize,
    pub failed: usize,
    pub issues_file: Option<String>,
    pub load_folders_file: Option<String>,
}

/// On-disk shape of the known mods dictionary.
pub type KnownModsFile = IndexMap<ModName, Vec<PackageId>>;
