use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use rimpatch_core::{ModName, PackageId, RimPatchError};
use rimpatch_domain::KnownModsFile;
use rimpatch_parsers_xml::normalize_eol;

use crate::Result;

const DLCS: [&str; 4] = ["Royalty", "Ideology", "Biotech", "Anomaly"];

/// Mod display name → package ids it ships as. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownMods(IndexMap<ModName, IndexSet<PackageId>>);

impl KnownMods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dictionary pre-filled with the official expansions.
    pub fn with_dlcs() -> Self {
        let mut km = Self::new();
        for dlc in DLCS {
            km.add(ModName::new(dlc), PackageId::new(format!("Ludeon.RimWorld.{dlc}")));
        }
        km
    }

    /// Returns `false` when the pair was already known.
    pub fn add(&mut self, name: ModName, id: PackageId) -> bool {
        self.0.entry(name).or_default().insert(id)
    }

    pub fn get(&self, name: &ModName) -> Option<&IndexSet<PackageId>> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &ModName) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &ModName> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn merge(&mut self, other: &KnownMods) {
        for (name, ids) in &other.0 {
            for id in ids {
                self.add(name.clone(), id.clone());
            }
        }
    }

    pub fn from_file_shape(file: KnownModsFile) -> Self {
        let mut km = Self::new();
        for (name, ids) in file {
            if name.is_empty() {
                continue;
            }
            for id in ids.into_iter().filter(|id| !id.is_empty()) {
                km.add(name.clone(), id);
            }
        }
        km
    }

    pub fn to_file_shape(&self) -> KnownModsFile {
        self.0
            .iter()
            .map(|(name, ids)| (name.clone(), ids.iter().cloned().collect()))
            .collect()
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        let file: KnownModsFile = serde_json::from_str(text)?;
        Ok(Self::from_file_shape(file))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| RimPatchError::io(path, e))?;
        let km = Self::from_json(&text).map_err(|e| RimPatchError::KnownMods {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(event = "known_mods_loaded", path = %path.display(), mods = km.len());
        Ok(km)
    }

    /// Load `path`, or start from an empty dictionary when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::new())
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_file_shape()).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        crate::util::write_atomic(path, normalize_eol(&self.to_json()).as_bytes())
    }
}
