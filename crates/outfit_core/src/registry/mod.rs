pub mod authoring;
mod ignored;
mod synthesis;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::form::{FormId, FormTable};
use authoring::{AuthoredOutfit, GROUP_FILE_EXTENSION};

pub use ignored::IgnoredItems;
pub use synthesis::{CUSTOM_OUTFIT_NAME, EMPTY_OUTFIT_NAME, synthesize_from_worn};

/// Group that receives outfits captured at runtime when the caller names none.
pub const CUSTOM_OUTFIT_GROUP: &str = "CustomOutfits";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outfit {
    pub name: String,
    pub group_name: String,
    pub items: Vec<FormId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutfitGroup {
    pub name: String,
    pub outfit_indices: Vec<usize>,
}

/// Flat outfit table plus the named groups that index into it.
///
/// Indices handed out by the registry stay valid until the next reload; the
/// table is append-only in between.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutfitRegistry {
    outfits: Vec<Outfit>,
    groups: BTreeMap<String, OutfitGroup>,
}

impl OutfitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from every `*.json` group file in `dir`.
    ///
    /// Files are read in file-name order. A file whose top level cannot be
    /// parsed is skipped; a bad outfit or item only drops that entry.
    pub fn load_dir<H: FormTable + ?Sized>(dir: &Path, host: &H) -> Self {
        let mut registry = Self::new();

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Unable to read outfit directory {}: {e}", dir.display());
                return registry;
            }
        };

        let mut paths: Vec<_> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(GROUP_FILE_EXTENSION))
            })
            .collect();
        paths.sort();

        for path in paths {
            let Some(group_name) = path.file_stem().map(|s| s.to_string_lossy().into_owned())
            else {
                continue;
            };
            info!("Reading outfit group file {}", path.display());
            match authoring::read_group_file(&path) {
                Ok(outfits) => registry.add_authored_group(&group_name, outfits, host),
                Err(e) => error!("Invalid group file {}: {e}", path.display()),
            }
        }

        info!(
            "Loaded {} outfits in {} groups",
            registry.outfits.len(),
            registry.groups.len()
        );
        registry
    }

    /// Resolves one group's authored outfits and appends them to the table.
    pub fn add_authored_group<H: FormTable + ?Sized>(
        &mut self,
        group_name: &str,
        outfits: Vec<AuthoredOutfit>,
        host: &H,
    ) {
        let group = self.ensure_group(group_name);
        let mut indices = Vec::with_capacity(outfits.len());
        let mut resolved = Vec::with_capacity(outfits.len());

        for authored in outfits {
            let mut items = Vec::with_capacity(authored.items.len());
            for entry in authored.items {
                match entry {
                    Ok(form_ref) => match host.resolve_item(&form_ref) {
                        Some(item) => items.push(item.id),
                        None => warn!(
                            "Outfit form not found or not equippable: {}:{}",
                            authored.name, form_ref
                        ),
                    },
                    Err(raw) => warn!("Invalid outfit form id: {}:{}", authored.name, raw),
                }
            }
            resolved.push(Outfit {
                name: authored.name,
                group_name: group.clone(),
                items,
            });
        }

        for outfit in resolved {
            indices.push(self.outfits.len());
            self.outfits.push(outfit);
        }
        if let Some(group) = self.groups.get_mut(&group) {
            group.outfit_indices.extend(indices);
        }
    }

    pub fn len(&self) -> usize {
        self.outfits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outfits.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Outfit> {
        self.outfits.get(index)
    }

    pub fn outfits(&self) -> &[Outfit] {
        &self.outfits
    }

    pub fn group(&self, name: &str) -> Option<&OutfitGroup> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &OutfitGroup> {
        self.groups.values()
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    pub fn group_outfit_names(&self, group_name: &str) -> Vec<String> {
        self.group_outfits(group_name)
            .map(|(_, outfit)| outfit.name.clone())
            .collect()
    }

    /// Outfits of a group in group order, paired with their table index.
    pub fn group_outfits<'a>(
        &'a self,
        group_name: &str,
    ) -> impl Iterator<Item = (usize, &'a Outfit)> + 'a {
        self.groups
            .get(group_name)
            .map(|g| g.outfit_indices.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |&i| self.outfits.get(i).map(|outfit| (i, outfit)))
    }

    /// Finds an outfit by group and name.
    ///
    /// An exact match wins; otherwise the first case-insensitive match is
    /// returned, since the host does not preserve string casing everywhere.
    pub fn find_index(&self, group_name: &str, outfit_name: &str) -> Option<usize> {
        let mut folded_match = None;
        let folded = fold_case(outfit_name);
        for (index, outfit) in self.group_outfits(group_name) {
            if outfit.name == outfit_name {
                return Some(index);
            }
            if folded_match.is_none() && fold_case(&outfit.name) == folded {
                folded_match = Some(index);
            }
        }
        folded_match
    }

    /// Returns `name`, or `name.NNN` with the smallest counter that does not
    /// collide case-insensitively with another outfit in the group.
    /// `ignore` names an existing outfit that is allowed to collide.
    pub fn make_unique_name(&self, group_name: &str, name: &str, ignore: Option<&str>) -> String {
        let taken: HashSet<String> = self
            .group_outfits(group_name)
            .filter(|(_, outfit)| Some(outfit.name.as_str()) != ignore)
            .map(|(_, outfit)| fold_case(&outfit.name))
            .collect();

        let mut unique = name.to_string();
        let mut discriminator = 0u32;
        while taken.contains(&fold_case(&unique)) {
            discriminator += 1;
            unique = format!("{name}.{discriminator:03}");
        }
        unique
    }

    /// Adds `outfit` to `group_name`, creating the group if needed.
    ///
    /// Returns `None` when the group already holds an outfit with the same
    /// item set. The stored name is made unique within the group.
    pub fn register(&mut self, mut outfit: Outfit, group_name: &str) -> Option<usize> {
        let duplicate = self
            .group_outfits(group_name)
            .any(|(_, existing)| outfits_are_equivalent(&outfit.items, &existing.items));
        if duplicate {
            info!(
                "Outfit {} already exists in group {group_name}, not registering",
                outfit.name
            );
            return None;
        }

        let group = self.ensure_group(group_name);
        outfit.name = self.make_unique_name(&group, &outfit.name, None);
        outfit.group_name = group.clone();

        let index = self.outfits.len();
        info!("Registered outfit {} in group {group} at {index}", outfit.name);
        self.outfits.push(outfit);
        if let Some(group) = self.groups.get_mut(&group) {
            group.outfit_indices.push(index);
        }
        Some(index)
    }

    pub fn replace_items(&mut self, index: usize, items: Vec<FormId>) -> Option<&Outfit> {
        let outfit = self.outfits.get_mut(index)?;
        outfit.items = items;
        Some(outfit)
    }

    /// Renames the outfit at `index`, keeping the name unique in its group.
    pub fn rename(&mut self, index: usize, name: &str) -> Option<&Outfit> {
        let outfit = self.outfits.get(index)?;
        let unique = self.make_unique_name(&outfit.group_name, name, Some(&outfit.name));
        let outfit = self.outfits.get_mut(index)?;
        outfit.name = unique;
        Some(outfit)
    }

    /// Writes one group back to `<dir>/<group>.json`.
    pub fn save_group<H: FormTable + ?Sized>(
        &self,
        dir: &Path,
        group_name: &str,
        host: &H,
    ) -> Result<(), CoreError> {
        if !is_valid_group_name(group_name) {
            return Err(CoreError::new(
                CoreErrorCode::InvalidName,
                format!("{group_name:?} is not a valid group file name"),
            ));
        }
        if !self.groups.contains_key(group_name) {
            return Err(CoreError::new(
                CoreErrorCode::NotFound,
                format!("outfit group {group_name} does not exist"),
            ));
        }

        let outfits = self.group_outfits(group_name).map(|(_, outfit)| {
            let refs = outfit
                .items
                .iter()
                .filter_map(|&id| {
                    let form_ref = host.source_ref(id);
                    if form_ref.is_none() {
                        warn!("Dropping unresolvable form {id} from {}", outfit.name);
                    }
                    form_ref
                })
                .collect();
            (outfit.name.as_str(), refs)
        });
        let document = authoring::group_document(outfits);

        let path = dir.join(format!("{group_name}.{GROUP_FILE_EXTENSION}"));
        authoring::write_group_file(&path, &document)
    }

    fn ensure_group(&mut self, group_name: &str) -> String {
        self.groups
            .entry(group_name.to_string())
            .or_insert_with(|| OutfitGroup {
                name: group_name.to_string(),
                outfit_indices: Vec::new(),
            })
            .name
            .clone()
    }
}

/// Group names double as file stems in the outfit directory, so they may
/// not name a path.
pub fn is_valid_group_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\', ':'])
        && name != "."
        && !name.contains("..")
}

/// True when both lists hold the same set of items, in any order.
pub fn outfits_are_equivalent(a: &[FormId], b: &[FormId]) -> bool {
    let a: BTreeSet<_> = a.iter().collect();
    let b: BTreeSet<_> = b.iter().collect();
    a == b
}

pub(crate) fn fold_case(s: &str) -> String {
    s.to_lowercase()
}
