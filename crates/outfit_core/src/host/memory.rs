use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::form::{ActorForm, FormId, FormRef, FormTable, ItemForm, ItemKind};

const MAX_SOURCE_COUNT: usize = 0xFF;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemManifest {
    pub form: FormRef,
    pub kind: ItemKind,
    pub name: String,
    #[serde(default = "default_playable")]
    pub playable: bool,
    #[serde(default)]
    pub slot_mask: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActorManifest {
    pub form: FormRef,
    pub name: String,
    #[serde(default)]
    pub worn: Vec<FormRef>,
}

/// On-disk description of a game world for offline use: the load order and
/// the equippable items and actors it contains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormManifest {
    pub sources: Vec<String>,
    #[serde(default)]
    pub items: Vec<ItemManifest>,
    #[serde(default)]
    pub actors: Vec<ActorManifest>,
}

fn default_playable() -> bool {
    true
}

#[derive(Debug, Clone)]
struct MemoryActor {
    name: String,
    worn: Vec<FormId>,
}

/// A `FormTable` backed by plain maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    sources: Vec<String>,
    items: HashMap<FormId, ItemForm>,
    actors: BTreeMap<FormId, MemoryActor>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_manifest(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        let manifest: FormManifest = serde_json::from_str(&text).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Parse,
                format!("invalid form manifest {}: {e}", path.display()),
            )
        })?;
        Self::from_manifest(&manifest)
    }

    pub fn from_manifest(manifest: &FormManifest) -> Result<Self, CoreError> {
        let mut host = Self::new();
        for source in &manifest.sources {
            host.add_source(source)?;
        }
        for item in &manifest.items {
            let id = host.require_source_form(&item.form)?;
            host.insert_item(ItemForm {
                id,
                kind: item.kind,
                name: item.name.clone(),
                playable: item.playable,
                slot_mask: item.slot_mask,
            });
        }
        for actor in &manifest.actors {
            let id = host.require_source_form(&actor.form)?;
            let worn = actor
                .worn
                .iter()
                .map(|form_ref| host.require_source_form(form_ref))
                .collect::<Result<Vec<_>, _>>()?;
            host.insert_actor(id, actor.name.clone(), worn);
        }
        Ok(host)
    }

    /// Appends a source file to the load order and returns its load index.
    pub fn add_source(&mut self, name: &str) -> Result<u8, CoreError> {
        if let Some(index) = self.source_index(name) {
            return Ok(index);
        }
        if self.sources.len() >= MAX_SOURCE_COUNT {
            return Err(CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                format!("load order is full, cannot add {name}"),
            ));
        }
        self.sources.push(name.to_string());
        Ok((self.sources.len() - 1) as u8)
    }

    pub fn insert_item(&mut self, item: ItemForm) {
        self.items.insert(item.id, item);
    }

    pub fn insert_actor(&mut self, id: FormId, name: impl Into<String>, worn: Vec<FormId>) {
        self.actors.insert(
            id,
            MemoryActor {
                name: name.into(),
                worn,
            },
        );
    }

    pub fn set_worn(&mut self, actor: FormId, worn: Vec<FormId>) -> bool {
        match self.actors.get_mut(&actor) {
            Some(entry) => {
                entry.worn = worn;
                true
            }
            None => false,
        }
    }

    pub fn remove_actor(&mut self, id: FormId) -> bool {
        self.actors.remove(&id).is_some()
    }

    pub fn remove_item(&mut self, id: FormId) -> bool {
        self.items.remove(&id).is_some()
    }

    pub fn actor_ids(&self) -> Vec<FormId> {
        self.actors.keys().copied().collect()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    fn source_index(&self, name: &str) -> Option<u8> {
        self.sources
            .iter()
            .position(|s| s.eq_ignore_ascii_case(name))
            .map(|i| i as u8)
    }

    fn require_source_form(&self, form_ref: &FormRef) -> Result<FormId, CoreError> {
        let index = self.source_index(&form_ref.source).ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::NotFound,
                format!("{} is not in the load order", form_ref.source),
            )
        })?;
        Ok(FormId::compose(index, form_ref.local_id))
    }
}

impl FormTable for MemoryHost {
    fn lookup_source_form(&self, local_id: u32, source: &str) -> Option<FormId> {
        let index = self.source_index(source)?;
        let id = FormId::compose(index, local_id);
        if self.items.contains_key(&id) || self.actors.contains_key(&id) {
            Some(id)
        } else {
            None
        }
    }

    fn item(&self, id: FormId) -> Option<ItemForm> {
        self.items.get(&id).cloned()
    }

    fn actor(&self, id: FormId) -> Option<ActorForm> {
        self.actors.get(&id).map(|actor| ActorForm {
            id,
            name: actor.name.clone(),
        })
    }

    fn worn_items(&self, actor: FormId) -> Vec<FormId> {
        self.actors
            .get(&actor)
            .map(|a| a.worn.clone())
            .unwrap_or_default()
    }

    fn source_ref(&self, id: FormId) -> Option<FormRef> {
        let index = (id.raw() >> 24) as usize;
        let source = self.sources.get(index)?;
        Some(FormRef::new(id.raw() & 0x00FF_FFFF, source.clone()))
    }
}
