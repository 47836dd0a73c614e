use serde::{Deserialize, Serialize};

use crate::form::FormId;

/// Host lifecycle notifications the plugin listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostMessage {
    PostLoad,
    DataLoaded,
    NewGame,
    PreLoadGame,
    PostLoadGame,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutfitEntry {
    pub index: usize,
    pub name: String,
    pub group: String,
    pub items: Vec<FormId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupEntry {
    pub name: String,
    pub outfit_indices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActorOutfitEntry {
    pub actor: FormId,
    pub actor_name: Option<String>,
    pub name: String,
    pub group: String,
    pub do_not_remove: bool,
    pub items: Vec<FormId>,
}
