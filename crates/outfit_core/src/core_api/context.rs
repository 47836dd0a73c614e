use tracing::{error, info, warn};

use crate::actor_map::{ActorOutfitMap, ClearedOutfit, EquippedOutfit};
use crate::cosave::{self, SaveRecordSink, SaveRecordSource};
use crate::form::{FormId, FormTable};
use crate::registry::{
    CUSTOM_OUTFIT_GROUP, IgnoredItems, Outfit, OutfitRegistry, is_valid_group_name,
    synthesize_from_worn,
};
use crate::shuffle::ShuffleState;

use super::config::PluginConfig;
use super::types::{ActorOutfitEntry, GroupEntry, HostMessage, OutfitEntry};

/// All plugin state for one game session.
///
/// The registry and ignored set only change wholesale through [`reload`],
/// apart from the explicit register/replace/rename operations.
///
/// [`reload`]: PluginContext::reload
#[derive(Debug, Clone)]
pub struct PluginContext {
    config: PluginConfig,
    registry: OutfitRegistry,
    ignored: IgnoredItems,
    actors: ActorOutfitMap,
    shuffle: ShuffleState,
}

impl PluginContext {
    pub fn new(config: PluginConfig) -> Self {
        Self {
            config,
            registry: OutfitRegistry::new(),
            ignored: IgnoredItems::new(),
            actors: ActorOutfitMap::new(),
            shuffle: ShuffleState::new(),
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn registry(&self) -> &OutfitRegistry {
        &self.registry
    }

    pub fn ignored(&self) -> &IgnoredItems {
        &self.ignored
    }

    pub fn actors(&self) -> &ActorOutfitMap {
        &self.actors
    }

    /// Rebuilds the registry and ignored set from disk and forgets every
    /// actor assignment and cached shuffle.
    pub fn reload<H: FormTable + ?Sized>(&mut self, host: &H) {
        let ignored = IgnoredItems::load(&self.config.config_file, host);
        let registry = OutfitRegistry::load_dir(&self.config.outfit_dir, host);

        self.ignored = ignored;
        self.registry = registry;
        self.actors.reset();
        self.shuffle.reset();
    }

    pub fn handle_message<H: FormTable + ?Sized>(&mut self, message: HostMessage, host: &H) {
        match message {
            HostMessage::DataLoaded | HostMessage::NewGame => self.reload(host),
            HostMessage::PostLoad | HostMessage::PreLoadGame | HostMessage::PostLoadGame => {}
        }
    }

    /// Host callback for loading a game: reloads definitions, then restores
    /// actor outfits from the co-save.
    pub fn on_game_loaded<S, H>(&mut self, source: &mut S, host: &H)
    where
        S: SaveRecordSource + ?Sized,
        H: FormTable + ?Sized,
    {
        self.reload(host);
        self.actors = cosave::restore_actor_outfits(source, host);
        info!("Restored outfits for {} actors", self.actors.len());
    }

    /// Host callback for saving a game. Failures are logged and only affect
    /// this plugin's record.
    pub fn on_game_saved<S, H>(&self, sink: &mut S, host: &H)
    where
        S: SaveRecordSink + ?Sized,
        H: FormTable + ?Sized,
    {
        if let Err(e) = cosave::save_actor_outfits(&self.actors, sink, host) {
            error!("Actor outfits were not saved: {e}");
        }
    }

    pub fn set_outfit(
        &mut self,
        actor: FormId,
        index: usize,
        do_not_remove: bool,
    ) -> Option<&Outfit> {
        self.actors.set(&self.registry, actor, index, do_not_remove)
    }

    pub fn clear_outfit(&mut self, actor: FormId) -> Option<ClearedOutfit> {
        self.actors.clear(actor)
    }

    pub fn equipped_outfit(&self, actor: FormId) -> Option<&EquippedOutfit> {
        self.actors.get(actor)
    }

    pub fn shuffled_index(&mut self, position: usize, seed: u32) -> Option<usize> {
        self.shuffle.index_at(position, seed, self.registry.len())
    }

    pub fn shuffle_position(&mut self, index: usize, seed: u32) -> Option<usize> {
        self.shuffle.position_of(index, seed, self.registry.len())
    }

    /// Captures what `actor` wears as a new outfit in `group_name` (the
    /// custom group when empty), saves the group file and puts the outfit on
    /// the actor. `None` when the actor is gone or the group already has an
    /// outfit with the same items.
    pub fn register_current_outfit<H: FormTable + ?Sized>(
        &mut self,
        host: &H,
        actor: FormId,
        group_name: &str,
        outfit_name: &str,
        apparel_only: bool,
    ) -> Option<usize> {
        let mut outfit = synthesize_from_worn(host, actor, &self.ignored, apparel_only)?;
        if !outfit_name.is_empty() {
            outfit.name = outfit_name.to_string();
        }
        let group_name = if group_name.is_empty() {
            CUSTOM_OUTFIT_GROUP
        } else {
            group_name
        };
        if !is_valid_group_name(group_name) {
            warn!("Refusing to register outfit under group {group_name:?}");
            return None;
        }

        let index = self.registry.register(outfit, group_name)?;
        // The table grew, so any cached permutation is short one index.
        self.shuffle.reset();
        self.persist_group(group_name, host);
        self.actors.set(&self.registry, actor, index, true);
        Some(index)
    }

    /// Replaces the items of the registry outfit `actor` currently wears
    /// with what it wears now.
    pub fn replace_current_outfit<H: FormTable + ?Sized>(
        &mut self,
        host: &H,
        actor: FormId,
        apparel_only: bool,
    ) -> Option<usize> {
        let captured = synthesize_from_worn(host, actor, &self.ignored, apparel_only)?;
        let (index, _) = self.current_registry_outfit(actor)?;

        let group_name = self
            .registry
            .replace_items(index, captured.items)?
            .group_name
            .clone();
        self.persist_group(&group_name, host);
        self.actors.set(&self.registry, actor, index, true);
        Some(index)
    }

    /// Renames the registry outfit `actor` currently wears, keeping the name
    /// unique within its group.
    pub fn rename_current_outfit<H: FormTable + ?Sized>(
        &mut self,
        host: &H,
        actor: FormId,
        name: &str,
    ) -> Option<usize> {
        let (index, do_not_remove) = self.current_registry_outfit(actor)?;

        let group_name = self.registry.rename(index, name)?.group_name.clone();
        self.persist_group(&group_name, host);
        self.actors.set(&self.registry, actor, index, do_not_remove);
        Some(index)
    }

    pub fn outfit_entries(&self) -> Vec<OutfitEntry> {
        self.registry
            .outfits()
            .iter()
            .enumerate()
            .map(|(index, outfit)| OutfitEntry {
                index,
                name: outfit.name.clone(),
                group: outfit.group_name.clone(),
                items: outfit.items.clone(),
            })
            .collect()
    }

    pub fn group_entries(&self) -> Vec<GroupEntry> {
        self.registry
            .groups()
            .map(|group| GroupEntry {
                name: group.name.clone(),
                outfit_indices: group.outfit_indices.clone(),
            })
            .collect()
    }

    pub fn actor_entries<H: FormTable + ?Sized>(&self, host: &H) -> Vec<ActorOutfitEntry> {
        self.actors
            .iter()
            .map(|(actor, outfit)| ActorOutfitEntry {
                actor,
                actor_name: host.actor(actor).map(|a| a.name),
                name: outfit.name.clone(),
                group: outfit.group_name.clone(),
                do_not_remove: outfit.do_not_remove,
                items: outfit.items.clone(),
            })
            .collect()
    }

    /// Registry index of the outfit `actor` wears, with its do-not-remove flag.
    fn current_registry_outfit(&self, actor: FormId) -> Option<(usize, bool)> {
        let equipped = self.actors.get(actor)?;
        if self.registry.group(&equipped.group_name).is_none() {
            warn!("Outfit group {} no longer exists", equipped.group_name);
            return None;
        }
        let Some(index) = self
            .registry
            .find_index(&equipped.group_name, &equipped.name)
        else {
            warn!(
                "Outfit {} no longer exists in group {}",
                equipped.name, equipped.group_name
            );
            return None;
        };
        Some((index, equipped.do_not_remove))
    }

    fn persist_group<H: FormTable + ?Sized>(&self, group_name: &str, host: &H) {
        if let Err(e) = self
            .registry
            .save_group(&self.config.outfit_dir, group_name, host)
        {
            error!("Failed to save outfit group {group_name}: {e}");
        }
    }
}
