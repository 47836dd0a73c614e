use crate::form::{FormId, FormTable};
use crate::registry::Outfit;

use super::context::PluginContext;

/// Native functions bound to the quest script class.
///
/// Every call tolerates a null or stale actor and out-of-range indices,
/// answering with an empty list, `-1`, `0`, `false` or an empty string.
pub struct ScriptBridge<'a, H: ?Sized> {
    context: &'a mut PluginContext,
    host: &'a H,
}

impl<'a, H: FormTable + ?Sized> ScriptBridge<'a, H> {
    pub fn new(context: &'a mut PluginContext, host: &'a H) -> Self {
        Self { context, host }
    }

    /// `GetNumOutfits`
    pub fn get_num_outfits(&self) -> i32 {
        to_script_int(self.context.registry().len())
    }

    /// `GetOutfitForms`
    pub fn get_outfit_forms(&self, index: i32) -> Vec<FormId> {
        self.outfit_at(index)
            .map(|outfit| outfit.items.clone())
            .unwrap_or_default()
    }

    /// `GetOutfitName`
    pub fn get_outfit_name(&self, index: i32) -> String {
        self.outfit_at(index)
            .map(|outfit| outfit.name.clone())
            .unwrap_or_default()
    }

    /// `GetOutfitGroupName`
    pub fn get_outfit_group_name(&self, index: i32) -> String {
        self.outfit_at(index)
            .map(|outfit| outfit.group_name.clone())
            .unwrap_or_default()
    }

    /// `GetOutfitIndex`: `-1` when the outfit is unknown.
    pub fn get_outfit_index(&self, group_name: &str, outfit_name: &str) -> i32 {
        self.context
            .registry()
            .find_index(group_name, outfit_name)
            .map_or(-1, to_script_int)
    }

    /// `GetActorOutfitGroupName`
    pub fn get_actor_outfit_group_name(&self, actor: Option<FormId>) -> String {
        self.live_actor(actor)
            .and_then(|actor| self.context.equipped_outfit(actor))
            .map(|outfit| outfit.group_name.clone())
            .unwrap_or_default()
    }

    /// `GetActorOutfitName`
    pub fn get_actor_outfit_name(&self, actor: Option<FormId>) -> String {
        self.live_actor(actor)
            .and_then(|actor| self.context.equipped_outfit(actor))
            .map(|outfit| outfit.name.clone())
            .unwrap_or_default()
    }

    /// `ExtSetOutfit`: the items the actor should now wear.
    pub fn ext_set_outfit(&mut self, actor: Option<FormId>, index: i32) -> Vec<FormId> {
        let (Some(actor), Ok(index)) = (self.live_actor(actor), usize::try_from(index)) else {
            return Vec::new();
        };
        self.context
            .set_outfit(actor, index, false)
            .map(|outfit| outfit.items.clone())
            .unwrap_or_default()
    }

    /// `ExtClearOutfit`: the items to unequip. A leading `None` asks the
    /// script to leave one slot alone.
    pub fn ext_clear_outfit(&mut self, actor: Option<FormId>) -> Vec<Option<FormId>> {
        let Some(actor) = self.live_actor(actor) else {
            return Vec::new();
        };
        self.context
            .clear_outfit(actor)
            .map(|cleared| cleared.into_script_list())
            .unwrap_or_default()
    }

    /// `GetShuffledOutfitIndex`: outfit index at `position` of the shuffle
    /// for `seed`. A negative seed skips shuffling.
    pub fn get_shuffled_outfit_index(&mut self, position: i32, seed: i32) -> i32 {
        let len = self.context.registry().len();
        if len == 0 {
            return 0;
        }
        let position = i64::from(position).rem_euclid(len as i64) as usize;
        let Ok(seed) = u32::try_from(seed) else {
            return to_script_int(position);
        };
        self.context
            .shuffled_index(position, seed)
            .map_or(0, to_script_int)
    }

    /// `GetOutfitShuffleIndex`: shuffle position of outfit `index` for
    /// `seed`. A negative seed returns `index` unchanged.
    pub fn get_outfit_shuffle_index(&mut self, index: i32, seed: i32) -> i32 {
        let Ok(seed) = u32::try_from(seed) else {
            return index;
        };
        let Ok(index) = usize::try_from(index) else {
            return 0;
        };
        self.context
            .shuffle_position(index, seed)
            .map_or(0, to_script_int)
    }

    /// `RegisterCurrentOutfit`
    pub fn register_current_outfit(
        &mut self,
        actor: Option<FormId>,
        group_name: &str,
        outfit_name: &str,
        apparel_only: bool,
    ) -> bool {
        let Some(actor) = self.live_actor(actor) else {
            return false;
        };
        self.context
            .register_current_outfit(self.host, actor, group_name, outfit_name, apparel_only)
            .is_some()
    }

    /// `ReplaceCurrentOutfit`
    pub fn replace_current_outfit(&mut self, actor: Option<FormId>, apparel_only: bool) -> bool {
        let Some(actor) = self.live_actor(actor) else {
            return false;
        };
        self.context
            .replace_current_outfit(self.host, actor, apparel_only)
            .is_some()
    }

    /// `RenameCurrentOutfit`
    pub fn rename_current_outfit(&mut self, actor: Option<FormId>, name: &str) -> bool {
        let Some(actor) = self.live_actor(actor) else {
            return false;
        };
        self.context
            .rename_current_outfit(self.host, actor, name)
            .is_some()
    }

    /// `GetGroupNames`
    pub fn get_group_names(&self) -> Vec<String> {
        self.context.registry().group_names()
    }

    /// `GetGroupOutfitNames`
    pub fn get_group_outfit_names(&self, group_name: &str) -> Vec<String> {
        self.context.registry().group_outfit_names(group_name)
    }

    fn outfit_at(&self, index: i32) -> Option<&Outfit> {
        let index = usize::try_from(index).ok()?;
        self.context.registry().get(index)
    }

    fn live_actor(&self, actor: Option<FormId>) -> Option<FormId> {
        let actor = actor?;
        self.host.actor(actor).map(|_| actor)
    }
}

fn to_script_int(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
