use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::form::FormId;
use crate::registry::{Outfit, OutfitRegistry};

/// An actor's own copy of the outfit it wears. It survives edits to, or
/// removal of, the registry entry it was copied from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedOutfit {
    pub name: String,
    pub group_name: String,
    pub items: Vec<FormId>,
    pub do_not_remove: bool,
}

impl EquippedOutfit {
    pub fn from_outfit(outfit: &Outfit, do_not_remove: bool) -> Self {
        Self {
            name: outfit.name.clone(),
            group_name: outfit.group_name.clone(),
            items: outfit.items.clone(),
            do_not_remove,
        }
    }
}

/// Items to unequip after an outfit was cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearedOutfit {
    /// One equipment slot should be left as it is.
    pub keep_one_slot: bool,
    pub items: Vec<FormId>,
}

impl ClearedOutfit {
    /// Flattens into the list handed to scripts: a leading `None` marks the
    /// slot to leave untouched.
    pub fn into_script_list(self) -> Vec<Option<FormId>> {
        let mut out = Vec::with_capacity(self.items.len() + usize::from(self.keep_one_slot));
        if self.keep_one_slot {
            out.push(None);
        }
        out.extend(self.items.into_iter().map(Some));
        out
    }
}

/// Which outfit each actor currently wears, keyed by actor id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorOutfitMap {
    entries: BTreeMap<FormId, EquippedOutfit>,
}

impl ActorOutfitMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies outfit `index` onto `actor` and returns the registry's entry.
    pub fn set<'r>(
        &mut self,
        registry: &'r OutfitRegistry,
        actor: FormId,
        index: usize,
        do_not_remove: bool,
    ) -> Option<&'r Outfit> {
        let outfit = registry.get(index)?;
        info!("Setting actor {actor} outfit to {}", outfit.name);
        self.entries
            .insert(actor, EquippedOutfit::from_outfit(outfit, do_not_remove));
        Some(outfit)
    }

    pub fn insert(&mut self, actor: FormId, outfit: EquippedOutfit) {
        self.entries.insert(actor, outfit);
    }

    /// Removes the actor's entry. `None` when the actor had no outfit.
    pub fn clear(&mut self, actor: FormId) -> Option<ClearedOutfit> {
        let removed = self.entries.remove(&actor)?;
        info!("Removing outfit {} from actor {actor}", removed.name);
        Some(ClearedOutfit {
            keep_one_slot: removed.do_not_remove,
            items: removed.items,
        })
    }

    pub fn get(&self, actor: FormId) -> Option<&EquippedOutfit> {
        self.entries.get(&actor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormId, &EquippedOutfit)> {
        self.entries.iter().map(|(&id, outfit)| (id, outfit))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{ActorOutfitMap, ClearedOutfit};
    use crate::form::FormId;
    use crate::registry::{Outfit, OutfitRegistry};

    const ACTOR: FormId = FormId(0x14);

    fn registry() -> OutfitRegistry {
        let mut registry = OutfitRegistry::new();
        registry.register(
            Outfit {
                name: "Red Dress".to_string(),
                group_name: String::new(),
                items: vec![FormId(1), FormId(2)],
            },
            "Casual",
        );
        registry
    }

    #[test]
    fn set_copies_the_outfit() {
        let mut registry = registry();
        let mut map = ActorOutfitMap::new();
        let set = map.set(&registry, ACTOR, 0, false).cloned();
        assert_eq!(set.map(|o| o.name), Some("Red Dress".to_string()));

        registry.rename(0, "Blue Dress");
        registry.replace_items(0, vec![FormId(9)]);

        let equipped = map.get(ACTOR).expect("actor should have an outfit");
        assert_eq!(equipped.name, "Red Dress");
        assert_eq!(equipped.group_name, "Casual");
        assert_eq!(equipped.items, vec![FormId(1), FormId(2)]);
    }

    #[test]
    fn set_out_of_range_leaves_map_untouched() {
        let registry = registry();
        let mut map = ActorOutfitMap::new();
        assert!(map.set(&registry, ACTOR, 1, false).is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn clear_returns_items_and_removes_entry() {
        let registry = registry();
        let mut map = ActorOutfitMap::new();
        map.set(&registry, ACTOR, 0, false);

        let cleared = map.clear(ACTOR).expect("actor had an outfit");
        assert_eq!(
            cleared.into_script_list(),
            vec![Some(FormId(1)), Some(FormId(2))]
        );
        assert!(map.get(ACTOR).is_none());
        assert!(map.clear(ACTOR).is_none());
    }

    #[test]
    fn do_not_remove_prefixes_marker() {
        let cleared = ClearedOutfit {
            keep_one_slot: true,
            items: vec![FormId(1), FormId(2)],
        };
        assert_eq!(
            cleared.into_script_list(),
            vec![None, Some(FormId(1)), Some(FormId(2))]
        );
    }
}
