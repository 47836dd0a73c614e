use tracing::debug;

use super::{IgnoredItems, Outfit};
use crate::form::{FormId, FormTable, ItemKind};

/// Name given to a captured outfit when the actor wears nothing usable.
pub const EMPTY_OUTFIT_NAME: &str = "Naked";
/// Name given to a captured outfit that has items but no armor to name it after.
pub const CUSTOM_OUTFIT_NAME: &str = "CustomOutfit";

/// Captures what `actor` currently wears as a new, ungrouped outfit.
///
/// Non-playable and ignored items are skipped, and with `apparel_only` so is
/// everything that is not armor. The outfit is named after the first armor
/// piece, unless a body-slot armor piece shows up, which always wins.
/// Returns `None` when the actor does not exist.
pub fn synthesize_from_worn<H: FormTable + ?Sized>(
    host: &H,
    actor: FormId,
    ignored: &IgnoredItems,
    apparel_only: bool,
) -> Option<Outfit> {
    host.actor(actor)?;

    let mut outfit = Outfit::default();
    for id in host.worn_items(actor) {
        let Some(item) = host.item(id) else {
            continue;
        };
        if apparel_only && item.kind != ItemKind::Armor {
            continue;
        }
        if !item.playable || ignored.contains(item.id) {
            debug!("Skipping worn form {} ({})", item.id, item.name);
            continue;
        }

        if item.kind == ItemKind::Armor && (outfit.name.is_empty() || item.occupies_body_slot()) {
            outfit.name = item.name.clone();
        }
        outfit.items.push(item.id);
    }

    if outfit.name.is_empty() {
        outfit.name = if outfit.items.is_empty() {
            EMPTY_OUTFIT_NAME.to_string()
        } else {
            CUSTOM_OUTFIT_NAME.to_string()
        };
    }
    Some(outfit)
}

#[cfg(test)]
mod tests {
    use super::{CUSTOM_OUTFIT_NAME, EMPTY_OUTFIT_NAME, synthesize_from_worn};
    use crate::form::{BODY_SLOT_MASK, FormId, ItemForm, ItemKind};
    use crate::host::MemoryHost;
    use crate::registry::IgnoredItems;

    const ACTOR: FormId = FormId(0x100);

    fn item(id: u32, kind: ItemKind, name: &str, slot_mask: u32) -> ItemForm {
        ItemForm {
            id: FormId(id),
            kind,
            name: name.to_string(),
            playable: true,
            slot_mask,
        }
    }

    fn host_wearing(items: Vec<ItemForm>) -> MemoryHost {
        let mut host = MemoryHost::new();
        let worn = items.iter().map(|i| i.id).collect();
        for i in items {
            host.insert_item(i);
        }
        host.insert_actor(ACTOR, "Lydia", worn);
        host
    }

    #[test]
    fn body_slot_armor_names_the_outfit() {
        let host = host_wearing(vec![
            item(1, ItemKind::Weapon, "Sword", 0),
            item(2, ItemKind::Armor, "Boots", 0x80),
            item(3, ItemKind::Armor, "Cuirass", BODY_SLOT_MASK),
            item(4, ItemKind::Armor, "Helmet", 0x2),
        ]);
        let outfit = synthesize_from_worn(&host, ACTOR, &IgnoredItems::new(), false)
            .expect("actor exists");
        assert_eq!(outfit.name, "Cuirass");
        assert_eq!(outfit.items, vec![FormId(1), FormId(2), FormId(3), FormId(4)]);
    }

    #[test]
    fn first_armor_names_the_outfit_without_body_slot() {
        let host = host_wearing(vec![
            item(1, ItemKind::Light, "Torch", 0),
            item(2, ItemKind::Armor, "Boots", 0x80),
            item(3, ItemKind::Armor, "Gloves", 0x8),
        ]);
        let outfit = synthesize_from_worn(&host, ACTOR, &IgnoredItems::new(), true)
            .expect("actor exists");
        assert_eq!(outfit.name, "Boots");
        assert_eq!(outfit.items, vec![FormId(2), FormId(3)]);
    }

    #[test]
    fn filtered_items_fall_back_to_fixed_labels() {
        let mut hidden = item(2, ItemKind::Armor, "Skin", BODY_SLOT_MASK);
        hidden.playable = false;
        let host = host_wearing(vec![
            item(1, ItemKind::Weapon, "Sword", 0),
            hidden,
            item(3, ItemKind::Armor, "Quest Amulet", 0x20),
        ]);
        let ignored: IgnoredItems = [FormId(3)].into_iter().collect();

        let outfit = synthesize_from_worn(&host, ACTOR, &ignored, false).expect("actor exists");
        assert_eq!(outfit.name, CUSTOM_OUTFIT_NAME);
        assert_eq!(outfit.items, vec![FormId(1)]);

        let outfit = synthesize_from_worn(&host, ACTOR, &ignored, true).expect("actor exists");
        assert_eq!(outfit.name, EMPTY_OUTFIT_NAME);
        assert!(outfit.items.is_empty());
    }

    #[test]
    fn missing_actor_yields_nothing() {
        let host = MemoryHost::new();
        assert!(synthesize_from_worn(&host, ACTOR, &IgnoredItems::new(), false).is_none());
    }
}
