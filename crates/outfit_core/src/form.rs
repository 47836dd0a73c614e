use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Armor slot 32 (body) in the biped slot bitmask.
pub const BODY_SLOT_MASK: u32 = 0x0000_0004;

const LOCAL_ID_MASK: u32 = 0x00FF_FFFF;

/// Runtime identity of a host form. Only stable within one load of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(pub u32);

impl FormId {
    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn compose(load_index: u8, local_id: u32) -> Self {
        Self(((load_index as u32) << 24) | (local_id & LOCAL_ID_MASK))
    }

    pub fn to_hex(self) -> String {
        format!("{:08X}", self.0)
    }

    pub fn from_hex(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        u32::from_str_radix(digits, 16).ok().map(Self)
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Weapon,
    Armor,
    Ammo,
    Light,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Weapon => "Weapon",
            Self::Armor => "Armor",
            Self::Ammo => "Ammo",
            Self::Light => "Light",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemForm {
    pub id: FormId,
    pub kind: ItemKind,
    pub name: String,
    pub playable: bool,
    pub slot_mask: u32,
}

impl ItemForm {
    pub fn occupies_body_slot(&self) -> bool {
        self.kind == ItemKind::Armor && self.slot_mask & BODY_SLOT_MASK != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorForm {
    pub id: FormId,
    pub name: String,
}

/// Authoring-side reference to a form: a numeric id that is only unique
/// within its source file, plus that file's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormRef {
    pub local_id: u32,
    pub source: String,
}

impl FormRef {
    pub fn new(local_id: u32, source: impl Into<String>) -> Self {
        Self {
            local_id,
            source: source.into(),
        }
    }
}

impl fmt::Display for FormRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|0x{:06X}", self.source, self.local_id)
    }
}

impl FromStr for FormRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((source, id)) = s.rsplit_once('|') else {
            return Err(format!("form reference {s:?} is missing a '|' separator"));
        };
        let source = source.trim();
        if source.is_empty() {
            return Err(format!("form reference {s:?} has an empty source file"));
        }
        let local_id = FormId::from_hex(id)
            .ok_or_else(|| format!("form reference {s:?} has an invalid hex id"))?
            .raw();
        Ok(Self::new(local_id, source))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFormRef {
    Compact(String),
    Object {
        #[serde(rename = "mod")]
        source: String,
        id: RawLocalId,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLocalId {
    Number(u32),
    Hex(String),
}

impl<'de> Deserialize<'de> for FormRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawFormRef::deserialize(deserializer)? {
            RawFormRef::Compact(text) => text.parse().map_err(serde::de::Error::custom),
            RawFormRef::Object { source, id } => {
                let local_id = match id {
                    RawLocalId::Number(n) => n,
                    RawLocalId::Hex(text) => FormId::from_hex(&text)
                        .ok_or_else(|| {
                            serde::de::Error::custom(format!("invalid hex form id {text:?}"))
                        })?
                        .raw(),
                };
                Ok(Self::new(local_id, source))
            }
        }
    }
}

impl Serialize for FormRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Read-only view of the host's form table.
///
/// Every method answers for the current session only. A `None` (or an empty
/// list) means the object does not currently exist, never that something
/// went wrong.
pub trait FormTable {
    /// Resolves a source-file reference to the runtime id of the form.
    fn lookup_source_form(&self, local_id: u32, source: &str) -> Option<FormId>;

    /// Returns the form if it exists and is one of the equippable kinds.
    fn item(&self, id: FormId) -> Option<ItemForm>;

    fn actor(&self, id: FormId) -> Option<ActorForm>;

    /// Items currently equipped on the actor, in the host's enumeration order.
    fn worn_items(&self, actor: FormId) -> Vec<FormId>;

    /// Re-derives the authoring reference for a runtime id.
    fn source_ref(&self, id: FormId) -> Option<FormRef>;

    /// The item that `form_ref` names, if it exists and is equippable.
    fn resolve_item(&self, form_ref: &FormRef) -> Option<ItemForm> {
        self.lookup_source_form(form_ref.local_id, &form_ref.source)
            .and_then(|id| self.item(id))
    }
}
