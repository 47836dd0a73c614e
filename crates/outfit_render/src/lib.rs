use std::fmt::Write as _;

use outfit_core::core_api::{ActorOutfitEntry, GroupEntry, OutfitEntry, PluginContext};
use outfit_core::form::{FormId, FormTable};
use serde_json::{Map as JsonMap, Value as JsonValue};

const INDEX_COL_WIDTH: usize = 5;
const NAME_COL_WIDTH: usize = 32;
const ACTOR_COL_WIDTH: usize = 24;
const GROUP_COL_WIDTH: usize = 20;
const SHUFFLE_ROW_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    CanonicalV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRenderOptions {
    /// List every item under its outfit.
    pub verbose: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    pub groups: bool,
    pub group: Option<String>,
    pub outfit: Option<usize>,
    pub actors: bool,
    pub shuffle: bool,
}

impl FieldSelection {
    pub fn is_any_selected(&self) -> bool {
        self.groups || self.group.is_some() || self.outfit.is_some() || self.actors || self.shuffle
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleOrder {
    pub seed: u32,
    /// Outfit index at each shuffle position.
    pub indices: Vec<usize>,
}

/// Snapshot of everything the plugin state can show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutfitListing {
    pub groups: Vec<GroupEntry>,
    pub outfits: Vec<OutfitEntry>,
    pub actors: Vec<ActorOutfitEntry>,
    pub shuffle: Option<ShuffleOrder>,
}

impl OutfitListing {
    pub fn from_context<H: FormTable + ?Sized>(context: &PluginContext, host: &H) -> Self {
        Self {
            groups: context.group_entries(),
            outfits: context.outfit_entries(),
            actors: context.actor_entries(host),
            shuffle: None,
        }
    }

    /// Adds the shuffle order for `seed`. Needs the context mutably since
    /// the permutation is cached there.
    pub fn with_shuffle(mut self, context: &mut PluginContext, seed: u32) -> Self {
        let indices = (0..context.registry().len())
            .filter_map(|position| context.shuffled_index(position, seed))
            .collect();
        self.shuffle = Some(ShuffleOrder { seed, indices });
        self
    }

    fn group_outfits<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a OutfitEntry> + 'a {
        self.outfits.iter().filter(move |outfit| outfit.group == group)
    }
}

pub fn render_json_full<H: FormTable + ?Sized>(
    listing: &OutfitListing,
    host: &H,
    style: JsonStyle,
) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(default_json(listing, host)),
    }
}

pub fn render_json_selected<H: FormTable + ?Sized>(
    listing: &OutfitListing,
    host: &H,
    fields: &FieldSelection,
    style: JsonStyle,
) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(selected_json(fields, listing, host)),
    }
}

/// `key=value` lines for the selected fields, in a fixed order.
pub fn render_selected_pairs<H: FormTable + ?Sized>(
    listing: &OutfitListing,
    host: &H,
    fields: &FieldSelection,
) -> Vec<(&'static str, String)> {
    let mut out = Vec::new();

    if fields.groups {
        for group in &listing.groups {
            out.push(("group", group.name.clone()));
        }
    }
    if let Some(name) = &fields.group {
        for outfit in listing.group_outfits(name) {
            out.push(("outfit", format!("{}={}", outfit.index, outfit.name)));
        }
    }
    if let Some(index) = fields.outfit {
        match listing.outfits.get(index) {
            Some(outfit) => {
                out.push(("name", outfit.name.clone()));
                out.push(("group", outfit.group.clone()));
                for &item in &outfit.items {
                    out.push(("item", item_label(item, host)));
                }
            }
            None => out.push(("outfit", "none".to_string())),
        }
    }
    if fields.actors {
        for actor in &listing.actors {
            out.push((
                "actor",
                format!("{}: {}/{}", actor_label(actor), actor.group, actor.name),
            ));
        }
    }
    if let Some(shuffle) = listing.shuffle.as_ref().filter(|_| fields.shuffle) {
        out.push(("shuffle", join_indices(&shuffle.indices)));
    }

    out
}

pub fn render_text<H: FormTable + ?Sized>(
    listing: &OutfitListing,
    host: &H,
    options: TextRenderOptions,
) -> String {
    let mut out = String::new();
    writeln!(
        &mut out,
        "OUTFIT PLAYLIST: {} outfits in {} groups",
        listing.outfits.len(),
        listing.groups.len()
    )
    .expect("writing to String cannot fail");

    for group in &listing.groups {
        writeln!(&mut out).expect("writing to String cannot fail");
        writeln!(&mut out, " ::: {} :::", group.name).expect("writing to String cannot fail");
        if group.outfit_indices.is_empty() {
            writeln!(&mut out, "  none").expect("writing to String cannot fail");
        }
        for outfit in group
            .outfit_indices
            .iter()
            .filter_map(|&index| listing.outfits.get(index))
        {
            write_outfit_line(&mut out, outfit, host, options);
        }
    }

    writeln!(&mut out).expect("writing to String cannot fail");
    writeln!(&mut out, " ::: Actors :::").expect("writing to String cannot fail");
    if listing.actors.is_empty() {
        writeln!(&mut out, "  none").expect("writing to String cannot fail");
    }
    for actor in &listing.actors {
        let keep = if actor.do_not_remove { " [keep]" } else { "" };
        let line = format!(
            "  {:<a$}{:<g$}{}{}",
            fit_column(&actor_label(actor), ACTOR_COL_WIDTH),
            fit_column(&actor.group, GROUP_COL_WIDTH),
            actor.name,
            keep,
            a = ACTOR_COL_WIDTH,
            g = GROUP_COL_WIDTH
        );
        writeln!(&mut out, "{}", line.trim_end()).expect("writing to String cannot fail");
    }

    if let Some(shuffle) = &listing.shuffle {
        writeln!(&mut out).expect("writing to String cannot fail");
        writeln!(&mut out, " ::: Shuffle (seed {}) :::", shuffle.seed)
            .expect("writing to String cannot fail");
        for row in shuffle.indices.chunks(SHUFFLE_ROW_LEN) {
            writeln!(&mut out, "  {}", join_indices(row)).expect("writing to String cannot fail");
        }
    }

    out
}

fn write_outfit_line<H: FormTable + ?Sized>(
    out: &mut String,
    outfit: &OutfitEntry,
    host: &H,
    options: TextRenderOptions,
) {
    let count = match outfit.items.len() {
        1 => "1 item".to_string(),
        n => format!("{n} items"),
    };
    writeln!(
        out,
        "  {:>i$} {:<n$}{}",
        outfit.index,
        fit_column(&outfit.name, NAME_COL_WIDTH),
        count,
        i = INDEX_COL_WIDTH,
        n = NAME_COL_WIDTH
    )
    .expect("writing to String cannot fail");

    if options.verbose {
        for &item in &outfit.items {
            writeln!(
                out,
                "  {:>i$}   {}",
                "",
                item_label(item, host),
                i = INDEX_COL_WIDTH
            )
            .expect("writing to String cannot fail");
        }
    }
}

fn default_json<H: FormTable + ?Sized>(
    listing: &OutfitListing,
    host: &H,
) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();
    out.insert(
        "outfit_count".to_string(),
        JsonValue::from(listing.outfits.len()),
    );
    out.insert("groups".to_string(), groups_to_json(&listing.groups));
    out.insert(
        "outfits".to_string(),
        JsonValue::Array(
            listing
                .outfits
                .iter()
                .map(|outfit| outfit_to_json(outfit, host))
                .collect(),
        ),
    );
    out.insert("actors".to_string(), actors_to_json(&listing.actors, host));
    if let Some(shuffle) = &listing.shuffle {
        out.insert("shuffle".to_string(), shuffle_to_json(shuffle));
    }
    out
}

fn selected_json<H: FormTable + ?Sized>(
    fields: &FieldSelection,
    listing: &OutfitListing,
    host: &H,
) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();

    if fields.groups {
        out.insert("groups".to_string(), groups_to_json(&listing.groups));
    }
    if let Some(name) = &fields.group {
        out.insert(
            "group".to_string(),
            JsonValue::Array(
                listing
                    .group_outfits(name)
                    .map(|outfit| outfit_to_json(outfit, host))
                    .collect(),
            ),
        );
    }
    if let Some(index) = fields.outfit {
        out.insert(
            "outfit".to_string(),
            listing
                .outfits
                .get(index)
                .map_or(JsonValue::Null, |outfit| outfit_to_json(outfit, host)),
        );
    }
    if fields.actors {
        out.insert("actors".to_string(), actors_to_json(&listing.actors, host));
    }
    if fields.shuffle {
        out.insert(
            "shuffle".to_string(),
            listing
                .shuffle
                .as_ref()
                .map_or(JsonValue::Null, shuffle_to_json),
        );
    }

    out
}

fn groups_to_json(groups: &[GroupEntry]) -> JsonValue {
    JsonValue::Array(
        groups
            .iter()
            .map(|group| {
                let mut m = JsonMap::new();
                m.insert("name".to_string(), JsonValue::String(group.name.clone()));
                m.insert(
                    "outfits".to_string(),
                    JsonValue::Array(
                        group
                            .outfit_indices
                            .iter()
                            .map(|&index| JsonValue::from(index))
                            .collect(),
                    ),
                );
                JsonValue::Object(m)
            })
            .collect(),
    )
}

fn outfit_to_json<H: FormTable + ?Sized>(outfit: &OutfitEntry, host: &H) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("index".to_string(), JsonValue::from(outfit.index));
    m.insert("name".to_string(), JsonValue::String(outfit.name.clone()));
    m.insert("group".to_string(), JsonValue::String(outfit.group.clone()));
    m.insert("items".to_string(), items_to_json(&outfit.items, host));
    JsonValue::Object(m)
}

fn actors_to_json<H: FormTable + ?Sized>(actors: &[ActorOutfitEntry], host: &H) -> JsonValue {
    JsonValue::Array(
        actors
            .iter()
            .map(|actor| {
                let mut m = JsonMap::new();
                m.insert("actor".to_string(), JsonValue::String(actor.actor.to_string()));
                m.insert(
                    "actor_name".to_string(),
                    actor
                        .actor_name
                        .clone()
                        .map_or(JsonValue::Null, JsonValue::String),
                );
                m.insert("outfit".to_string(), JsonValue::String(actor.name.clone()));
                m.insert("group".to_string(), JsonValue::String(actor.group.clone()));
                m.insert(
                    "do_not_remove".to_string(),
                    JsonValue::Bool(actor.do_not_remove),
                );
                m.insert("items".to_string(), items_to_json(&actor.items, host));
                JsonValue::Object(m)
            })
            .collect(),
    )
}

fn items_to_json<H: FormTable + ?Sized>(items: &[FormId], host: &H) -> JsonValue {
    JsonValue::Array(
        items
            .iter()
            .map(|&id| {
                let item = host.item(id);
                let mut m = JsonMap::new();
                m.insert("form".to_string(), JsonValue::String(id.to_string()));
                m.insert(
                    "source".to_string(),
                    host.source_ref(id)
                        .map_or(JsonValue::Null, |r| JsonValue::String(r.to_string())),
                );
                m.insert(
                    "name".to_string(),
                    item.as_ref()
                        .map_or(JsonValue::Null, |i| JsonValue::String(i.name.clone())),
                );
                m.insert(
                    "kind".to_string(),
                    item.as_ref()
                        .map_or(JsonValue::Null, |i| JsonValue::String(i.kind.to_string())),
                );
                JsonValue::Object(m)
            })
            .collect(),
    )
}

fn shuffle_to_json(shuffle: &ShuffleOrder) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("seed".to_string(), JsonValue::from(shuffle.seed));
    m.insert(
        "indices".to_string(),
        JsonValue::Array(shuffle.indices.iter().map(|&i| JsonValue::from(i)).collect()),
    );
    JsonValue::Object(m)
}

fn item_label<H: FormTable + ?Sized>(id: FormId, host: &H) -> String {
    let source = host
        .source_ref(id)
        .map_or_else(|| id.to_string(), |r| r.to_string());
    match host.item(id) {
        Some(item) => format!("{source} ({})", item.name),
        None => format!("{source} (missing)"),
    }
}

fn actor_label(actor: &ActorOutfitEntry) -> String {
    match &actor.actor_name {
        Some(name) => format!("{} {name}", actor.actor),
        None => actor.actor.to_string(),
    }
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out = String::with_capacity(width);
    for ch in value.chars().take(width - 3) {
        out.push(ch);
    }
    out.push_str("...");
    out
}
