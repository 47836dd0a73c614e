use std::fs;

use outfit_core::core_api::{HostMessage, PluginConfig, PluginContext};
use outfit_core::form::{FormId, ItemForm, ItemKind};
use outfit_core::host::MemoryHost;
use outfit_render::{
    FieldSelection, JsonStyle, OutfitListing, TextRenderOptions, render_json_full,
    render_json_selected, render_selected_pairs, render_text,
};
use serde_json::Value;
use tempfile::TempDir;

const LYDIA: FormId = FormId(0x000A_2C94);

fn host() -> MemoryHost {
    let mut host = MemoryHost::new();
    host.add_source("Skyrim.esm").expect("source should be added");
    for (id, name, slot_mask) in [
        (0x0001_2E49, "Red Dress", 4),
        (0x0001_2E4A, "Boots", 128),
    ] {
        host.insert_item(ItemForm {
            id: FormId(id),
            kind: ItemKind::Armor,
            name: name.to_string(),
            playable: true,
            slot_mask,
        });
    }
    host.insert_actor(LYDIA, "Lydia", Vec::new());
    host
}

fn loaded_context(host: &MemoryHost) -> (TempDir, PluginContext) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let outfit_dir = dir.path().join("SKSE/Plugins/OutfitPlaylist");
    fs::create_dir_all(&outfit_dir).expect("failed to create outfit dir");
    fs::write(
        outfit_dir.join("Casual.json"),
        r#"{"Red Dress": ["Skyrim.esm|0x012E49", "Skyrim.esm|0x012E4A"], "Barefoot": ["Skyrim.esm|0x012E49"]}"#,
    )
    .expect("failed to write group file");
    fs::write(outfit_dir.join("Empty.json"), "{}").expect("failed to write group file");

    let mut context = PluginContext::new(PluginConfig::from_data_dir(dir.path()));
    context.handle_message(HostMessage::DataLoaded, host);
    (dir, context)
}

#[test]
fn full_json_uses_canonical_top_level_order() {
    let host = host();
    let (_dir, mut context) = loaded_context(&host);
    context.set_outfit(LYDIA, 0, true);
    let listing = OutfitListing::from_context(&context, &host).with_shuffle(&mut context, 5);

    let value = render_json_full(&listing, &host, JsonStyle::CanonicalV1);
    let keys: Vec<&str> = value
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["outfit_count", "groups", "outfits", "actors", "shuffle"]);

    assert_eq!(value["outfit_count"], 2);
    assert_eq!(value["groups"][0]["name"], "Casual");
    assert_eq!(value["groups"][1]["outfits"], Value::Array(Vec::new()));
    assert_eq!(value["outfits"][0]["items"][1]["name"], "Boots");
    assert_eq!(value["outfits"][0]["items"][1]["source"], "Skyrim.esm|0x012E4A");
    assert_eq!(value["actors"][0]["actor"], "000A2C94");
    assert_eq!(value["actors"][0]["actor_name"], "Lydia");
    assert_eq!(value["actors"][0]["do_not_remove"], true);
    assert_eq!(value["shuffle"]["seed"], 5);
    assert_eq!(
        value["shuffle"]["indices"]
            .as_array()
            .expect("indices should be an array")
            .len(),
        2
    );
}

#[test]
fn selected_json_uses_canonical_subset_order() {
    let host = host();
    let (_dir, context) = loaded_context(&host);
    let listing = OutfitListing::from_context(&context, &host);
    let fields = FieldSelection {
        actors: true,
        groups: true,
        outfit: Some(9),
        ..FieldSelection::default()
    };

    let value = render_json_selected(&listing, &host, &fields, JsonStyle::CanonicalV1);
    let keys: Vec<&str> = value
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["groups", "outfit", "actors"]);
    assert_eq!(value["outfit"], Value::Null);
    assert_eq!(value["actors"], Value::Array(Vec::new()));
}

#[test]
fn selected_pairs_follow_field_order() {
    let host = host();
    let (_dir, mut context) = loaded_context(&host);
    context.set_outfit(LYDIA, 1, false);
    let listing = OutfitListing::from_context(&context, &host);
    let fields = FieldSelection {
        group: Some("Casual".to_string()),
        outfit: Some(0),
        actors: true,
        ..FieldSelection::default()
    };

    let pairs: Vec<String> = render_selected_pairs(&listing, &host, &fields)
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    assert_eq!(
        pairs,
        vec![
            "outfit=0=Red Dress",
            "outfit=1=Barefoot",
            "name=Red Dress",
            "group=Casual",
            "item=Skyrim.esm|0x012E49 (Red Dress)",
            "item=Skyrim.esm|0x012E4A (Boots)",
            "actor=000A2C94 Lydia: Casual/Barefoot",
        ]
    );
}

#[test]
fn text_listing_contains_expected_sections() {
    let host = host();
    let (_dir, mut context) = loaded_context(&host);
    context.set_outfit(LYDIA, 0, true);
    let listing = OutfitListing::from_context(&context, &host);

    let rendered = render_text(&listing, &host, TextRenderOptions::default());
    assert!(rendered.starts_with("OUTFIT PLAYLIST: 2 outfits in 2 groups\n"));
    assert!(rendered.contains(" ::: Casual :::"));
    assert!(rendered.contains(" ::: Empty :::\n  none"));
    assert!(rendered.contains("Red Dress"));
    assert!(rendered.contains("2 items"));
    assert!(rendered.contains("1 item\n"));
    assert!(rendered.contains("[keep]"));
    assert!(!rendered.contains("Skyrim.esm|0x012E4A (Boots)"));
    assert!(!rendered.contains("Shuffle"));

    let verbose = render_text(&listing, &host, TextRenderOptions { verbose: true });
    assert!(verbose.contains("Skyrim.esm|0x012E4A (Boots)"));
}
