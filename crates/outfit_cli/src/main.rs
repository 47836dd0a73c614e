use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use outfit_core::core_api::{HostMessage, PluginConfig, PluginContext, ScriptBridge};
use outfit_core::cosave::CosaveFile;
use outfit_core::form::{FormId, FormTable};
use outfit_core::host::MemoryHost;
use outfit_render::{
    FieldSelection, JsonStyle, OutfitListing, TextRenderOptions, render_json_full,
    render_json_selected, render_selected_pairs, render_text,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Game data directory holding SKSE/Plugins.
    #[arg(long = "data-dir", value_name = "DIR")]
    data_dir: PathBuf,
    /// JSON manifest of the load order, items and actors.
    #[arg(long, value_name = "MANIFEST.json")]
    forms: PathBuf,
    /// Co-save to restore actor outfits from.
    #[arg(long, value_name = "FILE")]
    cosave: Option<PathBuf>,
    #[arg(long)]
    groups: bool,
    #[arg(long, value_name = "NAME")]
    group: Option<String>,
    #[arg(long, value_name = "INDEX")]
    outfit: Option<usize>,
    #[arg(long)]
    actors: bool,
    #[arg(long, value_name = "SEED")]
    shuffle: Option<u32>,
    /// List every item in the full text listing.
    #[arg(long)]
    verbose: bool,
    #[arg(long)]
    json: bool,
    #[arg(long = "set", value_name = "ACTOR=INDEX", value_parser = parse_set_edit)]
    set: Vec<(FormId, i32)>,
    #[arg(long = "clear", value_name = "ACTOR", value_parser = parse_actor)]
    clear: Vec<FormId>,
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn field_selection(&self) -> FieldSelection {
        FieldSelection {
            groups: self.groups,
            group: self.group.clone(),
            outfit: self.outfit,
            actors: self.actors,
            shuffle: self.shuffle.is_some(),
        }
    }

    fn has_edits(&self) -> bool {
        !self.set.is_empty() || !self.clear.is_empty()
    }
}

fn parse_actor(raw: &str) -> Result<FormId, String> {
    FormId::from_hex(raw).ok_or_else(|| format!("invalid form id {raw:?}, expected hex"))
}

fn parse_set_edit(raw: &str) -> Result<(FormId, i32), String> {
    let (actor, index) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ACTOR=INDEX, got {raw:?}"))?;
    let actor = parse_actor(actor.trim())?;
    let index = index
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid outfit index {index:?}: {e}"))?;
    Ok((actor, index))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    let fields = cli.field_selection();
    let has_edits = cli.has_edits();

    if has_edits && cli.output.is_none() {
        eprintln!("--set/--clear flags require --output <PATH>");
        process::exit(2);
    }
    if !has_edits && cli.output.is_some() {
        eprintln!("--output requires at least one --set or --clear flag");
        process::exit(2);
    }

    let host = MemoryHost::load_manifest(&cli.forms).unwrap_or_else(|e| {
        eprintln!("Error loading form manifest: {}", cli.forms.display());
        eprintln!("  {e}");
        process::exit(1);
    });

    let mut context = PluginContext::new(PluginConfig::from_data_dir(&cli.data_dir));
    context.handle_message(HostMessage::DataLoaded, &host);

    if let Some(path) = &cli.cosave {
        let bytes = fs::read(path).unwrap_or_else(|e| {
            eprintln!("Error reading {}: {e}", path.display());
            process::exit(1);
        });
        let mut cosave = CosaveFile::parse(&bytes).unwrap_or_else(|e| {
            eprintln!("Error parsing co-save file: {}", path.display());
            eprintln!("  {e}");
            process::exit(1);
        });
        context.on_game_loaded(&mut cosave, &host);
    }

    apply_edits(&cli, &mut context, &host);

    if let Some(out_path) = &cli.output {
        let mut cosave = CosaveFile::new();
        context.on_game_saved(&mut cosave, &host);
        let bytes = cosave.to_bytes().unwrap_or_else(|e| {
            eprintln!("Error creating co-save bytes: {e}");
            process::exit(1);
        });
        fs::write(out_path, bytes).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {e}", out_path.display());
            process::exit(1);
        });
    }

    let mut listing = OutfitListing::from_context(&context, &host);
    if let Some(seed) = cli.shuffle {
        listing = listing.with_shuffle(&mut context, seed);
    }

    if cli.json {
        let json = if fields.is_any_selected() {
            render_json_selected(&listing, &host, &fields, JsonStyle::CanonicalV1)
        } else {
            render_json_full(&listing, &host, JsonStyle::CanonicalV1)
        };
        let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        println!("{rendered}");
        return;
    }

    if fields.is_any_selected() {
        for (key, value) in render_selected_pairs(&listing, &host, &fields) {
            println!("{key}={value}");
        }
        return;
    }

    if let Some(out_path) = &cli.output {
        println!("Wrote co-save to {}", out_path.display());
        return;
    }

    print!(
        "{}",
        render_text(
            &listing,
            &host,
            TextRenderOptions {
                verbose: cli.verbose,
            },
        )
    );
}

fn apply_edits(cli: &Cli, context: &mut PluginContext, host: &MemoryHost) {
    let outfit_count = context.registry().len();
    let mut bridge = ScriptBridge::new(context, host);

    for &(actor, index) in &cli.set {
        if host.actor(actor).is_none() {
            eprintln!("Error applying --set: actor {actor} does not exist");
            process::exit(1);
        }
        if !usize::try_from(index).is_ok_and(|i| i < outfit_count) {
            eprintln!(
                "Error applying --set: outfit index {index} is out of range (0..{outfit_count})"
            );
            process::exit(1);
        }
        bridge.ext_set_outfit(Some(actor), index);
    }
    for &actor in &cli.clear {
        if host.actor(actor).is_none() {
            eprintln!("Error applying --clear: actor {actor} does not exist");
            process::exit(1);
        }
        bridge.ext_clear_outfit(Some(actor));
    }
}
