use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

const MANIFEST: &str = r#"{
    "sources": ["Skyrim.esm", "Wardrobe.esp"],
    "items": [
        {"form": "Skyrim.esm|0x012E49", "kind": "Armor", "name": "Red Dress", "slot_mask": 4},
        {"form": "Skyrim.esm|0x012E4A", "kind": "Armor", "name": "Boots", "slot_mask": 128},
        {"form": "Wardrobe.esp|0x000801", "kind": "Armor", "name": "Circlet", "slot_mask": 4096}
    ],
    "actors": [
        {"form": "Skyrim.esm|0x0A2C94", "name": "Lydia"},
        {"form": "Skyrim.esm|0x0A2C95", "name": "Aela"}
    ]
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let outfit_dir = dir.path().join("data/SKSE/Plugins/OutfitPlaylist");
        fs::create_dir_all(&outfit_dir).expect("failed to create outfit dir");
        fs::write(
            outfit_dir.join("Casual.json"),
            r#"{"Red Dress": ["Skyrim.esm|0x012E49", "Skyrim.esm|0x012E4A"]}"#,
        )
        .expect("failed to write group file");
        fs::write(
            outfit_dir.join("Formal.json"),
            r#"{"outfits": {"Gala": ["Skyrim.esm|0x012E49", "Wardrobe.esp|0x000801"]}}"#,
        )
        .expect("failed to write group file");
        fs::write(dir.path().join("forms.json"), MANIFEST).expect("failed to write manifest");
        Self { dir }
    }

    fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    fn manifest(&self) -> PathBuf {
        self.dir.path().join("forms.json")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, extra: &[&str]) -> std::process::Output {
        let data_dir = self.data_dir();
        let manifest = self.manifest();
        let mut args = vec![
            "--data-dir".to_string(),
            data_dir.to_string_lossy().to_string(),
            "--forms".to_string(),
            manifest.to_string_lossy().to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        run_cli(&args)
    }
}

fn run_cli(args: &[String]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_outfit-playlist"))
        .args(args)
        .output()
        .expect("failed to run outfit-playlist CLI")
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[test]
fn cli_prints_group_names() {
    let fixture = Fixture::new();
    let output = fixture.run(&["--groups"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["group=Casual", "group=Formal"]);
}

#[test]
fn cli_prints_requested_fields_in_fixed_order() {
    let fixture = Fixture::new();
    let output = fixture.run(&["--outfit", "1", "--group", "Casual"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "outfit=0=Red Dress",
            "name=Gala",
            "group=Formal",
            "item=Skyrim.esm|0x012E49 (Red Dress)",
            "item=Wardrobe.esp|0x000801 (Circlet)",
        ]
    );
}

#[test]
fn cli_without_field_flags_prints_full_listing() {
    let fixture = Fixture::new();
    let output = fixture.run(&[]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("OUTFIT PLAYLIST: 2 outfits in 2 groups"));
    assert!(stdout.contains(" ::: Formal :::"));
    assert!(stdout.contains(" ::: Actors :::\n  none"));
}

#[test]
fn cli_json_shuffle_is_a_permutation() {
    let fixture = Fixture::new();
    let output = fixture.run(&["--json", "--shuffle", "77"]);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(json["shuffle"]["seed"], 77);
    let mut indices: Vec<u64> = json["shuffle"]["indices"]
        .as_array()
        .expect("indices should be an array")
        .iter()
        .map(|v| v.as_u64().expect("index should be a number"))
        .collect();
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1]);

    let again = fixture.run(&["--json", "--shuffle", "77"]);
    let again: Value = serde_json::from_slice(&again.stdout).expect("stdout should be JSON");
    assert_eq!(again["shuffle"], json["shuffle"]);
}

#[test]
fn cli_set_writes_cosave_that_reloads() {
    let fixture = Fixture::new();
    let cosave = fixture.path("outfits.cosave");
    let cosave_arg = path_arg(&cosave);

    let output = fixture.run(&[
        "--set",
        "000A2C94=1",
        "--set",
        "000A2C95=0",
        "--output",
        &cosave_arg,
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wrote co-save to"));
    assert!(cosave.exists());

    let output = fixture.run(&["--cosave", &cosave_arg, "--actors"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "actor=000A2C94 Lydia: Formal/Gala",
            "actor=000A2C95 Aela: Casual/Red Dress",
        ]
    );

    let cleared = fixture.path("cleared.cosave");
    let cleared_arg = path_arg(&cleared);
    let output = fixture.run(&[
        "--cosave",
        &cosave_arg,
        "--clear",
        "000A2C94",
        "--output",
        &cleared_arg,
        "--actors",
        "--json",
    ]);
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let actors = json["actors"]
        .as_array()
        .expect("actors should be an array");
    assert_eq!(actors.len(), 1);
    assert_eq!(actors[0]["actor_name"], "Aela");
}

#[test]
fn cli_edits_require_output() {
    let fixture = Fixture::new();
    let output = fixture.run(&["--set", "000A2C94=0"]);
    assert_eq!(output.status.code(), Some(2));

    let cosave = fixture.path("unused.cosave");
    let output = fixture.run(&["--output", &path_arg(&cosave)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!cosave.exists());
}

#[test]
fn cli_rejects_invalid_edits() {
    let fixture = Fixture::new();
    let cosave = fixture.path("bad.cosave");
    let cosave_arg = path_arg(&cosave);

    let output = fixture.run(&["--set", "000A2C94=5", "--output", &cosave_arg]);
    assert_eq!(output.status.code(), Some(1));
    let output = fixture.run(&["--set", "00000BAD=0", "--output", &cosave_arg]);
    assert_eq!(output.status.code(), Some(1));
    let output = fixture.run(&["--set", "Lydia", "--output", &cosave_arg]);
    assert!(!output.status.success());
    assert!(!cosave.exists());
}

#[test]
fn cli_rejects_corrupt_cosave() {
    let fixture = Fixture::new();
    let cosave = fixture.path("corrupt.cosave");
    fs::write(&cosave, b"not a co-save").expect("failed to write corrupt file");

    let output = fixture.run(&["--cosave", &path_arg(&cosave)]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error parsing co-save file"));
}
