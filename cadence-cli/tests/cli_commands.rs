use std::fs;
use std::path::Path;

use assert_cmd::Command;
use cadence_lib::EngineConfig;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"{
    "sounds": [
        { "id": "blip", "url": ["blip_a.wav", "blip_b.wav"], "max_instances": 3 },
        { "id": "alarm", "url": "alarm.wav", "max_instances": 1, "stealing_strategy": "none" }
    ],
    "tracks": [
        { "id": "calm", "url": "calm.ogg", "loop": true, "max_instances": 1 },
        { "id": "storm", "url": "storm.ogg", "loop": true, "max_instances": 1, "fade_out": false }
    ],
    "transition_duration_ms": 400
}"#;

fn cadence() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("cadence"))
}

fn write_config(dir: &Path, body: &str, touch_sources: bool) -> String {
    let path = dir.join("cadence.json");
    fs::write(&path, body).expect("write config");
    if touch_sources {
        for name in ["blip_a.wav", "blip_b.wav", "alarm.wav", "calm.ogg", "storm.ogg"] {
            fs::write(dir.join(name), b"").expect("touch source");
        }
    }
    path.to_string_lossy().into_owned()
}

#[test]
fn create_config_json_outputs_a_loadable_template() {
    let output = cadence()
        .args(["create", "config-json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sounds\""))
        .stdout(predicate::str::contains("\"tracks\""))
        .stdout(predicate::str::contains("\"stealing_strategy\""))
        .get_output()
        .stdout
        .clone();

    let json = String::from_utf8(output).expect("utf8");
    let config = EngineConfig::from_json_str(&json).expect("template parses");
    assert!(!config.sounds.is_empty());
    assert!(!config.tracks.is_empty());
}

#[test]
fn check_reports_prewarmed_pools() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(dir.path(), CONFIG, true);

    cadence()
        .args(["check", path.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("sounds (2):"))
        .stdout(predicate::str::contains("idle=3 max=3 policy=oldest sources=2"))
        .stdout(predicate::str::contains("idle=1 max=1 policy=none sources=1"))
        .stdout(predicate::str::contains("no-fade-out"))
        .stdout(predicate::str::contains("transition_ms=400"));
}

#[test]
fn check_flags_missing_sources() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(dir.path(), CONFIG, false);

    cadence()
        .args(["check", path.as_str()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("missing:"));

    cadence()
        .args(["check", path.as_str(), "--skip-files"])
        .assert()
        .success();
}

#[test]
fn check_rejects_duplicate_ids() {
    let dir = TempDir::new().expect("tempdir");
    let body = r#"{ "sounds": [ { "id": "a", "url": "a.wav" }, { "id": "a", "url": "b.wav" } ] }"#;
    let path = write_config(dir.path(), body, false);

    cadence()
        .args(["check", path.as_str(), "--skip-files"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate"));
}

#[test]
fn check_rejects_a_pitch_spread_reaching_zero() {
    let dir = TempDir::new().expect("tempdir");
    let body = r#"{ "sounds": [ { "id": "warp", "url": "w.wav", "pitch": 0.5, "randomize": { "pitch": 1.0 } } ] }"#;
    let path = write_config(dir.path(), body, false);

    cadence()
        .args(["check", path.as_str(), "--skip-files"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid audio type warp"));
}

#[test]
fn simulate_prints_a_crossfade() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(dir.path(), CONFIG, false);

    cadence()
        .args([
            "simulate", path.as_str(), "--track", "calm", "--then", "storm", "--ms", "500",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("500ms  current=calm:1.000  previous=-"))
        .stdout(predicate::str::contains(
            "500ms  current=storm:0.000  previous=calm:1.000",
        ))
        .stdout(predicate::str::contains("1000ms  current=storm:1.000  previous=-"));
}

#[test]
fn simulate_quiet_prints_only_the_last_frame() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(dir.path(), CONFIG, false);

    cadence()
        .args([
            "simulate",
            path.as_str(),
            "--track",
            "calm",
            "--ms",
            "200",
            "--transition-ms",
            "400",
            "--quiet",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("200ms  current=calm:0.500  previous=-"))
        .stdout(predicate::str::contains("\n").count(1));
}

#[test]
fn simulate_unknown_track_fails() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(dir.path(), CONFIG, false);

    cadence()
        .args(["simulate", path.as_str(), "--track", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}
