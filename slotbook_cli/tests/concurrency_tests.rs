//! Concurrency tests for the slotbook binary.
//!
//! These tests verify that readers running alongside a writer only ever see
//! complete snapshots, because every save replaces the file with a rename.

use assert_cmd::Command;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("slotbook"));
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .arg("--data-file")
        .arg(dir.join("appointments.json"));
    cmd
}

fn book(dir: &Path, day: u32) {
    cli(dir)
        .args([
            "create",
            "--title",
            &format!("Meeting {}", day),
            "--start",
            &format!("2025-03-{:02}T09:00:00Z", day),
            "--end",
            &format!("2025-03-{:02}T10:00:00Z", day),
        ])
        .timeout(Duration::from_secs(10))
        .assert()
        .success();
}

#[test]
fn test_readers_never_see_partial_snapshot() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let dir: PathBuf = temp_dir.path().to_path_buf();

    book(&dir, 1);

    let writer_dir = dir.clone();
    let writer = thread::spawn(move || {
        for day in 2..=10 {
            book(&writer_dir, day);
        }
    });

    let readers: Vec<_> = (0..3)
        .map(|i| {
            let dir = dir.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(i * 5));
                let mut last_seen = 0;
                for _ in 0..8 {
                    let output = cli(&dir)
                        .args(["list", "--json"])
                        .timeout(Duration::from_secs(10))
                        .output()
                        .expect("run list");
                    assert!(
                        output.status.success(),
                        "list failed: {}",
                        String::from_utf8_lossy(&output.stderr)
                    );
                    let items: Vec<Value> =
                        serde_json::from_slice(&output.stdout).expect("valid JSON listing");
                    // A single writer only ever grows the set
                    assert!(items.len() >= last_seen);
                    last_seen = items.len();
                }
            })
        })
        .collect();

    writer.join().expect("Writer thread panicked");
    for reader in readers {
        reader.join().expect("Reader thread panicked");
    }

    let output = cli(&dir).args(["list", "--json"]).output().unwrap();
    let items: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(items.len(), 10);
}

#[test]
fn test_sequential_runs_accumulate() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let dir = temp_dir.path();

    for day in 1..=5 {
        thread::sleep(Duration::from_millis(u64::from(day) * 2));
        book(dir, day);
    }

    let snapshot: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.join("appointments.json")).expect("Failed to read snapshot"),
    )
    .expect("Snapshot contains invalid JSON");
    let starts: Vec<_> = snapshot["appointments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["startTime"].as_str().unwrap().to_string())
        .collect();

    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts.len(), 5);
    assert_eq!(starts, sorted, "snapshot must be ordered by start time");
}
