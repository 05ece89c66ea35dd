// SPDX-License-Identifier: Apache-2.0
//! End-to-end coverage of the `fantasim` binary's subcommands and exit codes.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const TOPOLOGY_STREAM: &str = "S:1:0:L0:geo.plates.topology:M1:";

fn cli() -> Command {
    Command::cargo_bin("fantasim").expect("fantasim binary builds")
}

#[test]
fn append_then_materialize_round_trips_topology() {
    let dir = tempdir().expect("tempdir");
    let kv_path = dir.path().join("fantasim.kv");
    let events_path = dir.path().join("events.json");
    fs::write(
        &events_path,
        r#"[
            {"tick": 1, "payload": {"PlateCreated": {"plate_id": 1}}},
            {"tick": 2, "payload": {"PlateCreated": {"plate_id": 2}}}
        ]"#,
    )
    .expect("write events.json");

    cli()
        .args(["append", "--stream", TOPOLOGY_STREAM, "--events"])
        .arg(&events_path)
        .args(["--kv"])
        .arg(&kv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("appended 2 record(s)"));

    cli()
        .args(["materialize", "--stream", TOPOLOGY_STREAM, "--tick", "2", "--kv"])
        .arg(&kv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("boundaries: 0, junctions: 0"));
}

#[test]
fn invalid_stream_key_exits_with_code_two() {
    let dir = tempdir().expect("tempdir");
    let kv_path = dir.path().join("fantasim.kv");
    let events_path = dir.path().join("events.json");
    fs::write(&events_path, r#"[{"tick": 1, "payload": {"PlateCreated": {"plate_id": 1}}}]"#).expect("write events.json");

    cli()
        .args(["append", "--stream", "not-a-stream-key", "--events"])
        .arg(&events_path)
        .args(["--kv"])
        .arg(&kv_path)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid --stream"));
}

#[test]
fn non_monotonic_append_exits_with_tick_policy_violation_code() {
    let dir = tempdir().expect("tempdir");
    let kv_path = dir.path().join("fantasim.kv");
    let events_path = dir.path().join("events.json");
    fs::write(
        &events_path,
        r#"[
            {"tick": 5, "payload": {"PlateCreated": {"plate_id": 1}}},
            {"tick": 3, "payload": {"PlateCreated": {"plate_id": 2}}}
        ]"#,
    )
    .expect("write events.json");

    cli()
        .args(["append", "--stream", TOPOLOGY_STREAM, "--events"])
        .arg(&events_path)
        .args(["--tick-policy", "reject", "--kv"])
        .arg(&kv_path)
        .assert()
        .failure()
        .code(4);
}

#[test]
fn cache_gc_on_empty_store_reports_zero_deletions() {
    let dir = tempdir().expect("tempdir");
    let kv_path = dir.path().join("fantasim.kv");

    cli()
        .args(["cache", "gc", "--prefix", TOPOLOGY_STREAM, "--max-age", "0", "--min-keep", "1", "--kv"])
        .arg(&kv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("manifests deleted"))
        .stdout(predicate::str::contains("0"));
}
