use std::time::{Duration, Instant};

use cmdgroup::bridge::{Bridge, ErrorKind};
use cmdgroup::runner::Runner;
use cmdgroup::store::{CatalogStore, StoreError};

fn file_bridge(dir: &std::path::Path) -> Bridge {
    let store = CatalogStore::open_file(dir.join("command_groups.json")).unwrap();
    Bridge::new(store, Runner::default())
}

fn memory_bridge() -> Bridge {
    Bridge::new(CatalogStore::in_memory(), Runner::default())
}

#[test]
fn test_create_group_then_list() {
    let mut bridge = memory_bridge();
    bridge.create_group("Dev").unwrap();

    let catalog = bridge.get_groups();
    assert_eq!(catalog.groups.len(), 1);
    assert_eq!(catalog.groups[0].name, "Dev");
    assert!(catalog.groups[0].commands.is_empty());
}

#[test]
fn test_delete_group_removes_its_commands() {
    let mut bridge = memory_bridge();
    let group = bridge.create_group("Dev").unwrap();
    let build = bridge
        .add_command_to_group(&group, "Build", "echo build", false)
        .unwrap();
    let test = bridge
        .add_command_to_group(&group, "Test", "echo test", false)
        .unwrap();

    bridge.delete_group(&group).unwrap();

    for id in [&build, &test] {
        match bridge.store().command(&group, id).unwrap_err() {
            StoreError::GroupNotFound(g) => assert_eq!(g, group),
            other => panic!("Expected GroupNotFound, got: {other:?}"),
        }
        let err = bridge.execute_stored_command(&group, id).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
    assert!(bridge.get_groups().is_empty());
}

#[test]
fn test_add_and_execute_command() {
    let mut bridge = memory_bridge();
    let group = bridge.create_group("Dev").unwrap();
    let cmd = bridge
        .add_command_to_group(&group, "Build", "echo hi", false)
        .unwrap();

    let output = bridge.execute_stored_command(&group, &cmd).unwrap();
    assert!(output.contains("hi"), "got: {output}");
}

#[test]
fn test_group_run_continues_after_failure() {
    let mut bridge = memory_bridge();
    let group = bridge.create_group("Mixed").unwrap();
    bridge
        .add_command_to_group(&group, "A", "exit 1", false)
        .unwrap();
    bridge
        .add_command_to_group(&group, "B", "echo ok", false)
        .unwrap();

    let results = bridge.execute_group_commands(&group).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].name, "A");
    assert!(!results[0].success);
    assert!(
        results[0].output.contains("exit code 1"),
        "got: {}",
        results[0].output
    );
    assert_eq!(results[1].name, "B");
    assert_eq!(results[1].output, "ok");
}

#[test]
fn test_group_run_uses_detached_flag() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker.txt");
    let mut bridge = memory_bridge();
    let group = bridge.create_group("Background").unwrap();
    bridge
        .add_command_to_group(&group, "Sleeper", "sleep 5", true)
        .unwrap();
    bridge
        .add_command_to_group(
            &group,
            "Writer",
            &format!("echo done > {}", marker.display()),
            false,
        )
        .unwrap();

    let start = Instant::now();
    let results = bridge.execute_group_commands(&group).unwrap();
    assert!(start.elapsed() < Duration::from_secs(4));
    assert_eq!(results[0].output, cmdgroup::runner::DETACHED_ACK);
    assert!(marker.exists());
}

#[test]
fn test_detached_returns_immediately() {
    let bridge = memory_bridge();
    let start = Instant::now();
    let ack = bridge.execute_command_detached("sleep 5").unwrap();
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(ack, "Process started successfully in background");
}

#[test]
fn test_export_import_round_trip() {
    let mut source = memory_bridge();
    let dev = source.create_group("Dev").unwrap();
    source
        .add_command_to_group(&dev, "Build", "cargo build", false)
        .unwrap();
    source
        .add_command_to_group(&dev, "Serve", "python -m http.server", true)
        .unwrap();
    let ops = source.create_group("Ops").unwrap();
    source
        .add_command_to_group(&ops, "Uptime", "uptime", false)
        .unwrap();

    let document = source.export_data(None).unwrap().document;

    let mut target = memory_bridge();
    target.create_group("Stale").unwrap();
    target.import_data(&document, false).unwrap();
    assert_eq!(target.get_groups(), source.get_groups());
}

#[test]
fn test_malformed_import_leaves_catalog_unchanged() {
    let mut bridge = memory_bridge();
    let group = bridge.create_group("Dev").unwrap();
    bridge
        .add_command_to_group(&group, "Build", "echo hi", false)
        .unwrap();
    let before = bridge.get_groups();

    for bad in [
        "{ not json",
        r#"{"groups": [{"id": "g", "commands": []}]}"#,
        r#"{"groups": [{"id": "g", "name": "", "commands": []}]}"#,
        r#"[{"id": "g", "name": "A"}, {"id": "g", "name": "B"}]"#,
    ] {
        let err = bridge.import_data(bad, false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format, "document: {bad}");
        assert_eq!(bridge.get_groups(), before);
    }
}

#[test]
fn test_catalog_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let (group, cmd) = {
        let mut bridge = file_bridge(dir.path());
        let group = bridge.create_group("Dev").unwrap();
        let cmd = bridge
            .add_command_to_group(&group, "Watch", "tail -f log", true)
            .unwrap();
        (group, cmd)
    };

    let bridge = file_bridge(dir.path());
    let stored = bridge.store().command(&group, &cmd).unwrap();
    assert_eq!(stored.name, "Watch");
    assert!(stored.is_detached);
}

#[test]
fn test_reopen_malformed_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("command_groups.json");
    std::fs::write(&path, "{ truncated").unwrap();
    match CatalogStore::open_file(&path).unwrap_err() {
        StoreError::Format(_) => {}
        other => panic!("Expected Format error, got: {other:?}"),
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ truncated");
}

#[test]
fn test_reads_catalog_written_by_desktop_app() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("command_groups.json"),
        r#"{
          "groups": {
            "0b9f": {
              "id": "0b9f",
              "name": "Servers",
              "commands": [
                {"id": "c1", "name": "Web", "command": "npm start", "is_detached": true},
                {"id": "c2", "name": "Status", "command": "git status", "is_detached": null}
              ]
            }
          }
        }"#,
    )
    .unwrap();

    let bridge = file_bridge(dir.path());
    let group = bridge.store().group("0b9f").unwrap();
    assert_eq!(group.commands.len(), 2);
    assert!(group.commands[0].is_detached);
    assert!(!group.commands[1].is_detached);
}

#[test]
fn test_export_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = memory_bridge();
    bridge.create_group("Dev").unwrap();
    let target = dir.path().join("backup/export.json");

    let result = bridge.export_data(Some(&target)).unwrap();
    assert_eq!(
        result.message,
        format!("Data exported to: {}", target.display())
    );
    assert_eq!(std::fs::read_to_string(&target).unwrap(), result.document);
}

#[test]
fn test_open_bridge_with_explicit_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = dir.path().join("config.yaml");
    std::fs::write(&settings, "data_file: data/catalog.json\n").unwrap();

    let (mut bridge, path) = cmdgroup::open_bridge(Some(&settings), None).unwrap();
    assert_eq!(path, dir.path().join("data/catalog.json"));
    bridge.create_group("Dev").unwrap();
    assert!(path.exists());
}
