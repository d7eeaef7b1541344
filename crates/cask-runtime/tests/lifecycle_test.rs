//! Unprivileged lifecycle tests for the runtime crate.
//!
//! The paths that need root (bind mounts, namespace spawns, cgroup writes)
//! are exercised end-to-end by hand; everything around them (record
//! allocation, metadata durability, listing semantics) is covered here
//! against temp directories.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

use cask_common::types::{ContainerId, ContainerState};
use cask_runtime::metadata::{self, ContainerRecord};
use cask_runtime::supervisor::Supervisor;

fn running_record(id: &str, pid: u32) -> ContainerRecord {
    let mut record = ContainerRecord::new(
        ContainerId::new(id),
        "alpine:latest".into(),
        vec!["/bin/sh".into(), "-c".into(), "exit 7".into()],
    );
    record.status = ContainerState::Running;
    record.pid = Some(pid);
    record
}

// ── Metadata durability ──────────────────────────────────────────────

#[test]
fn listing_reflects_a_persisted_running_container() {
    let dir = tempfile::tempdir().expect("tempdir");
    let record = running_record("run-1", std::process::id());
    metadata::save(dir.path(), &record).expect("save");

    let listed = metadata::list_containers(dir.path()).expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, record.id);
    assert_eq!(listed[0].image, record.image);
    assert_eq!(listed[0].command, record.command);
    assert_eq!(listed[0].pid, record.pid);
    assert_eq!(listed[0].status, ContainerState::Running);
}

#[test]
fn listing_reports_last_known_status_after_stop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut record = running_record("run-1", std::process::id());

    record.status = ContainerState::Stopped;
    record.touch();
    metadata::save(dir.path(), &record).expect("save");

    let listed = metadata::list_containers(dir.path()).expect("list");
    assert_eq!(listed[0].status, ContainerState::Stopped);
}

#[test]
fn every_transition_rewrites_the_same_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut record = ContainerRecord::new(
        ContainerId::generate(),
        "demo:v1".into(),
        vec!["/bin/true".into()],
    );

    for (state, pid) in [
        (ContainerState::Created, None),
        (ContainerState::Running, Some(1234)),
        (ContainerState::Stopped, Some(1234)),
    ] {
        record.status = state;
        record.pid = pid;
        record.touch();
        metadata::save(dir.path(), &record).expect("save");

        let loaded = metadata::load(dir.path(), &record.id).expect("load");
        assert_eq!(loaded.status, state);
    }

    let listed = metadata::list_containers(dir.path()).expect("list");
    assert_eq!(listed.len(), 1, "transitions must not multiply records");
}

// ── Listing robustness ───────────────────────────────────────────────

#[test]
fn listing_tolerates_partial_writes_from_concurrent_supervisors() {
    let dir = tempfile::tempdir().expect("tempdir");
    metadata::save(dir.path(), &running_record("intact", std::process::id())).expect("save");

    // A record caught mid-rewrite parses as garbage and is skipped.
    let torn = dir.path().join("torn").join("metadata");
    std::fs::create_dir_all(&torn).expect("dirs");
    std::fs::write(torn.join("container.json"), "{\"ID\": \"torn\", \"Ima").expect("torn");

    let listed = metadata::list_containers(dir.path()).expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id.as_str(), "intact");
}

#[test]
fn listing_ignores_stray_files_in_the_containers_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("README"), "not a container").expect("stray");
    metadata::save(dir.path(), &running_record("real", std::process::id())).expect("save");

    let listed = metadata::list_containers(dir.path()).expect("list");
    assert_eq!(listed.len(), 1);
}

// ── Supervisor construction ──────────────────────────────────────────

#[test]
fn supervisor_exposes_its_containers_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let containers = dir.path().join("containers");
    let supervisor = Supervisor::new(&containers);
    assert_eq!(supervisor.containers_dir(), containers.as_path());
}

#[cfg(target_os = "linux")]
#[test]
fn run_requires_an_existing_source_rootfs() {
    use cask_common::types::ResourceLimits;
    use cask_runtime::supervisor::RunOptions;

    let dir = tempfile::tempdir().expect("tempdir");
    let supervisor = Supervisor::new(dir.path().join("containers"))
        .with_cgroup_root(dir.path().join("cgroup"));

    // Unprivileged, the bind mount is refused before anything can leak; a
    // failed staging must leave no container directory behind.
    let result = supervisor.run(RunOptions {
        image: "ghost:v1".into(),
        rootfs: dir.path().join("missing-rootfs"),
        command: vec!["/bin/true".into()],
        limits: ResourceLimits::default(),
    });
    assert!(result.is_err());

    let containers = dir.path().join("containers");
    let leftover = std::fs::read_dir(&containers)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftover, 0, "failed staging must clean up its directory");
}
