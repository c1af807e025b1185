//! End-to-end sync tests: two databases sharing one mirror directory.
//!
//! These tests exercise the full push/pull cycle a pair of machines
//! would run, including conflicting edits and deletes.

use nextup::sync::{JsonDirMirror, SyncEngine, TaskMirror};
use nextup::{Database, Task};

fn mem_db() -> Database {
    Database::new(":memory:").unwrap()
}

fn seeded_task(name: &str) -> Task {
    let mut task = Task::new(name.to_string());
    task.created_at = 1_000;
    task.last_modified = 1_000;
    task
}

#[test]
fn push_then_pull_moves_tasks_between_databases() {
    let dir = tempfile::TempDir::new().unwrap();
    let mirror = JsonDirMirror::new(dir.path()).unwrap();
    let db_a = mem_db();
    let db_b = mem_db();

    let id = db_a
        .create_task_with_subtasks(&seeded_task("pack boxes"), &["tape".to_string()])
        .unwrap();
    db_a.insert_task(&seeded_task("call movers")).unwrap();

    // Machine A pushes both tasks, minting mirror ids.
    let report = SyncEngine::new(&db_a, &mirror).sync_all();
    assert!(report.ok);
    assert_eq!(report.pushed, 2);
    assert_eq!(report.pulled, 0);
    assert!(db_a.get_task(id).unwrap().unwrap().remote_id.is_some());

    // Machine B starts empty and picks both up.
    let report = SyncEngine::new(&db_b, &mirror).sync_all();
    assert_eq!(report.pushed, 0);
    assert_eq!(report.pulled, 2);

    let tasks = db_b.get_all_tasks().unwrap();
    assert_eq!(tasks.len(), 2);
    let copied = tasks.iter().find(|t| t.name == "pack boxes").unwrap();
    assert!(copied.remote_id.is_some());
    let steps = db_b.subtasks_for_task(copied.id.unwrap()).unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].name, "tape");
}

#[test]
fn settled_replicas_pull_nothing() {
    let dir = tempfile::TempDir::new().unwrap();
    let mirror = JsonDirMirror::new(dir.path()).unwrap();
    let db_a = mem_db();
    let db_b = mem_db();

    db_a.insert_task(&seeded_task("water plants")).unwrap();
    SyncEngine::new(&db_a, &mirror).sync_all();
    SyncEngine::new(&db_b, &mirror).sync_all();

    // Nothing changed anywhere, so another pass applies nothing.
    let report = SyncEngine::new(&db_a, &mirror).sync_all();
    assert_eq!(report.pulled, 0);
    let report = SyncEngine::new(&db_b, &mirror).sync_all();
    assert_eq!(report.pulled, 0);
    assert_eq!(db_a.get_all_tasks().unwrap().len(), 1);
    assert_eq!(db_b.get_all_tasks().unwrap().len(), 1);
}

#[test]
fn newer_edit_wins_on_both_sides() {
    let dir = tempfile::TempDir::new().unwrap();
    let mirror = JsonDirMirror::new(dir.path()).unwrap();
    let db_a = mem_db();
    let db_b = mem_db();

    db_a.create_task_with_subtasks(&seeded_task("plan trip"), &["book hotel".to_string()])
        .unwrap();
    SyncEngine::new(&db_a, &mirror).sync_all();
    SyncEngine::new(&db_b, &mirror).sync_all();

    // Machine B renames the task and reworks its checklist.
    let mut edited = db_b.get_all_tasks().unwrap().remove(0);
    let b_id = edited.id.unwrap();
    edited.name = "plan spring trip".to_string();
    edited.last_modified += 10_000;
    db_b.update_task(&edited).unwrap();
    db_b.replace_subtasks(
        b_id,
        &[
            nextup::Subtask::new(b_id, "renew passport".to_string(), 0),
            nextup::Subtask::new(b_id, "book hotel".to_string(), 1),
        ],
    )
    .unwrap();
    SyncEngine::new(&db_b, &mirror).push_all().unwrap();

    // Machine A pulls and the newer copy replaces its own wholesale.
    let pulled = SyncEngine::new(&db_a, &mirror).pull_all().unwrap();
    assert_eq!(pulled, 1);
    let tasks = db_a.get_all_tasks().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "plan spring trip");
    let names: Vec<String> = db_a
        .subtasks_for_task(tasks[0].id.unwrap())
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["renew passport", "book hotel"]);
}

#[test]
fn stale_mirror_copy_does_not_overwrite() {
    let dir = tempfile::TempDir::new().unwrap();
    let mirror = JsonDirMirror::new(dir.path()).unwrap();
    let db_a = mem_db();

    db_a.insert_task(&seeded_task("write summary")).unwrap();
    SyncEngine::new(&db_a, &mirror).push_all().unwrap();

    // A later local edit leaves the mirror copy behind.
    let mut edited = db_a.get_all_tasks().unwrap().remove(0);
    edited.name = "write the quarterly summary".to_string();
    edited.last_modified += 20_000;
    db_a.update_task(&edited).unwrap();

    let pulled = SyncEngine::new(&db_a, &mirror).pull_all().unwrap();
    assert_eq!(pulled, 0);
    assert_eq!(
        db_a.get_all_tasks().unwrap()[0].name,
        "write the quarterly summary"
    );
}

#[test]
fn local_delete_clears_the_mirror_document() {
    let dir = tempfile::TempDir::new().unwrap();
    let mirror = JsonDirMirror::new(dir.path()).unwrap();
    let db_a = mem_db();

    let id = db_a.insert_task(&seeded_task("old errand")).unwrap();
    SyncEngine::new(&db_a, &mirror).push_all().unwrap();
    assert_eq!(mirror.list().unwrap().len(), 1);

    // Deleting locally removes the document first, then the row.
    let task = db_a.get_task(id).unwrap().unwrap();
    SyncEngine::new(&db_a, &mirror).delete_remote_quietly(task.remote_id.as_deref());
    db_a.delete_task(id).unwrap();

    assert!(mirror.list().unwrap().is_empty());
    assert!(db_a.get_all_tasks().unwrap().is_empty());
}

#[test]
fn checklist_state_travels_with_its_task() {
    let dir = tempfile::TempDir::new().unwrap();
    let mirror = JsonDirMirror::new(dir.path()).unwrap();
    let db_a = mem_db();
    let db_b = mem_db();

    db_a.create_task_with_subtasks(
        &seeded_task("ship release"),
        &["tag".to_string(), "announce".to_string()],
    )
    .unwrap();
    SyncEngine::new(&db_a, &mirror).sync_all();
    SyncEngine::new(&db_b, &mirror).sync_all();

    // Machine B checks off the first step.
    let b_task = db_b.get_all_tasks().unwrap().remove(0);
    let b_id = b_task.id.unwrap();
    let steps = db_b.subtasks_for_task(b_id).unwrap();
    db_b.set_subtask_completed(steps[0].id.unwrap(), true).unwrap();
    db_b.touch_task_last_modified(b_id, b_task.last_modified + 5_000).unwrap();
    SyncEngine::new(&db_b, &mirror).push_all().unwrap();

    // Machine A sees the checked step after a pull.
    SyncEngine::new(&db_a, &mirror).pull_all().unwrap();
    let a_id = db_a.get_all_tasks().unwrap()[0].id.unwrap();
    let steps = db_a.subtasks_for_task(a_id).unwrap();
    assert_eq!(steps.len(), 2);
    assert!(steps[0].completed);
    assert_eq!(steps[0].name, "tag");
    assert!(!steps[1].completed);
}
