//! Best-effort mirror of the task list to a secondary store.
//!
//! Local data is authoritative. A full sync pushes every local task,
//! then pulls the mirror and takes a remote copy wholesale when its
//! last_modified is newer. Incremental pushes after an edit never fail
//! the edit itself.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::database::{Database, DatabaseError};
use crate::models::{Subtask, Task};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Mirror I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Mirror document error: {0}")]
    DocumentError(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
}

/// Wire form of one subtask inside a task document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub sort_order: i64,
}

/// Wire form of one task, subtasks embedded. Every field is optional
/// on the way in so a document written by a newer build still loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub deadline: Option<i64>,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub quick: bool,
    #[serde(default)]
    pub time_worked_ms: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub last_modified: i64,
    #[serde(default)]
    pub subtasks: Vec<SubtaskDocument>,
}

impl TaskDocument {
    /// Build the wire document for a task and its subtasks.
    pub fn from_task(task: &Task, subtasks: &[Subtask]) -> Self {
        Self {
            name: task.name.clone(),
            deadline: task.deadline,
            difficulty: task.difficulty.as_str().to_string(),
            priority: task.priority.as_str().to_string(),
            completed: task.completed,
            completed_at: task.completed_at,
            started: task.started,
            quick: task.quick,
            time_worked_ms: task.time_worked_ms,
            created_at: task.created_at,
            last_modified: task.last_modified,
            subtasks: subtasks
                .iter()
                .map(|s| SubtaskDocument {
                    name: s.name.clone(),
                    completed: s.completed,
                    sort_order: s.sort_order,
                })
                .collect(),
        }
    }

    /// Turn a pulled document into a local task. Unknown difficulty or
    /// priority labels fall back to the defaults.
    pub fn to_task(&self, remote_id: &str) -> Task {
        Task {
            id: None,
            name: self.name.clone(),
            deadline: self.deadline,
            difficulty: self.difficulty.parse().unwrap_or_default(),
            priority: self.priority.parse().unwrap_or_default(),
            completed: self.completed,
            completed_at: self.completed_at,
            started: self.started,
            quick: self.quick,
            time_worked_ms: self.time_worked_ms,
            created_at: self.created_at,
            last_modified: self.last_modified,
            remote_id: Some(remote_id.to_string()),
        }
    }

    /// The document's subtasks in their stored order.
    pub fn to_subtasks(&self, task_id: i64) -> Vec<Subtask> {
        let mut docs: Vec<&SubtaskDocument> = self.subtasks.iter().collect();
        docs.sort_by_key(|d| d.sort_order);
        docs.into_iter()
            .map(|d| Subtask {
                id: None,
                task_id,
                name: d.name.clone(),
                completed: d.completed,
                sort_order: d.sort_order,
            })
            .collect()
    }
}

/// Storage seam for the cloud copy of the task list.
pub trait TaskMirror {
    /// Overwrite the document stored under `remote_id`.
    fn put(&self, remote_id: &str, doc: &TaskDocument) -> Result<(), SyncError>;
    /// Store a new document and return the id minted for it.
    fn create(&self, doc: &TaskDocument) -> Result<String, SyncError>;
    /// Remove a document. Removing an id that is already gone is fine.
    fn delete(&self, remote_id: &str) -> Result<(), SyncError>;
    /// Every (id, document) pair currently stored, ordered by id.
    fn list(&self) -> Result<Vec<(String, TaskDocument)>, SyncError>;
}

/// Mirror backend that keeps one pretty-printed JSON file per task in
/// a directory. Ids are UUIDv7, so lexicographic order is creation
/// order.
pub struct JsonDirMirror {
    dir: PathBuf,
}

impl JsonDirMirror {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn document_path(&self, remote_id: &str) -> PathBuf {
        self.dir.join(format!("{remote_id}.json"))
    }
}

impl TaskMirror for JsonDirMirror {
    fn put(&self, remote_id: &str, doc: &TaskDocument) -> Result<(), SyncError> {
        let json = serde_json::to_string_pretty(doc)?;
        fs::write(self.document_path(remote_id), json)?;
        Ok(())
    }

    fn create(&self, doc: &TaskDocument) -> Result<String, SyncError> {
        let remote_id = Uuid::now_v7().to_string();
        self.put(&remote_id, doc)?;
        Ok(remote_id)
    }

    fn delete(&self, remote_id: &str) -> Result<(), SyncError> {
        match fs::remove_file(self.document_path(remote_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::from(e)),
        }
    }

    fn list(&self) -> Result<Vec<(String, TaskDocument)>, SyncError> {
        let mut documents = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raw = fs::read_to_string(&path)?;
            match serde_json::from_str(&raw) {
                Ok(doc) => documents.push((stem.to_string(), doc)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable mirror document");
                }
            }
        }
        documents.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(documents)
    }
}

/// Outcome of a full sync pass, shown to the user as-is.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub ok: bool,
    pub message: String,
    pub pushed: usize,
    pub pulled: usize,
}

pub struct SyncEngine<'a> {
    db: &'a Database,
    mirror: &'a dyn TaskMirror,
}

impl<'a> SyncEngine<'a> {
    pub fn new(db: &'a Database, mirror: &'a dyn TaskMirror) -> Self {
        Self { db, mirror }
    }

    /// Full sync pass: push every local task, then pull the mirror.
    pub fn sync_all(&self) -> SyncReport {
        let result = self.push_all().and_then(|pushed| {
            let pulled = self.pull_all()?;
            Ok((pushed, pulled))
        });
        match result {
            Ok((pushed, pulled)) => SyncReport {
                ok: true,
                message: format!("Pushed {pushed}, pulled {pulled}"),
                pushed,
                pulled,
            },
            Err(e) => SyncReport {
                ok: false,
                message: format!("Sync failed: {e}"),
                pushed: 0,
                pulled: 0,
            },
        }
    }

    /// Push every local task to the mirror, overwriting what is there.
    pub fn push_all(&self) -> Result<usize, SyncError> {
        let tasks = self.db.get_all_tasks()?;
        let mut count = 0;
        for task in tasks {
            self.push_task(&task)?;
            count += 1;
        }
        Ok(count)
    }

    /// Push one task, minting and recording a mirror id on first push.
    pub fn push_task(&self, task: &Task) -> Result<(), SyncError> {
        let Some(id) = task.id else { return Ok(()) };
        let subtasks = self.db.subtasks_for_task(id)?;
        let doc = TaskDocument::from_task(task, &subtasks);
        match &task.remote_id {
            Some(remote_id) => self.mirror.put(remote_id, &doc)?,
            None => {
                let remote_id = self.mirror.create(&doc)?;
                self.db.set_remote_id(id, &remote_id)?;
            }
        }
        Ok(())
    }

    /// Push after a local edit. Failures are logged and swallowed so a
    /// broken mirror never blocks the edit itself.
    pub fn push_task_quietly(&self, id: i64) {
        let task = match self.db.get_task(id) {
            Ok(Some(task)) => task,
            Ok(None) => return,
            Err(e) => {
                warn!(task = id, error = %e, "mirror push skipped");
                return;
            }
        };
        if let Err(e) = self.push_task(&task) {
            warn!(task = id, error = %e, "mirror push failed");
        }
    }

    /// Pull the mirror into the local store. A remote copy wins
    /// wholesale, subtasks included, when its last_modified is newer;
    /// documents unknown locally become new tasks.
    pub fn pull_all(&self) -> Result<usize, SyncError> {
        let mut count = 0;
        for (remote_id, doc) in self.mirror.list()? {
            match self.db.task_by_remote_id(&remote_id)? {
                Some(local) => {
                    if doc.last_modified > local.last_modified {
                        let Some(local_id) = local.id else { continue };
                        let mut task = doc.to_task(&remote_id);
                        task.id = Some(local_id);
                        self.db.update_task(&task)?;
                        self.db.replace_subtasks(local_id, &doc.to_subtasks(local_id))?;
                        count += 1;
                    }
                }
                None => {
                    let task = doc.to_task(&remote_id);
                    let local_id = self.db.insert_task(&task)?;
                    self.db.replace_subtasks(local_id, &doc.to_subtasks(local_id))?;
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Remove a task's mirror document ahead of a local delete.
    /// Missing documents and mirror errors are ignored.
    pub fn delete_remote_quietly(&self, remote_id: Option<&str>) {
        if let Some(remote_id) = remote_id {
            if let Err(e) = self.mirror.delete(remote_id) {
                warn!(remote_id, error = %e, "mirror delete failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, Priority};

    fn task(name: &str) -> Task {
        let mut task = Task::new(name.to_string());
        task.created_at = 1_000;
        task.last_modified = 1_000;
        task
    }

    fn mirror_in(dir: &std::path::Path) -> JsonDirMirror {
        JsonDirMirror::new(dir.join("mirror")).unwrap()
    }

    #[test]
    fn first_push_mints_an_id_and_writes_a_document() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::new(":memory:").unwrap();
        let mirror = mirror_in(tmp.path());
        let engine = SyncEngine::new(&db, &mirror);

        let id = db
            .create_task_with_subtasks(&task("mirrored"), &["step".to_string()])
            .unwrap();
        let report = engine.sync_all();

        assert!(report.ok);
        assert_eq!(report.pushed, 1);
        assert_eq!(report.pulled, 0);

        let stored = db.get_task(id).unwrap().unwrap();
        let remote_id = stored.remote_id.unwrap();
        let docs = mirror.list().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].0, remote_id);
        assert_eq!(docs[0].1.name, "mirrored");
        assert_eq!(docs[0].1.subtasks.len(), 1);
    }

    #[test]
    fn repeated_sync_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::new(":memory:").unwrap();
        let mirror = mirror_in(tmp.path());
        let engine = SyncEngine::new(&db, &mirror);

        let id = db.insert_task(&task("stable")).unwrap();
        engine.sync_all();
        let first_remote = db.get_task(id).unwrap().unwrap().remote_id;

        let report = engine.sync_all();
        assert!(report.ok);
        assert_eq!(report.pulled, 0);
        assert_eq!(db.get_task(id).unwrap().unwrap().remote_id, first_remote);
        assert_eq!(mirror.list().unwrap().len(), 1);
    }

    #[test]
    fn pull_adopts_documents_unknown_locally() {
        let tmp = tempfile::tempdir().unwrap();
        let mirror = mirror_in(tmp.path());

        let db_a = Database::new(":memory:").unwrap();
        let mut original = task("shared");
        original.difficulty = Difficulty::Hard;
        original.priority = Priority::Urgent;
        db_a.create_task_with_subtasks(&original, &["one".to_string(), "two".to_string()])
            .unwrap();
        SyncEngine::new(&db_a, &mirror).push_all().unwrap();

        let db_b = Database::new(":memory:").unwrap();
        let pulled = SyncEngine::new(&db_b, &mirror).pull_all().unwrap();
        assert_eq!(pulled, 1);

        let tasks = db_b.get_all_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "shared");
        assert_eq!(tasks[0].difficulty, Difficulty::Hard);
        assert_eq!(tasks[0].priority, Priority::Urgent);
        assert!(tasks[0].remote_id.is_some());

        let subtasks = db_b.subtasks_for_task(tasks[0].id.unwrap()).unwrap();
        let names: Vec<&str> = subtasks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn newer_remote_copy_wins_wholesale() {
        let tmp = tempfile::tempdir().unwrap();
        let mirror = mirror_in(tmp.path());

        let db_a = Database::new(":memory:").unwrap();
        let a_id = db_a
            .create_task_with_subtasks(&task("draft"), &["old step".to_string()])
            .unwrap();
        SyncEngine::new(&db_a, &mirror).push_all().unwrap();

        let db_b = Database::new(":memory:").unwrap();
        let engine_b = SyncEngine::new(&db_b, &mirror);
        engine_b.pull_all().unwrap();

        let mut theirs = db_b.get_all_tasks().unwrap().remove(0);
        let b_id = theirs.id.unwrap();
        theirs.name = "draft, revised".to_string();
        theirs.last_modified = 9_000;
        db_b.update_task(&theirs).unwrap();
        db_b.replace_subtasks(b_id, &[Subtask::new(b_id, "new step".to_string(), 0)])
            .unwrap();
        engine_b.push_task(&theirs).unwrap();

        let pulled = SyncEngine::new(&db_a, &mirror).pull_all().unwrap();
        assert_eq!(pulled, 1);

        let ours = db_a.get_task(a_id).unwrap().unwrap();
        assert_eq!(ours.name, "draft, revised");
        assert_eq!(ours.last_modified, 9_000);
        let subtasks = db_a.subtasks_for_task(a_id).unwrap();
        assert_eq!(subtasks.len(), 1);
        assert_eq!(subtasks[0].name, "new step");
    }

    #[test]
    fn older_remote_copy_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let mirror = mirror_in(tmp.path());

        let db = Database::new(":memory:").unwrap();
        let id = db.insert_task(&task("current")).unwrap();
        let engine = SyncEngine::new(&db, &mirror);
        engine.push_all().unwrap();

        // Plant a stale document under the same remote id
        let remote_id = db.get_task(id).unwrap().unwrap().remote_id.unwrap();
        let mut stale = task("stale");
        stale.last_modified = 500;
        mirror
            .put(&remote_id, &TaskDocument::from_task(&stale, &[]))
            .unwrap();

        assert_eq!(engine.pull_all().unwrap(), 0);
        assert_eq!(db.get_task(id).unwrap().unwrap().name, "current");
    }

    #[test]
    fn unreadable_documents_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let mirror = mirror_in(tmp.path());

        let db = Database::new(":memory:").unwrap();
        db.insert_task(&task("good")).unwrap();
        SyncEngine::new(&db, &mirror).push_all().unwrap();

        std::fs::write(tmp.path().join("mirror").join("broken.json"), "{ nope").unwrap();
        std::fs::write(tmp.path().join("mirror").join("notes.txt"), "ignore me").unwrap();

        let docs = mirror.list().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].1.name, "good");
    }

    #[test]
    fn deleting_a_missing_document_is_fine() {
        let tmp = tempfile::tempdir().unwrap();
        let mirror = mirror_in(tmp.path());
        mirror.delete("never-existed").unwrap();
    }

    #[test]
    fn unknown_labels_fall_back_to_defaults() {
        let doc = TaskDocument {
            name: "odd".to_string(),
            deadline: None,
            difficulty: "heroic".to_string(),
            priority: String::new(),
            completed: false,
            completed_at: None,
            started: false,
            quick: false,
            time_worked_ms: 0,
            created_at: 0,
            last_modified: 0,
            subtasks: Vec::new(),
        };
        let restored = doc.to_task("some-id");
        assert_eq!(restored.difficulty, Difficulty::Easy);
        assert_eq!(restored.priority, Priority::Normal);
        assert_eq!(restored.remote_id.as_deref(), Some("some-id"));
    }

    #[test]
    fn minimal_document_still_loads() {
        let doc: TaskDocument = serde_json::from_str(r#"{ "name": "bare" }"#).unwrap();
        assert_eq!(doc.name, "bare");
        assert!(!doc.completed);
        assert!(doc.subtasks.is_empty());
        assert_eq!(doc.last_modified, 0);
    }
}
