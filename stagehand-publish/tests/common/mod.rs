//! Shared fixtures: an in-memory depot over a temp workspace, and a fake host.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use stagehand_core::{DestinationRecord, Identity, PublishConfig};
use stagehand_publish::{HostError, HostSession, ReferencedFile, RevisionControl, RevisionError};
use tempfile::TempDir;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config_in(dir: &TempDir) -> PublishConfig {
    PublishConfig::new(dir.path().join("farm"), dir.path().join("staging"), "artist")
}

pub fn write(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(path, content).expect("write");
    path.to_path_buf()
}

/// Recursively count regular files under `dir`.
pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .expect("read_dir")
        .filter_map(|e| e.ok())
        .map(|e| {
            let path = e.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

// ---------------------------------------------------------------------------
// FakeDepot
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct DepotFile {
    revisions: Vec<Vec<u8>>,
    have: u32,
    opened_by: Option<Identity>,
}

impl DepotFile {
    fn head(&self) -> u32 {
        self.revisions.len() as u32
    }
}

#[derive(Debug, Default)]
struct DepotState {
    files: HashMap<PathBuf, DepotFile>,
    calls: Vec<&'static str>,
    descriptions: Vec<String>,
    fail_on: Option<&'static str>,
}

/// Revision-control double. Workspace files are real files on disk; submitted
/// revisions live in memory. Records every call and can fail one operation.
pub struct FakeDepot {
    identity: Identity,
    state: Mutex<DepotState>,
}

impl FakeDepot {
    pub fn new(identity: &str) -> Self {
        Self {
            identity: Identity::from(identity),
            state: Mutex::new(DepotState::default()),
        }
    }

    /// Put `content` into history as revision 1 and sync it to the workspace.
    pub fn seed(&self, path: &Path, content: &str) {
        write(path, content);
        let mut state = self.state.lock().unwrap();
        let file = state.files.entry(path.to_path_buf()).or_default();
        file.revisions.push(content.as_bytes().to_vec());
        file.have = file.head();
    }

    /// Submit a newer revision as if from another machine (workspace untouched).
    pub fn push_remote_revision(&self, path: &Path, content: &str) {
        let mut state = self.state.lock().unwrap();
        let file = state.files.entry(path.to_path_buf()).or_default();
        file.revisions.push(content.as_bytes().to_vec());
    }

    pub fn open_as(&self, path: &Path, who: &str) {
        let mut state = self.state.lock().unwrap();
        state.files.entry(path.to_path_buf()).or_default().opened_by = Some(Identity::from(who));
    }

    pub fn fail_on(&self, op: &'static str) {
        self.state.lock().unwrap().fail_on = Some(op);
    }

    pub fn count(&self, op: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| **c == op).count()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.state.lock().unwrap().descriptions.clone()
    }

    pub fn head(&self, path: &Path) -> u32 {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .map(DepotFile::head)
            .unwrap_or(0)
    }

    pub fn head_content(&self, path: &Path) -> Option<String> {
        let state = self.state.lock().unwrap();
        let bytes = state.files.get(path)?.revisions.last()?.clone();
        String::from_utf8(bytes).ok()
    }

    pub fn opened_by(&self, path: &Path) -> Option<Identity> {
        self.state.lock().unwrap().files.get(path)?.opened_by.clone()
    }

    fn enter(&self, op: &'static str, path: &Path) -> Result<std::sync::MutexGuard<'_, DepotState>, RevisionError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op);
        if state.fail_on == Some(op) {
            return Err(RevisionError::transport(op, path, "connection reset by peer"));
        }
        Ok(state)
    }
}

impl RevisionControl for FakeDepot {
    fn stat(&self, path: &Path) -> Result<DestinationRecord, RevisionError> {
        let state = self.enter("stat", path)?;
        Ok(match state.files.get(path) {
            Some(file) => DestinationRecord {
                head_revision: file.head(),
                have_revision: file.have,
                locked_by: file.opened_by.clone(),
                exists_in_history: file.head() > 0,
            },
            None => DestinationRecord::default(),
        })
    }

    fn sync(&self, path: &Path) -> Result<(), RevisionError> {
        let mut state = self.enter("sync", path)?;
        if let Some(file) = state.files.get_mut(path) {
            if let Some(head) = file.revisions.last() {
                std::fs::write(path, head)
                    .map_err(|e| RevisionError::rejected("sync", path, e.to_string()))?;
            }
            file.have = file.head();
        }
        Ok(())
    }

    fn checkout(&self, path: &Path) -> Result<(), RevisionError> {
        let identity = self.identity.clone();
        let mut state = self.enter("checkout", path)?;
        let file = state.files.entry(path.to_path_buf()).or_default();
        match &file.opened_by {
            Some(holder) if *holder != identity => Err(RevisionError::rejected(
                "checkout",
                path,
                format!("already opened by {holder}"),
            )),
            _ => {
                file.opened_by = Some(identity);
                Ok(())
            }
        }
    }

    fn add(&self, path: &Path) -> Result<(), RevisionError> {
        let identity = self.identity.clone();
        let mut state = self.enter("add", path)?;
        state.files.entry(path.to_path_buf()).or_default().opened_by = Some(identity);
        Ok(())
    }

    fn diff(&self, path: &Path) -> Result<bool, RevisionError> {
        let state = self.enter("diff", path)?;
        let workspace = std::fs::read(path).ok();
        let head = state.files.get(path).and_then(|f| f.revisions.last());
        Ok(workspace.as_ref() != head)
    }

    fn submit(&self, path: &Path, description: &str) -> Result<(), RevisionError> {
        let mut state = self.enter("submit", path)?;
        let content = std::fs::read(path)
            .map_err(|e| RevisionError::rejected("submit", path, e.to_string()))?;
        state.descriptions.push(description.to_string());
        let file = state.files.entry(path.to_path_buf()).or_default();
        file.revisions.push(content);
        file.have = file.head();
        file.opened_by = None;
        Ok(())
    }

    fn revert(&self, path: &Path) -> Result<(), RevisionError> {
        let mut state = self.enter("revert", path)?;
        if let Some(file) = state.files.get_mut(path) {
            if let Some(head) = file.revisions.last() {
                std::fs::write(path, head)
                    .map_err(|e| RevisionError::rejected("revert", path, e.to_string()))?;
            }
            file.opened_by = None;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeHost
// ---------------------------------------------------------------------------

/// Host session whose "document" is an in-memory string saved on demand.
pub struct FakeHost {
    pub document: PathBuf,
    pub name: String,
    pub content: String,
    pub references: Vec<ReferencedFile>,
    pub saves: Mutex<Vec<PathBuf>>,
}

impl FakeHost {
    pub fn new(document: PathBuf, name: &str, content: &str) -> Self {
        Self {
            document,
            name: name.to_string(),
            content: content.to_string(),
            references: Vec::new(),
            saves: Mutex::new(Vec::new()),
        }
    }

    pub fn with_references(mut self, references: Vec<ReferencedFile>) -> Self {
        self.references = references;
        self
    }
}

impl HostSession for FakeHost {
    fn current_document_path(&self) -> Result<PathBuf, HostError> {
        Ok(self.document.clone())
    }

    fn current_document_logical_name(&self) -> Result<String, HostError> {
        Ok(self.name.clone())
    }

    fn save_document(&self, path: &Path) -> Result<(), HostError> {
        std::fs::write(path, &self.content).map_err(|e| HostError::new(e.to_string()))?;
        self.saves.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn list_referenced_files(&self) -> Result<Vec<ReferencedFile>, HostError> {
        Ok(self.references.clone())
    }
}
