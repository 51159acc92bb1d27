//! In-memory port implementations shared by the engine tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use filesync_core::domain::{
    PageToken, RemoteId, RemoteVersion, SigningKey, SyncMetadataRecord, VersionPage, VersionQuery,
};
use filesync_core::ports::{IMetadataStore, IRemoteStore, ISigner, NewRemoteObject};

pub const FOLDER: &str = "folder-1";

pub fn folder_id() -> RemoteId {
    RemoteId::new(FOLDER.to_string()).unwrap()
}

pub fn rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// MemoryRemoteStore
// ============================================================================

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub id: String,
    pub name: String,
    pub parent: String,
    pub modified: String,
    pub properties: HashMap<String, String>,
    pub content: Vec<u8>,
}

#[derive(Default)]
struct RemoteState {
    objects: Vec<StoredObject>,
    next_id: u32,
    deleted: Vec<String>,
    list_calls: usize,
    fail_deletes: bool,
}

/// Remote store keeping objects in insertion order, paginated by offset
pub struct MemoryRemoteStore {
    state: Mutex<RemoteState>,
    page_size: usize,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(RemoteState::default()),
            page_size,
        }
    }

    /// Adds an object as if it had been uploaded earlier; returns its id
    pub fn insert(
        &self,
        name: &str,
        modified: &str,
        properties: &[(&str, &str)],
        content: &[u8],
    ) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("obj-{}", state.next_id);
        state.objects.push(StoredObject {
            id: id.clone(),
            name: name.to_string(),
            parent: FOLDER.to_string(),
            modified: modified.to_string(),
            properties: properties
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            content: content.to_vec(),
        });
        id
    }

    pub fn named(&self, name: &str) -> Vec<StoredObject> {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .filter(|o| o.name == name)
            .cloned()
            .collect()
    }

    pub fn ids_named(&self, name: &str) -> Vec<String> {
        self.named(name).into_iter().map(|o| o.id).collect()
    }

    pub fn object_count(&self) -> usize {
        self.state.lock().unwrap().objects.len()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn fail_deletes(&self) {
        self.state.lock().unwrap().fail_deletes = true;
    }
}

#[async_trait::async_trait]
impl IRemoteStore for MemoryRemoteStore {
    async fn list_page(&self, query: &VersionQuery, token: Option<&PageToken>) -> Result<VersionPage> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;

        let offset = match token {
            Some(t) => t.as_str().parse::<usize>()?,
            None => 0,
        };
        let matching: Vec<&StoredObject> = state
            .objects
            .iter()
            .filter(|o| o.name == query.name && o.parent == query.parent_id.as_str())
            .collect();

        let end = (offset + self.page_size).min(matching.len());
        let versions = matching[offset.min(end)..end]
            .iter()
            .map(|o| {
                RemoteVersion::new(RemoteId::new(o.id.clone()).unwrap(), &o.name, &o.modified)
                    .with_properties(o.properties.clone())
            })
            .collect();
        let next_page_token = if end < matching.len() {
            Some(PageToken::new(end.to_string())?)
        } else {
            None
        };

        Ok(VersionPage {
            versions,
            next_page_token,
        })
    }

    async fn create(&self, object: &NewRemoteObject, content: Vec<u8>) -> Result<RemoteId> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("obj-{}", state.next_id);
        state.objects.push(StoredObject {
            id: id.clone(),
            name: object.name.clone(),
            parent: object.parent_id.as_str().to_string(),
            modified: rfc3339(object.modified_time.unwrap_or_else(Utc::now)),
            properties: object.properties.clone(),
            content,
        });
        Ok(RemoteId::new(id)?)
    }

    async fn delete(&self, id: &RemoteId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_deletes {
            bail!("403 Forbidden");
        }
        let before = state.objects.len();
        state.objects.retain(|o| o.id != id.as_str());
        if state.objects.len() == before {
            bail!("404 Not Found: {}", id);
        }
        state.deleted.push(id.as_str().to_string());
        Ok(())
    }

    async fn download(&self, id: &RemoteId) -> Result<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .iter()
            .find(|o| o.id == id.as_str())
            .map(|o| o.content.clone())
            .ok_or_else(|| anyhow!("404 Not Found: {}", id))
    }

    async fn find_or_create_folder(&self, name: &str) -> Result<RemoteId> {
        Ok(RemoteId::new(format!("folder-{}", name))?)
    }
}

// ============================================================================
// MemoryMetadataStore
// ============================================================================

#[derive(Default)]
pub struct MemoryMetadataStore {
    records: Mutex<HashMap<PathBuf, SyncMetadataRecord>>,
    fail_writes: Mutex<bool>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: &Path, record: SyncMetadataRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), record);
    }

    pub fn record(&self, path: &Path) -> Option<SyncMetadataRecord> {
        self.records.lock().unwrap().get(path).copied()
    }

    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }
}

#[async_trait::async_trait]
impl IMetadataStore for MemoryMetadataStore {
    async fn get(&self, path: &Path) -> Result<Option<SyncMetadataRecord>> {
        Ok(self.record(path))
    }

    async fn set(&self, path: &Path, record: &SyncMetadataRecord) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            bail!("expected 1 affected row, got 0");
        }
        self.put(path, *record);
        Ok(())
    }

    async fn list_known_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = self.records.lock().unwrap().keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }
}

// ============================================================================
// FakeSigner
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
    Unavailable,
}

/// Signs by prefixing the content; verification answers with a fixed verdict
pub struct FakeSigner {
    verdict: Verdict,
    verified: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FakeSigner {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            verified: Mutex::new(Vec::new()),
        }
    }

    pub fn verified(&self) -> Vec<(PathBuf, PathBuf)> {
        self.verified.lock().unwrap().clone()
    }
}

impl ISigner for FakeSigner {
    fn sign(&self, file: &Path, key: &SigningKey) -> Result<Vec<u8>> {
        let content = std::fs::read(file)?;
        let mut signature = format!("sig:{}:", key).into_bytes();
        signature.extend(content);
        Ok(signature)
    }

    fn verify(&self, signature: &Path, content: &Path) -> Result<bool> {
        // Both staged files must exist while the verifier runs
        assert!(signature.exists(), "signature not staged");
        assert!(content.exists(), "content not staged");
        self.verified
            .lock()
            .unwrap()
            .push((signature.to_path_buf(), content.to_path_buf()));
        match self.verdict {
            Verdict::Pass => Ok(true),
            Verdict::Fail => Ok(false),
            Verdict::Unavailable => bail!("No such file or directory (os error 2)"),
        }
    }
}
