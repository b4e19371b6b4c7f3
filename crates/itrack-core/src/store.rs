//! File-backed issue store for itrack
//!
//! All issues live in one JSON object keyed by ID. The whole file is
//! rewritten on every mutation; there is no append log.

use crate::{Error, Issue, Result, Status, error::StorageCause};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Keyed issue persistence used by the service layer
pub trait IssueRepository: Send + Sync {
    /// Insert or overwrite the issue under its ID and persist
    fn save(&self, issue: Issue) -> Result<Issue>;

    /// Look up an issue; absence is not an error
    fn find_by_id(&self, id: &str) -> Option<Issue>;

    /// All issues currently in `status`, in no particular order
    fn find_by_status(&self, status: Status) -> Vec<Issue>;

    /// Overwrite an existing issue and persist
    fn update(&self, issue: Issue) -> Result<()>;
}

/// JSON file issue store
///
/// The mutex guards the in-memory map and is held across the file write,
/// so no caller can observe the map and the file disagreeing.
pub struct FileIssueStore {
    path: PathBuf,
    issues: Mutex<HashMap<String, Issue>>,
}

impl FileIssueStore {
    /// Open the store at `path`, creating the file if it does not exist
    ///
    /// A new file is written immediately with an empty object. A zero-length
    /// file is treated as empty and left as is.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            issues: Mutex::new(HashMap::new()),
        };

        {
            let mut issues = store.lock();
            let init_err = |source| Error::StorageInit {
                path: store.path.clone(),
                source,
            };

            if store.path.exists() {
                *issues = read_issues(&store.path).map_err(init_err)?;
                tracing::debug!(path = %store.path.display(), count = issues.len(), "loaded issues");
            } else {
                create_parent_dir(&store.path).map_err(init_err)?;
                write_issues(&store.path, &issues).map_err(init_err)?;
                tracing::debug!(path = %store.path.display(), "created issues file");
            }
        }

        Ok(store)
    }

    /// Path to the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored issues
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-read the backing file, replacing the in-memory map
    ///
    /// On failure the current map is kept.
    pub fn reload(&self) -> Result<()> {
        let mut issues = self.lock();
        let loaded = read_issues(&self.path).map_err(|source| Error::StorageRead {
            path: self.path.clone(),
            source,
        })?;
        *issues = loaded;
        tracing::debug!(path = %self.path.display(), count = issues.len(), "reloaded issues");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Issue>> {
        // Every writer restores the map before releasing, so a poisoned map is still consistent.
        self.issues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert and persist, restoring the previous entry if the write fails
    fn put(&self, issue: Issue) -> Result<Issue> {
        let mut issues = self.lock();
        let previous = issues.insert(issue.id.clone(), issue.clone());

        if let Err(source) = write_issues(&self.path, &issues) {
            tracing::warn!(id = %issue.id, path = %self.path.display(), "write failed, rolling back");
            match previous {
                Some(prev) => {
                    issues.insert(issue.id.clone(), prev);
                }
                None => {
                    issues.remove(&issue.id);
                }
            }
            return Err(Error::StorageWrite {
                path: self.path.clone(),
                source,
            });
        }

        tracing::debug!(id = %issue.id, count = issues.len(), "persisted issues");
        Ok(issue)
    }
}

impl IssueRepository for FileIssueStore {
    fn save(&self, issue: Issue) -> Result<Issue> {
        self.put(issue)
    }

    fn find_by_id(&self, id: &str) -> Option<Issue> {
        self.lock().get(id).cloned()
    }

    fn find_by_status(&self, status: Status) -> Vec<Issue> {
        self.lock()
            .values()
            .filter(|i| i.status == status)
            .cloned()
            .collect()
    }

    fn update(&self, issue: Issue) -> Result<()> {
        self.put(issue).map(|_| ())
    }
}

fn create_parent_dir(path: &Path) -> std::result::Result<(), StorageCause> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn read_issues(path: &Path) -> std::result::Result<HashMap<String, Issue>, StorageCause> {
    let content = fs::read_to_string(path)?;
    if content.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(serde_json::from_str(&content)?)
}

fn write_issues(
    path: &Path,
    issues: &HashMap<String, Issue>,
) -> std::result::Result<(), StorageCause> {
    let json = serde_json::to_string_pretty(issues)?;

    // Write beside the target, then rename over it
    let tmp_path = temp_path(path);
    if let Err(err) = fs::write(&tmp_path, json).and_then(|()| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    fn issue(description: &str) -> Issue {
        Issue::create(description, None).unwrap()
    }

    #[test]
    fn test_open_creates_file_with_empty_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("issues.json");

        let store = FileIssueStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.path(), path.as_path());

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn test_open_zero_length_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("issues.json");
        fs::write(&path, "").unwrap();

        let store = FileIssueStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_open_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("issues.json");
        fs::write(&path, "{ not json").unwrap();

        let err = FileIssueStore::open(&path).err().unwrap();
        assert!(matches!(
            err,
            Error::StorageInit {
                source: StorageCause::Json(_),
                ..
            }
        ));
        assert!(err.is_storage());
    }

    #[test]
    fn test_save_and_find() {
        let dir = tempdir().unwrap();
        let store = FileIssueStore::open(dir.path().join("issues.json")).unwrap();

        let saved = store.save(issue("desc1")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_id(&saved.id), Some(saved));
        assert_eq!(store.find_by_id("missing"), None);
    }

    #[test]
    fn test_file_is_keyed_by_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("issues.json");
        let store = FileIssueStore::open(&path).unwrap();
        let saved = store.save(issue("desc1")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains('\n'), "expected pretty-printed output");

        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        let record = &value[saved.id.as_str()];
        assert_eq!(record["id"], saved.id.as_str());
        assert_eq!(record["description"], "desc1");
        assert_eq!(record["status"], "OPEN");
    }

    #[test]
    fn test_find_by_status() {
        let dir = tempdir().unwrap();
        let store = FileIssueStore::open(dir.path().join("issues.json")).unwrap();

        let a = store.save(issue("a")).unwrap();
        let b = store.save(issue("b").with_status(Status::Closed)).unwrap();
        let c = store.save(issue("c").with_status(Status::Closed)).unwrap();

        let open = store.find_by_status(Status::Open);
        assert_eq!(open, vec![a]);

        let mut closed: Vec<_> = store
            .find_by_status(Status::Closed)
            .into_iter()
            .map(|i| i.id)
            .collect();
        closed.sort();
        let mut expected = vec![b.id, c.id];
        expected.sort();
        assert_eq!(closed, expected);

        assert!(store.find_by_status(Status::InProgress).is_empty());
    }

    #[test]
    fn test_update_overwrites() {
        let dir = tempdir().unwrap();
        let store = FileIssueStore::open(dir.path().join("issues.json")).unwrap();

        let saved = store.save(issue("desc")).unwrap();
        let changed = saved.with_status(Status::InProgress);
        store.update(changed.clone()).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_id(&saved.id), Some(changed));
    }

    #[test]
    fn test_reopen_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("issues.json");

        let mut saved = Vec::new();
        {
            let store = FileIssueStore::open(&path).unwrap();
            saved.push(store.save(issue("one")).unwrap());
            saved.push(
                store
                    .save(Issue::create("two", Some("dangling".to_string())).unwrap())
                    .unwrap(),
            );
            saved.push(store.save(issue("three").with_status(Status::Closed)).unwrap());
        }

        let reopened = FileIssueStore::open(&path).unwrap();
        assert_eq!(reopened.len(), saved.len());
        for issue in saved {
            assert_eq!(reopened.find_by_id(&issue.id), Some(issue));
        }
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        let store = FileIssueStore::open(sub.join("issues.json")).unwrap();
        let kept = store.save(issue("kept")).unwrap();

        fs::remove_dir_all(&sub).unwrap();

        let new_issue = issue("lost");
        let err = store.save(new_issue.clone()).unwrap_err();
        assert!(matches!(err, Error::StorageWrite { .. }));
        assert_eq!(store.find_by_id(&new_issue.id), None);

        let err = store.update(kept.with_status(Status::Closed)).unwrap_err();
        assert!(matches!(err, Error::StorageWrite { .. }));
        assert_eq!(store.find_by_id(&kept.id), Some(kept));
    }

    #[test]
    fn test_failed_rename_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("issues.json");
        let store = FileIssueStore::open(&path).unwrap();
        let kept = store.save(issue("kept")).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        // A directory at the temp path makes the write fail before the rename
        let tmp = temp_path(&path);
        fs::create_dir(&tmp).unwrap();

        let err = store.update(kept.with_status(Status::Closed)).unwrap_err();
        assert!(matches!(err, Error::StorageWrite { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(store.find_by_id(&kept.id), Some(kept.clone()));

        fs::remove_dir(&tmp).unwrap();
        store.update(kept.with_status(Status::Closed)).unwrap();
        assert!(!tmp.exists());
        store.reload().unwrap();
        assert_eq!(store.find_by_id(&kept.id).unwrap().status, Status::Closed);
    }

    #[test]
    fn test_reload_picks_up_file_and_keeps_map_on_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("issues.json");
        let first = FileIssueStore::open(&path).unwrap();
        let second = FileIssueStore::open(&path).unwrap();

        let saved = first.save(issue("shared")).unwrap();
        assert_eq!(second.find_by_id(&saved.id), None);
        second.reload().unwrap();
        assert_eq!(second.find_by_id(&saved.id), Some(saved.clone()));

        fs::write(&path, "[broken").unwrap();
        let err = second.reload().unwrap_err();
        assert!(matches!(err, Error::StorageRead { .. }));
        assert_eq!(second.find_by_id(&saved.id), Some(saved));
    }

    #[test]
    fn test_concurrent_saves() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("issues.json");
        let store = Arc::new(FileIssueStore::open(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for n in 0..10 {
                        store.save(issue(&format!("t{t}-{n}"))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 80);
        let reopened = FileIssueStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 80);
    }
}
