//! Durable session store backed by a JSON file

use std::collections::HashMap;
use std::fs::{self as std_fs, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use tempfile::NamedTempFile;
use tokio::fs as tokio_fs;

use super::{Session, SessionStore};
use crate::{AuthError, AuthResult};

type SessionMap = HashMap<String, Session>;

/// Sessions persisted to a single JSON document
///
/// Any number of handles, in this process or in other worker processes, may
/// share one file. Writes hold an exclusive lock on a `<file>.lock` sidecar
/// across read-modify-write and replace the document atomically through a
/// uniquely named temp file, so readers see either the old or the new
/// document and no acknowledged write is lost.
///
/// Every operation parses the whole document. That is fine for the small
/// session sets this store is meant for; larger deployments should use the
/// PostgreSQL store.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileSessionStore {
    /// Open (or prepare to create) the store at `path`
    pub async fn open<P: AsRef<Path>>(path: P) -> AuthResult<Self> {
        let path = path.as_ref().to_path_buf();
        tokio_fs::create_dir_all(parent_dir(&path)).await?;

        let mut lock_name = path.as_os_str().to_os_string();
        lock_name.push(".lock");
        Ok(Self {
            path,
            lock_path: PathBuf::from(lock_name),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `change` against the current document under the file lock, saving
    /// the document afterwards when `change` reports it dirty
    async fn update<T, F>(&self, change: F) -> AuthResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SessionMap) -> (T, bool) + Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();

        tokio::task::spawn_blocking(move || {
            let lock = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(&lock_path)?;
            lock.lock_exclusive()?;

            let mut sessions = load_blocking(&path)?;
            let (outcome, dirty) = change(&mut sessions);
            if dirty {
                save_blocking(&path, &sessions)?;
            }
            // closing the handle releases the lock
            drop(lock);
            Ok(outcome)
        })
        .await
        .map_err(|e| AuthError::storage_error(format!("session file task failed: {}", e)))?
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn parse(bytes: &[u8]) -> AuthResult<SessionMap> {
    if bytes.is_empty() {
        return Ok(SessionMap::new());
    }
    Ok(serde_json::from_slice(bytes)?)
}

fn load_blocking(path: &Path) -> AuthResult<SessionMap> {
    match std_fs::read(path) {
        Ok(bytes) => parse(&bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionMap::new()),
        Err(e) => Err(e.into()),
    }
}

fn save_blocking(path: &Path, sessions: &SessionMap) -> AuthResult<()> {
    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    serde_json::to_writer_pretty(&mut tmp, sessions)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn put(&self, token: &str, session: Session) -> AuthResult<()> {
        let token = token.to_string();
        self.update(move |sessions| {
            sessions.insert(token, session);
            ((), true)
        })
        .await
    }

    async fn get(&self, token: &str) -> AuthResult<Option<Session>> {
        // the document is only ever replaced by rename, so reads need no lock
        let mut sessions = match tokio_fs::read(&self.path).await {
            Ok(bytes) => parse(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(sessions.remove(token))
    }

    async fn remove(&self, token: &str) -> AuthResult<bool> {
        let token = token.to_string();
        self.update(move |sessions| {
            let removed = sessions.remove(&token).is_some();
            (removed, removed)
        })
        .await
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}
