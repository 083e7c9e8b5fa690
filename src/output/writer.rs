//! Content store for extracted pages
//!
//! All writes go through one lock so concurrent workers never interleave
//! writes into the output tree. The lock is only held for a single file
//! write. Distinct URLs can map to the same file (`/docs/a` and
//! `/docs/a.html`); the later write wins and is reported as a collision.

use crate::crawler::PageContent;
use crate::output::{OutputError, OutputResult};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Writes extracted content under an output directory
#[derive(Debug)]
pub struct ContentStore {
    root: PathBuf,
    /// Files written by this store; the lock serializes writes
    written: Mutex<HashSet<PathBuf>>,
    collisions: AtomicUsize,
}

impl ContentStore {
    /// Creates a store rooted at `root`
    ///
    /// The directory is not created until `ensure_directory` or the first
    /// write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Mutex::new(HashSet::new()),
            collisions: AtomicUsize::new(0),
        }
    }

    /// Returns the output directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of writes that replaced a file written earlier by this store
    pub fn collisions(&self) -> usize {
        self.collisions.load(Ordering::Relaxed)
    }

    /// Creates `path` and all missing parents
    pub async fn ensure_directory(&self, path: &Path) -> OutputResult<()> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    /// Writes `content` to `relative` under the output directory
    ///
    /// Returns the full path written.
    pub async fn write_file(&self, relative: &Path, content: &str) -> OutputResult<PathBuf> {
        let target = self.resolve(relative)?;

        let mut written = self.written.lock().await;

        if let Some(parent) = target.parent() {
            self.ensure_directory(parent).await?;
        }
        tokio::fs::write(&target, content.as_bytes()).await?;

        if !written.insert(target.clone()) {
            self.collisions.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "Overwrote {} which was already written by this crawl",
                target.display()
            );
        }

        tracing::debug!("Wrote {} bytes to {}", content.len(), target.display());
        Ok(target)
    }

    /// Persists one page's extracted content
    pub async fn persist(&self, content: &PageContent) -> OutputResult<PathBuf> {
        self.write_file(&content.filename, &content.body).await
    }

    /// Joins a relative path onto the root, refusing to escape it
    fn resolve(&self, relative: &Path) -> OutputResult<PathBuf> {
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

        if !safe || relative.as_os_str().is_empty() {
            return Err(OutputError::UnsafePath(relative.display().to_string()));
        }

        Ok(self.root.join(relative))
    }
}
