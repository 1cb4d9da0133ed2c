use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWrite;
use tracing::warn;

/// URL prefix under which stored files are served.
pub const MEDIA_PREFIX: &str = "/media/";

/// How far the timestamp may move forward looking for a free name.
const NAME_ATTEMPTS: i64 = 1000;

pub type MediaWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Flat storage for uploaded binaries, addressed by file name.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Creates `file_name` for writing. Fails with `ErrorKind::AlreadyExists`
    /// instead of truncating a stored file.
    async fn create(&self, file_name: &str) -> io::Result<MediaWriter>;
    async fn remove(&self, file_name: &str) -> io::Result<()>;
}

/// Lower-cases the name and collapses every run of characters outside
/// `[a-z0-9._-]` into a single `-`.
pub fn sanitize_file_name(original: &str) -> String {
    let mut out = String::with_capacity(original.len());
    let mut in_run = false;
    for c in original.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

/// `{millis}-{sanitized}`; `fallback` stands in for an empty name.
pub fn stored_name(millis: i64, original: &str, fallback: &str) -> String {
    let name = if original.trim().is_empty() { fallback } else { original };
    format!("{}-{}", millis, sanitize_file_name(name))
}

/// Creates a fresh stored file for `original`. When the name is taken the
/// timestamp is moved forward a millisecond at a time.
pub async fn create_unique(
    store: &dyn MediaStore,
    original: &str,
    fallback: &str,
) -> io::Result<(String, MediaWriter)> {
    let now = Utc::now().timestamp_millis();
    for offset in 0..NAME_ATTEMPTS {
        let file_name = stored_name(now + offset, original, fallback);
        match store.create(&file_name).await {
            Ok(writer) => return Ok((file_name, writer)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free file name for {original}"),
    ))
}

/// Best-effort removal; failures are logged and otherwise ignored.
pub async fn discard(store: &dyn MediaStore, file_name: &str) {
    if let Err(err) = store.remove(file_name).await {
        warn!("failed to remove stored file {}: {}", file_name, err);
    }
}

pub fn media_url(file_name: &str) -> String {
    format!("{MEDIA_PREFIX}{file_name}")
}

/// The stored file name behind a media URL. `None` for anything outside the
/// media directory.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let name = url.strip_prefix(MEDIA_PREFIX)?;
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return None;
    }
    Some(name)
}

pub struct DiskMediaStore {
    root: PathBuf,
}

impl DiskMediaStore {
    pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl MediaStore for DiskMediaStore {
    async fn create(&self, file_name: &str) -> io::Result<MediaWriter> {
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.root.join(file_name))
            .await?;
        Ok(Box::new(file))
    }

    async fn remove(&self, file_name: &str) -> io::Result<()> {
        tokio::fs::remove_file(self.root.join(file_name)).await
    }
}

type Files = Arc<Mutex<HashMap<String, Vec<u8>>>>;

fn poisoned() -> io::Error {
    io::Error::other("media store lock poisoned")
}

/// Keeps files in memory. Used by tests.
#[derive(Default)]
pub struct MemoryMediaStore {
    files: Files,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(file_name))
            .unwrap_or(false)
    }

    pub fn contents(&self, file_name: &str) -> Option<Vec<u8>> {
        self.files.lock().ok()?.get(file_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn create(&self, file_name: &str) -> io::Result<MediaWriter> {
        let mut files = self.files.lock().map_err(|_| poisoned())?;
        if files.contains_key(file_name) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, file_name.to_string()));
        }
        files.insert(file_name.to_string(), Vec::new());
        Ok(Box::new(MemoryWriter {
            files: self.files.clone(),
            file_name: file_name.to_string(),
        }))
    }

    async fn remove(&self, file_name: &str) -> io::Result<()> {
        let mut files = self.files.lock().map_err(|_| poisoned())?;
        files.remove(file_name);
        Ok(())
    }
}

/// Appends to an entry of a [`MemoryMediaStore`].
struct MemoryWriter {
    files: Files,
    file_name: String,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let mut files = match self.files.lock() {
            Ok(files) => files,
            Err(_) => return Poll::Ready(Err(poisoned())),
        };
        match files.get_mut(&self.file_name) {
            Some(file) => {
                file.extend_from_slice(buf);
                Poll::Ready(Ok(buf.len()))
            }
            None => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::NotFound,
                self.file_name.clone(),
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
