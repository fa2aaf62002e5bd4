use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The three kinds of generated media kept on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
    Video,
}

impl MediaKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Audio => &["wav", "mp3", "aac", "flac"],
            MediaKind::Image => &["png", "jpg", "jpeg", "gif", "webp"],
            MediaKind::Video => &["mp4"],
        }
    }

    pub fn matches(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions().iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

/// `<prefix>_<unix millis>_<8 hex chars>.<ext>`; unique across steps finishing in the same millisecond
pub fn timestamped_name(prefix: &str, ext: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.{}", prefix, Utc::now().timestamp_millis(), &suffix[..8], ext)
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaFile {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Directory layout for generated media: `audio/`, `images/`, `videos/`
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, kind: MediaKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    pub async fn ensure_dirs(&self) -> io::Result<()> {
        for kind in [MediaKind::Audio, MediaKind::Image, MediaKind::Video] {
            tokio::fs::create_dir_all(self.dir(kind)).await?;
        }
        Ok(())
    }

    pub async fn save(&self, kind: MediaKind, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let dir = self.dir(kind);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(filename);
        tokio::fs::write(&path, bytes).await?;
        tracing::info!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Files of one kind, sorted by name; a missing directory lists as empty
    pub async fn list(&self, kind: MediaKind) -> io::Result<Vec<MediaFile>> {
        let dir = self.dir(kind);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Media directory {} does not exist", dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if !kind.matches(&name) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            files.push(MediaFile {
                name,
                size: metadata.len(),
                modified: metadata.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now()),
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Path of an existing file of `kind`; rejects anything that is not a bare file name
    pub async fn resolve(&self, kind: MediaKind, filename: &str) -> Option<PathBuf> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return None;
        }

        let path = self.dir(kind).join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => Some(path),
            _ => None,
        }
    }

    /// First stored file of `kind` whose name starts with `prefix`
    pub async fn find_with_prefix(&self, kind: MediaKind, prefix: &str) -> io::Result<Option<PathBuf>> {
        if prefix.is_empty() {
            return Ok(None);
        }
        Ok(self
            .list(kind)
            .await?
            .into_iter()
            .find(|f| f.name.starts_with(prefix))
            .map(|f| self.dir(kind).join(f.name)))
    }
}
