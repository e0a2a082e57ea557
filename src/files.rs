//! Photo uploads attached to a report
use crate::code_format::normalize;
use crate::error::UploadError;
use crate::utils;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::debug;

/// A photo picked by the finder, not yet uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    pub fn new(file_name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }
}

pub trait FileStore: Send + Sync {
    /// Store `bytes` under `path` and return a URL the owner can fetch it from
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, UploadError>;
}

/// Object path for a report photo: `reports/<CODE>/<unix millis>_<index>_<name>`.
/// `index` is the photo's position in its submission, so same-named photos
/// uploaded within one millisecond don't collide.
pub fn photo_path(code: &str, uploaded_at_millis: i64, index: usize, file_name: &str) -> String {
    let name: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "reports/{}/{}_{}_{}",
        normalize(code),
        uploaded_at_millis,
        index,
        name
    )
}

/// Writes uploads under `root` and serves them from `public_base`
pub struct DirFileStore {
    root: PathBuf,
    public_base: String,
}

impl DirFileStore {
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }
}

impl FileStore for DirFileStore {
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty(path.to_string()));
        }
        let target = self.root.join(path);
        let io_err = |source| UploadError::Io {
            path: target.display().to_string(),
            source,
        };
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&target, bytes).map_err(io_err)?;

        debug!(path, content_type, digest = %utils::content_digest(bytes), "photo stored");
        Ok(format!("{}/{}", self.public_base, path))
    }
}

/// Keeps uploads in memory. URLs use the `memory://` scheme.
#[derive(Default)]
pub struct MemoryFileStore {
    objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .ok()?
            .get(path)
            .map(|(_, bytes)| bytes.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileStore for MemoryFileStore {
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty(path.to_string()));
        }
        self.objects
            .write()
            .map_err(|_| UploadError::Unavailable("memory file store lock poisoned".to_string()))?
            .insert(path.to_string(), (content_type.to_string(), bytes.to_vec()));
        Ok(format!("memory://{path}"))
    }
}

impl<F: FileStore + ?Sized> FileStore for std::sync::Arc<F> {
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, UploadError> {
        (**self).upload(path, bytes, content_type)
    }
}
