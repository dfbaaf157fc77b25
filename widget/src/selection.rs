//! Ordered store of the photos selected for one product.
//!
//! The store is the single owner of every [`SelectedPhoto`] and of its
//! preview handle. Limits are checked against the prospective post-add state,
//! so a rejected add leaves the store untouched.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::preview::PreviewHandle;
use crate::preview::PreviewRegistry;

/// File extensions the analysis pipeline accepts, lowercase with dot.
pub const ALLOWED_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".heic", ".heif", ".webp"];

/// Opaque identifier for one selected photo, unique within a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PhotoId(Uuid);

impl PhotoId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Binary photo data as picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFile {
    name: String,
    bytes: Vec<u8>,
}

impl PhotoFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lowercased extension including the dot; nameless uploads count as
    /// `.jpg`, matching the server's normalization.
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
                format!(".{}", ext.to_ascii_lowercase())
            }
            _ => ".jpg".to_string(),
        }
    }
}

/// One photo held by the store, together with its preview.
#[derive(Debug)]
pub struct SelectedPhoto {
    pub id: PhotoId,
    pub file: PhotoFile,
    pub preview: PreviewHandle,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("No more than {limit} images allowed per analysis.")]
    TooManyPhotos { limit: usize },
    #[error("Image batch exceeds {limit_mib} MB limit.")]
    BatchTooLarge { limit_mib: u64 },
    #[error("Unsupported image type: {extension}")]
    UnsupportedType { extension: String },
}

/// Insertion-ordered photo selection with count/size limits.
#[derive(Debug)]
pub struct SelectionStore {
    photos: Vec<SelectedPhoto>,
    max_photos: usize,
    max_total_bytes: u64,
}

impl SelectionStore {
    pub fn new(max_photos: usize, max_total_bytes: u64) -> Self {
        Self {
            photos: Vec::new(),
            max_photos,
            max_total_bytes,
        }
    }

    /// Append `files` in input order, acquiring a preview for each.
    ///
    /// Validation runs against the prospective post-add state before any
    /// mutation: on error nothing was appended and nothing was acquired.
    pub fn add(
        &mut self,
        files: Vec<PhotoFile>,
        previews: &mut PreviewRegistry,
    ) -> Result<Vec<PhotoId>, SelectionError> {
        if self.photos.len() + files.len() > self.max_photos {
            return Err(SelectionError::TooManyPhotos {
                limit: self.max_photos,
            });
        }
        let incoming: u64 = files.iter().map(PhotoFile::byte_len).sum();
        if self.total_bytes() + incoming > self.max_total_bytes {
            return Err(SelectionError::BatchTooLarge {
                limit_mib: self.max_total_bytes / (1024 * 1024),
            });
        }
        for file in &files {
            let extension = file.extension();
            if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
                return Err(SelectionError::UnsupportedType { extension });
            }
        }

        let mut added = Vec::with_capacity(files.len());
        for file in files {
            let preview = previews.acquire(&file);
            let id = PhotoId::new();
            self.photos.push(SelectedPhoto { id, file, preview });
            added.push(id);
        }
        Ok(added)
    }

    /// Remove the photo with `id`, releasing its preview. Returns whether
    /// anything was removed; an unknown id is a silent no-op.
    pub fn remove(&mut self, id: PhotoId, previews: &mut PreviewRegistry) -> bool {
        let Some(index) = self.photos.iter().position(|photo| photo.id == id) else {
            return false;
        };
        let photo = self.photos.remove(index);
        previews.release(photo.preview);
        true
    }

    /// Remove every photo, releasing all previews.
    pub fn clear(&mut self, previews: &mut PreviewRegistry) {
        for photo in self.photos.drain(..) {
            previews.release(photo.preview);
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.photos.iter().map(|photo| photo.file.byte_len()).sum()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedPhoto> {
        self.photos.iter()
    }

    pub fn ids(&self) -> Vec<PhotoId> {
        self.photos.iter().map(|photo| photo.id).collect()
    }
}
