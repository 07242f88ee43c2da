// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image upload storage under the public directory.
//!
//! Files land in `<public_dir>/uploads/<kind>/` and are referenced by their
//! public path (`/uploads/<kind>/<file>`), which is what gets stored on the
//! user or story document. Replaced files are removed on a best-effort basis.

use crate::error::AppError;
use axum::body::Bytes;
use std::path::{Path, PathBuf};

/// URL prefix under which uploaded files are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub const INVALID_IMAGE_TYPE: &str = "Only JPG, JPEG, PNG image files are allowed!";

/// What an uploaded image is for; decides its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    ProfilePicture,
    CoverPage,
}

impl UploadKind {
    fn dir(self) -> &'static str {
        match self {
            UploadKind::ProfilePicture => "profile_pics",
            UploadKind::CoverPage => "cover_pages",
        }
    }

    fn file_prefix(self) -> &'static str {
        match self {
            UploadKind::ProfilePicture => "profilePic",
            UploadKind::CoverPage => "coverPage",
        }
    }
}

/// A file part received in a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    public_dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(public_dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            public_dir: public_dir.into(),
            max_bytes,
        }
    }

    /// Directory served at [`UPLOADS_ROUTE`].
    pub fn uploads_dir(&self) -> PathBuf {
        self.public_dir.join("uploads")
    }

    /// Check extension and size. Returns the normalized extension.
    pub fn validate(&self, file: &UploadedFile) -> Result<String, AppError> {
        let ext = Path::new(&file.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| ALLOWED_IMAGE_EXTENSIONS.contains(&e.as_str()))
            .ok_or_else(|| AppError::BadRequest(INVALID_IMAGE_TYPE.to_string()))?;

        if file.data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }
        if file.data.len() > self.max_bytes {
            return Err(AppError::BadRequest(format!(
                "File too large: maximum size is {} bytes",
                self.max_bytes
            )));
        }
        Ok(ext)
    }

    /// Validate and write an image. Returns its public path.
    pub async fn save(&self, kind: UploadKind, file: &UploadedFile) -> Result<String, AppError> {
        let ext = self.validate(file)?;

        let dir = self.uploads_dir().join(kind.dir());
        tokio::fs::create_dir_all(&dir).await?;

        let stored_name = format!(
            "{}-{}-{}.{}",
            kind.file_prefix(),
            chrono::Utc::now().timestamp_millis(),
            &uuid::Uuid::new_v4().simple().to_string()[..8],
            ext
        );
        tokio::fs::write(dir.join(&stored_name), &file.data).await?;

        tracing::debug!(kind = ?kind, file = %stored_name, bytes = file.data.len(), "Stored upload");
        Ok(format!("{}/{}/{}", UPLOADS_ROUTE, kind.dir(), stored_name))
    }

    /// Map a stored public path back to a file under the uploads directory.
    ///
    /// Returns `None` for anything outside `/uploads/` or containing
    /// traversal segments.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let relative = public_path.strip_prefix(UPLOADS_ROUTE)?.strip_prefix('/')?;

        let mut path = self.uploads_dir();
        for segment in relative.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }

    /// Delete a previously stored file. Failures are logged, never returned.
    pub async fn remove(&self, public_path: &str) {
        let Some(path) = self.resolve(public_path) else {
            tracing::warn!(path = %public_path, "Refusing to delete file outside uploads");
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %public_path, "Removed replaced upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %public_path, error = %e, "Failed to remove upload"),
        }
    }
}
