//! Multipart intake with per-field type and size rules.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::AppError;
use crate::media::{self, MediaStore};

const MB: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Video,
    Image,
    Resource,
}

impl UploadKind {
    pub const fn max_bytes(self) -> usize {
        match self {
            UploadKind::Video => 500 * MB,
            UploadKind::Image => 10 * MB,
            UploadKind::Resource => 200 * MB,
        }
    }

    /// Request body cap for a route accepting this kind, leaving room for the
    /// text fields and multipart framing.
    pub const fn body_limit(self) -> usize {
        self.max_bytes() + MB
    }

    pub fn accepts(self, content_type: &str) -> bool {
        match self {
            UploadKind::Video => content_type.starts_with("video/"),
            UploadKind::Image => content_type.starts_with("image/"),
            UploadKind::Resource => true,
        }
    }

    fn type_message(self) -> &'static str {
        match self {
            UploadKind::Video => "Only video files are allowed",
            UploadKind::Image => "Only image files are allowed",
            UploadKind::Resource => "File type not allowed",
        }
    }

    fn size_message(self) -> String {
        format!("File exceeds the {} MB limit", self.max_bytes() / MB)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FileRule {
    pub field: &'static str,
    pub kind: UploadKind,
}

impl FileRule {
    pub const fn new(field: &'static str, kind: UploadKind) -> Self {
        Self { field, kind }
    }
}

/// A file part already written to the media store.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub field: String,
    pub original_name: String,
    pub file_name: String,
}

impl StoredFile {
    pub fn url(&self) -> String {
        media::media_url(&self.file_name)
    }
}

/// A parsed multipart form: text fields by name plus the files it stored.
///
/// The form owns its files until [`UploadForm::finish`] sees the handler
/// succeed; on failure they are removed again.
#[derive(Debug, Default)]
pub struct UploadForm {
    texts: HashMap<String, String>,
    files: Vec<StoredFile>,
    written: Vec<String>,
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

impl UploadForm {
    /// Reads every part, streaming files into `media` under the limits of
    /// their rule. Nothing stays stored if reading fails.
    pub async fn parse(
        multipart: Multipart,
        rules: &[FileRule],
        media: &dyn MediaStore,
    ) -> Result<Self, AppError> {
        let mut form = UploadForm::default();
        match form.read(multipart, rules, media).await {
            Ok(()) => Ok(form),
            Err(err) => {
                form.discard(media).await;
                Err(err)
            }
        }
    }

    async fn read(
        &mut self,
        mut multipart: Multipart,
        rules: &[FileRule],
        media: &dyn MediaStore,
    ) -> Result<(), AppError> {
        while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            let Some(original_name) = field.file_name().map(str::to_string) else {
                let value = field.text().await.map_err(multipart_error)?;
                self.texts.insert(name, value);
                continue;
            };

            // Browsers send an empty part for file inputs left blank.
            if original_name.is_empty() {
                continue;
            }

            let rule = rules
                .iter()
                .find(|rule| rule.field == name)
                .ok_or_else(|| AppError::BadRequest(format!("Unexpected file field '{name}'")))?;

            let content_type = field.content_type().unwrap_or("application/octet-stream");
            if !rule.kind.accepts(content_type) {
                return Err(AppError::BadRequest(rule.kind.type_message().to_string()));
            }

            let (file_name, mut writer) = media::create_unique(media, &original_name, rule.field).await?;
            self.written.push(file_name.clone());

            let mut size = 0;
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                size += chunk.len();
                if size > rule.kind.max_bytes() {
                    return Err(AppError::BadRequest(rule.kind.size_message()));
                }
                writer.write_all(&chunk).await?;
            }
            writer.shutdown().await?;
            debug!("stored {} ({} bytes) from field {}", file_name, size, name);

            self.files.push(StoredFile {
                field: name,
                original_name,
                file_name,
            });
        }

        Ok(())
    }

    /// Passes `result` through, removing the stored files when it is an error.
    pub async fn finish<T>(
        &self,
        media: &dyn MediaStore,
        result: Result<T, AppError>,
    ) -> Result<T, AppError> {
        if result.is_err() {
            self.discard(media).await;
        }
        result
    }

    async fn discard(&self, media: &dyn MediaStore) {
        for file_name in &self.written {
            media::discard(media, file_name).await;
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    /// Trimmed text, with blank values treated as absent.
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.text(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn int(&self, name: &str) -> Result<Option<i64>, AppError> {
        match self.non_empty(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::BadRequest(format!("{name} must be an integer"))),
        }
    }

    pub fn float(&self, name: &str) -> Result<Option<f64>, AppError> {
        match self.non_empty(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::BadRequest(format!("{name} must be a number"))),
        }
    }

    pub fn file(&self, field: &str) -> Option<&StoredFile> {
        self.files.iter().find(|f| f.field == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_check_mime_prefix() {
        assert!(UploadKind::Video.accepts("video/mp4"));
        assert!(!UploadKind::Video.accepts("image/png"));
        assert!(UploadKind::Image.accepts("image/png"));
        assert!(!UploadKind::Image.accepts("application/pdf"));
        assert!(UploadKind::Resource.accepts("application/pdf"));
    }

    #[test]
    fn limits_match_upload_kinds() {
        assert_eq!(UploadKind::Video.max_bytes(), 500 * MB);
        assert_eq!(UploadKind::Image.max_bytes(), 10 * MB);
        assert_eq!(UploadKind::Resource.max_bytes(), 200 * MB);
        assert!(UploadKind::Image.body_limit() > UploadKind::Image.max_bytes());
    }

    #[test]
    fn numeric_fields_reject_garbage() {
        let mut form = UploadForm::default();
        form.texts.insert("course_id".into(), " 12 ".into());
        form.texts.insert("order_index".into(), "".into());
        form.texts.insert("bad".into(), "twelve".into());

        assert_eq!(form.int("course_id").unwrap(), Some(12));
        assert_eq!(form.int("order_index").unwrap(), None);
        assert_eq!(form.int("missing").unwrap(), None);
        assert!(matches!(form.int("bad"), Err(AppError::BadRequest(_))));
    }
}
