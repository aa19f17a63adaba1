//! File upload handling
//!
//! Multipart form reading plus validated storage of uploaded files under the
//! configured uploads directory. Stored names are generated server-side
//! (timestamp + random suffix + original extension), so client filenames
//! never touch the filesystem. Only the relative `/uploads/...` path is
//! persisted.
//!
//! Known limitation, kept from the original system: a file stored here is
//! not removed if the database write that references it later fails.

use crate::config::UploadConfig;
use crate::error::AppError;
use axum::body::Bytes;
use axum::extract::Multipart;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;

/// Upload validation profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Faculty photos and lab images
    Image,
    /// Teaching material documents
    Document,
}

impl UploadKind {
    fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Image => &["jpg", "jpeg", "png", "gif"],
            UploadKind::Document => &["pdf", "doc", "docx", "ppt", "pptx", "xls", "xlsx"],
        }
    }

    fn allows_mime(&self, mime: &str) -> bool {
        match self {
            UploadKind::Image => matches!(
                mime,
                "image/jpeg" | "image/jpg" | "image/png" | "image/gif"
            ),
            UploadKind::Document => matches!(
                mime,
                "application/pdf"
                    | "application/msword"
                    | "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    | "application/vnd.ms-powerpoint"
                    | "application/vnd.openxmlformats-officedocument.presentationml.presentation"
                    | "application/vnd.ms-excel"
                    | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
        }
    }

    /// Per-file size ceiling in bytes
    pub fn max_bytes(&self) -> usize {
        match self {
            UploadKind::Image => 5 * 1024 * 1024,
            UploadKind::Document => 50 * 1024 * 1024,
        }
    }

    fn rejection(&self) -> &'static str {
        match self {
            UploadKind::Image => "Only image files are allowed (JPG, PNG, GIF)",
            UploadKind::Document => "Only document files are allowed (PDF, PPT, DOC, XLS)",
        }
    }
}

/// A file part pulled out of a multipart request
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Parsed multipart form: text fields plus at most one file part
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl MultipartForm {
    /// Drain a multipart request, treating `file_field` as the file part and
    /// everything else as text fields.
    pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == file_field && field.file_name().is_some() {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                // An empty file input submits a zero-byte part; treat it as absent.
                if !data.is_empty() {
                    form.file = Some(UploadedFile {
                        file_name,
                        content_type,
                        data,
                    });
                }
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Text field, trimmed; empty submissions count as absent
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Text field that must be present and non-empty
    pub fn required(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::Validation(format!("{} is required", field_label(name))))
    }

    /// Numeric field, parsed leniently
    pub fn int(&self, name: &str) -> Option<i32> {
        self.text(name).and_then(|v| v.parse().ok())
    }

    /// Comma-separated list field (e.g. focus areas)
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        self.text(name).map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}

fn field_label(name: &str) -> String {
    let mut label: String = name.replace('_', " ");
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    label
}

/// Validate an uploaded file against its profile and write it to disk.
///
/// Returns the relative path to persist (`/uploads/...`).
pub async fn store_file(
    config: &UploadConfig,
    kind: UploadKind,
    subdir: Option<&str>,
    prefix: &str,
    file: &UploadedFile,
) -> Result<String, AppError> {
    let extension = Path::new(&file.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    // Both the extension and the declared MIME type must pass.
    let mime_ok = file
        .content_type
        .as_deref()
        .map(|m| kind.allows_mime(m))
        .unwrap_or(false);
    if !kind.allowed_extensions().contains(&extension.as_str()) || !mime_ok {
        return Err(AppError::Validation(kind.rejection().to_string()));
    }

    if file.data.len() > kind.max_bytes() {
        return Err(AppError::Validation(format!(
            "File too large (limit {} MB)",
            kind.max_bytes() / (1024 * 1024)
        )));
    }

    let stored_name = format!(
        "{}{}-{}.{}",
        prefix,
        Utc::now().timestamp_millis(),
        rand::random::<u32>(),
        extension
    );

    let mut target_dir = config.dir.clone();
    if let Some(subdir) = subdir {
        target_dir.push(subdir);
    }
    tokio::fs::create_dir_all(&target_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {}", e)))?;

    tokio::fs::write(target_dir.join(&stored_name), &file.data)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

    Ok(match subdir {
        Some(subdir) => format!("/uploads/{}/{}", subdir, stored_name),
        None => format!("/uploads/{}", stored_name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn image(file_name: &str, content_type: &str, len: usize) -> UploadedFile {
        UploadedFile {
            file_name: file_name.to_string(),
            content_type: Some(content_type.to_string()),
            data: Bytes::from(vec![0u8; len]),
        }
    }

    fn test_config(dir: &std::path::Path) -> UploadConfig {
        UploadConfig {
            dir: dir.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_store_accepts_valid_image() {
        let dir = std::env::temp_dir().join("portal-upload-test-accept");
        let path = store_file(
            &test_config(&dir),
            UploadKind::Image,
            None,
            "faculty-",
            &image("photo.PNG", "image/png", 128),
        )
        .await
        .unwrap();

        assert!(path.starts_with("/uploads/faculty-"));
        assert!(path.ends_with(".png"));
        let on_disk = dir.join(path.trim_start_matches("/uploads/"));
        assert!(on_disk.exists());
        let _ = std::fs::remove_file(on_disk);
    }

    #[tokio::test]
    async fn test_store_rejects_wrong_extension() {
        let dir = std::env::temp_dir().join("portal-upload-test-ext");
        let err = store_file(
            &test_config(&dir),
            UploadKind::Image,
            None,
            "faculty-",
            &image("script.exe", "image/png", 128),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_store_rejects_mismatched_mime() {
        let dir = std::env::temp_dir().join("portal-upload-test-mime");
        let err = store_file(
            &test_config(&dir),
            UploadKind::Document,
            Some("materials"),
            "",
            &image("notes.pdf", "text/html", 128),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_store_rejects_oversized_file() {
        let dir = std::env::temp_dir().join("portal-upload-test-size");
        let err = store_file(
            &test_config(&dir),
            UploadKind::Image,
            None,
            "lab-",
            &image("big.jpg", "image/jpeg", UploadKind::Image.max_bytes() + 1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_document_allow_list() {
        assert!(UploadKind::Document.allows_mime("application/pdf"));
        assert!(!UploadKind::Document.allows_mime("application/octet-stream"));
        assert!(UploadKind::Document.allowed_extensions().contains(&"docx"));
        assert!(!UploadKind::Document.allowed_extensions().contains(&"exe"));
    }

    #[test]
    fn test_field_label() {
        assert_eq!(field_label("course_name"), "Course name");
        assert_eq!(field_label("title"), "Title");
    }
}
