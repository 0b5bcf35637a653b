//! Multipart upload staging
//!
//! File fields are written under the upload dir with random names; text
//! fields are kept in memory. Whatever the handler does not take is removed
//! by `StagedForm::discard`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;

use vidhub_auth_core::discard_staged;

use crate::error::ApiResult;

/// Parsed multipart form with files staged on disk
#[derive(Debug, Default)]
pub struct StagedForm {
    fields: HashMap<String, String>,
    files: HashMap<String, PathBuf>,
}

impl StagedForm {
    /// Text field value, empty when absent
    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// Take ownership of a staged file
    pub fn take_file(&mut self, name: &str) -> Option<PathBuf> {
        self.files.remove(name)
    }

    /// Remove every staged file not taken
    pub async fn discard(self) {
        for path in self.files.values() {
            discard_staged(path).await;
        }
    }

    async fn read(&mut self, mut multipart: Multipart, dir: &Path) -> ApiResult<()> {
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) if !file_name.is_empty() => {
                    let bytes = field.bytes().await?;
                    if bytes.is_empty() {
                        continue;
                    }

                    let path = dir.join(staged_file_name(&file_name));
                    tokio::fs::write(&path, &bytes).await?;
                    tracing::debug!(field = %name, path = %path.display(), "Staged upload");

                    if let Some(replaced) = self.files.insert(name, path) {
                        discard_staged(&replaced).await;
                    }
                }
                _ => {
                    let text = field.text().await?;
                    self.fields.insert(name, text);
                }
            }
        }
        Ok(())
    }
}

/// Read a multipart body, staging file fields under `dir`
pub async fn stage_multipart(multipart: Multipart, dir: &Path) -> ApiResult<StagedForm> {
    tokio::fs::create_dir_all(dir).await?;

    let mut form = StagedForm::default();
    match form.read(multipart, dir).await {
        Ok(()) => Ok(form),
        Err(e) => {
            form.discard().await;
            Err(e)
        }
    }
}

/// Random file name keeping a plain alphanumeric extension
fn staged_file_name(original: &str) -> String {
    let id = uuid::Uuid::new_v4();
    match Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        Some(ext) => format!("{id}.{}", ext.to_ascii_lowercase()),
        None => id.to_string(),
    }
}
