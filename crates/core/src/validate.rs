use crate::entry::{MAX_UPLOAD_BYTES, UploadRequest};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("missing required field: {field}")]
    MissingField { field: String },
    #[error("folder name must not contain a path separator: {name}")]
    SeparatorInName { name: String },
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("file content may contain sensitive values ({reason}); upload refused")]
    SensitiveContent { reason: String },
}

/// A check run against every upload before it reaches the remote store.
pub trait UploadValidator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn validate(&self, upload: &UploadRequest) -> Result<(), ValidationError>;
}

/// Run validators in order, stopping at the first rejection.
pub fn run_validators(
    validators: &[Box<dyn UploadValidator>],
    upload: &UploadRequest,
) -> Result<(), ValidationError> {
    validators.iter().try_for_each(|v| v.validate(upload))
}

pub fn check_payload_size(size: usize) -> Result<(), ValidationError> {
    if size > MAX_UPLOAD_BYTES {
        Err(ValidationError::PayloadTooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        })
    } else {
        Ok(())
    }
}

/// Folder names are a single path segment.
pub fn validate_folder_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: "folderName".to_string(),
        });
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ValidationError::SeparatorInName {
            name: name.to_string(),
        });
    }
    Ok(())
}

pub fn require_field<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError::MissingField {
            field: field.to_string(),
        })
}
