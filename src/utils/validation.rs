use crate::error::ValidationError;
use crate::models::{UploadCandidate, ValidatedCandidate};
use mime::Mime;
use validator::Validate;

/// Maximum upload size: 10 MiB
pub const MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// Recognized CSV media types
pub const CSV_MIME_TYPES: &[&str] = &["text/csv", "application/csv"];

/// Maximum resource name length accepted by the data service
pub const MAX_RESOURCE_NAME_LEN: usize = 100;

/// Normalizes a declared content type to its essence (`text/csv; charset=utf-8`
/// becomes `text/csv`). Unparseable types normalize to an empty string.
fn mime_essence(content_type: &str) -> String {
    content_type
        .parse::<Mime>()
        .map(|m| m.essence_str().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Validates file metadata before any network traffic.
///
/// Rules are applied in order and the first failure wins:
/// 1. the declared content type is a recognized CSV media type, or the file
///    name ends with `.csv` (case-insensitive);
/// 2. the declared size does not exceed [`MAX_UPLOAD_SIZE`];
/// 3. file name and content type are non-empty.
///
/// Pure and deterministic; no I/O.
pub fn validate(candidate: &UploadCandidate) -> Result<ValidatedCandidate, ValidationError> {
    validate_with_limit(candidate, MAX_UPLOAD_SIZE)
}

/// Same as [`validate`] with a caller-supplied size limit.
pub fn validate_with_limit(
    candidate: &UploadCandidate,
    max_bytes: u64,
) -> Result<ValidatedCandidate, ValidationError> {
    let essence = mime_essence(&candidate.declared_content_type);
    let csv_mime = CSV_MIME_TYPES.contains(&essence.as_str());
    let csv_extension = candidate.file_name.to_lowercase().ends_with(".csv");
    if !csv_mime && !csv_extension {
        return Err(ValidationError::InvalidFileType);
    }

    if candidate.size_bytes > max_bytes {
        return Err(ValidationError::FileTooLarge {
            size_bytes: candidate.size_bytes,
            max_bytes,
        });
    }

    if candidate.file_name.is_empty() {
        return Err(ValidationError::MissingField("fileName"));
    }
    if candidate.declared_content_type.is_empty() {
        return Err(ValidationError::MissingField("contentType"));
    }

    Ok(ValidatedCandidate::new(candidate.clone()))
}

#[derive(Debug, Validate)]
struct ResourceNameInput<'a> {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    name: &'a str,
}

/// Validates a user-supplied resource name before a create request is issued.
pub fn validate_resource_name(name: &str) -> Result<(), ValidationError> {
    ResourceNameInput { name }
        .validate()
        .map_err(|e| ValidationError::InvalidResourceName(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, content_type: &str, size: u64) -> UploadCandidate {
        UploadCandidate {
            file_name: name.to_string(),
            declared_content_type: content_type.to_string(),
            size_bytes: size,
        }
    }

    #[test]
    fn accepts_csv_by_mime_type() {
        assert!(validate(&candidate("data.csv", "text/csv", 500 * 1024)).is_ok());
        assert!(validate(&candidate("export", "application/csv", 1024)).is_ok());
        assert!(validate(&candidate("data.csv", "text/csv; charset=utf-8", 1024)).is_ok());
    }

    #[test]
    fn accepts_csv_by_extension() {
        assert!(validate(&candidate("DATA.CSV", "application/octet-stream", 1024)).is_ok());
    }

    #[test]
    fn rejects_non_csv_files() {
        assert_eq!(
            validate(&candidate("image.png", "image/png", 1024)),
            Err(ValidationError::InvalidFileType)
        );
    }

    #[test]
    fn rejects_oversized_files() {
        let size = 11 * 1024 * 1024;
        assert_eq!(
            validate(&candidate("big.csv", "text/csv", size)),
            Err(ValidationError::FileTooLarge {
                size_bytes: size,
                max_bytes: MAX_UPLOAD_SIZE,
            })
        );
        // The boundary itself is fine.
        assert!(validate(&candidate("edge.csv", "text/csv", MAX_UPLOAD_SIZE)).is_ok());
    }

    #[test]
    fn rejects_empty_fields() {
        assert_eq!(
            validate(&candidate("", "text/csv", 1024)),
            Err(ValidationError::MissingField("fileName"))
        );
        assert_eq!(
            validate(&candidate("data.csv", "", 1024)),
            Err(ValidationError::MissingField("contentType"))
        );
    }

    #[test]
    fn file_type_rule_wins_over_later_rules() {
        // An oversized non-CSV file reports the type failure, not the size.
        assert_eq!(
            validate(&candidate("huge.png", "image/png", 100 * 1024 * 1024)),
            Err(ValidationError::InvalidFileType)
        );
    }

    #[test]
    fn resource_name_length_is_bounded() {
        assert!(validate_resource_name("data.csv").is_ok());
        assert!(validate_resource_name(&"x".repeat(MAX_RESOURCE_NAME_LEN)).is_ok());
        assert!(validate_resource_name("").is_err());
        assert!(validate_resource_name(&"x".repeat(MAX_RESOURCE_NAME_LEN + 1)).is_err());
    }
}
