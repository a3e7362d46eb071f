use crate::error::{PipelineError, Result};
use crate::model::FileCandidate;

/// Largest accepted upload: 20 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Check a candidate file against the format/size policy before any network
/// call is made.
///
/// Pure function of the file's declared metadata; the payload is never
/// parsed. Rules are evaluated in order and the first failure wins.
pub fn validate(file: &FileCandidate) -> Result<()> {
    if file.name.trim().is_empty() || file.bytes.is_empty() {
        return Err(PipelineError::validation("missing", "Invalid file"));
    }

    if file.size_bytes() > MAX_UPLOAD_BYTES {
        return Err(PipelineError::validation(
            "size",
            "File size must be less than 20 MB",
        ));
    }

    if !file.content_type.starts_with("application/pdf") {
        return Err(PipelineError::validation("type", "File must be a PDF"));
    }

    Ok(())
}
