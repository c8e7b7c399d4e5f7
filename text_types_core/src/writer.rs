use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::TextTypesError;
use crate::TextTypesResult;

/// Check whether the file at `path` already holds exactly `content`.
pub fn is_up_to_date(path: &Path, content: &str) -> TextTypesResult<bool> {
	match std::fs::read(path) {
		Ok(existing) => Ok(existing == content.as_bytes()),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
		Err(source) => {
			Err(TextTypesError::WriteArtifact {
				path: path.to_path_buf(),
				source,
			})
		}
	}
}

/// Write `content` to `path` unless the file already holds exactly that
/// content. Returns `true` when the file was written.
///
/// Missing parent directories are created. The content is written to a
/// sibling temporary file and renamed into place, so readers never observe a
/// partially written artifact.
pub fn write_if_changed(path: &Path, content: &str) -> TextTypesResult<bool> {
	if is_up_to_date(path, content)? {
		tracing::debug!(path = %path.display(), "artifact unchanged");
		return Ok(false);
	}

	let to_write_error = |source: std::io::Error| {
		TextTypesError::WriteArtifact {
			path: path.to_path_buf(),
			source,
		}
	};

	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).map_err(to_write_error)?;
	}

	let temp_path = path.with_extension(format!(
		"tmp-{}-{}",
		std::process::id(),
		std::time::SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_or(0, |duration| duration.as_nanos())
	));

	std::fs::write(&temp_path, content).map_err(to_write_error)?;

	if let Err(source) = std::fs::rename(&temp_path, path) {
		let _ = std::fs::remove_file(&temp_path);
		return Err(to_write_error(source));
	}

	tracing::info!(path = %path.display(), "wrote artifact");
	Ok(true)
}
