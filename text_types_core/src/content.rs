use std::collections::HashMap;
use std::path::PathBuf;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Serialize;

use crate::TextTypesError;
use crate::TextTypesResult;
use crate::collector::SourceFile;

/// Normalize CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// A key and its normalized content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEntry {
	pub key: String,
	pub content: String,
}

impl TextEntry {
	pub fn new(key: impl Into<String>, content: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			content: content.into(),
		}
	}
}

/// Two source files that produced the same output key. The file collected
/// later (by canonical key) wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCollision {
	pub key: String,
	/// The file whose content was replaced.
	pub overridden: PathBuf,
	/// The file whose content is used.
	pub winner: PathBuf,
}

/// The ordered, key-unique entries of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct TextEntries(
	#[deref]
	#[deref_mut]
	Vec<TextEntry>,
);

impl TextEntries {
	/// Build entries from an ordered list, letting later duplicates replace
	/// earlier ones in place.
	pub fn from_ordered(entries: impl IntoIterator<Item = TextEntry>) -> Self {
		let mut positions: HashMap<String, usize> = HashMap::new();
		let mut unique: Vec<TextEntry> = Vec::new();

		for entry in entries {
			if let Some(&index) = positions.get(&entry.key) {
				unique[index] = entry;
			} else {
				positions.insert(entry.key.clone(), unique.len());
				unique.push(entry);
			}
		}

		Self(unique)
	}

	pub fn into_inner(self) -> Vec<TextEntry> {
		self.0
	}
}

impl From<Vec<TextEntry>> for TextEntries {
	fn from(entries: Vec<TextEntry>) -> Self {
		Self::from_ordered(entries)
	}
}

/// Read and normalize every collected file.
///
/// Every file is read before anything is returned, so a single unreadable
/// file fails the whole run.
pub fn read_entries(files: &[SourceFile]) -> TextTypesResult<(TextEntries, Vec<KeyCollision>)> {
	let mut owners: HashMap<&str, &SourceFile> = HashMap::new();
	let mut collisions = Vec::new();
	let mut entries = Vec::with_capacity(files.len());

	for file in files {
		let raw = std::fs::read_to_string(&file.path).map_err(|source| {
			TextTypesError::ReadSource {
				path: file.path.clone(),
				source,
			}
		})?;

		if let Some(previous) = owners.insert(file.output_key.as_str(), file) {
			tracing::warn!(
				key = %file.output_key,
				overridden = %previous.path.display(),
				winner = %file.path.display(),
				"duplicate output key"
			);
			collisions.push(KeyCollision {
				key: file.output_key.clone(),
				overridden: previous.path.clone(),
				winner: file.path.clone(),
			});
		}

		entries.push(TextEntry::new(
			file.output_key.clone(),
			normalize_line_endings(&raw),
		));
	}

	Ok((TextEntries::from_ordered(entries), collisions))
}
