use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

/// The keys derived for a single source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceKeys {
	/// Root-relative, forward-slash path with a leading `/`, e.g.
	/// `/src/content/intro.md`.
	pub canonical_key: String,
	/// The public key used in generated artifacts, e.g. `intro.md`.
	pub output_key: String,
}

/// Derive the canonical and output keys of `path` relative to `root`.
///
/// `strip_prefix` is removed verbatim from the start of the canonical key.
/// A prefix written without its leading slash (`src/content/`) is also
/// accepted. When no prefix applies, the output key is the canonical key
/// without its leading `/`.
pub fn derive_keys(root: &Path, path: &Path, strip_prefix: Option<&str>) -> SourceKeys {
	let canonical_key = canonical_key(root, path);
	let output_key = output_key(&canonical_key, strip_prefix).to_string();

	SourceKeys {
		canonical_key,
		output_key,
	}
}

/// Build the canonical key for `path`. Files outside `root` keep their `..`
/// segments, e.g. `/../shared/footer.md`.
pub fn canonical_key(root: &Path, path: &Path) -> String {
	format!("/{}", to_slash(&relative_path(root, path)))
}

/// Apply the prefix-stripping transform to a canonical key.
pub fn output_key<'a>(canonical_key: &'a str, strip_prefix: Option<&str>) -> &'a str {
	let unrooted = canonical_key.strip_prefix('/').unwrap_or(canonical_key);

	let Some(prefix) = strip_prefix else {
		return unrooted;
	};

	if let Some(stripped) = canonical_key.strip_prefix(prefix) {
		return stripped;
	}

	if !prefix.starts_with('/') {
		if let Some(stripped) = unrooted.strip_prefix(prefix) {
			return stripped;
		}
	}

	unrooted
}

/// Join path components with `/` regardless of the platform separator.
pub(crate) fn to_slash(path: &Path) -> String {
	path.components()
		.filter_map(|component| {
			match component {
				Component::Normal(part) => Some(part.to_string_lossy()),
				Component::ParentDir => Some("..".into()),
				Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
			}
		})
		.collect::<Vec<_>>()
		.join("/")
}

/// Compute `path` relative to `root` lexically, inserting `..` segments when
/// `path` lives outside of `root`.
pub(crate) fn relative_path(root: &Path, path: &Path) -> PathBuf {
	let root_components: Vec<Component<'_>> = normalized_components(root);
	let path_components: Vec<Component<'_>> = normalized_components(path);
	let shared = root_components
		.iter()
		.zip(&path_components)
		.take_while(|(a, b)| a == b)
		.count();

	let mut relative = PathBuf::new();
	for _ in shared..root_components.len() {
		relative.push("..");
	}
	for component in &path_components[shared..] {
		relative.push(component.as_os_str());
	}

	relative
}

/// Lexically fold `.` and `..` segments without touching the file system.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
	normalized_components(path)
		.into_iter()
		.map(Component::as_os_str)
		.collect()
}

/// Components with `.` removed and `..` folded into their parent.
fn normalized_components(path: &Path) -> Vec<Component<'_>> {
	let mut components = Vec::new();

	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				if matches!(components.last(), Some(Component::Normal(_))) {
					components.pop();
				} else {
					components.push(component);
				}
			}
			other => components.push(other),
		}
	}

	components
}
