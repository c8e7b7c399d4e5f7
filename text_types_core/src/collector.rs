use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::Path;
use std::path::PathBuf;

use globset::GlobBuilder;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::WalkBuilder;
use serde::Serialize;

use crate::TextTypesError;
use crate::TextTypesResult;
use crate::keys::SourceKeys;
use crate::keys::derive_keys;
use crate::keys::normalize_lexically;
use crate::keys::relative_path;
use crate::keys::to_slash;

/// Characters that start a glob construct. A path segment containing any of
/// them ends the literal base directory of a pattern.
const GLOB_META_CHARS: [char; 5] = ['*', '?', '[', '{', '\\'];

/// A source file matched by the include patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
	/// Absolute path to the file.
	pub path: PathBuf,
	/// Root-relative key with a leading `/`.
	pub canonical_key: String,
	/// Key used in the generated artifacts.
	pub output_key: String,
}

impl SourceFile {
	fn new(path: PathBuf, keys: SourceKeys) -> Self {
		Self {
			path,
			canonical_key: keys.canonical_key,
			output_key: keys.output_key,
		}
	}
}

/// Compiled include and exclude globs.
///
/// Patterns are matched against root-relative, forward-slash paths. A
/// leading `/` on a pattern is stripped so `/src/*.md` and `src/*.md` are
/// equivalent, as are `./src/*.md` and `src/*.md`. `*` never crosses a `/`;
/// use `**` for that.
#[derive(Debug, Clone)]
pub struct PatternSet {
	include: GlobSet,
	exclude: GlobSet,
	/// Include pattern segments written with a leading `.`, e.g. `.intro.md`
	/// or `.*`. Only hidden entries matching one of them are walked.
	dot_segments: GlobSet,
	bases: Vec<PathBuf>,
}

impl PatternSet {
	pub fn new(include: &[String], exclude: &[String]) -> TextTypesResult<Self> {
		let include_patterns: Vec<&str> = normalize_patterns(include).collect();
		let exclude_patterns: Vec<&str> = normalize_patterns(exclude).collect();

		let mut bases: Vec<PathBuf> = include_patterns
			.iter()
			.map(|pattern| base_directory(pattern))
			.collect();
		bases.sort();
		bases.dedup();

		let dot_segments: Vec<&str> = include_patterns
			.iter()
			.flat_map(|pattern| pattern.split('/'))
			.filter(|segment| segment.starts_with('.') && !matches!(*segment, "." | ".."))
			.collect();

		Ok(Self {
			include: build_glob_set(&include_patterns)?,
			exclude: build_glob_set(&exclude_patterns)?,
			dot_segments: build_glob_set(&dot_segments)?,
			bases,
		})
	}

	/// Check whether a hidden file or directory name is written out by one
	/// of the include patterns.
	pub fn names_hidden(&self, name: &OsStr) -> bool {
		self.dot_segments.is_match(name)
	}

	/// Check whether a root-relative, forward-slash path is selected by the
	/// include patterns and not removed by the exclude patterns.
	pub fn is_match(&self, relative_path: &str) -> bool {
		let relative_path = relative_path.strip_prefix('/').unwrap_or(relative_path);
		self.include.is_match(relative_path) && !self.exclude.is_match(relative_path)
	}

	/// The literal directories (relative to the root) that can contain
	/// matches. Walking starts here instead of at the root.
	pub fn base_directories(&self) -> &[PathBuf] {
		&self.bases
	}
}

/// Strip the conventional leading `/` or `./` and drop blank patterns.
pub fn normalize_patterns(patterns: &[String]) -> impl Iterator<Item = &str> {
	patterns
		.iter()
		.map(|pattern| strip_leading_root(pattern.trim()))
		.filter(|pattern| !pattern.is_empty())
}

fn strip_leading_root(mut pattern: &str) -> &str {
	pattern = pattern.strip_prefix('/').unwrap_or(pattern);
	while let Some(rest) = pattern.strip_prefix("./") {
		pattern = rest.trim_start_matches('/');
	}
	pattern
}

fn build_glob_set(patterns: &[&str]) -> TextTypesResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = GlobBuilder::new(pattern)
			.literal_separator(true)
			.build()
			.map_err(|e| {
				TextTypesError::InvalidPattern {
					pattern: (*pattern).to_string(),
					reason: e.kind().to_string(),
				}
			})?;
		builder.add(glob);
	}

	builder.build().map_err(|e| {
		TextTypesError::InvalidPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

/// The leading segments of `pattern` that contain no glob syntax, excluding
/// the final segment.
fn base_directory(pattern: &str) -> PathBuf {
	let segments: Vec<&str> = pattern.split('/').collect();
	let Some((_, directories)) = segments.split_last() else {
		return PathBuf::new();
	};

	directories
		.iter()
		.take_while(|segment| !segment.contains(GLOB_META_CHARS))
		.filter(|segment| !segment.is_empty())
		.collect()
}

/// Collect every file under `root` matched by `include` and not by `exclude`,
/// sorted by canonical key.
///
/// Hidden files and directories are skipped unless an include pattern spells
/// out their leading `.`, as in `src/.drafts/*.md` or `src/.*.md`. `.gitignore` rules are not consulted.
pub fn collect_files(
	root: &Path,
	include: &[String],
	exclude: &[String],
	strip_prefix: Option<&str>,
) -> TextTypesResult<Vec<SourceFile>> {
	let patterns = PatternSet::new(include, exclude)?;
	collect_with_patterns(root, &patterns, strip_prefix)
}

/// Collect files with an already compiled [`PatternSet`].
pub fn collect_with_patterns(
	root: &Path,
	patterns: &PatternSet,
	strip_prefix: Option<&str>,
) -> TextTypesResult<Vec<SourceFile>> {
	// A missing root is an error; a missing base directory only means there
	// are no matches.
	std::fs::metadata(root)?;

	let root = normalize_lexically(&std::path::absolute(root)?);
	let mut paths = BTreeSet::new();

	for base in patterns.base_directories() {
		let base = normalize_lexically(&root.join(base));
		if !base.is_dir() {
			tracing::debug!(base = %base.display(), "skipping missing base directory");
			continue;
		}

		walk_base(&root, &base, patterns, &mut paths)?;
	}

	let mut files: Vec<SourceFile> = paths
		.into_iter()
		.map(|path| {
			let keys = derive_keys(&root, &path, strip_prefix);
			SourceFile::new(path, keys)
		})
		.collect();
	files.sort_by(|a, b| a.canonical_key.cmp(&b.canonical_key));

	Ok(files)
}

fn walk_base(
	root: &Path,
	base: &Path,
	patterns: &PatternSet,
	paths: &mut BTreeSet<PathBuf>,
) -> TextTypesResult<()> {
	let visible = patterns.clone();
	let walker = WalkBuilder::new(base)
		.standard_filters(false)
		.follow_links(false)
		.filter_entry(move |entry| {
			let name = entry.file_name();
			!name.as_encoded_bytes().starts_with(b".") || visible.names_hidden(name)
		})
		.build();

	for result in walker {
		let entry = result.map_err(walk_error)?;
		if !entry.file_type().is_some_and(|kind| kind.is_file()) {
			continue;
		}

		let path = normalize_lexically(entry.path());
		let relative = to_slash(&relative_path(root, &path));
		if patterns.is_match(&relative) {
			tracing::debug!(file = %relative, "matched source file");
			paths.insert(path);
		}
	}

	Ok(())
}

fn walk_error(error: ignore::Error) -> TextTypesError {
	let message = error.to_string();
	let io_error = error
		.into_io_error()
		.unwrap_or_else(|| std::io::Error::other(message));
	TextTypesError::Io(io_error)
}
