use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::TextTypesError;
use crate::TextTypesResult;
use crate::collector::PatternSet;

/// Default location of the generated static module, relative to the root.
pub const DEFAULT_OUTPUT: &str = "src/@generated/text-types/index.ts";

/// Default location of the declaration file when `dts = true`.
pub const DEFAULT_DTS: &str = "src/@generated/text-types/texts.d.ts";

/// Default location of the JSON manifest when `manifest = true`.
pub const DEFAULT_MANIFEST: &str = "src/@generated/text-types/texts.json";

/// Content longer than this many UTF-16 code units is typed as `string`.
pub const DEFAULT_MAX_LITERAL_LENGTH: usize = 50_000;

/// Module name used for the ambient declaration when no virtual module is
/// configured.
pub const DEFAULT_DECLARATION_MODULE: &str = "text-types";

/// Default identifier of the virtual module.
pub const DEFAULT_VIRTUAL_ID: &str = "virtual:text-types";

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"text-types.toml",
	".text-types.toml",
	".config/text-types.toml",
];

/// One glob pattern or a list of them.
///
/// ```toml
/// include = "src/content/*.md"
/// exclude = ["src/content/drafts/**", "**/*.skip.md"]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Eq, PartialEq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum PatternList {
	One(String),
	Many(Vec<String>),
}

impl PatternList {
	/// The configured patterns as a slice.
	pub fn as_slice(&self) -> &[String] {
		match self {
			Self::One(pattern) => std::slice::from_ref(pattern),
			Self::Many(patterns) => patterns.as_slice(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.as_slice().iter().all(|pattern| pattern.trim().is_empty())
	}
}

impl Default for PatternList {
	fn default() -> Self {
		Self::Many(Vec::new())
	}
}

impl From<&str> for PatternList {
	fn from(pattern: &str) -> Self {
		Self::One(pattern.to_string())
	}
}

impl From<String> for PatternList {
	fn from(pattern: String) -> Self {
		Self::One(pattern)
	}
}

impl From<Vec<String>> for PatternList {
	fn from(patterns: Vec<String>) -> Self {
		Self::Many(patterns)
	}
}

impl<const N: usize> From<[&str; N]> for PatternList {
	fn from(patterns: [&str; N]) -> Self {
		Self::Many(patterns.iter().map(ToString::to_string).collect())
	}
}

/// An artifact path, or a boolean switch.
///
/// - `false` disables the artifact.
/// - `true` enables it at its default location.
/// - A path enables it at that location (relative to the project root).
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum OutputTarget {
	Toggle(bool),
	Path(PathBuf),
}

impl OutputTarget {
	/// Returns the relative path of the artifact, or `None` when disabled.
	pub fn resolve<'a>(&'a self, default: &'static str) -> Option<&'a Path> {
		match self {
			Self::Toggle(false) => None,
			Self::Toggle(true) => Some(Path::new(default)),
			Self::Path(path) => Some(path.as_path()),
		}
	}
}

impl Default for OutputTarget {
	fn default() -> Self {
		Self::Toggle(false)
	}
}

impl From<&str> for OutputTarget {
	fn from(path: &str) -> Self {
		Self::Path(PathBuf::from(path))
	}
}

/// The opening and closing text of a placeholder, `["{{", "}}"]` by default.
#[derive(Debug, Clone, Deserialize, Serialize, Eq, PartialEq, Hash)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Delimiters {
	pub open: String,
	pub close: String,
}

impl Delimiters {
	pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
		Self {
			open: open.into(),
			close: close.into(),
		}
	}

	/// Reject empty or identical delimiters.
	pub fn validate(&self) -> TextTypesResult<()> {
		if self.open.is_empty() || self.close.is_empty() {
			return Err(TextTypesError::EmptyDelimiter);
		}

		if self.open == self.close {
			return Err(TextTypesError::EqualDelimiters(self.open.clone()));
		}

		Ok(())
	}
}

impl Default for Delimiters {
	fn default() -> Self {
		Self::new("{{", "}}")
	}
}

impl From<(String, String)> for Delimiters {
	fn from((open, close): (String, String)) -> Self {
		Self { open, close }
	}
}

impl From<Delimiters> for (String, String) {
	fn from(delimiters: Delimiters) -> Self {
		(delimiters.open, delimiters.close)
	}
}

/// Transforms applied to generated keys.
#[derive(Debug, Clone, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct KeyTransformConfig {
	/// Strip this prefix from the root-relative key, e.g. `/src/content/`
	/// turns `/src/content/intro.md` into `intro.md`.
	#[serde(default)]
	pub strip_prefix: Option<String>,
}

/// Virtual module configuration.
///
/// ```toml
/// [virtual]
/// id = "virtual:text-types"
/// ```
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VirtualModuleConfig {
	#[serde(default = "default_virtual_id")]
	pub id: String,
	/// Only eager loading is supported. `false` is rejected during
	/// validation.
	#[serde(default = "default_eager")]
	pub eager: bool,
}

impl Default for VirtualModuleConfig {
	fn default() -> Self {
		Self {
			id: default_virtual_id(),
			eager: true,
		}
	}
}

fn default_virtual_id() -> String {
	DEFAULT_VIRTUAL_ID.to_string()
}

fn default_eager() -> bool {
	true
}

fn default_output() -> OutputTarget {
	OutputTarget::Path(PathBuf::from(DEFAULT_OUTPUT))
}

fn default_max_literal_length() -> usize {
	DEFAULT_MAX_LITERAL_LENGTH
}

/// Configuration loaded from a `text-types.toml` file.
///
/// ```toml
/// include = "src/content/**/*.{md,txt}"
/// exclude = ["src/content/drafts/**"]
/// output = "src/@generated/text-types/index.ts"
/// dts = false
/// manifest = false
/// max_literal_length = 50000
/// delimiters = ["{{", "}}"]
///
/// [key_transform]
/// strip_prefix = "/src/content/"
///
/// [virtual]
/// id = "virtual:text-types"
/// ```
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TextTypesConfig {
	/// Globs of source text files, relative to the project root.
	#[serde(default)]
	pub include: PatternList,
	/// Globs subtracted from the include set.
	#[serde(default)]
	pub exclude: PatternList,
	/// The generated static module. Defaults to [`DEFAULT_OUTPUT`].
	#[serde(default = "default_output")]
	pub output: OutputTarget,
	/// The generated ambient declaration file. Disabled by default.
	#[serde(default)]
	pub dts: OutputTarget,
	/// The generated JSON manifest of keys and placeholder names. Disabled by
	/// default.
	#[serde(default)]
	pub manifest: OutputTarget,
	#[serde(default)]
	pub key_transform: KeyTransformConfig,
	/// Content longer than this falls back to the `string` type.
	#[serde(default = "default_max_literal_length")]
	pub max_literal_length: usize,
	#[serde(default)]
	pub delimiters: Delimiters,
	/// When present, a virtual module is served instead of (or alongside) the
	/// static module.
	#[serde(default, rename = "virtual")]
	pub virtual_module: Option<VirtualModuleConfig>,
}

impl TextTypesConfig {
	/// A config with the given include patterns and every other value at its
	/// default.
	pub fn new(include: impl Into<PatternList>) -> Self {
		Self {
			include: include.into(),
			exclude: PatternList::default(),
			output: default_output(),
			dts: OutputTarget::default(),
			manifest: OutputTarget::default(),
			key_transform: KeyTransformConfig::default(),
			max_literal_length: DEFAULT_MAX_LITERAL_LENGTH,
			delimiters: Delimiters::default(),
			virtual_module: None,
		}
	}

	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> TextTypesResult<Option<TextTypesConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_from(&config_path).map(Some)
	}

	/// Load the config from an explicit file path.
	pub fn load_from(path: &Path) -> TextTypesResult<TextTypesConfig> {
		let content = std::fs::read_to_string(path)?;
		Self::parse(&content)
	}

	/// Parse config file contents.
	pub fn parse(content: &str) -> TextTypesResult<TextTypesConfig> {
		toml::from_str(content).map_err(|e| TextTypesError::ConfigParse(e.to_string()))
	}

	/// Validate the config and resolve every path against `root`.
	///
	/// All configuration errors are raised here, before any file is read.
	pub fn into_context(self, root: &Path) -> TextTypesResult<GenerationContext> {
		if self.include.is_empty() {
			return Err(TextTypesError::MissingInclude);
		}

		self.delimiters.validate()?;

		let virtual_module = match self.virtual_module {
			Some(config) if !config.eager => {
				return Err(TextTypesError::UnsupportedLoading(config.id));
			}
			Some(config) => Some(VirtualModule::new(config.id)),
			None => None,
		};

		let include = self.include.as_slice().to_vec();
		let exclude = self.exclude.as_slice().to_vec();
		// Compile once so invalid patterns surface as configuration errors.
		PatternSet::new(&include, &exclude)?;

		let root = std::path::absolute(root)?;
		let output = self.output.resolve(DEFAULT_OUTPUT).map(|p| root.join(p));
		let dts = self.dts.resolve(DEFAULT_DTS).map(|p| root.join(p));
		let manifest = self.manifest.resolve(DEFAULT_MANIFEST).map(|p| root.join(p));

		Ok(GenerationContext {
			root,
			include,
			exclude,
			strip_prefix: self.key_transform.strip_prefix,
			options: GenerationOptions {
				max_literal_length: self.max_literal_length,
				delimiters: self.delimiters,
			},
			output,
			dts,
			manifest,
			virtual_module,
		})
	}
}

/// Options shared by every artifact of a generation run.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GenerationOptions {
	pub max_literal_length: usize,
	pub delimiters: Delimiters,
}

impl Default for GenerationOptions {
	fn default() -> Self {
		Self {
			max_literal_length: DEFAULT_MAX_LITERAL_LENGTH,
			delimiters: Delimiters::default(),
		}
	}
}

/// A configured virtual module.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VirtualModule {
	/// The id consumers import, e.g. `virtual:text-types`.
	pub id: String,
	/// The id after host resolution. The `\0` prefix keeps other plugins from
	/// trying to load it from disk.
	pub resolved_id: String,
}

impl VirtualModule {
	pub fn new(id: impl Into<String>) -> Self {
		let id = id.into();
		let resolved_id = format!("\0{id}");
		Self { id, resolved_id }
	}
}

/// A validated configuration with absolute paths, ready for generation.
#[derive(Debug, Clone)]
pub struct GenerationContext {
	/// Absolute project root.
	pub root: PathBuf,
	pub include: Vec<String>,
	pub exclude: Vec<String>,
	pub strip_prefix: Option<String>,
	pub options: GenerationOptions,
	/// Absolute path of the static module, if enabled.
	pub output: Option<PathBuf>,
	/// Absolute path of the declaration file, if enabled.
	pub dts: Option<PathBuf>,
	/// Absolute path of the JSON manifest, if enabled.
	pub manifest: Option<PathBuf>,
	pub virtual_module: Option<VirtualModule>,
}

impl GenerationContext {
	/// The module name used in the ambient declaration.
	pub fn declaration_module(&self) -> &str {
		self.virtual_module
			.as_ref()
			.map_or(DEFAULT_DECLARATION_MODULE, |module| module.id.as_str())
	}
}
