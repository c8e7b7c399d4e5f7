use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::TextTypesError;
use crate::TextTypesResult;
use crate::collector::PatternSet;
use crate::collector::SourceFile;
use crate::collector::collect_with_patterns;
use crate::config::GenerationContext;
use crate::config::TextTypesConfig;
use crate::content::KeyCollision;
use crate::content::TextEntries;
use crate::content::read_entries;
use crate::generator::VirtualModuleSource;
use crate::generator::generate_declaration;
use crate::generator::generate_manifest;
use crate::generator::generate_module;
use crate::generator::generate_virtual_module;
use crate::keys::normalize_lexically;
use crate::keys::relative_path;
use crate::keys::to_slash;
use crate::writer::is_up_to_date;
use crate::writer::write_if_changed;

/// The host's module graph, used to refresh the virtual module after a
/// regeneration.
pub trait ModuleGraph {
	/// Handle to a loaded module.
	type Module;

	/// Look up a loaded module by its resolved id.
	fn get_module_by_id(&self, id: &str) -> Option<Self::Module>;

	/// Mark a module for re-evaluation.
	fn invalidate_module(&mut self, module: &Self::Module);

	/// Ask every consumer to reload from scratch.
	fn full_reload(&mut self);
}

/// A module graph for hosts that have none, such as the command line. No
/// module is ever loaded, so a change always requests a full reload, which is
/// a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedModuleGraph;

impl ModuleGraph for DetachedModuleGraph {
	type Module = ();

	fn get_module_by_id(&self, _id: &str) -> Option<Self::Module> {
		None
	}

	fn invalidate_module(&mut self, _module: &Self::Module) {}

	fn full_reload(&mut self) {
		tracing::debug!("full reload requested without a module graph");
	}
}

/// The kinds of artifact written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
	/// The static TypeScript module.
	Module,
	/// The ambient declaration file.
	Declaration,
	/// The JSON manifest.
	Manifest,
}

impl fmt::Display for ArtifactKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Module => "module",
			Self::Declaration => "declaration",
			Self::Manifest => "manifest",
		};
		f.write_str(name)
	}
}

/// A rendered artifact that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
	pub kind: ArtifactKind,
	pub path: PathBuf,
	pub content: String,
}

impl Artifact {
	/// Whether the file on disk already holds this content.
	pub fn is_up_to_date(&self) -> TextTypesResult<bool> {
		is_up_to_date(&self.path, &self.content)
	}
}

/// Everything produced by a generation run before anything is written.
#[derive(Debug, Clone)]
pub struct PreparedGeneration {
	pub files: Vec<SourceFile>,
	pub entries: TextEntries,
	pub collisions: Vec<KeyCollision>,
	pub artifacts: Vec<Artifact>,
}

/// The outcome of writing one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactWrite {
	pub kind: ArtifactKind,
	pub path: PathBuf,
	/// `false` when the file already held the generated content.
	pub changed: bool,
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
	pub files: Vec<SourceFile>,
	pub entries: TextEntries,
	pub collisions: Vec<KeyCollision>,
	pub artifacts: Vec<ArtifactWrite>,
}

impl GenerationReport {
	/// Returns true if at least one artifact was written.
	pub fn has_changes(&self) -> bool {
		self.artifacts.iter().any(|artifact| artifact.changed)
	}
}

/// What happened in response to a file change.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ChangeOutcome {
	/// The file is not matched by the configured patterns. Nothing ran.
	Ignored,
	/// Artifacts were regenerated. No virtual module is configured.
	Regenerated(GenerationReport),
	/// Artifacts were regenerated and the loaded virtual module was
	/// invalidated.
	Invalidated(GenerationReport),
	/// Artifacts were regenerated, the virtual module was not loaded yet and a
	/// full reload was requested.
	FullReload(GenerationReport),
}

impl ChangeOutcome {
	/// The generation report, unless the change was ignored.
	pub fn report(&self) -> Option<&GenerationReport> {
		match self {
			Self::Ignored => None,
			Self::Regenerated(report) | Self::Invalidated(report) | Self::FullReload(report) => {
				Some(report)
			}
		}
	}
}

/// The generation pipeline for one project.
///
/// Construct it once per project; the configuration is validated and the
/// change matcher compiled up front. Every method takes `&self`.
#[derive(Debug, Clone)]
pub struct TextTypes {
	context: GenerationContext,
	patterns: PatternSet,
}

impl TextTypes {
	/// Validate `config` against `root`.
	pub fn new(root: &Path, config: TextTypesConfig) -> TextTypesResult<Self> {
		let context = config.into_context(root)?;
		let patterns = PatternSet::new(&context.include, &context.exclude)?;

		Ok(Self { context, patterns })
	}

	/// Load the discovered config file at `root`.
	pub fn from_root(root: &Path) -> TextTypesResult<Self> {
		let Some(config) = TextTypesConfig::load(root)? else {
			return Err(TextTypesError::ConfigNotFound(root.to_path_buf()));
		};

		Self::new(root, config)
	}

	pub fn context(&self) -> &GenerationContext {
		&self.context
	}

	pub fn root(&self) -> &Path {
		&self.context.root
	}

	/// Collect the matched source files, sorted by canonical key.
	pub fn collect(&self) -> TextTypesResult<Vec<SourceFile>> {
		collect_with_patterns(
			&self.context.root,
			&self.patterns,
			self.context.strip_prefix.as_deref(),
		)
	}

	/// Collect, read and render every configured artifact without writing.
	pub fn prepare(&self) -> TextTypesResult<PreparedGeneration> {
		let files = self.collect()?;
		let (entries, collisions) = read_entries(&files)?;
		let options = &self.context.options;
		let mut artifacts = Vec::new();

		if let Some(path) = &self.context.output {
			artifacts.push(Artifact {
				kind: ArtifactKind::Module,
				path: path.clone(),
				content: generate_module(&entries, options)?,
			});
		}

		if let Some(path) = &self.context.dts {
			artifacts.push(Artifact {
				kind: ArtifactKind::Declaration,
				path: path.clone(),
				content: generate_declaration(self.context.declaration_module(), &entries, options)?,
			});
		}

		if let Some(path) = &self.context.manifest {
			artifacts.push(Artifact {
				kind: ArtifactKind::Manifest,
				path: path.clone(),
				content: generate_manifest(&entries, options)?,
			});
		}

		Ok(PreparedGeneration {
			files,
			entries,
			collisions,
			artifacts,
		})
	}

	/// Run the full pipeline and write every artifact whose content changed.
	pub fn run_generation(&self) -> TextTypesResult<GenerationReport> {
		let prepared = self.prepare()?;
		let mut artifacts = Vec::with_capacity(prepared.artifacts.len());

		for artifact in &prepared.artifacts {
			let changed = write_if_changed(&artifact.path, &artifact.content)?;
			artifacts.push(ArtifactWrite {
				kind: artifact.kind,
				path: artifact.path.clone(),
				changed,
			});
		}

		tracing::debug!(
			entries = prepared.entries.len(),
			written = artifacts.iter().filter(|a| a.changed).count(),
			"generation finished"
		);

		Ok(GenerationReport {
			files: prepared.files,
			entries: prepared.entries,
			collisions: prepared.collisions,
			artifacts,
		})
	}

	/// Generate once when the build starts.
	pub fn build_start(&self) -> TextTypesResult<GenerationReport> {
		self.run_generation()
	}

	/// Whether a change to `path` can affect the generated artifacts.
	/// Relative paths are resolved against the project root.
	pub fn is_relevant(&self, path: &Path) -> bool {
		let absolute = normalize_lexically(&self.context.root.join(path));
		let relative = to_slash(&relative_path(&self.context.root, &absolute));
		self.patterns.is_match(&relative)
	}

	/// React to a change of `path`.
	///
	/// Irrelevant paths are ignored without any I/O. Otherwise the whole
	/// matched set is regenerated and, when a virtual module is configured,
	/// the module graph is told to refresh it.
	pub fn handle_file_change<G: ModuleGraph>(
		&self,
		path: &Path,
		graph: &mut G,
	) -> TextTypesResult<ChangeOutcome> {
		if !self.is_relevant(path) {
			tracing::debug!(path = %path.display(), "ignoring unrelated change");
			return Ok(ChangeOutcome::Ignored);
		}

		let report = self.run_generation()?;

		let Some(module) = &self.context.virtual_module else {
			return Ok(ChangeOutcome::Regenerated(report));
		};

		match graph.get_module_by_id(&module.resolved_id) {
			Some(loaded) => {
				graph.invalidate_module(&loaded);
				Ok(ChangeOutcome::Invalidated(report))
			}
			None => {
				graph.full_reload();
				Ok(ChangeOutcome::FullReload(report))
			}
		}
	}

	/// Map the configured virtual module id to its resolved id.
	pub fn resolve_id(&self, id: &str) -> Option<&str> {
		self.context
			.virtual_module
			.as_ref()
			.filter(|module| module.id == id)
			.map(|module| module.resolved_id.as_str())
	}

	/// Return the virtual module source for its resolved id.
	pub fn load(&self, id: &str) -> TextTypesResult<Option<String>> {
		match &self.context.virtual_module {
			Some(module) if module.resolved_id == id => self.virtual_module_source().map(Some),
			_ => Ok(None),
		}
	}

	/// Synthesize the virtual module source.
	pub fn virtual_module_source(&self) -> TextTypesResult<String> {
		if self.context.virtual_module.is_none() {
			return Err(TextTypesError::VirtualModuleDisabled(
				crate::config::DEFAULT_VIRTUAL_ID.to_string(),
			));
		}

		let source = VirtualModuleSource {
			include: &self.context.include,
			exclude: &self.context.exclude,
			strip_prefix: self.context.strip_prefix.as_deref(),
		};

		generate_virtual_module(&source, &self.context.options)
	}
}
