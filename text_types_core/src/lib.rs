//! `text_types_core` is the core library of text-types, a build-time content
//! compiler. It collects plain text files matched by glob patterns and
//! generates a TypeScript module whose `texts` constant carries each file's
//! content as a string literal type, together with a `getText` helper that
//! fills `{{ placeholder }}` slots at runtime.
//!
//! ## Processing Pipeline
//!
//! ```text
//! text-types.toml
//!   → Config (validates patterns, delimiters and the virtual module)
//!   → Collector (walks the pattern base directories, derives keys)
//!   → Content (reads files, normalizes line endings, resolves key collisions)
//!   → Generator (renders the module, declaration and manifest templates)
//!   → Writer (writes each artifact only when its content changed)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `text-types.toml` and validation
//!   into a [`GenerationContext`].
//! - [`collector`]: Glob matching and directory walking.
//! - [`keys`]: Canonical and output key derivation.
//! - [`placeholder`]: Placeholder scanning, name extraction and
//!   substitution.
//! - [`generator`]: Code generation for every artifact kind.
//!
//! ## Key Types
//!
//! - [`TextTypes`]: The pipeline for one project: initial generation, file
//!   change handling and virtual module loading.
//! - [`TextTypesConfig`]: Configuration loaded from `text-types.toml`.
//! - [`TextEntry`]: One key with its normalized content.
//! - [`GenerationReport`]: What a generation run read and wrote.
//! - [`ModuleGraph`]: The host seam used to refresh the virtual module.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use text_types_core::TextTypes;
//!
//! let pipeline = TextTypes::from_root(Path::new(".")).unwrap();
//! let report = pipeline.build_start().unwrap();
//!
//! for artifact in &report.artifacts {
//!     println!("{} {}", artifact.kind, artifact.path.display());
//! }
//! ```

pub use collector::*;
pub use config::*;
pub use content::*;
pub use error::*;
pub use generator::*;
pub use keys::*;
pub use orchestrator::*;
pub use placeholder::*;
pub use writer::*;

pub mod collector;
pub mod config;
mod content;
#[allow(unused_assignments)]
mod error;
pub mod generator;
pub mod keys;
mod orchestrator;
pub mod placeholder;
mod writer;
