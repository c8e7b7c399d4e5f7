use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum TextTypesError {
	#[error(transparent)]
	#[diagnostic(code(text_types::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to read source file `{path}`")]
	#[diagnostic(
		code(text_types::read_source),
		help("source files must be readable UTF-8 text")
	)]
	ReadSource {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to write generated artifact `{path}`")]
	#[diagnostic(code(text_types::write_artifact))]
	WriteArtifact {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(text_types::config_parse),
		help("check that text-types.toml is valid TOML and only uses known keys")
	)]
	ConfigParse(String),

	#[error("no config file found in `{0}`")]
	#[diagnostic(
		code(text_types::config_not_found),
		help("run `text-types init` to create a text-types.toml file")
	)]
	ConfigNotFound(PathBuf),

	#[error("no include patterns configured")]
	#[diagnostic(
		code(text_types::missing_include),
		help("set `include` to a glob such as \"src/content/**/*.md\"")
	)]
	MissingInclude,

	#[error("invalid pattern `{pattern}`: {reason}")]
	#[diagnostic(code(text_types::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("placeholder delimiters must not be empty")]
	#[diagnostic(
		code(text_types::empty_delimiter),
		help("use a non-empty pair such as [\"{{{{\", \"}}}}\"]")
	)]
	EmptyDelimiter,

	#[error("opening and closing placeholder delimiters are both `{0}`")]
	#[diagnostic(
		code(text_types::equal_delimiters),
		help("the opening and closing delimiters must differ")
	)]
	EqualDelimiters(String),

	#[error("non-eager loading is not supported for virtual module `{0}`")]
	#[diagnostic(
		code(text_types::unsupported_loading),
		help("remove `eager = false` from the [virtual] section")
	)]
	UnsupportedLoading(String),

	#[error("virtual module `{0}` is not configured")]
	#[diagnostic(
		code(text_types::virtual_module_disabled),
		help("add a [virtual] section with an `id` to text-types.toml")
	)]
	VirtualModuleDisabled(String),

	#[error("code template rendering failed: {0}")]
	#[diagnostic(code(text_types::template_render))]
	TemplateRender(String),
}

impl TextTypesError {
	/// Returns true for errors raised while validating configuration, before
	/// any file is read or written.
	pub fn is_configuration_error(&self) -> bool {
		matches!(
			self,
			Self::ConfigParse(_)
				| Self::ConfigNotFound(_)
				| Self::MissingInclude
				| Self::InvalidPattern { .. }
				| Self::EmptyDelimiter
				| Self::EqualDelimiters(_)
				| Self::UnsupportedLoading(_)
				| Self::VirtualModuleDisabled(_)
		)
	}
}

impl From<minijinja::Error> for TextTypesError {
	fn from(error: minijinja::Error) -> Self {
		Self::TemplateRender(error.to_string())
	}
}

pub type TextTypesResult<T> = Result<T, TextTypesError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
