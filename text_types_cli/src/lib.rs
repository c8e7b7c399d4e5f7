use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Compile text files into a typed TypeScript module.",
	long_about = "text-types collects plain text files matched by glob patterns and generates a \
	              TypeScript module whose `texts` constant carries each file's content as a \
	              string literal type. A `getText` helper fills `{{ placeholder }}` slots at \
	              runtime.\n\nQuick start:\n  text-types init      Create a text-types.toml \
	              file\n  text-types generate  Write the generated module\n  text-types check     \
	              Verify the generated files are up to date\n  text-types list      Show every \
	              collected text"
)]
pub struct TextTypesCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Path to the config file. Defaults to the first of `text-types.toml`,
	/// `.text-types.toml` and `.config/text-types.toml` in the project root.
	#[arg(long, short, global = true)]
	pub config: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize text-types in a project.
	///
	/// Creates a `text-types.toml` file and a sample `src/content/hello.md`
	/// text. Existing files are left untouched.
	Init,
	/// Generate the typed module and any other configured artifacts.
	///
	/// Collects every text matched by the configured patterns and writes the
	/// static module, declaration file and manifest. Files whose content would
	/// not change are not rewritten.
	Generate {
		/// Watch the project for changes and regenerate whenever a matched
		/// text file is created, modified or removed.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Check that the generated artifacts are up to date.
	///
	/// Generates every artifact in memory and compares it with the file on
	/// disk without writing anything. Exits with status 1 when an artifact is
	/// missing or stale, which makes it suitable for CI pipelines.
	Check {
		/// Show a line diff for each stale artifact.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Output format for check results.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// List every collected text with its key, source file and placeholders.
	List {
		/// Output format for the listing.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Print a text with its placeholders filled in.
	///
	/// Placeholders without a matching `--arg` are printed unchanged.
	Render {
		/// The output key of the text, e.g. `hello.md`.
		key: String,

		/// A placeholder value written as `name=value`. May be repeated.
		#[arg(long = "arg", short, value_parser = parse_arg)]
		args: Vec<(String, String)>,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}

/// Parse a `name=value` placeholder argument. The value may be empty or
/// contain further `=` characters.
pub fn parse_arg(value: &str) -> Result<(String, String), String> {
	let Some((name, value)) = value.split_once('=') else {
		return Err(format!("expected `name=value`, found `{value}`"));
	};

	let name = name.trim();
	if name.is_empty() {
		return Err("placeholder name must not be empty".to_string());
	}

	Ok((name.to_string(), value.to_string()))
}
