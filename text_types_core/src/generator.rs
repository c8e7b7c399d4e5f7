use minijinja::AutoEscape;
use minijinja::Environment;
use minijinja::UndefinedBehavior;
use minijinja::context;
use serde::Serialize;

use crate::TextTypesResult;
use crate::collector::normalize_patterns;
use crate::config::Delimiters;
use crate::config::GenerationOptions;
use crate::content::TextEntry;
use crate::placeholder::extract_variable_names;

/// First line of every generated artifact.
pub const GENERATED_HEADER: &str = "// This file is generated by text-types. Do not edit it by hand.";

const STATIC_MODULE_TEMPLATE: &str = "static_module";
const DECLARATION_TEMPLATE: &str = "declaration";
const VIRTUAL_MODULE_TEMPLATE: &str = "virtual_module";

/// Quote `value` as a double-quoted JavaScript / TypeScript string literal.
///
/// Quotes, backslashes, newlines and other control characters are escaped,
/// as are U+2028 and U+2029. Every string slot in every code template goes
/// through this function.
pub fn string_literal(value: &str) -> String {
	let literal = serde_json::Value::from(value).to_string();

	if literal.contains(['\u{2028}', '\u{2029}']) {
		literal
			.replace('\u{2028}', "\\u2028")
			.replace('\u{2029}', "\\u2029")
	} else {
		literal
	}
}

/// Escape `value` for use inside a JavaScript regular expression literal.
pub fn escape_regex(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len() * 2);

	for c in value.chars() {
		match c {
			'\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
			| '/' | '-' => {
				escaped.push('\\');
				escaped.push(c);
			}
			'\n' => escaped.push_str("\\n"),
			'\r' => escaped.push_str("\\r"),
			'\t' => escaped.push_str("\\t"),
			'\u{2028}' => escaped.push_str("\\u2028"),
			'\u{2029}' => escaped.push_str("\\u2029"),
			other => escaped.push(other),
		}
	}

	escaped
}

/// The global regular expression literal matching a placeholder, e.g.
/// `/\{\{(.+?)\}\}/g`.
pub fn placeholder_pattern(delimiters: &Delimiters) -> String {
	format!(
		"/{}(.+?){}/g",
		escape_regex(&delimiters.open),
		escape_regex(&delimiters.close)
	)
}

/// Length of `content` in UTF-16 code units, the unit used by the consuming
/// type checker.
pub fn content_length(content: &str) -> usize {
	content.encode_utf16().count()
}

/// Whether `content` is short enough to be typed as a string literal. The
/// boundary is inclusive.
pub fn is_literal(content: &str, max_literal_length: usize) -> bool {
	content_length(content) <= max_literal_length
}

/// One entry as it appears in the generated artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactEntry {
	pub key: String,
	/// The quoted key.
	pub key_literal: String,
	/// The quoted content.
	pub value_literal: String,
	/// The quoted content, or `string` when the content is too long.
	pub content_type: String,
	pub is_literal: bool,
	/// Content length in UTF-16 code units.
	pub length: usize,
	pub variables: Vec<String>,
	/// A union of quoted variable names, or `never`.
	pub variables_type: String,
}

impl ArtifactEntry {
	fn new(entry: &TextEntry, options: &GenerationOptions) -> Self {
		let value_literal = string_literal(&entry.content);
		let length = content_length(&entry.content);
		let is_literal = length <= options.max_literal_length;
		let content_type = if is_literal {
			value_literal.clone()
		} else {
			"string".to_string()
		};

		let variables = extract_variable_names(&entry.content, &options.delimiters);
		let variables_type = if variables.is_empty() {
			"never".to_string()
		} else {
			variables
				.iter()
				.map(|name| string_literal(name))
				.collect::<Vec<_>>()
				.join(" | ")
		};

		Self {
			key: entry.key.clone(),
			key_literal: string_literal(&entry.key),
			value_literal,
			content_type,
			is_literal,
			length,
			variables,
			variables_type,
		}
	}
}

/// The data shared by the static module, the declaration and the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactModel {
	pub entries: Vec<ArtifactEntry>,
	pub placeholder_pattern: String,
}

impl ArtifactModel {
	pub fn new(entries: &[TextEntry], options: &GenerationOptions) -> Self {
		Self {
			entries: entries
				.iter()
				.map(|entry| ArtifactEntry::new(entry, options))
				.collect(),
			placeholder_pattern: placeholder_pattern(&options.delimiters),
		}
	}
}

/// Inputs of the virtual module, which loads the files itself at runtime.
#[derive(Debug, Clone, Copy)]
pub struct VirtualModuleSource<'a> {
	pub include: &'a [String],
	pub exclude: &'a [String],
	pub strip_prefix: Option<&'a str>,
}

impl VirtualModuleSource<'_> {
	/// Root-relative include patterns followed by negated exclude patterns.
	pub fn glob_patterns(&self) -> Vec<String> {
		let include = normalize_patterns(self.include).map(|pattern| format!("/{pattern}"));
		let exclude = normalize_patterns(self.exclude).map(|pattern| format!("!/{pattern}"));
		include.chain(exclude).collect()
	}
}

/// Generate the static TypeScript module: typed `texts` plus `getText`.
pub fn generate_module(entries: &[TextEntry], options: &GenerationOptions) -> TextTypesResult<String> {
	let model = ArtifactModel::new(entries, options);
	render_model(STATIC_MODULE_TEMPLATE, &model, None)
}

/// Generate an ambient declaration for `module_id` with the same types as the
/// static module and no runtime values.
pub fn generate_declaration(
	module_id: &str,
	entries: &[TextEntry],
	options: &GenerationOptions,
) -> TextTypesResult<String> {
	let model = ArtifactModel::new(entries, options);
	render_model(DECLARATION_TEMPLATE, &model, Some(module_id))
}

/// Generate the source of the virtual module. The module loads the matched
/// files through the host's `import.meta.glob` when it is evaluated, so no
/// file content is embedded here.
pub fn generate_virtual_module(
	source: &VirtualModuleSource<'_>,
	options: &GenerationOptions,
) -> TextTypesResult<String> {
	let glob_patterns = format!(
		"[{}]",
		source
			.glob_patterns()
			.iter()
			.map(|pattern| string_literal(pattern))
			.collect::<Vec<_>>()
			.join(", ")
	);
	let strip_prefix = source
		.strip_prefix
		.map_or_else(|| "null".to_string(), string_literal);

	let env = environment()?;
	let template = env.get_template(VIRTUAL_MODULE_TEMPLATE)?;
	let source = template.render(context! {
		header => GENERATED_HEADER,
		glob_patterns => glob_patterns,
		strip_prefix => strip_prefix,
		placeholder_pattern => placeholder_pattern(&options.delimiters),
	})?;

	Ok(source)
}

#[derive(Serialize)]
struct Manifest<'a> {
	delimiters: &'a Delimiters,
	max_literal_length: usize,
	texts: Vec<ManifestEntry<'a>>,
}

#[derive(Serialize)]
struct ManifestEntry<'a> {
	key: &'a str,
	variables: &'a [String],
	length: usize,
	literal: bool,
}

/// Generate a JSON manifest listing every key with its placeholder names, for
/// tools that cannot read the TypeScript types.
pub fn generate_manifest(entries: &[TextEntry], options: &GenerationOptions) -> TextTypesResult<String> {
	let model = ArtifactModel::new(entries, options);
	let manifest = Manifest {
		delimiters: &options.delimiters,
		max_literal_length: options.max_literal_length,
		texts: model
			.entries
			.iter()
			.map(|entry| {
				ManifestEntry {
					key: &entry.key,
					variables: &entry.variables,
					length: entry.length,
					literal: entry.is_literal,
				}
			})
			.collect(),
	};

	let mut json = serde_json::to_string_pretty(&manifest)
		.map_err(|e| crate::TextTypesError::TemplateRender(e.to_string()))?;
	json.push('\n');
	Ok(json)
}

fn render_model(
	name: &str,
	model: &ArtifactModel,
	module_id: Option<&str>,
) -> TextTypesResult<String> {
	let env = environment()?;
	let template = env.get_template(name)?;
	let rendered = template.render(context! {
		header => GENERATED_HEADER,
		module_literal => module_id.map(string_literal),
		entries => &model.entries,
		placeholder_pattern => &model.placeholder_pattern,
	})?;

	Ok(rendered)
}

fn environment() -> TextTypesResult<Environment<'static>> {
	let mut env = Environment::new();
	env.set_trim_blocks(true);
	env.set_lstrip_blocks(true);
	env.set_keep_trailing_newline(true);
	env.set_undefined_behavior(UndefinedBehavior::Strict);
	// Slots are quoted by `string_literal` before rendering.
	env.set_auto_escape_callback(|_| AutoEscape::None);
	env.add_template(
		STATIC_MODULE_TEMPLATE,
		include_str!("templates/static_module.jinja"),
	)?;
	env.add_template(DECLARATION_TEMPLATE, include_str!("templates/declaration.jinja"))?;
	env.add_template(
		VIRTUAL_MODULE_TEMPLATE,
		include_str!("templates/virtual_module.jinja"),
	)?;

	Ok(env)
}
