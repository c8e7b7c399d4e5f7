use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use text_types_cli::Commands;
use text_types_cli::OutputFormat;
use text_types_cli::TextTypesCli;
use text_types_core::ChangeOutcome;
use text_types_core::DetachedModuleGraph;
use text_types_core::GenerationReport;
use text_types_core::PlaceholderArgs;
use text_types_core::SourceFile;
use text_types_core::TextEntries;
use text_types_core::TextTypes;
use text_types_core::TextTypesConfig;
use text_types_core::TextTypesError;
use text_types_core::extract_variable_names;
use text_types_core::is_literal;
use text_types_core::read_entries;
use text_types_core::substitute;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding the log filter, e.g. `TEXT_TYPES_LOG=debug`.
const LOG_ENV_VAR: &str = "TEXT_TYPES_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = TextTypesCli::parse();

	// Respect NO_COLOR, --no-color and terminals without color support.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Generate { watch }) => run_generate(&args, *watch),
		Some(Commands::Check { diff, format }) => run_check(&args, *diff, *format),
		Some(Commands::List { format }) => run_list(&args, *format),
		Some(Commands::Render { key, args: values }) => run_render(&args, key, values),
		None => {
			eprintln!("No subcommand specified. Run `text-types --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<TextTypesError>() {
			Ok(error) => {
				let report: miette::Report = (*error).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.try_init()
		.ok();
}

fn resolve_root(args: &TextTypesCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_pipeline(args: &TextTypesCli) -> Result<TextTypes, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = match &args.config {
		Some(path) => TextTypesConfig::load_from(path)?,
		None => {
			TextTypesConfig::load(&root)?.ok_or_else(|| TextTypesError::ConfigNotFound(root.clone()))?
		}
	};

	if args.verbose {
		if let Some(path) = args.config.clone().or_else(|| TextTypesConfig::resolve_path(&root)) {
			println!("Using config: {}", path.display());
		}
	}

	Ok(TextTypes::new(&root, config)?)
}

fn run_init(args: &TextTypesCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config_path = root.join("text-types.toml");
	let sample_path = root.join("src/content/hello.md");

	let config_exists = TextTypesConfig::resolve_path(&root).is_some();

	if config_exists {
		println!("Config file already exists: {}", config_path.display());
	} else {
		let sample_config = "# text-types configuration\n\n# Text files to collect, relative to \
		                     the project root.\ninclude = \"src/content/**/*.{md,txt}\"\n\n# \
		                     Where the typed module is written. Set to false to \
		                     disable.\noutput = \"src/@generated/text-types/index.ts\"\n\n# Also \
		                     write an ambient declaration file.\n# dts = true\n\n[key_transform]\n# \
		                     `/src/content/hello.md` becomes `hello.md`.\nstrip_prefix = \
		                     \"/src/content/\"\n";

		std::fs::write(&config_path, sample_config)?;
		println!("Created text-types.toml");
	}

	if sample_path.exists() {
		// Never overwrite an existing text.
	} else if !config_exists {
		if let Some(parent) = sample_path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&sample_path, "Hello {{ name }}!\n")?;
		println!("Created sample text: {}", make_relative(&sample_path, &root));
	}

	if !config_exists {
		println!();
		println!("Next steps:");
		println!("  1. Add text files under src/content/");
		println!("  2. Run `text-types generate` to write the typed module");
		println!("  3. Import it:");
		println!("     import {{ getText }} from \"./@generated/text-types\";");
		println!("     getText(\"hello.md\", {{ name: \"World\" }});");
	}

	Ok(())
}

fn run_generate(args: &TextTypesCli, watch: bool) -> Result<(), Box<dyn std::error::Error>> {
	let pipeline = load_pipeline(args)?;
	let report = pipeline.build_start()?;
	print_generation_report(args, &pipeline, &report);

	if !watch {
		return Ok(());
	}

	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let (tx, rx) = mpsc::channel::<PathBuf>();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				if matches!(
					event.kind,
					notify::EventKind::Modify(_)
						| notify::EventKind::Create(_)
						| notify::EventKind::Remove(_)
				) {
					for path in event.paths {
						let _ = tx.send(path);
					}
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(pipeline.root(), notify::RecursiveMode::Recursive)?;

	let mut graph = DetachedModuleGraph;

	loop {
		let mut changed = BTreeSet::new();
		changed.insert(rx.recv()?);
		// Debounce: drain additional events within 200ms.
		while let Ok(path) = rx.recv_timeout(Duration::from_millis(200)) {
			changed.insert(path);
		}
		tracing::debug!(paths = changed.len(), "processing file changes");

		// One regeneration covers every file, so stop at the first relevant
		// path of the batch.
		for path in &changed {
			match pipeline.handle_file_change(path, &mut graph) {
				Ok(ChangeOutcome::Ignored) => continue,
				Ok(outcome) => {
					println!(
						"\nChange detected in {}, regenerated.",
						make_relative(path, pipeline.root())
					);
					if let Some(report) = outcome.report() {
						print_generation_report(args, &pipeline, report);
					}
				}
				Err(e) => {
					let report: miette::Report = e.into();
					eprintln!("{report:?}");
				}
			}
			break;
		}
	}
}

fn print_generation_report(args: &TextTypesCli, pipeline: &TextTypes, report: &GenerationReport) {
	let root = pipeline.root();
	let written = report.artifacts.iter().filter(|a| a.changed).count();
	let unchanged = report.artifacts.len() - written;

	for artifact in &report.artifacts {
		let rel = make_relative(&artifact.path, root);
		if artifact.changed {
			println!("  {} {} ({})", colored!("wrote", green), rel, artifact.kind);
		} else if args.verbose {
			println!("  unchanged {rel} ({})", artifact.kind);
		}
	}

	println!(
		"Generated {} text(s): {written} artifact(s) written, {unchanged} unchanged.",
		report.entries.len()
	);

	// Each collision is also logged as a warning by the core.
	if !report.collisions.is_empty() {
		println!(
			"{} {} key collision(s), later files won.",
			colored!("warning:", yellow),
			report.collisions.len()
		);
	}
}

fn run_check(
	args: &TextTypesCli,
	show_diff: bool,
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let pipeline = load_pipeline(args)?;
	let root = pipeline.root();
	let prepared = pipeline.prepare()?;

	let mut stale = Vec::new();
	for artifact in &prepared.artifacts {
		let current = match std::fs::read_to_string(&artifact.path) {
			Ok(content) => Some(content),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
			Err(e) => return Err(e.into()),
		};

		if current.as_deref() != Some(artifact.content.as_str()) {
			stale.push((artifact, current));
		}
	}

	if stale.is_empty() {
		match format {
			OutputFormat::Json => {
				println!("{{\"ok\":true,\"stale\":[]}}");
			}
			OutputFormat::Text => {
				println!("Check passed: all generated artifacts are up to date.");
			}
		}
		return Ok(());
	}

	match format {
		OutputFormat::Json => {
			let entries: Vec<serde_json::Value> = stale
				.iter()
				.map(|(artifact, current)| {
					serde_json::json!({
						"kind": artifact.kind,
						"path": make_relative(&artifact.path, root),
						"status": if current.is_some() { "stale" } else { "missing" },
					})
				})
				.collect();
			let output = serde_json::json!({
				"ok": false,
				"stale": entries,
			});
			println!("{output}");
		}
		OutputFormat::Text => {
			eprintln!("Check failed.");
			for (artifact, current) in &stale {
				let rel = make_relative(&artifact.path, root);
				let status = if current.is_some() { "stale" } else { "missing" };
				eprintln!("  {} {rel} ({status})", artifact.kind);

				if show_diff {
					print_diff(current.as_deref().unwrap_or_default(), &artifact.content);
				}
			}
			eprintln!();
			eprintln!(
				"{} artifact(s) are out of date. Run `text-types generate` to fix.",
				stale.len()
			);
		}
	}

	process::exit(1);
}

/// Collect and read every text without rendering any artifact.
fn read_texts(
	pipeline: &TextTypes,
) -> Result<(Vec<SourceFile>, TextEntries), Box<dyn std::error::Error>> {
	let files = pipeline.collect()?;
	let (entries, _) = read_entries(&files)?;
	Ok((files, entries))
}

fn run_list(args: &TextTypesCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let pipeline = load_pipeline(args)?;
	let root = pipeline.root();
	let options = &pipeline.context().options;
	let (files, entries) = read_texts(&pipeline)?;

	// Later files win a shared key, matching the generated module.
	let sources: HashMap<&str, &SourceFile> = files
		.iter()
		.map(|file| (file.output_key.as_str(), file))
		.collect();
	let source_of = |key: &str| {
		sources
			.get(key)
			.map(|file| make_relative(&file.path, root))
			.unwrap_or_default()
	};

	if let OutputFormat::Json = format {
		let texts: Vec<serde_json::Value> = entries
			.iter()
			.map(|entry| {
				serde_json::json!({
					"key": entry.key,
					"file": source_of(&entry.key),
					"variables": extract_variable_names(&entry.content, &options.delimiters),
					"literal": is_literal(&entry.content, options.max_literal_length),
				})
			})
			.collect();
		println!("{}", serde_json::Value::Array(texts));
		return Ok(());
	}

	if entries.is_empty() {
		println!("No texts found.");
		return Ok(());
	}

	println!("{}", colored!("Texts:", bold));
	for entry in entries.iter() {
		let variables = extract_variable_names(&entry.content, &options.delimiters);
		let variables = if variables.is_empty() {
			String::new()
		} else {
			format!(" [{}]", variables.join(", "))
		};
		let fallback = if is_literal(&entry.content, options.max_literal_length) {
			""
		} else {
			" (string)"
		};
		println!(
			"  {} {}{variables}{fallback}",
			entry.key,
			source_of(&entry.key)
		);
	}

	println!("\n{} text(s)", entries.len());

	Ok(())
}

fn run_render(
	args: &TextTypesCli,
	key: &str,
	values: &[(String, String)],
) -> Result<(), Box<dyn std::error::Error>> {
	let pipeline = load_pipeline(args)?;
	let (_, entries) = read_texts(&pipeline)?;

	let Some(entry) = entries.iter().find(|entry| entry.key == key) else {
		return Err(format!("unknown text key `{key}`. Run `text-types list` to see every key.").into());
	};

	let values: BTreeMap<String, String> = values.iter().cloned().collect();
	let rendered = substitute(
		&entry.content,
		Some(&values as &dyn PlaceholderArgs),
		&pipeline.context().options.delimiters,
	);

	if rendered.ends_with('\n') {
		print!("{rendered}");
	} else {
		println!("{rendered}");
	}

	Ok(())
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
