use clap::Parser;
use rstest::rstest;
use similar_asserts::assert_eq;
use text_types_cli::Commands;
use text_types_cli::TextTypesCli;
use text_types_cli::parse_arg;

#[rstest]
#[case::simple("name=World", ("name", "World"))]
#[case::empty_value("name=", ("name", ""))]
#[case::value_with_equals("query=a=b", ("query", "a=b"))]
#[case::trimmed_name(" name =World", ("name", "World"))]
fn parses_placeholder_arguments(#[case] input: &str, #[case] expected: (&str, &str)) {
	let parsed = parse_arg(input).unwrap_or_else(|e| panic!("parse {input}: {e}"));
	assert_eq!(parsed, (expected.0.to_string(), expected.1.to_string()));
}

#[rstest]
#[case::missing_separator("name")]
#[case::empty_name("=value")]
fn rejects_invalid_placeholder_arguments(#[case] input: &str) {
	assert!(parse_arg(input).is_err());
}

#[test]
fn render_collects_repeated_arguments() {
	let cli = TextTypesCli::try_parse_from([
		"text-types",
		"render",
		"greeting.md",
		"--arg",
		"name=Ada",
		"-a",
		"place=Earth",
	])
	.unwrap_or_else(|e| panic!("parse: {e}"));

	let Some(Commands::Render { key, args }) = cli.command else {
		panic!("expected the render command");
	};
	assert_eq!(key, "greeting.md");
	assert_eq!(
		args,
		vec![
			("name".to_string(), "Ada".to_string()),
			("place".to_string(), "Earth".to_string()),
		]
	);
}

#[test]
fn global_flags_follow_subcommands() {
	let cli = TextTypesCli::try_parse_from([
		"text-types",
		"check",
		"--diff",
		"--path",
		"site",
		"--no-color",
	])
	.unwrap_or_else(|e| panic!("parse: {e}"));

	assert!(cli.no_color);
	assert_eq!(cli.path, Some(std::path::PathBuf::from("site")));
	assert!(matches!(cli.command, Some(Commands::Check { diff: true, .. })));
}
