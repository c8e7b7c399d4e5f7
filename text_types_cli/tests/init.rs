mod common;

use text_types_core::AnyEmptyResult;

#[test]
fn init_creates_config_and_sample() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::text_types_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created text-types.toml"))
		.stdout(predicates::str::contains("Next steps:"));

	assert!(tmp.path().join("text-types.toml").is_file());
	let sample = std::fs::read_to_string(tmp.path().join("src/content/hello.md"))?;
	assert_eq!(sample, "Hello {{ name }}!\n");

	common::text_types_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let module = std::fs::read_to_string(tmp.path().join(common::MODULE_PATH))?;
	assert!(module.contains(r#""hello.md": "Hello {{ name }}!\n","#));

	Ok(())
}

#[test]
fn init_keeps_existing_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), ".text-types.toml", "include = \"texts/*.txt\"\n")?;

	common::text_types_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already exists"));

	assert!(!tmp.path().join("text-types.toml").exists());
	assert!(!tmp.path().join("src/content/hello.md").exists());

	Ok(())
}
