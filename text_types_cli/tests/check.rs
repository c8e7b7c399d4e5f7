mod common;

use serde_json::Value;
use text_types_core::AnyEmptyResult;

fn generate(root: &std::path::Path) {
	common::text_types_cmd()
		.arg("generate")
		.arg("--path")
		.arg(root)
		.assert()
		.success();
}

#[test]
fn check_passes_when_up_to_date() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::content_project(tmp.path())?;
	generate(tmp.path());

	common::text_types_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("up to date"));

	Ok(())
}

#[test]
fn check_fails_when_module_is_missing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::content_project(tmp.path())?;

	common::text_types_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("(missing)"))
		.stderr(predicates::str::contains("Run `text-types generate` to fix."));

	assert!(!tmp.path().join(common::MODULE_PATH).exists());

	Ok(())
}

#[test]
fn check_fails_when_text_changed() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::content_project(tmp.path())?;
	generate(tmp.path());
	common::write_file(tmp.path(), "src/content/hello.md", "# Hello again")?;

	common::text_types_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.arg("--diff")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("(stale)"))
		.stderr(predicates::str::contains(r##"-  "hello.md": "# Hello";"##))
		.stderr(predicates::str::contains(r##"+  "hello.md": "# Hello again";"##));

	// Check never writes.
	let module = std::fs::read_to_string(tmp.path().join(common::MODULE_PATH))?;
	assert!(!module.contains("# Hello again"));

	Ok(())
}

#[test]
fn check_json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::content_project(tmp.path())?;

	let output = common::text_types_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.arg("--format")
		.arg("json")
		.output()?;

	assert_eq!(output.status.code(), Some(1));
	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json["ok"], false);
	assert_eq!(json["stale"][0]["kind"], "module");
	assert_eq!(json["stale"][0]["status"], "missing");
	assert_eq!(json["stale"][0]["path"], common::MODULE_PATH);

	generate(tmp.path());

	let output = common::text_types_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.arg("--format")
		.arg("json")
		.output()?;

	assert!(output.status.success());
	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json["ok"], true);

	Ok(())
}
