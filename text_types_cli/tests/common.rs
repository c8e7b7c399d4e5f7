use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn text_types_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("text-types"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("TEXT_TYPES_LOG");
	cmd
}

pub const CONTENT_CONFIG: &str = "include = \"src/content/**/*.{md,txt}\"\n\n[key_transform]\nstrip_prefix = \"/src/content/\"\n";

pub const MODULE_PATH: &str = "src/@generated/text-types/index.ts";

pub fn write_file(root: &Path, relative: &str, content: &str) -> std::io::Result<()> {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)
}

/// A project with a config file, `hello.md` and `foo.txt`.
pub fn content_project(root: &Path) -> std::io::Result<()> {
	write_file(root, "text-types.toml", CONTENT_CONFIG)?;
	write_file(root, "src/content/hello.md", "# Hello")?;
	write_file(root, "src/content/foo.txt", "Foo {{ name }}")
}
