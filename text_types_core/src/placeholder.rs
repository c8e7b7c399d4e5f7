use std::borrow::Borrow;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::BuildHasher;
use std::hash::Hash;
use std::ops::Range;

use crate::config::Delimiters;

/// A placeholder found in text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
	/// Byte range of the whole placeholder, delimiters included.
	pub range: Range<usize>,
	/// The placeholder as written, e.g. `{{ name }}`.
	pub raw: &'a str,
	/// The trimmed text between the delimiters, e.g. `name`.
	pub name: &'a str,
}

/// Iterate over the placeholders in `content`.
///
/// The text between the delimiters must be at least one character long and
/// must not contain a line break. The first closing delimiter after an
/// opening delimiter ends the placeholder.
pub fn placeholders<'a>(content: &'a str, delimiters: &'a Delimiters) -> Placeholders<'a> {
	Placeholders {
		content,
		open: &delimiters.open,
		close: &delimiters.close,
		position: 0,
	}
}

/// Iterator returned by [`placeholders`].
#[derive(Debug, Clone)]
pub struct Placeholders<'a> {
	content: &'a str,
	open: &'a str,
	close: &'a str,
	position: usize,
}

impl<'a> Iterator for Placeholders<'a> {
	type Item = Placeholder<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.open.is_empty() || self.close.is_empty() {
			return None;
		}

		while self.position < self.content.len() {
			let start = self.position + self.content[self.position..].find(self.open)?;
			let inner_start = start + self.open.len();

			if !self.content[inner_start..].contains(self.close) {
				self.position = self.content.len();
				return None;
			}

			if let Some(close_start) = self.find_close(inner_start) {
				let end = close_start + self.close.len();
				self.position = end;

				return Some(Placeholder {
					range: start..end,
					raw: &self.content[start..end],
					name: self.content[inner_start..close_start].trim(),
				});
			}

			// No placeholder starts here, retry from the next character.
			let width = self.content[start..]
				.chars()
				.next()
				.map_or(1, char::len_utf8);
			self.position = start + width;
		}

		None
	}
}

impl Placeholders<'_> {
	fn find_close(&self, inner_start: usize) -> Option<usize> {
		let inner = &self.content[inner_start..];
		let first = inner.chars().next()?;
		if is_line_terminator(first) {
			return None;
		}

		let skip = first.len_utf8();
		let close_start = inner_start + skip + inner[skip..].find(self.close)?;
		if self.content[inner_start..close_start].contains(is_line_terminator) {
			return None;
		}

		Some(close_start)
	}
}

fn is_line_terminator(c: char) -> bool {
	matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Return the distinct, trimmed placeholder names in order of first
/// appearance.
pub fn extract_variable_names(content: &str, delimiters: &Delimiters) -> Vec<String> {
	let mut names: Vec<String> = Vec::new();

	for placeholder in placeholders(content, delimiters) {
		if !names.iter().any(|name| name == placeholder.name) {
			names.push(placeholder.name.to_string());
		}
	}

	names
}

/// Replace each placeholder whose name is present in `args` with the
/// argument's string form. Placeholders without a matching argument are left
/// untouched, delimiters included.
pub fn substitute(
	content: &str,
	args: Option<&dyn PlaceholderArgs>,
	delimiters: &Delimiters,
) -> String {
	let Some(args) = args else {
		return content.to_string();
	};

	let mut result = String::with_capacity(content.len());
	let mut last = 0;

	for placeholder in placeholders(content, delimiters) {
		let Some(value) = args.lookup(placeholder.name) else {
			continue;
		};

		result.push_str(&content[last..placeholder.range.start]);
		result.push_str(&value);
		last = placeholder.range.end;
	}

	result.push_str(&content[last..]);
	result
}

/// Values available for placeholder substitution.
pub trait PlaceholderArgs {
	/// The string form of the argument called `name`, if supplied.
	fn lookup(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl<K, V, S> PlaceholderArgs for HashMap<K, V, S>
where
	K: Borrow<str> + Hash + Eq,
	V: Display,
	S: BuildHasher,
{
	fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
		self.get(name).map(|value| Cow::Owned(value.to_string()))
	}
}

impl<K, V> PlaceholderArgs for BTreeMap<K, V>
where
	K: Borrow<str> + Ord,
	V: Display,
{
	fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
		self.get(name).map(|value| Cow::Owned(value.to_string()))
	}
}

impl PlaceholderArgs for serde_json::Map<String, serde_json::Value> {
	fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
		match self.get(name)? {
			serde_json::Value::String(value) => Some(Cow::Borrowed(value.as_str())),
			other => Some(Cow::Owned(other.to_string())),
		}
	}
}
