//! Scanning helpers shared by both converters.
//!
//! None of these build a tree. They locate delimiters in flat text: matching
//! close tags by depth counting, balanced parentheses, and the regions of a
//! template that hold expressions.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Match;
use regex::Regex;

/// Merge tag expression tags: `{{{raw}}}` or `{{echo}}` / `{{#block …}}`.
static TEMPLATE_TAG: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)\{\{\{.*?\}\}\}|\{\{.*?\}\}").expect("valid regex"));

/// Blade echoes: `{{ … }}` and `{!! … !!}`.
static BLADE_ECHO: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)\{!!.*?!!\}|\{\{.*?\}\}").expect("valid regex"));

/// The head of a Blade directive with an argument list, up to the `(`.
static BLADE_DIRECTIVE_HEAD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"@\w+\s*\(").expect("valid regex"));

/// Heads of the directives that take part in conversion.
static CONVERTIBLE_DIRECTIVE_HEAD: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"@(if|elseif|unless|foreach)\s*\(").expect("valid regex")
});

/// Private use characters that frame a sealed comment placeholder.
const SEAL_OPEN: char = '\u{E000}';
const SEAL_CLOSE: char = '\u{E001}';

/// Positions of every block opener and close tag in a text.
///
/// Built once per loop pass so that nested blocks can be matched without
/// rescanning the text for every level.
#[derive(Debug)]
pub(crate) struct BlockIndex {
	opens: Vec<usize>,
	closes: Vec<usize>,
}

impl BlockIndex {
	/// `open` is matched as a prefix so that openers with unusual headers
	/// still count towards the depth.
	pub(crate) fn new(content: &str, open: &str, close: &str) -> Self {
		Self {
			opens: content.match_indices(open).map(|(index, _)| index).collect(),
			closes: content.match_indices(close).map(|(index, _)| index).collect(),
		}
	}

	/// Find the byte offset of the close tag balancing an opener that ends at
	/// `start`. Every further opener raises the depth and every close tag
	/// lowers it; the close that brings the depth back to zero is the match.
	/// A match at or past `limit` counts as no match.
	pub(crate) fn matching_close(&self, start: usize, limit: usize) -> Option<usize> {
		let first_open = self.opens.partition_point(|&open| open < start);
		let first_close = self.closes.partition_point(|&close| close < start);
		let mut opens = self.opens[first_open..].iter().peekable();
		let mut depth = 1usize;

		for &close in &self.closes[first_close..] {
			while opens.next_if(|&&open| open < close).is_some() {
				depth += 1;
			}
			depth -= 1;
			if depth == 0 {
				return (close < limit).then_some(close);
			}
		}

		None
	}
}

/// Find the `)` that balances the `(` at `open_index`. Parentheses inside
/// single or double quoted strings are ignored.
pub(crate) fn find_balanced_paren(content: &str, open_index: usize) -> Option<usize> {
	let bytes = content.as_bytes();
	if bytes.get(open_index) != Some(&b'(') {
		return None;
	}

	let mut depth = 0usize;
	let mut quote: Option<u8> = None;
	let mut escaped = false;

	for (index, &byte) in bytes.iter().enumerate().skip(open_index) {
		if let Some(delimiter) = quote {
			if escaped {
				escaped = false;
			} else if byte == b'\\' {
				escaped = true;
			} else if byte == delimiter {
				quote = None;
			}
			continue;
		}

		match byte {
			b'\'' | b'"' => quote = Some(byte),
			b'(' => depth += 1,
			b')' => {
				depth -= 1;
				if depth == 0 {
					return Some(index);
				}
			}
			_ => {}
		}
	}

	None
}

/// Byte ranges of every merge tag (`{{…}}` / `{{{…}}}`) in `content`.
/// Comment tags are excluded.
pub(crate) fn template_tag_regions(content: &str) -> Vec<Range<usize>> {
	TEMPLATE_TAG
		.find_iter(content)
		.filter(|m| {
			let inner = m.as_str().trim_start_matches('{').trim_start();
			!inner.starts_with("--") && !inner.starts_with("!--")
		})
		.map(|m| m.range())
		.collect()
}

/// Byte ranges of every Blade expression region in `content`: echoes, raw
/// echoes and the argument lists of directives such as `@if(…)`.
pub(crate) fn blade_expression_regions(content: &str) -> Vec<Range<usize>> {
	let mut regions: Vec<Range<usize>> = BLADE_ECHO
		.find_iter(content)
		.filter(|m| !m.as_str().starts_with("{{--"))
		.map(|m| m.range())
		.collect();

	for head in BLADE_DIRECTIVE_HEAD.find_iter(content) {
		let open_index = head.end() - 1;
		if let Some(close_index) = find_balanced_paren(content, open_index) {
			regions.push(open_index..close_index + 1);
		}
	}

	regions.sort_by_key(|region| region.start);

	// Keep the outermost region when two overlap.
	let mut merged: Vec<Range<usize>> = Vec::with_capacity(regions.len());
	for region in regions {
		match merged.last() {
			Some(previous) if region.start < previous.end => {}
			_ => merged.push(region),
		}
	}

	merged
}

/// Rebuild `content`, passing each region and its start offset through
/// `rewrite` and copying the text between regions verbatim. `regions` must be
/// sorted and disjoint.
pub(crate) fn rewrite_regions(
	content: &str,
	regions: &[Range<usize>],
	mut rewrite: impl FnMut(usize, &str) -> String,
) -> String {
	let mut output = String::with_capacity(content.len());
	let mut cursor = 0;

	for region in regions {
		output.push_str(&content[cursor..region.start]);
		output.push_str(&rewrite(region.start, &content[region.clone()]));
		cursor = region.end;
	}

	output.push_str(&content[cursor..]);
	output
}

/// Replace every unescaped match of a bare directive keyword (`@else`,
/// `@endif`) with `replacement`.
pub(crate) fn replace_directive_keyword(content: &str, keyword: &Regex, replacement: &str) -> String {
	let mut output = String::with_capacity(content.len());
	let mut cursor = 0;

	for found in keyword.find_iter(content) {
		if is_escaped_directive(content, found.start()) {
			continue;
		}
		output.push_str(&content[cursor..found.start()]);
		output.push_str(replacement);
		cursor = found.end();
	}

	output.push_str(&content[cursor..]);
	output
}

/// Rewrite every unescaped directive call whose head (`@if(`, `@elseif (`)
/// matches `head`. `rewrite` receives the text between the balanced
/// parentheses. Calls whose argument list never closes are kept as written.
pub(crate) fn rewrite_directive_calls(
	content: &str,
	head: &Regex,
	mut rewrite: impl FnMut(&str) -> String,
) -> String {
	let mut output = String::with_capacity(content.len());
	let mut cursor = 0;

	for found in head.find_iter(content) {
		if found.start() < cursor || is_escaped_directive(content, found.start()) {
			continue;
		}
		let open_index = found.end() - 1;
		let Some(close_index) = find_balanced_paren(content, open_index) else {
			continue;
		};
		output.push_str(&content[cursor..found.start()]);
		output.push_str(&rewrite(&content[open_index + 1..close_index]));
		cursor = close_index + 1;
	}

	output.push_str(&content[cursor..]);
	output
}

/// Offsets and names of unescaped `@if` / `@elseif` / `@unless` /
/// `@foreach` calls whose argument list never closes.
pub(crate) fn unterminated_directives(content: &str) -> Vec<(usize, String)> {
	CONVERTIBLE_DIRECTIVE_HEAD
		.captures_iter(content)
		.filter_map(|caps| {
			let head = caps.get(0)?;
			if is_escaped_directive(content, head.start()) {
				return None;
			}
			match find_balanced_paren(content, head.end() - 1) {
				Some(_) => None,
				None => Some((head.start(), caps[1].to_string())),
			}
		})
		.collect()
}

/// Whether the `@` at `offset` is escaped (`@@if`).
pub(crate) fn is_escaped_directive(content: &str, offset: usize) -> bool {
	content[..offset].ends_with('@')
}

/// 1-indexed line and column of a byte offset. An offset inside a multi-byte
/// character counts as the start of that character.
pub(crate) fn line_column(content: &str, offset: usize) -> (usize, usize) {
	let mut offset = offset.min(content.len());
	while !content.is_char_boundary(offset) {
		offset -= 1;
	}

	let before = &content[..offset];
	let line = before.matches('\n').count() + 1;
	let line_start = before.rfind('\n').map_or(0, |index| index + 1);
	let column = before[line_start..].chars().count() + 1;
	(line, column)
}

/// Keeps converted comments out of reach of the later passes.
///
/// Each comment is replaced by a placeholder made of private use characters
/// and restored once every pass has run. When the input already contains
/// those characters the vault stays disabled and comments are converted in
/// place. Either way every seal is recorded so that offsets in the working
/// text can be mapped back to the source.
#[derive(Debug, Default)]
pub(crate) struct CommentVault {
	comments: Vec<SealedComment>,
	disabled: bool,
}

#[derive(Debug)]
struct SealedComment {
	converted: String,
	source_start: usize,
	source_len: usize,
	working_start: usize,
	/// Length of the placeholder, or of the converted comment when the vault
	/// is disabled.
	working_len: usize,
}

impl SealedComment {
	fn source_end(&self) -> usize {
		self.source_start + self.source_len
	}

	fn working_end(&self) -> usize {
		self.working_start + self.working_len
	}
}

impl CommentVault {
	pub(crate) fn for_source(source: &str) -> Self {
		Self {
			comments: Vec::new(),
			disabled: source.contains(SEAL_OPEN) || source.contains(SEAL_CLOSE),
		}
	}

	/// Store a converted comment and return the text to put in its place.
	/// Comments must be sealed in source order.
	pub(crate) fn seal(&mut self, comment: Match<'_>, converted: String) -> String {
		let replacement = if self.disabled {
			converted.clone()
		} else {
			format!("{SEAL_OPEN}{}{SEAL_CLOSE}", self.comments.len())
		};
		let working_start = match self.comments.last() {
			Some(previous) => previous.working_end() + (comment.start() - previous.source_end()),
			None => comment.start(),
		};

		self.comments.push(SealedComment {
			converted,
			source_start: comment.start(),
			source_len: comment.len(),
			working_start,
			working_len: replacement.len(),
		});
		replacement
	}

	/// Put the converted comments back.
	pub(crate) fn restore(&self, content: &str) -> String {
		if self.disabled || self.comments.is_empty() || !content.contains(SEAL_OPEN) {
			return content.to_string();
		}

		let mut output = String::with_capacity(content.len());
		let mut rest = content;

		while let Some(start) = rest.find(SEAL_OPEN) {
			output.push_str(&rest[..start]);
			let after_open = &rest[start + SEAL_OPEN.len_utf8()..];

			let sealed = after_open.find(SEAL_CLOSE).and_then(|end| {
				let index: usize = after_open[..end].parse().ok()?;
				let comment = self.comments.get(index)?;
				Some((comment, end))
			});

			match sealed {
				Some((comment, end)) => {
					output.push_str(&comment.converted);
					rest = &after_open[end + SEAL_CLOSE.len_utf8()..];
				}
				None => {
					output.push(SEAL_OPEN);
					rest = after_open;
				}
			}
		}

		output.push_str(rest);
		output
	}

	/// Map a byte offset in the text produced by the comment pass back to the
	/// source. An offset inside a sealed comment maps into the original
	/// comment.
	pub(crate) fn source_position(&self, working_offset: usize) -> usize {
		let mut previous: Option<&SealedComment> = None;

		for comment in &self.comments {
			if working_offset < comment.working_start {
				break;
			}
			if working_offset < comment.working_end() {
				let within = (working_offset - comment.working_start).min(comment.source_len);
				return comment.source_start + within;
			}
			previous = Some(comment);
		}

		match previous {
			Some(comment) => comment.source_end() + (working_offset - comment.working_end()),
			None => working_offset,
		}
	}
}
