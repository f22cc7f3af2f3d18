//! Blade to merge tags.
//!
//! Mirrors the merge tag to Blade converter with the same pass order.
//! Escaped directives (`@@if`) are left as text.

use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

use crate::Conversion;
use crate::ConversionDiagnostic;
use crate::LoopStack;
use crate::conversion::LoopFinding;
use crate::conversion::LoopPass;
use crate::expression::merge_tag_property_path;
use crate::expression::to_merge_tag_expression;
use crate::scanner::BlockIndex;
use crate::scanner::CommentVault;
use crate::scanner::blade_expression_regions;
use crate::scanner::find_balanced_paren;
use crate::scanner::is_escaped_directive;
use crate::scanner::line_column;
use crate::scanner::replace_directive_keyword;
use crate::scanner::rewrite_directive_calls;
use crate::scanner::rewrite_regions;
use crate::scanner::unterminated_directives;

static COMMENT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)\{\{--\s*(.*?)\s*--\}\}").expect("valid regex"));
static FOREACH_HEAD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"@foreach\s*\(").expect("valid regex"));
/// The inside of a `@foreach(…)` header: `<collection> as $<item>`.
static FOREACH_CLAUSE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)^\s*(.+?)\s+as\s+\$(\w+)\s*$").expect("valid regex"));
/// A PHP variable with an optional arrow chain.
static VARIABLE_REFERENCE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\$(\w+)((?:\s*->\s*\w+)*)").expect("valid regex"));
static ANCHORED_VARIABLE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\$(\w+)((?:\s*->\s*\w+)*)$").expect("valid regex"));
static LOOP_META: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\$loop\s*->\s*(index|first|last)\b").expect("valid regex"));
static END_IF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@endif\b").expect("valid regex"));
static ELSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@else\b").expect("valid regex"));
static ELSE_IF_HEAD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"@elseif\s*\(").expect("valid regex"));
static IF_HEAD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@if\s*\(").expect("valid regex"));
static END_UNLESS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"@endunless\b").expect("valid regex"));
static UNLESS_HEAD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"@unless\s*\(").expect("valid regex"));
static RAW_ECHO: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)\{!!\s*(.+?)\s*!!\}").expect("valid regex"));
static ECHO: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)\{\{\s*(.+?)\s*\}\}").expect("valid regex"));
/// Inner text of `{{ … }}` that is merge tag syntax already.
static NOT_AN_ECHO: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(?:\{|--|[#/!]|else\b)").expect("valid regex"));

const FOREACH_OPEN_PREFIX: &str = "@foreach";
const FOREACH_CLOSE: &str = "@endforeach";

/// Convert Blade directive syntax to merge tag syntax.
///
/// Text that is not Blade, including merge tags that are already present,
/// passes through unchanged.
///
/// ```
/// use tagshift_core::convert_to_merge_tags;
///
/// assert_eq!(convert_to_merge_tags("Hi {{ $user->name }}"), "Hi {{user.name}}");
/// assert_eq!(
/// 	convert_to_merge_tags("@if(!$hidden)Shown@endif"),
/// 	"{{#if !hidden}}Shown{{/if}}",
/// );
/// ```
pub fn convert_to_merge_tags(source: &str) -> String {
	convert_to_merge_tags_with_diagnostics(source).output
}

/// Convert Blade to merge tags and report fragments that could not be
/// converted.
pub fn convert_to_merge_tags_with_diagnostics(source: &str) -> Conversion {
	let mut vault = CommentVault::for_source(source);

	let content = convert_comments(source, &mut vault);
	let mut diagnostics = find_unterminated(&content, source, &vault);
	let content = convert_loops(&content, source, &vault, &mut diagnostics);
	let content = convert_conditionals(&content);
	let content = convert_raw_echoes(&content);
	let content = convert_echoes(&content);

	tracing::debug!(
		bytes = source.len(),
		diagnostics = diagnostics.len(),
		"converted blade to merge tags"
	);

	Conversion {
		output: vault.restore(&content),
		diagnostics,
	}
}

fn convert_comments(content: &str, vault: &mut CommentVault) -> String {
	COMMENT
		.replace_all(content, |caps: &Captures<'_>| {
			vault.seal(caps.get_match(), format!("{{{{!-- {} --}}}}", &caps[1]))
		})
		.into_owned()
}

/// Directives whose argument list never closes. Runs before any rewriting
/// after the comment pass, so offsets only need the comments mapped back.
fn find_unterminated(
	content: &str,
	source: &str,
	vault: &CommentVault,
) -> Vec<ConversionDiagnostic> {
	unterminated_directives(content)
		.into_iter()
		.map(|(offset, directive)| {
			let (line, column) = line_column(source, vault.source_position(offset));
			tracing::warn!(
				directive = %directive,
				line,
				column,
				"directive arguments are never closed; directive left unconverted"
			);
			ConversionDiagnostic::UnterminatedDirective {
				directive,
				line,
				column,
			}
		})
		.collect()
}

fn convert_loops(
	content: &str,
	source: &str,
	vault: &CommentVault,
	diagnostics: &mut Vec<ConversionDiagnostic>,
) -> String {
	let index = BlockIndex::new(content, FOREACH_OPEN_PREFIX, FOREACH_CLOSE);
	let mut pass = LoopPass::with_capacity(content.len());
	rewrite_loops(content, 0, &index, &mut pass);
	pass.finish(source, vault, diagnostics)
}

/// Convert every `@foreach` block in `content`, which starts at byte `base`
/// of the text `index` was built from.
fn rewrite_loops(content: &str, base: usize, index: &BlockIndex, pass: &mut LoopPass) {
	let mut cursor = 0;
	let mut search = 0;

	while let Some(head) = FOREACH_HEAD.find_at(content, search) {
		search = head.end();
		if is_escaped_directive(content, head.start()) {
			continue;
		}

		let open_paren = head.end() - 1;
		let Some(close_paren) = find_balanced_paren(content, open_paren) else {
			continue;
		};
		let Some(clause) = FOREACH_CLAUSE.captures(&content[open_paren + 1..close_paren]) else {
			continue;
		};
		let (Some(collection), Some(item)) = (clause.get(1), clause.get(2)) else {
			continue;
		};

		let body_start = close_paren + 1;
		let Some(body_end) = index
			.matching_close(base + body_start, base + content.len())
			.map(|close| close - base)
		else {
			pass.findings.push(LoopFinding::Unclosed {
				offset: base + head.start(),
				collection: collection.as_str().trim().to_string(),
			});
			break;
		};

		write_body_text(&content[cursor..head.start()], base + cursor, pass);

		let collection_offset = base + open_paren + 1 + collection.start();
		let collection = collection.as_str().trim();
		let outer = outer_references(collection, collection_offset, &pass.stack);
		pass.findings.extend(outer);
		let collection_expression = resolve_collection(collection, &pass.stack);
		pass.output.push_str(&format!("{{{{#each {collection_expression}}}}}"));

		pass.stack.push(item.as_str().to_string());
		rewrite_loops(
			&content[body_start..body_end],
			base + body_start,
			index,
			pass,
		);
		pass.stack.pop();

		pass.output.push_str("{{/each}}");
		cursor = body_end + FOREACH_CLOSE.len();
		search = cursor;
	}

	write_body_text(&content[cursor..], base + cursor, pass);
}

/// Merge tag path for a loop collection. A collection reached through the
/// innermost enclosing item becomes a `this` path.
fn resolve_collection(collection: &str, stack: &LoopStack) -> String {
	let enclosing = stack.innermost();
	let through_enclosing = ANCHORED_VARIABLE
		.captures(collection)
		.filter(|caps| Some(&caps[1]) == enclosing);

	match through_enclosing {
		Some(caps) => format!("this{}", merge_tag_property_path(&caps[2])),
		None => to_merge_tag_expression(collection),
	}
}

/// Write `text`, which starts at byte `offset` of the pass input, with the
/// innermost loop item and the `$loop` helpers rewritten inside its
/// expression regions. Items of outer loops are left as written and recorded.
fn write_body_text(text: &str, offset: usize, pass: &mut LoopPass) {
	let Some(item) = pass.stack.innermost() else {
		pass.output.push_str(text);
		return;
	};
	let regions = blade_expression_regions(text);
	let mut found = Vec::new();

	let rewritten = rewrite_regions(text, &regions, |start, region| {
		found.extend(outer_references(region, offset + start, &pass.stack));

		let region = LOOP_META.replace_all(region, "@${1}");
		VARIABLE_REFERENCE
			.replace_all(&region, |caps: &Captures<'_>| {
				if &caps[1] == item {
					format!("this{}", merge_tag_property_path(&caps[2]))
				} else {
					caps[0].to_string()
				}
			})
			.into_owned()
	});

	pass.findings.extend(found);
	pass.output.push_str(&rewritten);
}

/// References in `expression`, which starts at byte `offset` of the pass
/// input, to the items of loops enclosing the innermost one.
fn outer_references<'a>(
	expression: &'a str,
	offset: usize,
	stack: &'a LoopStack,
) -> impl Iterator<Item = LoopFinding> + 'a {
	VARIABLE_REFERENCE
		.captures_iter(expression)
		.filter(move |caps| stack.is_outer(&caps[1]))
		.map(move |caps| {
			LoopFinding::OuterReference {
				offset: offset + caps.get_match().start(),
				variable: caps[1].to_string(),
			}
		})
}

fn convert_conditionals(content: &str) -> String {
	let content = replace_directive_keyword(content, &END_IF, "{{/if}}");
	let content = replace_directive_keyword(&content, &ELSE, "{{else}}");
	let content = rewrite_directive_calls(&content, &ELSE_IF_HEAD, |condition| {
		format!("{{{{else if {}}}}}", to_merge_tag_expression(condition))
	});
	let content = rewrite_directive_calls(&content, &IF_HEAD, |condition| {
		format!("{{{{#if {}}}}}", to_merge_tag_expression(condition))
	});
	let content = replace_directive_keyword(&content, &END_UNLESS, "{{/unless}}");
	rewrite_directive_calls(&content, &UNLESS_HEAD, |condition| {
		format!("{{{{#unless {}}}}}", to_merge_tag_expression(condition))
	})
}

fn convert_raw_echoes(content: &str) -> String {
	RAW_ECHO
		.replace_all(content, |caps: &Captures<'_>| {
			format!("{{{{{{{}}}}}}}", to_merge_tag_expression(&caps[1]))
		})
		.into_owned()
}

fn convert_echoes(content: &str) -> String {
	ECHO.replace_all(content, |caps: &Captures<'_>| {
		let inner = caps[1].trim();
		if NOT_AN_ECHO.is_match(inner) {
			caps[0].to_string()
		} else {
			format!("{{{{{}}}}}", to_merge_tag_expression(inner))
		}
	})
	.into_owned()
}
