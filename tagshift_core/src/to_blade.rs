//! Merge tags to Blade.
//!
//! The converter runs a fixed sequence of passes over the text: comments,
//! loops, conditionals, raw echoes and finally plain echoes. Comments are
//! sealed away as soon as they are converted so no later pass can touch
//! their bodies. Loops go before conditionals and echoes because the loop
//! pass rewrites `this` and the `@index` / `@first` / `@last` helpers inside
//! tags, which the later passes then treat as ordinary Blade variables.

use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

use crate::Conversion;
use crate::ConversionDiagnostic;
use crate::LoopStack;
use crate::conversion::LoopFinding;
use crate::conversion::LoopPass;
use crate::expression::blade_property_path;
use crate::expression::to_blade_expression;
use crate::inflector::item_variable_name;
use crate::scanner::BlockIndex;
use crate::scanner::CommentVault;
use crate::scanner::rewrite_regions;
use crate::scanner::template_tag_regions;

static COMMENT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)\{\{!--\s*(.*?)\s*--\}\}").expect("valid regex"));
static EACH_OPEN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\{\{#each\s+(\w+(?:\.\w+)*)\s*\}\}").expect("valid regex")
});
/// `this`, optionally followed by a property path. A trailing `.` that is
/// not followed by a name is captured separately so it can be kept.
static THIS_REFERENCE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\bthis\b((?:\.\w+)+)?(\.)?").expect("valid regex"));
static LOOP_HELPER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"@(index|first|last)\b").expect("valid regex"));
static IF_OPEN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\{#if\s+(.+?)\}\}").expect("valid regex"));
static ELSE_IF: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\{else\s+if\s+(.+?)\}\}").expect("valid regex"));
static ELSE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\{\s*else\s*\}\}").expect("valid regex"));
static END_IF: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\{\s*/if\s*\}\}").expect("valid regex"));
static UNLESS_OPEN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\{#unless\s+(.+?)\}\}").expect("valid regex"));
static END_UNLESS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\{\s*/unless\s*\}\}").expect("valid regex"));
static RAW_ECHO: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)\{\{\{(.+?)\}\}\}").expect("valid regex"));
static ECHO: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)\{\{([^{].*?)\}\}").expect("valid regex"));
/// Inner text of tags the echo pass must leave alone: comments, block tags
/// and leftover `else` tags.
static NOT_AN_ECHO: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(?:--|[#/!]|else\b)").expect("valid regex"));

const EACH_OPEN_PREFIX: &str = "{{#each";
const EACH_CLOSE: &str = "{{/each}}";

/// Convert merge tag syntax to Blade directive syntax.
///
/// Text that is not merge tag syntax, including Blade that is already
/// present, passes through unchanged.
///
/// ```
/// use tagshift_core::convert_to_blade;
///
/// assert_eq!(convert_to_blade("Hi {{user.name}}"), "Hi {{ $user->name }}");
/// assert_eq!(
/// 	convert_to_blade("{{#each users}}{{this.email}}{{/each}}"),
/// 	"@foreach($users as $user){{ $user->email }}@endforeach",
/// );
/// ```
pub fn convert_to_blade(source: &str) -> String {
	convert_to_blade_with_diagnostics(source).output
}

/// Convert merge tag syntax to Blade and report fragments that could not be
/// converted.
pub fn convert_to_blade_with_diagnostics(source: &str) -> Conversion {
	let mut vault = CommentVault::for_source(source);
	let mut diagnostics = Vec::new();

	let content = convert_comments(source, &mut vault);
	let content = convert_loops(&content, source, &vault, &mut diagnostics);
	let content = convert_conditionals(&content);
	let content = convert_raw_echoes(&content);
	let content = convert_echoes(&content);

	tracing::debug!(
		bytes = source.len(),
		diagnostics = diagnostics.len(),
		"converted merge tags to blade"
	);

	Conversion {
		output: vault.restore(&content),
		diagnostics,
	}
}

fn convert_comments(content: &str, vault: &mut CommentVault) -> String {
	COMMENT
		.replace_all(content, |caps: &Captures<'_>| {
			vault.seal(caps.get_match(), format!("{{{{-- {} --}}}}", &caps[1]))
		})
		.into_owned()
}

fn convert_loops(
	content: &str,
	source: &str,
	vault: &CommentVault,
	diagnostics: &mut Vec<ConversionDiagnostic>,
) -> String {
	let index = BlockIndex::new(content, EACH_OPEN_PREFIX, EACH_CLOSE);
	let mut pass = LoopPass::with_capacity(content.len());
	rewrite_loops(content, 0, &index, &mut pass);
	pass.finish(source, vault, diagnostics)
}

/// Convert every `{{#each}}` block in `content`, which starts at byte `base`
/// of the text `index` was built from.
///
/// Text between blocks is written with its `this` references bound to the
/// innermost enclosing loop. Each block body recurses with the block's item
/// pushed, so a `this` always binds to the nearest loop.
fn rewrite_loops(content: &str, base: usize, index: &BlockIndex, pass: &mut LoopPass) {
	let mut cursor = 0;

	while let Some(caps) = EACH_OPEN.captures_at(content, cursor) {
		let opener = caps.get_match();
		let collection = &caps[1];

		let Some(body_end) = index
			.matching_close(base + opener.end(), base + content.len())
			.map(|close| close - base)
		else {
			pass.findings.push(LoopFinding::Unclosed {
				offset: base + opener.start(),
				collection: collection.to_string(),
			});
			break;
		};

		let name = collection.rsplit('.').next().unwrap_or(collection);
		let item = item_variable_name(name);
		let collection_expression = resolve_collection(collection, &pass.stack);

		write_body_text(&content[cursor..opener.start()], pass);
		pass.output.push_str(&format!("@foreach({collection_expression} as ${item})"));

		pass.stack.push(item);
		rewrite_loops(
			&content[opener.end()..body_end],
			base + opener.end(),
			index,
			pass,
		);
		pass.stack.pop();

		pass.output.push_str("@endforeach");
		cursor = body_end + EACH_CLOSE.len();
	}

	write_body_text(&content[cursor..], pass);
}

/// Blade expression for a loop collection. `this` and `this.*` resolve
/// against the innermost enclosing loop.
fn resolve_collection(collection: &str, stack: &LoopStack) -> String {
	let Some(enclosing) = stack.innermost() else {
		return to_blade_expression(collection);
	};

	if collection == "this" {
		return format!("${enclosing}");
	}

	match collection.strip_prefix("this.") {
		Some(path) => blade_property_path(enclosing, path),
		None => to_blade_expression(collection),
	}
}

/// Write `text` with `this` and the loop helpers inside its merge tags bound
/// to the innermost loop. Outside any loop the text is copied as is.
fn write_body_text(text: &str, pass: &mut LoopPass) {
	let Some(item) = pass.stack.innermost() else {
		pass.output.push_str(text);
		return;
	};
	let regions = template_tag_regions(text);

	let rewritten = rewrite_regions(text, &regions, |_, tag| {
		let tag = THIS_REFERENCE.replace_all(tag, |caps: &Captures<'_>| {
			match (caps.get(1), caps.get(2)) {
				(Some(path), trailing) => {
					let mut reference = blade_property_path(item, path.as_str());
					if trailing.is_some() {
						reference.push('.');
					}
					reference
				}
				// `this.` with nothing after the dot.
				(None, Some(_)) => caps[0].to_string(),
				(None, None) => format!("${item}"),
			}
		});

		LOOP_HELPER
			.replace_all(&tag, "$$loop->${1}")
			.into_owned()
	});

	pass.output.push_str(&rewritten);
}

fn convert_conditionals(content: &str) -> String {
	let content = IF_OPEN.replace_all(content, |caps: &Captures<'_>| {
		format!("@if({})", to_blade_expression(&caps[1]))
	});
	let content = ELSE_IF.replace_all(&content, |caps: &Captures<'_>| {
		format!("@elseif({})", to_blade_expression(&caps[1]))
	});
	let content = ELSE.replace_all(&content, "@else");
	let content = END_IF.replace_all(&content, "@endif");
	let content = UNLESS_OPEN.replace_all(&content, |caps: &Captures<'_>| {
		format!("@unless({})", to_blade_expression(&caps[1]))
	});
	let content = END_UNLESS.replace_all(&content, "@endunless");

	content.into_owned()
}

fn convert_raw_echoes(content: &str) -> String {
	RAW_ECHO
		.replace_all(content, |caps: &Captures<'_>| {
			format!("{{!! {} !!}}", to_blade_expression(&caps[1]))
		})
		.into_owned()
}

fn convert_echoes(content: &str) -> String {
	ECHO.replace_all(content, |caps: &Captures<'_>| {
		let inner = caps[1].trim();
		if NOT_AN_ECHO.is_match(inner) {
			caps[0].to_string()
		} else {
			format!("{{{{ {} }}}}", to_blade_expression(inner))
		}
	})
	.into_owned()
}
