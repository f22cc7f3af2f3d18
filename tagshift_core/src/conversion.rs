use std::fmt;
use std::str::FromStr;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Serialize;

use crate::TagshiftError;
use crate::convert_to_blade_with_diagnostics;
use crate::convert_to_merge_tags_with_diagnostics;
use crate::scanner::CommentVault;
use crate::scanner::line_column;

/// A non-fatal finding produced while converting a template. The converted
/// output is always returned; diagnostics only point at fragments that were
/// left in their original syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ConversionDiagnostic {
	/// A loop opener has no matching close tag. The opener and everything
	/// after it were left unconverted by the loop pass.
	UnclosedLoop {
		collection: String,
		line: usize,
		column: usize,
	},
	/// A Blade directive's argument list never closes, so the directive was
	/// left as written.
	UnterminatedDirective {
		directive: String,
		line: usize,
		column: usize,
	},
	/// The item of an enclosing loop is used inside a nested loop. Merge tags
	/// can only reach the innermost item, so the reference was left as a
	/// top-level variable.
	OuterLoopReference {
		variable: String,
		line: usize,
		column: usize,
	},
}

impl ConversionDiagnostic {
	/// 1-indexed line in the source template.
	pub fn line(&self) -> usize {
		match self {
			Self::UnclosedLoop { line, .. }
			| Self::UnterminatedDirective { line, .. }
			| Self::OuterLoopReference { line, .. } => *line,
		}
	}

	/// 1-indexed column in the source template.
	pub fn column(&self) -> usize {
		match self {
			Self::UnclosedLoop { column, .. }
			| Self::UnterminatedDirective { column, .. }
			| Self::OuterLoopReference { column, .. } => *column,
		}
	}

	pub fn message(&self) -> String {
		match self {
			Self::UnclosedLoop { collection, .. } => {
				format!("loop over `{collection}` is never closed; loops from here on were not converted")
			}
			Self::UnterminatedDirective { directive, .. } => {
				format!("`@{directive}(` has no closing parenthesis and was not converted")
			}
			Self::OuterLoopReference { variable, .. } => {
				format!("`${variable}` belongs to an enclosing loop and was left as a top-level variable")
			}
		}
	}

	pub fn help(&self) -> &'static str {
		match self {
			Self::UnclosedLoop { .. } => "close the loop with `{{/each}}` or `@endforeach`",
			Self::UnterminatedDirective { .. } => "balance the parentheses of the directive arguments",
			Self::OuterLoopReference { .. } => {
				"merge tags cannot reach an outer loop item from a nested loop; move the value onto the \
				 inner loop's item"
			}
		}
	}
}

impl fmt::Display for ConversionDiagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}: {}", self.line(), self.column(), self.message())
	}
}

/// Output of a conversion together with any diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversion {
	/// The converted template.
	pub output: String,
	/// Fragments that could not be converted.
	pub diagnostics: Vec<ConversionDiagnostic>,
}

impl Conversion {
	/// Returns true when every construct was converted.
	pub fn is_clean(&self) -> bool {
		self.diagnostics.is_empty()
	}
}

/// Which way a template is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
	/// Merge tags (`{{user.name}}`) to Blade directives (`{{ $user->name }}`).
	ToBlade,
	/// Blade directives back to merge tags.
	ToMergeTags,
}

impl Direction {
	/// Convert `source` in this direction.
	pub fn convert(self, source: &str) -> Conversion {
		match self {
			Self::ToBlade => convert_to_blade_with_diagnostics(source),
			Self::ToMergeTags => convert_to_merge_tags_with_diagnostics(source),
		}
	}

	/// The opposite direction.
	pub fn reverse(self) -> Self {
		match self {
			Self::ToBlade => Self::ToMergeTags,
			Self::ToMergeTags => Self::ToBlade,
		}
	}
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ToBlade => write!(f, "blade"),
			Self::ToMergeTags => write!(f, "merge-tags"),
		}
	}
}

impl FromStr for Direction {
	type Err = TagshiftError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.trim().to_ascii_lowercase().as_str() {
			"blade" | "to-blade" | "directive" | "directives" => Ok(Self::ToBlade),
			"merge-tags" | "merge-tag" | "mergetags" | "to-merge-tags" | "sparkpost" => {
				Ok(Self::ToMergeTags)
			}
			_ => Err(TagshiftError::UnknownDirection(value.to_string())),
		}
	}
}

/// Item variable names of the loops that enclose the text being converted,
/// innermost last.
///
/// One stack lives for the duration of a single conversion call and is
/// threaded through the loop pass; it is empty again when the call returns.
#[derive(Debug, Default, Deref, DerefMut)]
pub struct LoopStack(Vec<String>);

impl LoopStack {
	/// The item variable of the innermost open loop.
	pub fn innermost(&self) -> Option<&str> {
		self.0.last().map(String::as_str)
	}

	/// Whether `name` is the item of an enclosing loop other than the
	/// innermost one. A name the innermost loop rebinds is not outer.
	pub fn is_outer(&self, name: &str) -> bool {
		match self.0.split_last() {
			Some((innermost, outer)) => innermost != name && outer.iter().any(|item| item == name),
			None => false,
		}
	}
}

/// State of one loop pass: the output written so far, the loops enclosing
/// the current position and everything that was left unconverted.
#[derive(Debug, Default)]
pub(crate) struct LoopPass {
	pub(crate) output: String,
	pub(crate) stack: LoopStack,
	pub(crate) findings: Vec<LoopFinding>,
}

/// Something the loop pass left in its original syntax. Offsets are byte
/// offsets in the text the pass ran over.
#[derive(Debug)]
pub(crate) enum LoopFinding {
	/// An opener without a close. It and the rest of its enclosing body were
	/// copied unchanged.
	Unclosed { offset: usize, collection: String },
	/// An outer loop item referenced from inside a nested loop.
	OuterReference { offset: usize, variable: String },
}

impl LoopPass {
	pub(crate) fn with_capacity(capacity: usize) -> Self {
		Self {
			output: String::with_capacity(capacity),
			..Self::default()
		}
	}

	/// Record the findings against the source and return the output.
	pub(crate) fn finish(
		self,
		source: &str,
		vault: &CommentVault,
		diagnostics: &mut Vec<ConversionDiagnostic>,
	) -> String {
		for finding in self.findings {
			let diagnostic = match finding {
				LoopFinding::Unclosed { offset, collection } => {
					let (line, column) = line_column(source, vault.source_position(offset));
					tracing::warn!(
						collection = %collection,
						line,
						column,
						"loop is never closed; remaining loops left unconverted"
					);
					ConversionDiagnostic::UnclosedLoop {
						collection,
						line,
						column,
					}
				}
				LoopFinding::OuterReference { offset, variable } => {
					let (line, column) = line_column(source, vault.source_position(offset));
					tracing::warn!(
						variable = %variable,
						line,
						column,
						"outer loop item used in a nested loop; left as a top-level variable"
					);
					ConversionDiagnostic::OuterLoopReference {
						variable,
						line,
						column,
					}
				}
			};
			diagnostics.push(diagnostic);
		}

		self.output
	}
}
