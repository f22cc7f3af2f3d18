use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Serialize;

use crate::Conversion;
use crate::ConversionDiagnostic;
use crate::Direction;
use crate::TagshiftConfig;
use crate::TagshiftError;
use crate::TagshiftResult;

/// Reason recorded for sources whose converted content is blank.
pub const EMPTY_CONTENT: &str = "empty content";

/// A template discovered on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
	/// Absolute path of the file.
	pub path: PathBuf,
	/// Path relative to the template directory it was found in.
	pub relative: PathBuf,
	/// File name without the dialect extension
	/// (`welcome.blade.php` → `welcome`).
	pub stem: String,
}

impl TemplateFile {
	pub fn slug(&self) -> String {
		slug_from_stem(&self.stem)
	}

	pub fn file_name(&self) -> &str {
		self.path
			.file_name()
			.and_then(|name| name.to_str())
			.unwrap_or_default()
	}

	/// Whether `filter` names this template by slug, stem or file name.
	pub fn matches(&self, filter: &str) -> bool {
		let filter = filter.trim();
		self.stem == filter || self.file_name() == filter || self.slug() == slug_from_stem(filter)
	}
}

/// One template that will be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
	pub source: PathBuf,
	pub target: PathBuf,
	/// Slug of the template, unique within the plan.
	pub slug: String,
	/// Human readable name derived from the file stem.
	pub name: String,
	/// Converted content to write to `target`.
	pub content: String,
	pub diagnostics: Vec<ConversionDiagnostic>,
	/// The target already holds exactly this content.
	pub unchanged: bool,
}

/// A template that was discovered but will not be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
	pub source: PathBuf,
	pub reason: String,
}

/// Everything a conversion run would do, computed without touching the
/// target directory.
#[derive(Debug, Clone)]
pub struct ConversionPlan {
	pub direction: Direction,
	pub files: Vec<PlannedFile>,
	pub skipped: Vec<SkippedFile>,
}

impl ConversionPlan {
	/// Files whose target is missing or differs from the converted content.
	pub fn changed(&self) -> impl Iterator<Item = &PlannedFile> {
		self.files.iter().filter(|file| !file.unchanged)
	}

	pub fn diagnostic_count(&self) -> usize {
		self.files.iter().map(|file| file.diagnostics.len()).sum()
	}
}

/// Options that narrow or alter a conversion run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanOptions<'a> {
	/// Only convert the template with this slug, stem or file name.
	pub template: Option<&'a str>,
	/// Copy content without converting it.
	pub raw: bool,
}

/// A single diagnostic found by [`check_project`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckEntry {
	pub file: PathBuf,
	pub direction: Direction,
	pub diagnostic: ConversionDiagnostic,
}

/// Result of checking every template in a project.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
	/// Number of templates that were converted in memory.
	pub checked: usize,
	pub entries: Vec<CheckEntry>,
}

impl CheckReport {
	/// Returns true if no template produced a diagnostic.
	pub fn is_ok(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Find the source templates for `direction`, sorted by path.
///
/// Templates matched by the project's `.gitignore` (unless disabled) or by
/// `[exclude]` patterns are skipped.
pub fn discover_templates(
	root: &Path,
	config: &TagshiftConfig,
	direction: Direction,
) -> TagshiftResult<Vec<TemplateFile>> {
	let source_dir = root.join(config.templates.source_dir(root, direction));
	if !source_dir.is_dir() {
		return Err(TagshiftError::MissingDirectory {
			path: source_dir.display().to_string(),
		});
	}

	let extension = config.templates.source_extension(direction);
	let extension_set = build_extension_set(extension)?;
	let gitignore = if config.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(root)
	};
	let custom_exclude = build_exclude_matcher(root, &config.exclude.patterns)?;

	let mut paths = Vec::new();
	let mut visited_dirs = HashSet::new();
	walk_dir(
		&source_dir,
		&source_dir,
		&extension_set,
		&gitignore,
		&custom_exclude,
		&mut visited_dirs,
		&mut paths,
	)?;
	paths.sort();

	tracing::debug!(
		dir = %source_dir.display(),
		count = paths.len(),
		"discovered templates"
	);

	Ok(paths
		.into_iter()
		.filter_map(|path| {
			let relative = path.strip_prefix(&source_dir).ok()?.to_path_buf();
			let file_name = path.file_name()?.to_str()?;
			let stem = file_name
				.strip_suffix(extension)
				.and_then(|stem| stem.strip_suffix('.'))
				.unwrap_or(file_name)
				.to_string();
			Some(TemplateFile {
				path,
				relative,
				stem,
			})
		})
		.collect())
}

/// Keep only the templates that `filter` names.
pub fn select_templates(
	templates: Vec<TemplateFile>,
	filter: &str,
) -> TagshiftResult<Vec<TemplateFile>> {
	let selected: Vec<_> = templates
		.into_iter()
		.filter(|template| template.matches(filter))
		.collect();

	if selected.is_empty() {
		return Err(TagshiftError::TemplateNotFound(filter.to_string()));
	}

	Ok(selected)
}

/// Convert every discovered template in memory and work out where each one
/// should be written.
pub fn plan_conversions(
	root: &Path,
	config: &TagshiftConfig,
	direction: Direction,
	options: PlanOptions<'_>,
) -> TagshiftResult<ConversionPlan> {
	let mut templates = discover_templates(root, config, direction)?;
	if let Some(filter) = options.template {
		templates = select_templates(templates, filter)?;
	}

	let target_dir = root.join(config.templates.target_dir(root, direction));
	let target_extension = config.templates.target_extension(direction);
	let mut slugs = SlugRegistry::default();
	let mut files = Vec::new();
	let mut skipped = Vec::new();

	for template in templates {
		let source = normalize_line_endings(&std::fs::read_to_string(&template.path)?);
		let conversion = if options.raw {
			Conversion {
				output: source,
				diagnostics: Vec::new(),
			}
		} else {
			direction.convert(&source)
		};

		if conversion.output.trim().is_empty() {
			tracing::debug!(path = %template.path.display(), "skipping template with empty content");
			skipped.push(SkippedFile {
				source: template.path,
				reason: EMPTY_CONTENT.to_string(),
			});
			continue;
		}

		let slug = slugs.claim(&template.slug());
		let target_stem = match direction {
			Direction::ToBlade => template.stem.as_str(),
			Direction::ToMergeTags => slug.as_str(),
		};
		let target_parent = template
			.relative
			.parent()
			.map_or_else(|| target_dir.clone(), |parent| target_dir.join(parent));
		let target = target_parent.join(format!("{target_stem}.{target_extension}"));
		let unchanged = std::fs::read_to_string(&target)
			.is_ok_and(|existing| normalize_line_endings(&existing) == conversion.output);

		files.push(PlannedFile {
			source: template.path,
			target,
			name: name_from_stem(&template.stem),
			slug,
			content: conversion.output,
			diagnostics: conversion.diagnostics,
			unchanged,
		});
	}

	Ok(ConversionPlan {
		direction,
		files,
		skipped,
	})
}

/// Write the changed files of a plan, creating directories as needed.
/// Returns the number of files written.
pub fn write_conversions(plan: &ConversionPlan) -> TagshiftResult<usize> {
	let mut written = 0;

	for file in plan.changed() {
		if let Some(parent) = file.target.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&file.target, &file.content)?;
		tracing::debug!(path = %file.target.display(), "wrote template");
		written += 1;
	}

	Ok(written)
}

/// Convert every template of both dialects in memory and collect the
/// diagnostics. Dialects whose template directory does not exist are
/// skipped.
pub fn check_project(root: &Path, config: &TagshiftConfig) -> TagshiftResult<CheckReport> {
	let mut report = CheckReport::default();

	for direction in [Direction::ToBlade, Direction::ToMergeTags] {
		let templates = match discover_templates(root, config, direction) {
			Ok(templates) => templates,
			Err(TagshiftError::MissingDirectory { path }) => {
				tracing::debug!(%path, %direction, "no template directory; skipping");
				continue;
			}
			Err(error) => return Err(error),
		};

		for template in templates {
			let source = normalize_line_endings(&std::fs::read_to_string(&template.path)?);
			report.checked += 1;
			report.entries.extend(
				direction
					.convert(&source)
					.diagnostics
					.into_iter()
					.map(|diagnostic| CheckEntry {
						file: template.path.clone(),
						direction,
						diagnostic,
					}),
			);
		}
	}

	Ok(report)
}

/// Kebab case slug of a file stem: `WelcomeEmail` → `welcome-email`,
/// `order_shipped` → `order-shipped`.
pub fn slug_from_stem(stem: &str) -> String {
	split_words(stem)
		.iter()
		.map(|word| word.to_lowercase())
		.collect::<Vec<_>>()
		.join("-")
}

/// Display name of a file stem: `welcome-email` → `Welcome Email`.
pub fn name_from_stem(stem: &str) -> String {
	split_words(stem)
		.iter()
		.map(|word| {
			let mut chars = word.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

/// Split a stem into words on separators and camelCase humps. A run of
/// capitals stays one word (`HTMLEmail` → `HTML`, `Email`).
fn split_words(stem: &str) -> Vec<String> {
	let chars: Vec<char> = stem.chars().collect();
	let mut words = Vec::new();
	let mut current = String::new();

	for (index, &c) in chars.iter().enumerate() {
		if !c.is_alphanumeric() {
			if !current.is_empty() {
				words.push(std::mem::take(&mut current));
			}
			continue;
		}

		if c.is_uppercase() && !current.is_empty() {
			let previous = chars[index - 1];
			let next_is_lower = chars.get(index + 1).is_some_and(|next| next.is_lowercase());
			if previous.is_lowercase()
				|| previous.is_ascii_digit()
				|| (previous.is_uppercase() && next_is_lower)
			{
				words.push(std::mem::take(&mut current));
			}
		}

		current.push(c);
	}

	if !current.is_empty() {
		words.push(current);
	}

	words
}

/// Hands out slugs that are unique within one batch by appending `-1`,
/// `-2`, … to repeats.
#[derive(Debug, Default)]
struct SlugRegistry {
	seen: HashMap<String, usize>,
	taken: HashSet<String>,
}

impl SlugRegistry {
	fn claim(&mut self, slug: &str) -> String {
		let mut candidate = slug.to_string();

		while self.taken.contains(&candidate) {
			let counter = self.seen.entry(slug.to_string()).or_default();
			*counter += 1;
			candidate = format!("{slug}-{counter}");
		}

		self.taken.insert(candidate.clone());
		candidate
	}
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Build a `GlobSet` matching files with the given extension at any depth.
fn build_extension_set(extension: &str) -> TagshiftResult<GlobSet> {
	let pattern = format!("**/*.{extension}");
	let glob = Glob::new(&pattern).map_err(|e| {
		TagshiftError::InvalidPattern {
			pattern: pattern.clone(),
			reason: e.to_string(),
		}
	})?;

	let mut builder = GlobSetBuilder::new();
	builder.add(glob);
	builder.build().map_err(|e| {
		TagshiftError::InvalidPattern {
			pattern,
			reason: e.to_string(),
		}
	})
}

/// Build a `Gitignore` matcher from exclude patterns specified in
/// `tagshift.toml` `[exclude]`. These follow `.gitignore` syntax and are
/// applied on top of any `.gitignore` rules.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> TagshiftResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			TagshiftError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
	}
	builder.build().map_err(|e| {
		TagshiftError::InvalidPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

/// Build a `Gitignore` matcher from the project's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		if let Some(error) = builder.add(gitignore_path) {
			tracing::warn!(%error, "ignoring unreadable .gitignore");
		}
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "vendor"
}

fn walk_dir(
	source_dir: &Path,
	dir: &Path,
	extension_set: &GlobSet,
	gitignore: &Gitignore,
	custom_exclude: &Gitignore,
	visited_dirs: &mut HashSet<PathBuf>,
	files: &mut Vec<PathBuf>,
) -> TagshiftResult<()> {
	// Symlinked directories can loop back on themselves.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return Ok(());
	}

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();

		if path
			.file_name()
			.and_then(|name| name.to_str())
			.is_some_and(is_ignored_directory_name)
		{
			continue;
		}

		let is_dir = path.is_dir();

		if gitignore.matched(&path, is_dir).is_ignore()
			|| custom_exclude.matched(&path, is_dir).is_ignore()
		{
			continue;
		}

		if is_dir {
			walk_dir(
				source_dir,
				&path,
				extension_set,
				gitignore,
				custom_exclude,
				visited_dirs,
				files,
			)?;
		} else if path
			.strip_prefix(source_dir)
			.is_ok_and(|relative| extension_set.is_match(relative))
		{
			files.push(path);
		}
	}

	Ok(())
}
