use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::Direction;
use crate::TagshiftError;
use crate::TagshiftResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["tagshift.toml", ".tagshift.toml", ".config/tagshift.toml"];

/// Directories searched for Blade views when no config file names one.
pub const DEFAULT_BLADE_CANDIDATES: [&str; 4] = [
	"resources/views/emails",
	"resources/views/mails",
	"resources/views/email",
	"resources/views/mail",
];

pub const DEFAULT_MERGE_TAG_PATH: &str = "templates";
pub const DEFAULT_MERGE_TAG_EXTENSION: &str = "html";
pub const DEFAULT_BLADE_EXTENSION: &str = "blade.php";

/// Configuration loaded from a `tagshift.toml` file.
///
/// ```toml
/// [templates]
/// merge_tag_path = "templates"
/// blade_path = "resources/views/emails"
/// merge_tag_extension = "html"
/// blade_extension = "blade.php"
///
/// [exclude]
/// patterns = ["drafts/", "*.wip.html"]
///
/// disable_gitignore = false
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct TagshiftConfig {
	/// Where templates of each dialect live.
	#[serde(default)]
	pub templates: TemplatesConfig,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// When true, `.gitignore` files are not used for filtering. By default
	/// (`false`), templates that git would ignore are skipped.
	#[serde(default)]
	pub disable_gitignore: bool,
}

/// Template directories and file extensions for both dialects.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TemplatesConfig {
	/// Directory holding merge tag templates, relative to the project root.
	#[serde(default = "default_merge_tag_path")]
	pub merge_tag_path: PathBuf,
	/// Directory holding Blade views. When unset, the first existing
	/// directory from [`DEFAULT_BLADE_CANDIDATES`] is used.
	#[serde(default)]
	pub blade_path: Option<PathBuf>,
	#[serde(default = "default_merge_tag_extension")]
	pub merge_tag_extension: String,
	#[serde(default = "default_blade_extension")]
	pub blade_extension: String,
}

impl Default for TemplatesConfig {
	fn default() -> Self {
		Self {
			merge_tag_path: default_merge_tag_path(),
			blade_path: None,
			merge_tag_extension: default_merge_tag_extension(),
			blade_extension: default_blade_extension(),
		}
	}
}

impl TemplatesConfig {
	/// The Blade directory relative to `root`: the configured one, or the
	/// first default candidate that exists, or the first default candidate.
	pub fn blade_dir(&self, root: &Path) -> PathBuf {
		if let Some(path) = &self.blade_path {
			return path.clone();
		}

		DEFAULT_BLADE_CANDIDATES
			.iter()
			.map(PathBuf::from)
			.find(|candidate| root.join(candidate).is_dir())
			.unwrap_or_else(|| PathBuf::from(DEFAULT_BLADE_CANDIDATES[0]))
	}

	/// Directory that templates are read from when converting in `direction`.
	pub fn source_dir(&self, root: &Path, direction: Direction) -> PathBuf {
		match direction {
			Direction::ToBlade => self.merge_tag_path.clone(),
			Direction::ToMergeTags => self.blade_dir(root),
		}
	}

	/// Directory that converted templates are written to.
	pub fn target_dir(&self, root: &Path, direction: Direction) -> PathBuf {
		self.source_dir(root, direction.reverse())
	}

	/// File extension (without the leading dot) of source templates.
	pub fn source_extension(&self, direction: Direction) -> &str {
		match direction {
			Direction::ToBlade => self.merge_tag_extension.trim_start_matches('.'),
			Direction::ToMergeTags => self.blade_extension.trim_start_matches('.'),
		}
	}

	/// File extension (without the leading dot) of converted templates.
	pub fn target_extension(&self, direction: Direction) -> &str {
		self.source_extension(direction.reverse())
	}
}

/// Files to leave out of discovery.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ExcludeConfig {
	/// Gitignore-style patterns relative to the project root.
	///
	/// Examples: `"drafts/"`, `"*.wip.html"`, `"!keep.html"`.
	#[serde(default)]
	pub patterns: Vec<String>,
}

fn default_merge_tag_path() -> PathBuf {
	PathBuf::from(DEFAULT_MERGE_TAG_PATH)
}

fn default_merge_tag_extension() -> String {
	DEFAULT_MERGE_TAG_EXTENSION.to_string()
}

fn default_blade_extension() -> String {
	DEFAULT_BLADE_EXTENSION.to_string()
}

impl TagshiftConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> TagshiftResult<Option<TagshiftConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		tracing::debug!(path = %config_path.display(), "loading config");
		let content = std::fs::read_to_string(&config_path)?;
		let config: TagshiftConfig =
			toml::from_str(&content).map_err(|e| TagshiftError::ConfigParse(e.to_string()))?;

		Ok(Some(config))
	}

	/// Load the config at `root`, falling back to defaults when there is no
	/// config file.
	pub fn load_or_default(root: &Path) -> TagshiftResult<TagshiftConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}
}

/// Starter config written by `tagshift init`.
pub const INIT_CONFIG: &str = r#"# tagshift configuration

[templates]
# Merge tag (`{{user.name}}`) templates.
merge_tag_path = "templates"
# Blade (`{{ $user->name }}`) views.
blade_path = "resources/views/emails"
merge_tag_extension = "html"
blade_extension = "blade.php"

[exclude]
patterns = []
"#;
