use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum TagshiftError {
	#[error(transparent)]
	#[diagnostic(code(tagshift::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(tagshift::config_parse),
		help("check that tagshift.toml is valid TOML with [templates] and/or [exclude] sections")
	)]
	ConfigParse(String),

	#[error("template directory not found: `{path}`")]
	#[diagnostic(
		code(tagshift::missing_directory),
		help("create the directory, run `tagshift init`, or point [templates] in tagshift.toml at an existing folder")
	)]
	MissingDirectory { path: String },

	#[error("invalid pattern `{pattern}`: {reason}")]
	#[diagnostic(code(tagshift::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("no template matches `{0}`")]
	#[diagnostic(
		code(tagshift::template_not_found),
		help("pass a slug, a file stem (`welcome-email`) or a file name (`welcome-email.html`)")
	)]
	TemplateNotFound(String),

	#[error("unknown conversion direction: `{0}`")]
	#[diagnostic(
		code(tagshift::unknown_direction),
		help("supported directions: blade, merge-tags")
	)]
	UnknownDirection(String),
}

pub type TagshiftResult<T> = Result<T, TagshiftError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
