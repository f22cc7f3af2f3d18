use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use tagshift_core::Direction;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Move email templates between merge tag and Blade syntax.",
	long_about = "tagshift converts email templates between Handlebars style merge tags \
	              (`{{user.name}}`, `{{#each orders}}`) and Laravel Blade directives (`{{ \
	              $user->name }}`, `@foreach($orders as $order)`).\n\nQuick start:\n  tagshift \
	              init            Create tagshift.toml and the template folders\n  tagshift \
	              to-blade        Convert merge tag templates into Blade views\n  tagshift \
	              to-merge-tags   Convert Blade views into merge tag templates\n  tagshift \
	              check           Report fragments that cannot be converted"
)]
pub struct TagshiftCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output. Also raises the log level to `debug` unless
	/// `TAGSHIFT_LOG` is set.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize tagshift in a project.
	///
	/// Creates `tagshift.toml` in the project root along with the merge tag
	/// and Blade template directories it points at. Existing files and
	/// directories are left untouched.
	Init,
	/// Convert merge tag templates into Blade views.
	///
	/// Reads every merge tag template under the configured `merge_tag_path`
	/// and writes a Blade view with the same name into the Blade directory,
	/// keeping sub directories. Views that are already up to date are not
	/// rewritten.
	ToBlade {
		/// Only convert the template with this slug, file stem or file name.
		#[arg(long, short)]
		template: Option<String>,

		/// Preview which files would be written without touching the disk.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Copy templates as they are instead of converting them.
		#[arg(long, default_value_t = false)]
		raw: bool,

		/// Show a unified diff between each existing view and its converted
		/// content.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Convert Blade views into merge tag templates.
	///
	/// Reads every Blade view under the configured Blade directory and writes
	/// a merge tag template named after the view's slug into `merge_tag_path`.
	/// Slugs that collide within one run get a numeric suffix.
	ToMergeTags {
		/// Only convert the view with this slug, file stem or file name.
		#[arg(long, short)]
		template: Option<String>,

		/// Preview which files would be written without touching the disk.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Show a unified diff between each existing template and its
		/// converted content.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Convert a single file, or standard input, and print the result.
	///
	/// The converted text goes to stdout. Fragments that could not be
	/// converted are reported on stderr and do not change the exit code.
	Convert {
		/// Syntax to convert into.
		#[arg(long, value_enum)]
		to: Target,

		/// File to convert. Reads standard input when omitted.
		file: Option<PathBuf>,
	},
	/// Report fragments that cannot be converted.
	///
	/// Converts every template of both syntaxes in memory, without writing
	/// anything, and lists unclosed loops and directives whose arguments are
	/// never closed. Exits with a non-zero status code if any are found.
	Check {
		/// Output format for check results. Use `text` for human-readable
		/// output, `json` for programmatic consumption, or `github` for
		/// GitHub Actions annotations that appear inline on PRs.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption. Each entry includes the
	/// file path, the direction and the diagnostic.
	Json,
	/// GitHub Actions annotation format. Emits one `::warning` annotation
	/// per diagnostic.
	Github,
}

/// Syntax accepted by `tagshift convert --to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
	/// Blade directives and `{{ $echo }}` output.
	Blade,
	/// Handlebars style merge tags.
	MergeTags,
}

impl From<Target> for Direction {
	fn from(target: Target) -> Self {
		match target {
			Target::Blade => Direction::ToBlade,
			Target::MergeTags => Direction::ToMergeTags,
		}
	}
}
