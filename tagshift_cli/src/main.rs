use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tagshift_cli::Commands;
use tagshift_cli::OutputFormat;
use tagshift_cli::TagshiftCli;
use tagshift_cli::Target;
use tagshift_core::AnyEmptyResult;
use tagshift_core::ConversionDiagnostic;
use tagshift_core::ConversionPlan;
use tagshift_core::Direction;
use tagshift_core::INIT_CONFIG;
use tagshift_core::PlanOptions;
use tagshift_core::TagshiftConfig;
use tagshift_core::check_project;
use tagshift_core::normalize_line_endings;
use tagshift_core::plan_conversions;
use tagshift_core::write_conversions;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TAGSHIFT_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Paint `$text` with an `OwoColorize` style method when color is enabled.
macro_rules! colored {
	($text:expr, $style:ident) => {
		if color_enabled() {
			$text.$style().to_string()
		} else {
			$text.to_string()
		}
	};
}

fn main() {
	let args = TagshiftCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::ToBlade {
			template,
			dry_run,
			raw,
			diff,
		}) => {
			let options = PlanOptions {
				template: template.as_deref(),
				raw: *raw,
			};
			run_conversion(&args, Direction::ToBlade, options, *dry_run, *diff)
		}
		Some(Commands::ToMergeTags {
			template,
			dry_run,
			diff,
		}) => {
			let options = PlanOptions {
				template: template.as_deref(),
				raw: false,
			};
			run_conversion(&args, Direction::ToMergeTags, options, *dry_run, *diff)
		}
		Some(Commands::Convert { to, file }) => run_convert(*to, file.as_deref()),
		Some(Commands::Check { format }) => run_check(&args, *format),
		None => {
			eprintln!("No subcommand specified. Run `tagshift --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<tagshift_core::TagshiftError>() {
			Ok(tagshift_err) => {
				let report: miette::Report = (*tagshift_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr so that converted output on stdout stays clean.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &TagshiftCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn run_init(args: &TagshiftCli) -> AnyEmptyResult {
	let root = resolve_root(args);

	match TagshiftConfig::resolve_path(&root) {
		Some(existing) => {
			println!("Config file already exists: {}", existing.display());
		}
		None => {
			std::fs::create_dir_all(&root)?;
			std::fs::write(root.join("tagshift.toml"), INIT_CONFIG)?;
			println!("Created tagshift.toml");
		}
	}

	let config = TagshiftConfig::load_or_default(&root)?;
	let directories = [
		config.templates.merge_tag_path.clone(),
		config.templates.blade_dir(&root),
	];

	for directory in directories {
		let path = root.join(&directory);
		if path.is_dir() {
			println!("Template directory already exists: {}", directory.display());
		} else {
			std::fs::create_dir_all(&path)?;
			println!("Created template directory: {}", directory.display());
		}
	}

	println!();
	println!("Next steps:");
	println!(
		"  1. Put merge tag templates (`{{{{user.name}}}}`) in {}",
		config.templates.merge_tag_path.display()
	);
	println!("  2. Run `tagshift to-blade` to generate the matching Blade views");
	println!("  3. Run `tagshift check` in CI to catch templates that cannot be converted");

	Ok(())
}

fn run_conversion(
	args: &TagshiftCli,
	direction: Direction,
	options: PlanOptions<'_>,
	dry_run: bool,
	show_diff: bool,
) -> AnyEmptyResult {
	let root = resolve_root(args);
	let config = TagshiftConfig::load_or_default(&root)?;
	let plan = plan_conversions(&root, &config, direction, options)?;

	report_plan_warnings(&plan, &root);

	if plan.files.is_empty() && plan.skipped.is_empty() {
		println!(
			"No templates found in {}.",
			config.templates.source_dir(&root, direction).display()
		);
		return Ok(());
	}

	let changed: Vec<_> = plan.changed().collect();
	if changed.is_empty() {
		println!("All converted templates are already up to date.");
		return Ok(());
	}

	if show_diff {
		for file in &changed {
			let current = std::fs::read_to_string(&file.target)
				.map(|existing| normalize_line_endings(&existing))
				.unwrap_or_default();
			eprintln!("{}", colored!(make_relative(&file.target, &root), bold));
			print_diff(&current, &file.content);
		}
	}

	if dry_run {
		println!(
			"Dry run: would write {} file(s) as {direction}:",
			changed.len()
		);
		for file in &changed {
			println!(
				"  {} -> {}",
				make_relative(&file.source, &root),
				make_relative(&file.target, &root)
			);
		}
		return Ok(());
	}

	let written = write_conversions(&plan)?;
	println!("Converted {written} template(s) to {direction}.");

	if args.verbose {
		for file in &changed {
			println!(
				"  {} -> {} ({})",
				make_relative(&file.source, &root),
				make_relative(&file.target, &root),
				file.name
			);
		}
	}

	Ok(())
}

/// Report skipped files and conversion diagnostics for a plan. Neither
/// prevents the remaining files from being written.
fn report_plan_warnings(plan: &ConversionPlan, root: &Path) {
	for skipped in &plan.skipped {
		eprintln!(
			"{} skipped {}: {}",
			colored!("warning:", yellow),
			make_relative(&skipped.source, root),
			skipped.reason
		);
	}

	for file in &plan.files {
		let rel = make_relative(&file.source, root);
		for diagnostic in &file.diagnostics {
			let report = diagnostic_to_report(diagnostic, &rel);
			eprintln!("{report:?}");
		}
	}
}

fn run_convert(target: Target, file: Option<&Path>) -> AnyEmptyResult {
	let (name, source) = match file {
		Some(path) => (path.display().to_string(), std::fs::read_to_string(path)?),
		None => {
			let mut source = String::new();
			std::io::stdin().read_to_string(&mut source)?;
			("<stdin>".to_string(), source)
		}
	};

	let conversion = Direction::from(target).convert(&normalize_line_endings(&source));

	for diagnostic in &conversion.diagnostics {
		eprintln!("{} {name}:{diagnostic}", colored!("warning:", yellow));
	}

	let mut stdout = std::io::stdout().lock();
	stdout.write_all(conversion.output.as_bytes())?;
	stdout.flush()?;

	Ok(())
}

fn run_check(args: &TagshiftCli, format: OutputFormat) -> AnyEmptyResult {
	let root = resolve_root(args);
	let config = TagshiftConfig::load_or_default(&root)?;
	let report = check_project(&root, &config)?;

	if report.is_ok() {
		match format {
			OutputFormat::Json => {
				let output = serde_json::json!({
					"ok": true,
					"checked": report.checked,
					"diagnostics": [],
				});
				println!("{output}");
			}
			OutputFormat::Github => {
				println!("All templates convert cleanly.");
			}
			OutputFormat::Text => {
				println!(
					"Check passed: {} template(s) convert cleanly.",
					report.checked
				);
			}
		}
		return Ok(());
	}

	let summary = format!(
		"{} fragment(s) could not be converted across {} template(s).",
		report.entries.len(),
		report.checked
	);

	match format {
		OutputFormat::Json => {
			let entries: Vec<serde_json::Value> = report
				.entries
				.iter()
				.map(|entry| {
					serde_json::json!({
						"file": make_relative(&entry.file, &root),
						"direction": entry.direction,
						"line": entry.diagnostic.line(),
						"column": entry.diagnostic.column(),
						"message": entry.diagnostic.message(),
						"diagnostic": entry.diagnostic,
					})
				})
				.collect();
			let output = serde_json::json!({
				"ok": false,
				"checked": report.checked,
				"diagnostics": entries,
			});
			println!("{output}");
		}
		OutputFormat::Github => {
			for entry in &report.entries {
				println!(
					"::warning file={},line={},col={}::{}",
					make_relative(&entry.file, &root),
					entry.diagnostic.line(),
					entry.diagnostic.column(),
					entry.diagnostic.message()
				);
			}
			eprintln!("{summary}");
		}
		OutputFormat::Text => {
			eprintln!("Check failed.");
			eprintln!();
			for entry in &report.entries {
				eprintln!(
					"  {} {}:{} ({})",
					colored!("warning:", yellow),
					make_relative(&entry.file, &root),
					entry.diagnostic,
					entry.direction
				);
				if args.verbose {
					eprintln!("    help: {}", entry.diagnostic.help());
				}
			}
			eprintln!();
			eprintln!("{summary}");
		}
	}

	process::exit(1);
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

/// Convert a `ConversionDiagnostic` into a warning `miette::Report` with an
/// error code and help text for rich terminal display.
fn diagnostic_to_report(diagnostic: &ConversionDiagnostic, rel_path: &str) -> miette::Report {
	let location = format!("{rel_path}:{}:{}", diagnostic.line(), diagnostic.column());
	let message = format!("[{location}] {}", diagnostic.message());
	let code = match diagnostic {
		ConversionDiagnostic::UnclosedLoop { .. } => "tagshift::unclosed_loop",
		ConversionDiagnostic::UnterminatedDirective { .. } => "tagshift::unterminated_directive",
		ConversionDiagnostic::OuterLoopReference { .. } => "tagshift::outer_loop_reference",
		_ => "tagshift::diagnostic",
	};

	let diag_value = miette::MietteDiagnostic::new(message)
		.with_code(code)
		.with_help(diagnostic.help())
		.with_severity(miette::Severity::Warning);
	miette::Report::new(diag_value)
}
