mod common;

use clap::Parser;
use serde_json::Value;
use tagshift_cli::Commands;
use tagshift_cli::OutputFormat;
use tagshift_cli::TagshiftCli;
use tagshift_core::AnyEmptyResult;

#[test]
fn check_passes_when_everything_converts() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("templates"))?;
	std::fs::write(
		tmp.path().join("templates/welcome.html"),
		"Hi {{name}}{{#each items}}{{this}}{{/each}}",
	)?;

	common::tagshift_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"Check passed: 1 template(s) convert cleanly.",
		));

	Ok(())
}

#[test]
fn check_with_no_template_directories() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::tagshift_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Check passed: 0 template(s)"));

	Ok(())
}

#[test]
fn check_fails_on_unclosed_loop() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("templates"))?;
	std::fs::write(
		tmp.path().join("templates/broken.html"),
		"Hi\n  {{#each items}}{{this}}",
	)?;

	common::tagshift_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("Check failed."))
		.stderr(predicates::str::contains(
			"templates/broken.html:2:3: loop over `items` is never closed",
		))
		.stderr(predicates::str::contains(
			"1 fragment(s) could not be converted across 1 template(s).",
		));

	Ok(())
}

#[test]
fn check_verbose_shows_help() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("templates"))?;
	std::fs::write(tmp.path().join("templates/broken.html"), "{{#each items}}")?;

	common::tagshift_cmd()
		.arg("check")
		.arg("--verbose")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains(
			"help: close the loop with `{{/each}}` or `@endforeach`",
		));

	Ok(())
}

#[test]
fn check_json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("templates"))?;
	std::fs::write(tmp.path().join("templates/broken.html"), "{{#each items}}")?;

	let output = common::tagshift_cmd()
		.arg("check")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.get_output()
		.stdout
		.clone();

	let json: Value = serde_json::from_slice(&output)?;
	assert_eq!(json["ok"], Value::Bool(false));
	assert_eq!(json["checked"], 1);

	let entry = &json["diagnostics"][0];
	assert_eq!(entry["file"], "templates/broken.html");
	assert_eq!(entry["direction"], "to-blade");
	assert_eq!(entry["line"], 1);
	assert_eq!(entry["column"], 1);
	assert_eq!(entry["diagnostic"]["kind"], "unclosed_loop");
	assert_eq!(entry["diagnostic"]["collection"], "items");

	Ok(())
}

#[test]
fn check_json_output_when_clean() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	let output = common::tagshift_cmd()
		.arg("check")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.get_output()
		.stdout
		.clone();

	let json: Value = serde_json::from_slice(&output)?;
	assert_eq!(json["ok"], Value::Bool(true));
	assert_eq!(json["diagnostics"], Value::Array(Vec::new()));

	Ok(())
}

#[test]
fn check_github_annotations() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let views = tmp.path().join("resources/views/emails");
	std::fs::create_dir_all(&views)?;
	std::fs::write(views.join("bad.blade.php"), "Hi\n@if($a\nText")?;

	common::tagshift_cmd()
		.arg("check")
		.arg("--format")
		.arg("github")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stdout(predicates::str::contains(
			"::warning file=resources/views/emails/bad.blade.php,line=2,col=1::`@if(` has no \
			 closing parenthesis and was not converted",
		));

	Ok(())
}

#[test]
fn check_format_is_accepted_by_cli_parser() {
	let cli = TagshiftCli::parse_from(["tagshift", "check", "--format", "github"]);
	match cli.command {
		Some(Commands::Check { format }) => {
			assert!(matches!(format, OutputFormat::Github));
		}
		_ => panic!("expected Check command"),
	}

	let cli = TagshiftCli::parse_from(["tagshift", "check"]);
	match cli.command {
		Some(Commands::Check { format }) => {
			assert!(matches!(format, OutputFormat::Text));
		}
		_ => panic!("expected Check command"),
	}
}
