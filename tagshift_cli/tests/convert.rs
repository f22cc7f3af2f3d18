mod common;

use clap::Parser;
use tagshift_cli::Commands;
use tagshift_cli::TagshiftCli;
use tagshift_cli::Target;
use tagshift_core::AnyEmptyResult;
use tagshift_core::Direction;

#[test]
fn convert_command_is_accepted_by_cli_parser() {
	let cli = TagshiftCli::parse_from(["tagshift", "convert", "--to", "merge-tags"]);
	match cli.command {
		Some(Commands::Convert { to, file }) => {
			assert_eq!(to, Target::MergeTags);
			assert_eq!(Direction::from(to), Direction::ToMergeTags);
			assert!(file.is_none());
		}
		_ => panic!("expected Convert command"),
	}

	let cli = TagshiftCli::parse_from(["tagshift", "convert", "--to", "blade", "welcome.html"]);
	match cli.command {
		Some(Commands::Convert { to, file }) => {
			assert_eq!(Direction::from(to), Direction::ToBlade);
			assert_eq!(file, Some(std::path::PathBuf::from("welcome.html")));
		}
		_ => panic!("expected Convert command"),
	}
}

#[test]
fn converts_file_to_blade() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = tmp.path().join("welcome.html");
	std::fs::write(&path, "{{#unless user.verified}}Verify {{user.email}}{{/unless}}")?;

	common::tagshift_cmd()
		.arg("convert")
		.arg("--to")
		.arg("blade")
		.arg(&path)
		.assert()
		.success()
		.stdout("@unless($user->verified)Verify {{ $user->email }}@endunless");

	Ok(())
}

#[test]
fn converts_stdin_to_merge_tags() {
	common::tagshift_cmd()
		.arg("convert")
		.arg("--to")
		.arg("merge-tags")
		.write_stdin("{!! $footer !!}\r\n{{ $user->name }}")
		.assert()
		.success()
		.stdout("{{{footer}}}\n{{user.name}}");
}

#[test]
fn diagnostics_go_to_stderr() {
	common::tagshift_cmd()
		.arg("convert")
		.arg("--to")
		.arg("blade")
		.write_stdin("{{#each items}}{{this}}")
		.assert()
		.success()
		.stdout(predicates::str::starts_with("{{#each items}}"))
		.stderr(predicates::str::contains(
			"<stdin>:1:1: loop over `items` is never closed",
		));
}

#[test]
fn unknown_target_is_rejected() {
	common::tagshift_cmd()
		.arg("convert")
		.arg("--to")
		.arg("liquid")
		.write_stdin("{{name}}")
		.assert()
		.failure()
		.stderr(predicates::str::contains("invalid value 'liquid'"));
}

#[test]
fn missing_file_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::tagshift_cmd()
		.arg("convert")
		.arg("--to")
		.arg("blade")
		.arg(tmp.path().join("missing.html"))
		.assert()
		.code(2);

	Ok(())
}
