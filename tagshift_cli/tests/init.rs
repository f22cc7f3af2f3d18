mod common;

use tagshift_core::AnyEmptyResult;
use tagshift_core::INIT_CONFIG;

#[test]
fn can_init() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::tagshift_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created tagshift.toml"))
		.stdout(predicates::str::contains(
			"Created template directory: templates",
		));

	let config_content = std::fs::read_to_string(tmp.path().join("tagshift.toml"))?;
	assert_eq!(config_content, INIT_CONFIG);
	assert!(tmp.path().join("templates").is_dir());
	assert!(tmp.path().join("resources/views/emails").is_dir());

	Ok(())
}

#[test]
fn init_does_not_overwrite() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config_path = tmp.path().join("tagshift.toml");
	std::fs::write(&config_path, "# existing config\n")?;
	std::fs::create_dir_all(tmp.path().join("templates"))?;
	std::fs::write(tmp.path().join("templates/welcome.html"), "Hi")?;

	common::tagshift_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Config file already exists"))
		.stdout(predicates::str::contains(
			"Template directory already exists: templates",
		));

	assert_eq!(std::fs::read_to_string(&config_path)?, "# existing config\n");
	assert_eq!(
		std::fs::read_to_string(tmp.path().join("templates/welcome.html"))?,
		"Hi"
	);

	Ok(())
}

#[test]
fn init_uses_directories_from_existing_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(
		tmp.path().join(".config/tagshift.toml"),
		"[templates]\nmerge_tag_path = \"mail/source\"\nblade_path = \"mail/views\"\n",
	)?;

	let expected_path = tmp
		.path()
		.join(".config/tagshift.toml")
		.display()
		.to_string();

	common::tagshift_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(expected_path));

	assert!(!tmp.path().join("tagshift.toml").exists());
	assert!(tmp.path().join("mail/source").is_dir());
	assert!(tmp.path().join("mail/views").is_dir());

	Ok(())
}

#[test]
fn init_fails_on_invalid_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join(".tagshift.toml"), "[templates\n")?;

	common::tagshift_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}
