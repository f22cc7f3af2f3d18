use assert_cmd::Command;

pub fn tagshift_cmd() -> Command {
	let mut cmd = Command::cargo_bin("tagshift").expect("tagshift binary should be built");
	cmd.env("NO_COLOR", "1").env_remove("TAGSHIFT_LOG");
	cmd
}
