mod common;

use std::path::Path;

use tagshift_core::AnyEmptyResult;

fn write_view(root: &Path, relative: &str, content: &str) -> AnyEmptyResult {
	let path = root.join("resources/views/emails").join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)?;
	Ok(())
}

#[test]
fn converts_views_into_merge_tag_templates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_view(
		tmp.path(),
		"WelcomeEmail.blade.php",
		"Hello {{ $user->first_name }}\n@foreach($orders as $order)\n{{ $order->total }}\n@endforeach\n",
	)?;

	common::tagshift_cmd()
		.arg("to-merge-tags")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"Converted 1 template(s) to merge-tags.",
		));

	let template = std::fs::read_to_string(tmp.path().join("templates/welcome-email.html"))?;
	similar_asserts::assert_eq!(
		template,
		"Hello {{user.first_name}}\n{{#each orders}}\n{{this.total}}\n{{/each}}\n"
	);

	Ok(())
}

#[test]
fn colliding_slugs_get_a_suffix() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_view(tmp.path(), "WelcomeEmail.blade.php", "First")?;
	write_view(tmp.path(), "welcome_email.blade.php", "Second")?;

	common::tagshift_cmd()
		.arg("to-merge-tags")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Converted 2 template(s)"));

	let templates = tmp.path().join("templates");
	assert_eq!(
		std::fs::read_to_string(templates.join("welcome-email.html"))?,
		"First"
	);
	assert_eq!(
		std::fs::read_to_string(templates.join("welcome-email-1.html"))?,
		"Second"
	);

	Ok(())
}

#[test]
fn finds_views_in_fallback_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let views = tmp.path().join("resources/views/mail");
	std::fs::create_dir_all(&views)?;
	std::fs::write(views.join("receipt.blade.php"), "Total {{ $total }}")?;

	common::tagshift_cmd()
		.arg("to-merge-tags")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("templates/receipt.html"))?,
		"Total {{total}}"
	);

	Ok(())
}

#[test]
fn configured_directories_and_extensions_are_used() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("tagshift.toml"),
		"[templates]\nmerge_tag_path = \"sparkpost\"\nblade_path = \"views\"\nmerge_tag_extension \
		 = \"hbs\"\n",
	)?;
	std::fs::create_dir_all(tmp.path().join("views"))?;
	std::fs::write(tmp.path().join("views/invite.blade.php"), "@if($ok)Yes@endif")?;

	common::tagshift_cmd()
		.arg("to-merge-tags")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("sparkpost/invite.hbs"))?,
		"{{#if ok}}Yes{{/if}}"
	);

	Ok(())
}

#[test]
fn excluded_views_are_skipped() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("tagshift.toml"),
		"[exclude]\npatterns = [\"drafts/\"]\n",
	)?;
	write_view(tmp.path(), "welcome.blade.php", "Hi")?;
	write_view(tmp.path(), "drafts/next.blade.php", "Soon")?;

	common::tagshift_cmd()
		.arg("to-merge-tags")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Converted 1 template(s)"));

	assert!(tmp.path().join("templates/welcome.html").exists());
	assert!(!tmp.path().join("templates/drafts").exists());

	Ok(())
}

#[test]
fn unterminated_directive_is_reported() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_view(tmp.path(), "broken.blade.php", "Hi\n@if($a\nText")?;

	common::tagshift_cmd()
		.arg("to-merge-tags")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("tagshift::unterminated_directive"))
		.stderr(predicates::str::contains("broken.blade.php:2:1"));

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("templates/broken.html"))?,
		"Hi\n@if($a\nText"
	);

	Ok(())
}

#[test]
fn outer_loop_reference_is_reported() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_view(
		tmp.path(),
		"orders.blade.php",
		"@foreach($orders as $order)\n@foreach($order->items as $item)\n{{ $order->id }}: {{ $item->sku \
		 }}\n@endforeach\n@endforeach",
	)?;

	common::tagshift_cmd()
		.arg("to-merge-tags")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("tagshift::outer_loop_reference"))
		.stderr(predicates::str::contains("orders.blade.php:3:4"));

	similar_asserts::assert_eq!(
		std::fs::read_to_string(tmp.path().join("templates/orders.html"))?,
		"{{#each orders}}\n{{#each this.items}}\n{{order.id}}: {{this.sku}}\n{{/each}}\n{{/each}}"
	);

	Ok(())
}

#[test]
fn empty_view_directory_reports_no_templates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("resources/views/emails"))?;

	common::tagshift_cmd()
		.arg("to-merge-tags")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No templates found"));

	Ok(())
}
