//! Conversion of single variable expressions between the two dialects.
//!
//! Merge tags address values with dotted paths (`user.profile.name`), Blade
//! with PHP variables and the arrow operator (`$user->profile->name`). Both
//! helpers are total: any input string produces an output string.

/// Sigil that marks a PHP variable.
pub const VARIABLE_SIGIL: char = '$';
/// PHP property access operator.
pub const PROPERTY_ACCESS: &str = "->";
/// Path separator used by merge tags.
pub const PATH_SEPARATOR: char = '.';
/// Negation operator, shared by both dialects.
pub const NEGATION: char = '!';

/// Convert a merge tag expression into a Blade expression.
///
/// ```
/// use tagshift_core::expression::to_blade_expression;
///
/// assert_eq!(to_blade_expression("name"), "$name");
/// assert_eq!(to_blade_expression("user.profile.name"), "$user->profile->name");
/// assert_eq!(to_blade_expression("!user.isActive"), "!$user->isActive");
/// assert_eq!(to_blade_expression("$loop->index"), "$loop->index");
/// ```
pub fn to_blade_expression(expression: &str) -> String {
	let (negated, expression) = split_negation(expression);

	let converted = if expression.starts_with(VARIABLE_SIGIL) {
		expression.to_string()
	} else {
		let mut segments = expression.split(PATH_SEPARATOR);
		let root = segments.next().unwrap_or_default();
		let mut converted = format!("{VARIABLE_SIGIL}{root}");
		for segment in segments {
			converted.push_str(PROPERTY_ACCESS);
			converted.push_str(segment);
		}
		converted
	};

	apply_negation(negated, converted)
}

/// Convert a Blade expression back into a merge tag expression.
///
/// Expressions that do not start with the variable sigil are assumed to be
/// merge tag syntax already and are returned unchanged (apart from trimming).
///
/// ```
/// use tagshift_core::expression::to_merge_tag_expression;
///
/// assert_eq!(to_merge_tag_expression("$name"), "name");
/// assert_eq!(to_merge_tag_expression("$user->profile->name"), "user.profile.name");
/// assert_eq!(to_merge_tag_expression("! $hidden"), "!hidden");
/// assert_eq!(to_merge_tag_expression("this.id"), "this.id");
/// ```
pub fn to_merge_tag_expression(expression: &str) -> String {
	let (negated, expression) = split_negation(expression);

	let converted = match expression.strip_prefix(VARIABLE_SIGIL) {
		Some(variable) => variable
			.split(PROPERTY_ACCESS)
			.map(str::trim)
			.collect::<Vec<_>>()
			.join("."),
		None => expression.to_string(),
	};

	apply_negation(negated, converted)
}

/// Join a root and a dotted path (`customer.name`) with the arrow operator.
pub(crate) fn blade_property_path(root: &str, path: &str) -> String {
	let mut converted = format!("{VARIABLE_SIGIL}{root}");
	for segment in path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()) {
		converted.push_str(PROPERTY_ACCESS);
		converted.push_str(segment);
	}
	converted
}

/// Turn an arrow chain (`->customer->name`) into a dotted path
/// (`.customer.name`).
pub(crate) fn merge_tag_property_path(arrows: &str) -> String {
	arrows
		.split(PROPERTY_ACCESS)
		.filter(|segment| !segment.is_empty())
		.fold(String::new(), |mut path, segment| {
			path.push(PATH_SEPARATOR);
			path.push_str(segment.trim());
			path
		})
}

fn split_negation(expression: &str) -> (bool, &str) {
	let expression = expression.trim();
	match expression.strip_prefix(NEGATION) {
		Some(rest) => (true, rest.trim_start()),
		None => (false, expression),
	}
}

fn apply_negation(negated: bool, expression: String) -> String {
	if negated {
		format!("{NEGATION}{expression}")
	} else {
		expression
	}
}
