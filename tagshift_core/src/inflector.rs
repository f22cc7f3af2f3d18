//! Naive English singularization used to name loop item variables.
//!
//! The rules cover the plurals that realistically show up as merge tag
//! collection names. Words that are already singular, uncountable or
//! unrecognized come back unchanged, which [`item_variable_name`] turns into
//! the `<collection>Item` fallback.

/// Words with no distinct singular form.
const UNCOUNTABLE: &[&str] = &[
	"analytics",
	"audio",
	"data",
	"deer",
	"equipment",
	"feedback",
	"fish",
	"information",
	"metadata",
	"money",
	"news",
	"police",
	"rice",
	"series",
	"sheep",
	"species",
	"staff",
	"traffic",
];

/// Plurals that the suffix rules would get wrong.
const IRREGULAR: &[(&str, &str)] = &[
	("aliases", "alias"),
	("analyses", "analysis"),
	("bonuses", "bonus"),
	("buses", "bus"),
	("caches", "cache"),
	("calves", "calf"),
	("campuses", "campus"),
	("children", "child"),
	("cookies", "cookie"),
	("criteria", "criterion"),
	("crises", "crisis"),
	("echoes", "echo"),
	("feet", "foot"),
	("geese", "goose"),
	("halves", "half"),
	("heroes", "hero"),
	("indices", "index"),
	("knives", "knife"),
	("leaves", "leaf"),
	("lives", "life"),
	("loaves", "loaf"),
	("matrices", "matrix"),
	("men", "man"),
	("mice", "mouse"),
	("movies", "movie"),
	("oxen", "ox"),
	("people", "person"),
	("phenomena", "phenomenon"),
	("potatoes", "potato"),
	("quizzes", "quiz"),
	("selves", "self"),
	("shelves", "shelf"),
	("shoes", "shoe"),
	("statuses", "status"),
	("teeth", "tooth"),
	("theses", "thesis"),
	("thieves", "thief"),
	("toes", "toe"),
	("tomatoes", "tomato"),
	("vertices", "vertex"),
	("viruses", "virus"),
	("wives", "wife"),
	("wolves", "wolf"),
	("women", "woman"),
];

/// Suffix rewrites applied when no irregular form matched. The first
/// matching suffix wins.
const SUFFIX_RULES: &[(&str, &str)] = &[
	("ies", "y"),
	("sses", "ss"),
	("xes", "x"),
	("ches", "ch"),
	("shes", "sh"),
	("zzes", "zz"),
	("oes", "o"),
];

/// Endings that mark a word as singular even though it ends in `s`.
const SINGULAR_S_ENDINGS: &[&str] = &["ss", "us", "is"];

/// Return the singular form of `word`, or `word` itself when no rule
/// applies.
///
/// ```
/// use tagshift_core::inflector::singularize;
///
/// assert_eq!(singularize("orders"), "order");
/// assert_eq!(singularize("categories"), "category");
/// assert_eq!(singularize("teamMembers"), "teamMember");
/// assert_eq!(singularize("data"), "data");
/// ```
pub fn singularize(word: &str) -> String {
	let lower = word.to_ascii_lowercase();

	if UNCOUNTABLE
		.iter()
		.any(|uncountable| ends_with_word(word, &lower, uncountable))
	{
		return word.to_string();
	}

	for (plural, singular) in IRREGULAR {
		if ends_with_word(word, &lower, plural) {
			let start = word.len() - plural.len();
			return format!("{}{}", &word[..start], match_case(&word[start..], singular));
		}
	}

	for (suffix, replacement) in SUFFIX_RULES {
		if lower.len() > suffix.len() && lower.ends_with(suffix) {
			let start = word.len() - suffix.len();
			return format!("{}{}", &word[..start], match_case(&word[start..], replacement));
		}
	}

	if SINGULAR_S_ENDINGS.iter().any(|ending| lower.ends_with(ending)) {
		return word.to_string();
	}

	match word.strip_suffix(['s', 'S']) {
		Some(stem) if !stem.is_empty() => stem.to_string(),
		_ => word.to_string(),
	}
}

/// Choose the loop item variable for a collection name: its singular form,
/// or `<collection>Item` when singularizing changes nothing.
///
/// ```
/// use tagshift_core::inflector::item_variable_name;
///
/// assert_eq!(item_variable_name("items"), "item");
/// assert_eq!(item_variable_name("users"), "user");
/// assert_eq!(item_variable_name("data"), "dataItem");
/// ```
pub fn item_variable_name(collection: &str) -> String {
	let singular = singularize(collection);
	if singular == collection {
		format!("{collection}Item")
	} else {
		singular
	}
}

/// Whether `lower` ends with `suffix` at a word boundary of the original
/// `word`: the whole word, a camelCase hump, or after `_` / `-`.
fn ends_with_word(word: &str, lower: &str, suffix: &str) -> bool {
	if !lower.ends_with(suffix) {
		return false;
	}

	let start = lower.len() - suffix.len();
	if start == 0 {
		return true;
	}

	let Some(tail) = word.get(start..) else {
		return false;
	};
	let head = &word[..start];

	tail.starts_with(|c: char| c.is_ascii_uppercase()) || head.ends_with(['_', '-'])
}

/// Give `replacement` the capitalization of the first letter of `original`.
fn match_case(original: &str, replacement: &str) -> String {
	let starts_upper = original.starts_with(|c: char| c.is_ascii_uppercase());
	if !starts_upper {
		return replacement.to_string();
	}

	let mut chars = replacement.chars();
	match chars.next() {
		Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
		None => String::new(),
	}
}
