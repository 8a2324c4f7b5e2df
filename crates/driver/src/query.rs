//! Translates [`Locator`] descriptors into in-page JavaScript lookups.
//!
//! Text and role locators are lowered to XPath so every lookup ends up as
//! either `querySelectorAll` or `document.evaluate`, indexed by `nth`.

use swapper::Locator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
	Css { selector: String, nth: usize },
	XPath { expr: String, nth: usize },
}

impl Query {
	pub fn from_locator(locator: &Locator) -> Self {
		match locator {
			Locator::Css { selector, nth } => Query::Css {
				selector: selector.clone(),
				nth: *nth,
			},
			Locator::XPath { expr, nth } => Query::XPath {
				expr: expr.clone(),
				nth: *nth,
			},
			Locator::Text { text, exact, nth } => Query::XPath {
				expr: text_xpath(text, *exact),
				nth: *nth,
			},
			Locator::Role { role, name, nth } => Query::XPath {
				expr: role_xpath(role, name),
				nth: *nth,
			},
		}
	}

	/// JavaScript expression evaluating to the element or `null`.
	pub fn element_js(&self) -> String {
		match self {
			Query::Css { selector, nth } => format!("(document.querySelectorAll({})[{nth}] ?? null)", js_string(selector)),
			Query::XPath { expr, nth } => format!(
				"document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotItem({nth})",
				js_string(expr)
			),
		}
	}
}

/// Innermost elements whose normalized text contains (or equals) `text`.
fn text_xpath(text: &str, exact: bool) -> String {
	let literal = xpath_literal(text);
	let test = if exact {
		format!("normalize-space(.)={literal}")
	} else {
		format!("contains(normalize-space(.),{literal})")
	};
	format!("//body//*[{test}][not(.//*[{test}])]")
}

/// Elements with an implicit or explicit ARIA role and matching accessible name.
fn role_xpath(role: &str, name: &str) -> String {
	let implicit = match role {
		"button" => "self::button or (self::input and (@type='button' or @type='submit'))",
		"link" => "self::a[@href]",
		"checkbox" => "self::input[@type='checkbox']",
		"textbox" => "self::textarea or (self::input and (not(@type) or @type='text'))",
		"heading" => "self::h1 or self::h2 or self::h3 or self::h4 or self::h5 or self::h6",
		_ => "false()",
	};
	let role = xpath_literal(role);
	let name = xpath_literal(name);
	format!("//*[({implicit}) or @role={role}][normalize-space(.)={name} or @aria-label={name} or @value={name}]")
}

/// Quotes `value` as an XPath string literal, using `concat()` when it holds
/// both quote kinds.
pub fn xpath_literal(value: &str) -> String {
	if !value.contains('\'') {
		return format!("'{value}'");
	}
	if !value.contains('"') {
		return format!("\"{value}\"");
	}
	let parts: Vec<String> = value.split('\'').map(|part| format!("'{part}'")).collect();
	format!("concat({})", parts.join(", \"'\", "))
}

pub fn js_string(value: &str) -> String {
	serde_json::Value::String(value.to_string()).to_string()
}
