//! Per-entity-kind extraction from fetched listing and detail pages.
//!
//! Every listing page repeats one row container per record; the columns a
//! record needs are addressed here by role rather than by bare offsets at
//! the call sites. Extraction is best-effort per row: a malformed row is
//! skipped (or its product field defaulted), never a page abort.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
	static ref ROW_CONTAINER: Selector =
		Selector::parse("div.table__row").expect("valid row selector");
	static ref TITLE_LINK: Selector =
		Selector::parse("div.table__col_title a").expect("valid title selector");
	static ref COLUMN: Selector =
		Selector::parse("div.table__col").expect("valid column selector");
	static ref LINK: Selector = Selector::parse("a").expect("valid link selector");
	static ref TAG_CONTAINER: Selector =
		Selector::parse("div.tags").expect("valid tags selector");
	static ref TAG: Selector =
		Selector::parse("div.tags__tag").expect("valid tag selector");
}

// Column roles within a listing row.
const ADVISORY_COLUMN: usize = 0;
const VENDOR_COLUMN: usize = 1;
const PRODUCT_COLUMN: usize = 2;

pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Rows extracted from one listing page. `container_count` is kept separate
/// from the extracted rows: pagination ends on a page with no containers,
/// while a page whose containers are all malformed still advances the walk.
pub struct PageRows<T> {
	pub container_count: usize,
	pub rows: Vec<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VendorRow {
	pub vendor_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
	pub product_name: String,
	pub vendor_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VulnerabilityRow {
	pub kaspersky_id: String,
	pub vulnerability_name: String,
	pub product_name: String,
}

pub fn vendor_rows(body: &str) -> PageRows<VendorRow> {
	extract_rows(body, |row| {
		let vendor_name = title_text(&row)?;
		Some(VendorRow { vendor_name })
	})
}

pub fn product_rows(body: &str) -> PageRows<ProductRow> {
	extract_rows(body, |row| {
		let product_name = title_text(&row)?;
		let vendor_name = column_text(&row, VENDOR_COLUMN)?;
		Some(ProductRow { product_name, vendor_name })
	})
}

pub fn vulnerability_rows(body: &str) -> PageRows<VulnerabilityRow> {
	extract_rows(body, |row| {
		let kaspersky_id = column_text(&row, ADVISORY_COLUMN)?;
		let vulnerability_name = title_text(&row)?;
		let product_name = column_text(&row, PRODUCT_COLUMN)
			.unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());
		Some(VulnerabilityRow { kaspersky_id, vulnerability_name, product_name })
	})
}

/// Impact tag names from a vulnerability detail page. Each tag's name is
/// the text of its child nodes up to the nested hint element; the hint
/// text itself is excluded.
pub fn impact_tags(body: &str) -> Vec<String> {
	let document = Html::parse_document(body);

	let container = match document.select(&TAG_CONTAINER).next() {
		Some(container) => container,
		None => return Vec::new(),
	};

	container
		.select(&TAG)
		.map(|tag| tag_text_before_hint(&tag))
		.filter(|name| !name.is_empty())
		.collect()
}

fn extract_rows<T>(body: &str, parse_row: impl Fn(ElementRef) -> Option<T>) -> PageRows<T> {
	let document = Html::parse_document(body);

	let mut container_count = 0;
	let mut rows = Vec::new();
	for row in document.select(&ROW_CONTAINER) {
		container_count += 1;
		if let Some(parsed) = parse_row(row) {
			rows.push(parsed);
		}
	}

	PageRows { container_count, rows }
}

fn title_text(row: &ElementRef) -> Option<String> {
	row.select(&TITLE_LINK).next().map(link_text)
}

/// Link text of the n-th plain column, `None` when the column or its link
/// is missing.
fn column_text(row: &ElementRef, column: usize) -> Option<String> {
	let column = row.select(&COLUMN).nth(column)?;
	column.select(&LINK).next().map(link_text)
}

fn link_text(element: ElementRef) -> String {
	element.text().collect::<String>().trim().to_string()
}

fn tag_text_before_hint(tag: &ElementRef) -> String {
	let mut name = String::new();
	for child in tag.children() {
		if let Some(element) = ElementRef::wrap(child) {
			if has_class(&element, "hint") {
				break;
			}
			for piece in element.text() {
				name.push_str(piece.trim());
			}
		} else if let Some(text) = child.value().as_text() {
			name.push_str(text.trim());
		}
	}
	name.trim().to_string()
}

fn has_class(element: &ElementRef, class: &str) -> bool {
	element
		.value()
		.attr("class")
		.map_or(false, |attr| attr.split_whitespace().any(|c| c == class))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vendor_rows_take_title_links_and_skip_bare_containers() {
		let body = r#"
			<html><body>
				<div class="table__row">
					<div class="table__col_title"><a href="/v/1/">  Acme  </a></div>
				</div>
				<div class="table__row">
					<div class="table__col"><a href="/v/2/">not a title</a></div>
				</div>
			</body></html>
		"#;

		let page = vendor_rows(body);
		assert_eq!(page.container_count, 2);
		assert_eq!(page.rows, vec![VendorRow { vendor_name: "Acme".to_string() }]);
	}

	#[test]
	fn product_rows_need_both_title_and_vendor_links() {
		let body = r#"
			<html><body>
				<div class="table__row">
					<div class="table__col"><a>42</a></div>
					<div class="table__col_title"><a>Widget</a></div>
					<div class="table__col"><a>Acme</a></div>
				</div>
				<div class="table__row">
					<div class="table__col"><a>43</a></div>
					<div class="table__col_title"><a>Gadget</a></div>
					<div class="table__col">no link here</div>
				</div>
			</body></html>
		"#;

		let page = product_rows(body);
		assert_eq!(page.container_count, 2);
		assert_eq!(
			page.rows,
			vec![ProductRow {
				product_name: "Widget".to_string(),
				vendor_name: "Acme".to_string(),
			}],
		);
	}

	#[test]
	fn vulnerability_rows_default_the_missing_product() {
		let body = r#"
			<html><body>
				<div class="table__row">
					<div class="table__col"><a>KLA001</a></div>
					<div class="table__col_title"><a>CVE-TEST-1</a></div>
					<div class="table__col"><a>Acme</a></div>
					<div class="table__col"><a>Acme Widget</a></div>
				</div>
				<div class="table__row">
					<div class="table__col"><a>KLA002</a></div>
					<div class="table__col_title"><a>CVE-TEST-2</a></div>
				</div>
				<div class="table__row">
					<div class="table__col_title"><a>No advisory id</a></div>
				</div>
			</body></html>
		"#;

		let page = vulnerability_rows(body);
		assert_eq!(page.container_count, 3);
		assert_eq!(
			page.rows,
			vec![
				VulnerabilityRow {
					kaspersky_id: "KLA001".to_string(),
					vulnerability_name: "CVE-TEST-1".to_string(),
					product_name: "Acme Widget".to_string(),
				},
				VulnerabilityRow {
					kaspersky_id: "KLA002".to_string(),
					vulnerability_name: "CVE-TEST-2".to_string(),
					product_name: UNKNOWN_PRODUCT.to_string(),
				},
			],
		);
	}

	#[test]
	fn impact_tags_stop_at_the_hint_element() {
		let body = r#"
			<html><body>
				<div class="tags">
					<div class="tags__tag">
						SUI
						<div class="tags__hint hint">Spoofed user interface: long explanation</div>
					</div>
					<div class="tags__tag"><b>DoS</b>
						<div class="hint">Denial of service</div>
					</div>
					<div class="tags__tag">
						<div class="hint">hint only, no name</div>
					</div>
				</div>
			</body></html>
		"#;

		assert_eq!(impact_tags(body), vec!["SUI".to_string(), "DoS".to_string()]);
	}

	#[test]
	fn pages_without_containers_report_zero() {
		let page = vendor_rows("<html><body><p>nothing here</p></body></html>");
		assert_eq!(page.container_count, 0);
		assert!(page.rows.is_empty());

		assert!(impact_tags("<html><body></body></html>").is_empty());
	}
}
