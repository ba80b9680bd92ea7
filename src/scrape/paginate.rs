//! Sequential page walks over the listing and detail endpoints.
//!
//! Listing pages are numbered from 1 and walked until a fetch fails or a
//! fetched page has no row containers. Every extracted record is upserted
//! (and committed) before the next request goes out, so an interrupted
//! crawl can simply be rerun. Fetch problems end or skip a walk; only
//! storage faults propagate.

use anyhow::Result;
use log::{info, warn};

use crate::repositories::catalog_repo::CatalogRepository;
use crate::scrape::client::PageFetcher;
use crate::scrape::extract;

pub async fn crawl_vendors<F: PageFetcher>(
	fetcher: &F,
	repo: &CatalogRepository,
	base_url: &str,
) -> Result<usize> {
	let mut inserted = 0;
	let mut page = 1u32;

	while let Some(body) = listing_page(fetcher, base_url, "vendor", page).await {
		let extracted = extract::vendor_rows(&body);
		if extracted.container_count == 0 {
			info!("No more vendors found on page {}. Ending walk.", page);
			break;
		}

		for row in extracted.rows {
			if repo.upsert_vendor(&row.vendor_name).await? {
				inserted += 1;
			}
		}
		page += 1;
	}

	Ok(inserted)
}

pub async fn crawl_products<F: PageFetcher>(
	fetcher: &F,
	repo: &CatalogRepository,
	base_url: &str,
) -> Result<usize> {
	let mut inserted = 0;
	let mut page = 1u32;

	while let Some(body) = listing_page(fetcher, base_url, "product", page).await {
		let extracted = extract::product_rows(&body);
		if extracted.container_count == 0 {
			info!("No more products found on page {}. Ending walk.", page);
			break;
		}

		for row in extracted.rows {
			if repo.upsert_product(&row.product_name, &row.vendor_name).await? {
				inserted += 1;
			}
		}
		page += 1;
	}

	Ok(inserted)
}

pub async fn crawl_vulnerabilities<F: PageFetcher>(
	fetcher: &F,
	repo: &CatalogRepository,
	base_url: &str,
) -> Result<usize> {
	let mut inserted = 0;
	let mut page = 1u32;

	while let Some(body) = listing_page(fetcher, base_url, "vulnerability", page).await {
		let extracted = extract::vulnerability_rows(&body);
		if extracted.container_count == 0 {
			info!("No more vulnerabilities found on page {}. Ending walk.", page);
			break;
		}

		for row in extracted.rows {
			let fresh = repo
				.upsert_vulnerability(&row.vulnerability_name, &row.product_name, &row.kaspersky_id)
				.await?;
			if fresh {
				inserted += 1;
			}
		}
		page += 1;
	}

	Ok(inserted)
}

/// Walks the detail page of every stored advisory id and records its impact
/// tags. A failed detail fetch skips that advisory; the walk continues.
pub async fn crawl_impacts<F: PageFetcher>(
	fetcher: &F,
	repo: &CatalogRepository,
	base_url: &str,
) -> Result<usize> {
	let mut inserted = 0;

	for kaspersky_id in repo.advisory_ids().await? {
		let url = format!("{}{}/", base_url, kaspersky_id);
		info!("Parsing impacts on {}", url);

		let body = match fetcher.fetch(&url).await {
			Ok(page) if page.ok() => page.body,
			Ok(page) => {
				warn!(
					"Detail page for {} returned status {}. Skipping.",
					kaspersky_id, page.status
				);
				continue;
			}
			Err(e) => {
				warn!("Detail fetch for {} failed: {}. Skipping.", kaspersky_id, e);
				continue;
			}
		};

		for tag in extract::impact_tags(&body) {
			if repo.upsert_impact(&tag, &kaspersky_id).await? {
				inserted += 1;
			}
		}
	}

	Ok(inserted)
}

/// Fetches one listing page. `None` ends the walk: either the transport
/// failed or the page came back with a non-success status.
async fn listing_page<F: PageFetcher>(
	fetcher: &F,
	base_url: &str,
	entity: &str,
	page: u32,
) -> Option<String> {
	let url = format!("{}?paged={}", base_url, page);
	info!("Parsing {} listing on {}", entity, url);

	match fetcher.fetch(&url).await {
		Ok(fetched) if fetched.ok() => Some(fetched.body),
		Ok(fetched) => {
			warn!(
				"Failed to retrieve {} page {}. Status code: {}",
				entity, page, fetched.status
			);
			None
		}
		Err(e) => {
			warn!("Failed to retrieve {} page {}: {}", entity, page, e);
			None
		}
	}
}
