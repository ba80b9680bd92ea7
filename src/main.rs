// src/main.rs

mod db;
mod models;
mod repositories;
mod scrape;
mod utils;

use anyhow::{Context, Result};
use db::connection::{self, SqlitePool};
use db::schema;
use log::{info, warn};
use repositories::catalog_repo::CatalogRepository;
use repositories::report_repo::ReportRepository;
use scrape::client::HttpFetcher;
use scrape::paginate;
use std::path::Path;
use std::sync::Arc;

const VENDOR_LIST_URL: &str = "https://threats.kaspersky.com/en/vendor/";
const PRODUCT_LIST_URL: &str = "https://threats.kaspersky.com/en/product/";
const VULNERABILITY_LIST_URL: &str = "https://threats.kaspersky.com/en/vulnerability/";

const DEFAULT_REPORT_PRODUCT: &str = "Microsoft Windows";
// Spoofed-user-interface impact class for the vendor ranking.
const IMPACT_NEEDLE: &str = "SUI";
const TOP_VENDORS_LIMIT: u32 = 5;

struct App {
	pool: Arc<SqlitePool>,
	catalog: CatalogRepository,
	reports: ReportRepository,
}

impl App {
	fn new() -> Result<Self> {
		utils::logger::init();
		info!("Starting Kaspersky threats catalog");

		let pool = Arc::new(
			connection::establish_pool()
				.context("Failed to establish database connection pool")?,
		);

		let catalog = CatalogRepository::new(pool.clone());
		let reports = ReportRepository::new(pool.clone());

		Ok(App { pool, catalog, reports })
	}

	fn init_database(&self) -> Result<()> {
		let conn = self.pool.get().context("Failed to get database connection")?;
		schema::create_tables(&conn).context("Failed to create database tables")?;
		info!("Database tables initialized successfully");
		Ok(())
	}

	async fn crawl(&self) -> Result<()> {
		let fetcher = HttpFetcher::new().context("Failed to create HTTP client")?;

		let vendors = paginate::crawl_vendors(&fetcher, &self.catalog, VENDOR_LIST_URL).await?;
		info!("Vendor walk finished: {} new rows", vendors);

		let products = paginate::crawl_products(&fetcher, &self.catalog, PRODUCT_LIST_URL).await?;
		info!("Product walk finished: {} new rows", products);

		let vulnerabilities =
			paginate::crawl_vulnerabilities(&fetcher, &self.catalog, VULNERABILITY_LIST_URL).await?;
		info!("Vulnerability walk finished: {} new rows", vulnerabilities);

		let impacts =
			paginate::crawl_impacts(&fetcher, &self.catalog, VULNERABILITY_LIST_URL).await?;
		info!("Impact walk finished: {} new rows", impacts);

		Ok(())
	}

	async fn report(&self, product_name: &str) -> Result<()> {
		let out_dir = Path::new(".");

		match self.reports.vulnerabilities_for_product(product_name).await? {
			Some(vulnerabilities) => {
				utils::json_export::write_product_vulnerabilities(
					out_dir,
					product_name,
					&vulnerabilities,
				)?;
			}
			None => warn!("No product found with name '{}'", product_name),
		}

		let top_vendors = self
			.reports
			.top_vendors_by_impact(IMPACT_NEEDLE, TOP_VENDORS_LIMIT)
			.await?;
		utils::json_export::write_top_vendors(out_dir, &top_vendors)?;

		Ok(())
	}

	async fn run(&self, reports_only: bool, product_name: &str) -> Result<()> {
		self.init_database()?;

		let known = self.catalog.vulnerability_count().await?;
		info!("Database contains {} vulnerabilities", known);

		if !reports_only {
			self.crawl().await?;
		}

		self.report(product_name).await
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let args: Vec<String> = std::env::args().skip(1).collect();
	let reports_only = args.iter().any(|arg| arg == "--reports-only");
	let product_name = args
		.iter()
		.find(|arg| !arg.starts_with("--"))
		.cloned()
		.unwrap_or_else(|| DEFAULT_REPORT_PRODUCT.to_string());

	let app = App::new()?;
	app.run(reports_only, &product_name).await
}
