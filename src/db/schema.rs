use rusqlite::Connection;
use anyhow::{Result, Context};

pub fn create_tables(conn: &Connection) -> Result<()> {
	conn.execute_batch(
		"
		CREATE TABLE IF NOT EXISTS Vendors(
			vendor_id INTEGER PRIMARY KEY AUTOINCREMENT,
			vendor_name TEXT UNIQUE NOT NULL
		);

		CREATE TABLE IF NOT EXISTS Products(
			product_id INTEGER PRIMARY KEY AUTOINCREMENT,
			product_name TEXT UNIQUE NOT NULL,
			vendor_id INTEGER NOT NULL DEFAULT 0,
			FOREIGN KEY (vendor_id) REFERENCES Vendors(vendor_id)
		);

		CREATE TABLE IF NOT EXISTS Vulnerabilities(
			vulnerability_id INTEGER PRIMARY KEY AUTOINCREMENT,
			vulnerability_name TEXT NOT NULL,
			product_id INTEGER NOT NULL DEFAULT 0,
			kaspersky_id TEXT UNIQUE NOT NULL,
			FOREIGN KEY (product_id) REFERENCES Products(product_id)
		);

		CREATE TABLE IF NOT EXISTS Impacts(
			impact_id INTEGER PRIMARY KEY AUTOINCREMENT,
			impact_name TEXT NOT NULL,
			vulnerability_id INTEGER NOT NULL,
			UNIQUE(impact_name, vulnerability_id),
			FOREIGN KEY (vulnerability_id) REFERENCES Vulnerabilities(vulnerability_id)
		);

		CREATE INDEX IF NOT EXISTS idx_products_vendor
		ON Products(vendor_id);

		CREATE INDEX IF NOT EXISTS idx_vulnerabilities_product
		ON Vulnerabilities(product_id);

		CREATE INDEX IF NOT EXISTS idx_impacts_vulnerability
		ON Impacts(vulnerability_id);
		"
	).context("Failed to create tables")?;

	Ok(())
}
