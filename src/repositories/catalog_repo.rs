// src/repositories/catalog_repo.rs

use crate::db::connection::SqlitePool;
use crate::models::catalog::{Impact, Product, Vendor, Vulnerability};
use crate::repositories::resolve;
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;
use anyhow::{Result, Context};
use tokio::task;

/// Surrogate id standing in for a parent row that has not been ingested yet.
pub const UNKNOWN_PARENT_ID: i64 = 0;

pub struct CatalogRepository {
	pool: Arc<SqlitePool>,
}

impl CatalogRepository {
	pub fn new(pool: Arc<SqlitePool>) -> Self {
		Self { pool }
	}

	/// Insert a vendor unless one with the same name already exists.
	///
	/// Returns `true` when a row was inserted, `false` on a dedup no-op.
	pub async fn upsert_vendor(&self, vendor_name: &str) -> Result<bool> {
		let pool = self.pool.clone();
		let vendor_name = vendor_name.to_string();

		task::spawn_blocking(move || {
			let mut conn = pool.get().context("Failed to get database connection")?;
			let tx = conn.transaction()?;

			if resolve::vendor_id(&tx, &vendor_name)?.is_some() {
				return Ok(false);
			}

			tx.execute(
				"INSERT INTO Vendors (vendor_name) VALUES (?1)",
				params![vendor_name],
			).context("Failed to insert vendor")?;

			tx.commit().context("Failed to commit transaction")?;
			Ok(true)
		})
			.await
			.context("Failed to execute database operation")?
	}

	/// Insert a product unless one with the same name already exists.
	///
	/// The vendor reference is resolved by name; an unseen vendor degrades
	/// to [`UNKNOWN_PARENT_ID`] instead of failing.
	pub async fn upsert_product(&self, product_name: &str, vendor_name: &str) -> Result<bool> {
		let pool = self.pool.clone();
		let product_name = product_name.to_string();
		let vendor_name = vendor_name.to_string();

		task::spawn_blocking(move || {
			let mut conn = pool.get().context("Failed to get database connection")?;
			let tx = conn.transaction()?;

			if resolve::product_id(&tx, &product_name)?.is_some() {
				return Ok(false);
			}

			let vendor_id = resolve::vendor_id(&tx, &vendor_name)?
				.unwrap_or(UNKNOWN_PARENT_ID);

			tx.execute(
				"INSERT INTO Products (product_name, vendor_id) VALUES (?1, ?2)",
				params![product_name, vendor_id],
			).context("Failed to insert product")?;

			tx.commit().context("Failed to commit transaction")?;
			Ok(true)
		})
			.await
			.context("Failed to execute database operation")?
	}

	/// Insert a vulnerability unless its advisory id is already known.
	///
	/// The advisory id is stored verbatim; the product reference degrades to
	/// [`UNKNOWN_PARENT_ID`] when the product has not been ingested.
	pub async fn upsert_vulnerability(
		&self,
		vulnerability_name: &str,
		product_name: &str,
		kaspersky_id: &str,
	) -> Result<bool> {
		let pool = self.pool.clone();
		let vulnerability_name = vulnerability_name.to_string();
		let product_name = product_name.to_string();
		let kaspersky_id = kaspersky_id.to_string();

		task::spawn_blocking(move || {
			let mut conn = pool.get().context("Failed to get database connection")?;
			let tx = conn.transaction()?;

			if resolve::vulnerability_id(&tx, &kaspersky_id)?.is_some() {
				return Ok(false);
			}

			let product_id = resolve::product_id(&tx, &product_name)?
				.unwrap_or(UNKNOWN_PARENT_ID);

			tx.execute(
				"INSERT INTO Vulnerabilities (vulnerability_name, product_id, kaspersky_id)
				 VALUES (?1, ?2, ?3)",
				params![vulnerability_name, product_id, kaspersky_id],
			).context("Failed to insert vulnerability")?;

			tx.commit().context("Failed to commit transaction")?;
			Ok(true)
		})
			.await
			.context("Failed to execute database operation")?
	}

	/// Insert an impact tag unless the (tag, vulnerability) pair is already
	/// recorded. The vulnerability is resolved by advisory id.
	pub async fn upsert_impact(&self, impact_name: &str, kaspersky_id: &str) -> Result<bool> {
		let pool = self.pool.clone();
		let impact_name = impact_name.to_string();
		let kaspersky_id = kaspersky_id.to_string();

		task::spawn_blocking(move || {
			let mut conn = pool.get().context("Failed to get database connection")?;
			let tx = conn.transaction()?;

			let vulnerability_id = resolve::vulnerability_id(&tx, &kaspersky_id)?
				.unwrap_or(UNKNOWN_PARENT_ID);

			let exists: bool = tx.query_row(
				"SELECT EXISTS(
					SELECT 1 FROM Impacts
					WHERE impact_name = ?1 AND vulnerability_id = ?2
				 )",
				params![impact_name, vulnerability_id],
				|row| row.get(0),
			)?;

			if exists {
				return Ok(false);
			}

			tx.execute(
				"INSERT INTO Impacts (impact_name, vulnerability_id) VALUES (?1, ?2)",
				params![impact_name, vulnerability_id],
			).context("Failed to insert impact")?;

			tx.commit().context("Failed to commit transaction")?;
			Ok(true)
		})
			.await
			.context("Failed to execute database operation")?
	}

	/// All stored advisory ids, in insertion order. Drives the impact
	/// detail-page walk.
	pub async fn advisory_ids(&self) -> Result<Vec<String>> {
		let pool = self.pool.clone();

		task::spawn_blocking(move || {
			let conn = pool.get().context("Failed to get database connection")?;
			let mut stmt = conn.prepare(
				"SELECT kaspersky_id FROM Vulnerabilities ORDER BY vulnerability_id",
			).context("Failed to prepare statement")?;

			let ids = stmt.query_map([], |row| row.get(0))?
				.collect::<rusqlite::Result<Vec<String>>>()
				.context("Failed to collect advisory ids")?;

			Ok(ids)
		})
			.await
			.context("Failed to execute database operation")?
	}

	pub async fn vulnerability_count(&self) -> Result<usize> {
		let pool = self.pool.clone();

		task::spawn_blocking(move || {
			let conn = pool.get().context("Failed to get database connection")?;
			let count: i64 = conn.query_row(
				"SELECT COUNT(*) FROM Vulnerabilities",
				[],
				|row| row.get(0),
			).context("Failed to count vulnerabilities")?;

			Ok(count as usize)
		})
			.await
			.context("Failed to execute database operation")?
	}

	pub async fn find_vendor(&self, vendor_name: &str) -> Result<Option<Vendor>> {
		let pool = self.pool.clone();
		let vendor_name = vendor_name.to_string();

		task::spawn_blocking(move || {
			let conn = pool.get().context("Failed to get database connection")?;
			conn.query_row(
				"SELECT vendor_id, vendor_name FROM Vendors WHERE vendor_name = ?1",
				params![vendor_name],
				|row| {
					Ok(Vendor {
						vendor_id: Some(row.get(0)?),
						vendor_name: row.get(1)?,
					})
				},
			)
			.optional()
			.context("Failed to query vendor")
		})
			.await
			.context("Failed to execute database operation")?
	}

	pub async fn find_product(&self, product_name: &str) -> Result<Option<Product>> {
		let pool = self.pool.clone();
		let product_name = product_name.to_string();

		task::spawn_blocking(move || {
			let conn = pool.get().context("Failed to get database connection")?;
			conn.query_row(
				"SELECT product_id, product_name, vendor_id
				 FROM Products
				 WHERE product_name = ?1",
				params![product_name],
				|row| {
					Ok(Product {
						product_id: Some(row.get(0)?),
						product_name: row.get(1)?,
						vendor_id: row.get(2)?,
					})
				},
			)
			.optional()
			.context("Failed to query product")
		})
			.await
			.context("Failed to execute database operation")?
	}

	pub async fn find_vulnerability(&self, kaspersky_id: &str) -> Result<Option<Vulnerability>> {
		let pool = self.pool.clone();
		let kaspersky_id = kaspersky_id.to_string();

		task::spawn_blocking(move || {
			let conn = pool.get().context("Failed to get database connection")?;
			conn.query_row(
				"SELECT vulnerability_id, vulnerability_name, product_id, kaspersky_id
				 FROM Vulnerabilities
				 WHERE kaspersky_id = ?1",
				params![kaspersky_id],
				|row| {
					Ok(Vulnerability {
						vulnerability_id: Some(row.get(0)?),
						vulnerability_name: row.get(1)?,
						product_id: row.get(2)?,
						kaspersky_id: row.get(3)?,
					})
				},
			)
			.optional()
			.context("Failed to query vulnerability")
		})
			.await
			.context("Failed to execute database operation")?
	}

	/// Impact rows for one vulnerability id, in insertion order. Orphaned
	/// rows are reachable by passing [`UNKNOWN_PARENT_ID`].
	pub async fn impacts_for_vulnerability(&self, vulnerability_id: i64) -> Result<Vec<Impact>> {
		let pool = self.pool.clone();

		task::spawn_blocking(move || {
			let conn = pool.get().context("Failed to get database connection")?;
			let mut stmt = conn.prepare(
				"SELECT impact_id, impact_name, vulnerability_id
				 FROM Impacts
				 WHERE vulnerability_id = ?1
				 ORDER BY impact_id",
			).context("Failed to prepare statement")?;

			let impacts = stmt.query_map(params![vulnerability_id], |row| {
				Ok(Impact {
					impact_id: Some(row.get(0)?),
					impact_name: row.get(1)?,
					vulnerability_id: row.get(2)?,
				})
			})?
				.collect::<rusqlite::Result<Vec<_>>>()
				.context("Failed to collect impacts")?;

			Ok(impacts)
		})
			.await
			.context("Failed to execute database operation")?
	}
}
