// src/repositories/report_repo.rs

use crate::db::connection::SqlitePool;
use crate::repositories::resolve;
use indexmap::IndexMap;
use rusqlite::params;
use std::sync::Arc;
use anyhow::{Result, Context};
use tokio::task;

pub struct ReportRepository {
	pool: Arc<SqlitePool>,
}

impl ReportRepository {
	pub fn new(pool: Arc<SqlitePool>) -> Self {
		Self { pool }
	}

	/// Vulnerability names for one product, numbered "1".."N" in insertion
	/// order. `None` when the product has never been ingested.
	pub async fn vulnerabilities_for_product(
		&self,
		product_name: &str,
	) -> Result<Option<IndexMap<String, String>>> {
		let pool = self.pool.clone();
		let product_name = product_name.to_string();

		task::spawn_blocking(move || {
			let conn = pool.get().context("Failed to get database connection")?;

			let product_id = match resolve::product_id(&conn, &product_name)? {
				Some(id) => id,
				None => return Ok(None),
			};

			let mut stmt = conn.prepare(
				"SELECT vulnerability_name
				 FROM Vulnerabilities
				 WHERE product_id = ?1
				 ORDER BY vulnerability_id",
			).context("Failed to prepare statement")?;

			let names = stmt.query_map(params![product_id], |row| row.get::<_, String>(0))?
				.collect::<rusqlite::Result<Vec<_>>>()
				.context("Failed to collect vulnerabilities")?;

			let numbered = names
				.into_iter()
				.enumerate()
				.map(|(idx, name)| ((idx + 1).to_string(), name))
				.collect::<IndexMap<_, _>>();

			Ok(Some(numbered))
		})
			.await
			.context("Failed to execute database operation")?
	}

	/// Vendors ranked by the number of their vulnerabilities carrying an
	/// impact tag that contains `needle`, highest first, capped at `limit`.
	///
	/// The substring match is case-sensitive (`instr`, not `LIKE` — SQLite's
	/// `LIKE` folds ASCII case). Rows linked to the sentinel parent never
	/// appear: id 0 has no Vendors row and the joins are inner.
	pub async fn top_vendors_by_impact(
		&self,
		needle: &str,
		limit: u32,
	) -> Result<IndexMap<String, i64>> {
		let pool = self.pool.clone();
		let needle = needle.to_string();

		task::spawn_blocking(move || {
			let conn = pool.get().context("Failed to get database connection")?;

			let mut stmt = conn.prepare(
				"SELECT v.vendor_name, COUNT(*) AS vulnerability_count
				 FROM Vendors v
				 JOIN Products p ON v.vendor_id = p.vendor_id
				 JOIN Vulnerabilities vl ON p.product_id = vl.product_id
				 JOIN Impacts i ON vl.vulnerability_id = i.vulnerability_id
				 WHERE instr(i.impact_name, ?1) > 0
				 GROUP BY v.vendor_name
				 ORDER BY vulnerability_count DESC
				 LIMIT ?2",
			).context("Failed to prepare statement")?;

			let rows = stmt.query_map(params![needle, limit], |row| {
				Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
			})?
				.collect::<rusqlite::Result<Vec<_>>>()
				.context("Failed to collect vendor ranking")?;

			Ok(rows.into_iter().collect::<IndexMap<_, _>>())
		})
			.await
			.context("Failed to execute database operation")?
	}
}
