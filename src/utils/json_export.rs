//! Writers for the two derived report files.
//!
//! Both reports are JSON objects whose key order is meaningful, so they are
//! built as `IndexMap`s and serialized as-is; serde_json leaves non-ASCII
//! characters unescaped.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::info;
use serde::Serialize;

pub fn write_product_vulnerabilities(
	dir: &Path,
	product_name: &str,
	vulnerabilities: &IndexMap<String, String>,
) -> Result<PathBuf> {
	let path = dir.join(format!("vulnerabilities_{}.json", product_name));
	write_pretty_json(&path, vulnerabilities)?;
	info!("Saved vulnerabilities for '{}' to {}", product_name, path.display());
	Ok(path)
}

pub fn write_top_vendors(dir: &Path, top_vendors: &IndexMap<String, i64>) -> Result<PathBuf> {
	let path = dir.join("top_vendors.json");
	write_pretty_json(&path, top_vendors)?;
	info!("Saved top vendors to {}", path.display());
	Ok(path)
}

fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
	let file = File::create(path)
		.with_context(|| format!("Failed to create {}", path.display()))?;
	serde_json::to_writer_pretty(BufWriter::new(file), value)
		.with_context(|| format!("Failed to write {}", path.display()))?;
	Ok(())
}
