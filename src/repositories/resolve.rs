//! Natural-key lookups shared by the upsert and report paths.
//!
//! Each helper is a single point query on a borrowed connection so that a
//! caller can run the lookup and its dependent insert on the same
//! transaction. A miss is an ordinary `None`, never an error.

use rusqlite::{params, Connection, OptionalExtension};

pub fn vendor_id(conn: &Connection, vendor_name: &str) -> rusqlite::Result<Option<i64>> {
	conn.query_row(
		"SELECT vendor_id FROM Vendors WHERE vendor_name = ?1",
		params![vendor_name],
		|row| row.get(0),
	)
	.optional()
}

pub fn product_id(conn: &Connection, product_name: &str) -> rusqlite::Result<Option<i64>> {
	conn.query_row(
		"SELECT product_id FROM Products WHERE product_name = ?1",
		params![product_name],
		|row| row.get(0),
	)
	.optional()
}

pub fn vulnerability_id(conn: &Connection, kaspersky_id: &str) -> rusqlite::Result<Option<i64>> {
	conn.query_row(
		"SELECT vulnerability_id FROM Vulnerabilities WHERE kaspersky_id = ?1",
		params![kaspersky_id],
		|row| row.get(0),
	)
	.optional()
}
