// src/models/catalog.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: Option<i64>,
    pub vendor_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub vendor_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    pub vulnerability_id: Option<i64>,
    pub vulnerability_name: String,
    pub product_id: i64,
    pub kaspersky_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Impact {
    pub impact_id: Option<i64>,
    pub impact_name: String,
    pub vulnerability_id: i64,
}
