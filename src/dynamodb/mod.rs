//! Thin wrappers over the DynamoDB SDK.
//!
//! [`DynamoDb`] owns the SDK client and exposes the handful of calls the
//! inventory store needs: table bootstrap, atomic set-or-insert updates,
//! deletes and paginated reads. [`Table`] and [`Schema`] describe a table's
//! key layout and its global secondary indexes so it can be created on first
//! start. [`Item`] is the raw attribute map passed in and out of those calls.
//!
//! The client is built from an `aws_config::SdkConfig`, so credentials, region
//! and `AWS_ENDPOINT_URL` (for DynamoDB Local) come from the usual AWS
//! environment variables.

mod client;
mod item;
mod schema;
mod table;

pub use client::{DynamoDb, QueryParams, ScanParams};
pub use item::Item;
pub use schema::{FieldType, Schema};
pub use table::{SecondaryIndex, Table};
