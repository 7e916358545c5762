//! Persistence Adapters - JSON Order Documents
//!
//! Implements the `OrderStore` port over JSON files using the
//! `takerOrder` / `makerOrders` document format.

pub mod document;
pub mod json_file;

pub use document::ImportError;
pub use json_file::JsonFileStore;
