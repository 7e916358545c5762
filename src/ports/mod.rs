//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires from
//! the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `OrderStore`: Loading and saving order documents

pub mod order_store;

pub use order_store::{OrderSet, OrderStore};
