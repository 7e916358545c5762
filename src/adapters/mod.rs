//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! infrastructure (file I/O, terminal output).
//!
//! Adapter categories:
//! - `persistence`: JSON order documents and the file-backed `OrderStore`
//! - `report`: Human-readable rendering of settlement results
//! - `watch`: Polls an order document and recomputes on change

pub mod persistence;
pub mod report;
pub mod watch;
