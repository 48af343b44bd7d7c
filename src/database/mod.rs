/*!
 * Database module for persistent storage of admin data.
 *
 * This module provides a SQLite-backed document store holding:
 * - Video analyses (`videoAnalyses`)
 * - End-user accounts (`users`)
 * - Bookkeeping documents (`system`)
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::{DatabaseConnection, DatabaseStats};
pub use models::{Document, DocumentWrite, SortDirection};
pub use repository::{DocumentStore, Repository};
