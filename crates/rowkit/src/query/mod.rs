//! The query builder.
//!
//! This module provides a strongly-typed interface for constructing SQL queries
//! without manually concatenating strings. Each query type (SELECT, INSERT, UPDATE, DELETE)
//! has its own builder with chainable methods for composing clauses safely and ergonomically.
//!
//! The builders serve two audiences: the [`crate::handle::SqliteHandle`]
//! drives them with dynamic column names coming out of the mapper, while
//! application code can use the typed [`crate::expr::Col`] constants from
//! [`crate::define_entity!`].
//!
//! # Submodules
//!
//! - [`clause`] — Common clause helpers shared between different query types.
//! - [`select`] — Implementation of [`SelectQuery`].
//! - [`insert`] — Implementation of [`InsertQuery`].
//! - [`update`] — Implementation of [`UpdateQuery`].
//! - [`delete`] — Implementation of [`DeleteQuery`].

pub mod clause;
pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use delete::DeleteQuery;
pub use insert::InsertQuery;
pub use select::SelectQuery;
pub use update::UpdateQuery;
