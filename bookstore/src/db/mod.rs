// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Database abstraction in terms of the operations needed by the service.
//!
//! The `BookStore` trait is the only view of the database that the rest of the service has.
//! PostgreSQL backs the store in production and SQLite backs it during tests.

use crate::model::{Book, BookId, NewBook};
use async_trait::async_trait;

pub mod postgres;
#[cfg(test)]
pub(crate) mod sqlite;
#[cfg(test)]
pub(crate) mod testutils;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates a failure processing the data that already exists in the database.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is not available (maybe because of too many active concurrent
    /// connections).
    #[error("Unavailable")]
    Unavailable,
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// Operations to persist and query books.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Gets all existing books.  The order of the returned books is unspecified.
    async fn list_books(&self) -> DbResult<Vec<Book>>;

    /// Gets the book identified by `id`.
    async fn get_book_by_id(&self, id: &BookId) -> DbResult<Book>;

    /// Stores `book` as a new entry and returns the identifier assigned to it.
    async fn add_book(&self, book: &NewBook) -> DbResult<BookId>;

    /// Releases the connections held by the store.
    async fn close(&self);
}

/// Generates the identifier for a book that is about to be stored.
fn new_book_id() -> BookId {
    BookId::new(uuid::Uuid::new_v4().hyphenated().to_string())
}

/// Validates that an `INSERT` statement created exactly one row.
fn ensure_one_insert(affected: u64) -> DbResult<()> {
    match affected {
        1 => Ok(()),
        n => Err(DbError::BackendError(format!("Insert created {} rows", n))),
    }
}

/// Strips comments from a `schema` and splits it into individual statements.
fn schema_statements(schema: &str) -> Vec<String> {
    let comments = regex::RegexBuilder::new("--.*$")
        .multi_line(true)
        .build()
        .expect("Hardcoded regex must be valid");
    comments
        .replace_all(schema, "")
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
