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

//! Implementation of the database abstraction using SQLite.

use crate::db::{ensure_one_insert, new_book_id, schema_statements, BookStore, DbError, DbResult};
use crate::model::{Book, BookId, NewBook};
use async_trait::async_trait;
use futures::TryStreamExt;
use log::{debug, warn};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

/// Schema to use to initialize the test database.
const SCHEMA: &str = include_str!("sqlite.sql");

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::RowNotFound => DbError::NotFound,
        e if e.to_string().contains("UNIQUE constraint failed") => DbError::AlreadyExists,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Converts a row from the `books` table into a `Book`.
fn row_to_book(row: SqliteRow) -> DbResult<Book> {
    let id: String = row.try_get("id").map_err(map_sqlx_error)?;
    let title: String = row.try_get("title").map_err(map_sqlx_error)?;
    let author: String = row.try_get("author").map_err(map_sqlx_error)?;
    let price: f64 = row.try_get("price").map_err(map_sqlx_error)?;
    Ok(Book::new(BookId::new(id), title, author, price))
}

/// A book store backed by an in-memory SQLite database.
pub(crate) struct SqliteBookStore {
    /// SQLite connection pool.  The pool holds a single connection that is never recycled because
    /// the in-memory database vanishes once its last connection is closed.
    pool: SqlitePool,
}

impl Drop for SqliteBookStore {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("Dropping connection without having called close() first");
        }
    }
}

impl SqliteBookStore {
    /// Opens a new in-memory database and initializes its schema.
    pub(crate) async fn connect() -> DbResult<Self> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(":memory:")
            .await
            .map_err(map_sqlx_error)?;
        for query_str in schema_statements(SCHEMA) {
            sqlx::query(&query_str).execute(&pool).await.map_err(map_sqlx_error)?;
        }
        Ok(Self { pool })
    }

    /// Stores `book` verbatim, including its identifier, bypassing identifier generation.
    pub(crate) async fn put_book(&self, book: &Book) -> DbResult<()> {
        let query_str = "INSERT INTO books (id, title, author, price) VALUES (?, ?, ?, ?)";
        let done = sqlx::query(query_str)
            .bind(book.id().as_str())
            .bind(book.title())
            .bind(book.author())
            .bind(book.price())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        ensure_one_insert(done.rows_affected())
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn list_books(&self) -> DbResult<Vec<Book>> {
        let query_str = "SELECT id, title, author, price FROM books";
        let mut rows = sqlx::query(query_str).fetch(&self.pool);

        let mut books = vec![];
        while let Some(row) = rows.try_next().await.map_err(map_sqlx_error)? {
            books.push(row_to_book(row)?);
        }
        debug!("Fetched {} books", books.len());
        Ok(books)
    }

    async fn get_book_by_id(&self, id: &BookId) -> DbResult<Book> {
        let query_str = "SELECT id, title, author, price FROM books WHERE id = ?";
        let row = sqlx::query(query_str)
            .bind(id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row_to_book(row)
    }

    async fn add_book(&self, book: &NewBook) -> DbResult<BookId> {
        let id = new_book_id();
        let query_str = "INSERT INTO books (id, title, author, price) VALUES (?, ?, ?, ?)";
        let done = sqlx::query(query_str)
            .bind(id.as_str())
            .bind(book.title())
            .bind(book.author())
            .bind(book.price())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        ensure_one_insert(done.rows_affected())?;
        Ok(id)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Test utilities for the SQLite store.
pub(crate) mod testutils {
    use super::*;

    /// Initializes the test database.
    pub(crate) async fn setup() -> SqliteBookStore {
        let _can_fail = env_logger::builder().is_test(true).try_init();
        SqliteBookStore::connect().await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::generate_db_tests;

    generate_db_tests!(testutils::setup().await);

    #[tokio::test]
    async fn test_put_book_duplicate_id() {
        let store = testutils::setup().await;

        let book = Book::new(BookId::new("dup".to_owned()), "T".to_owned(), "A".to_owned(), 1.0);
        store.put_book(&book).await.unwrap();
        assert_eq!(DbError::AlreadyExists, store.put_book(&book).await.unwrap_err());

        store.close().await;
    }

    #[tokio::test]
    async fn test_get_book_by_id_bad_price_type() {
        let store = testutils::setup().await;

        sqlx::query("INSERT INTO books (id, title, author, price) VALUES ('x', 'T', 'A', 'cheap')")
            .execute(&store.pool)
            .await
            .unwrap();
        match store.get_book_by_id(&BookId::new("x".to_owned())).await {
            Err(DbError::DataIntegrityError(_)) => (),
            e => panic!("Must have failed with a DataIntegrityError but got: {:?}", e),
        }

        store.close().await;
    }
}
