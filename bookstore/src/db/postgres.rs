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

//! Implementation of the database abstraction using PostgreSQL.

use crate::db::{ensure_one_insert, new_book_id, schema_statements, BookStore, DbError, DbResult};
use crate::env::{get_optional_var, get_required_var};
use crate::model::{Book, BookId, NewBook};
use async_trait::async_trait;
use derivative::Derivative;
use futures::{Future, TryStreamExt};
use log::{debug, warn};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::Row;
use std::time::Duration;

/// Schema to use to initialize the production database.
const SCHEMA: &str = include_str!("postgres.sql");

/// Default value for the `max_retries` configuration property.
const DEFAULT_MAX_RETRIES: u16 = 60;

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::Database(e) => match e.code().as_deref() {
            Some("23505") /* unique_violation */ => DbError::AlreadyExists,
            Some("53300") /* too_many_connections */ => DbError::Unavailable,
            Some(number) => DbError::BackendError(format!("pgsql error {}: {}", number, e)),
            None => DbError::BackendError(e.to_string()),
        },
        sqlx::Error::PoolTimedOut => DbError::Unavailable,
        sqlx::Error::RowNotFound => DbError::NotFound,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Options to establish a connection to a PostgreSQL database.
#[derive(Derivative)]
#[derivative(Debug, Default)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct PostgresOptions {
    /// Host to connect to.
    pub host: String,

    /// Port to connect to (typically 5432).
    pub port: u16,

    /// Database name to connect to.
    pub database: String,

    /// Username to establish the connection with.
    pub username: String,

    /// Password to establish the connection with.
    #[derivative(Debug = "ignore")]
    pub password: String,

    /// Minimum number of connections to keep open against the database.
    pub min_connections: Option<u32>,

    /// Maximum number of connections to allow against the database.
    pub max_connections: Option<u32>,

    /// Number of times to retry acquiring a connection while the database is unavailable.
    pub max_retries: u16,
}

impl PostgresOptions {
    /// Initializes a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_HOST`, `<prefix>_PORT`, `<prefix>_DATABASE`,
    /// `<prefix>_USERNAME`, `<prefix>_PASSWORD`, `<prefix>_MIN_CONNECTIONS`,
    /// `<prefix>_MAX_CONNECTIONS` and `<prefix>_MAX_RETRIES`.
    pub fn from_env(prefix: &str) -> Result<PostgresOptions, String> {
        Ok(PostgresOptions {
            host: get_required_var::<String>(prefix, "HOST")?,
            port: get_required_var::<u16>(prefix, "PORT")?,
            database: get_required_var::<String>(prefix, "DATABASE")?,
            username: get_required_var::<String>(prefix, "USERNAME")?,
            password: get_required_var::<String>(prefix, "PASSWORD")?,
            min_connections: get_optional_var::<u32>(prefix, "MIN_CONNECTIONS")?,
            max_connections: get_optional_var::<u32>(prefix, "MAX_CONNECTIONS")?,
            max_retries: get_optional_var::<u16>(prefix, "MAX_RETRIES")?
                .unwrap_or(DEFAULT_MAX_RETRIES),
        })
    }
}

/// Retries a database operation up to `retries` times while the database reports that it is
/// unavailable.
async fn retry<Op, OpFut, T>(op: Op, mut retries: u16) -> DbResult<T>
where
    Op: Fn() -> OpFut,
    OpFut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut delay = Duration::from_millis(100 + u64::from(rand::random::<u16>() % 900));
    loop {
        match op().await.map_err(map_sqlx_error) {
            Ok(result) => return Ok(result),
            Err(DbError::Unavailable) => {
                if retries == 0 {
                    return Err(DbError::Unavailable);
                }
                retries -= 1;

                warn!(
                    "Database is unavailable; waiting {}ms before retrying with {} attempts left",
                    delay.as_millis(),
                    retries
                );

                tokio::time::sleep(delay).await;
                if delay < Duration::from_secs(5) {
                    delay += Duration::from_millis(u64::from(rand::random::<u16>() % 1000));
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Converts a row from the `books` table into a `Book`.
fn row_to_book(row: PgRow) -> DbResult<Book> {
    let id: String = row.try_get("id").map_err(map_sqlx_error)?;
    let title: String = row.try_get("title").map_err(map_sqlx_error)?;
    let author: String = row.try_get("author").map_err(map_sqlx_error)?;
    let price: f64 = row.try_get("price").map_err(map_sqlx_error)?;
    Ok(Book::new(BookId::new(id), title, author, price))
}

/// A book store backed by a PostgreSQL database.
pub struct PostgresBookStore {
    /// Shared PostgreSQL connection pool.  This is a cloneable type that all concurrent
    /// requests can use concurrently.
    pool: PgPool,

    /// Maximum number of attempts to retry a connection operation when the database does not seem
    /// to be available.
    max_retries: u16,
}

impl Drop for PostgresBookStore {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("Dropping connection without having called close() first");
        }
    }
}

impl PostgresBookStore {
    /// Creates a new store based on a set of options.
    ///
    /// Note that this does *not* establish the connection.
    pub fn connect(opts: PostgresOptions) -> Self {
        let mut pool_options = PgPoolOptions::new();
        if let Some(min_connections) = opts.min_connections {
            pool_options = pool_options.min_connections(min_connections);
        }
        if let Some(max_connections) = opts.max_connections {
            pool_options = pool_options.max_connections(max_connections);
        }
        pool_options = pool_options.acquire_timeout(Duration::from_secs(2));

        let options = PgConnectOptions::new()
            .host(&opts.host)
            .port(opts.port)
            .database(&opts.database)
            .username(&opts.username)
            .password(&opts.password);

        let pool = pool_options.connect_lazy_with(options);
        Self { pool, max_retries: opts.max_retries }
    }

    /// Obtains a connection from the pool, waiting for the database to become available.
    async fn conn(&self) -> DbResult<PoolConnection<Postgres>> {
        retry(|| self.pool.acquire(), self.max_retries).await
    }

    /// Creates the tables needed by the store if they do not exist yet.
    pub async fn init_schema(&self) -> DbResult<()> {
        let mut conn = self.conn().await?;
        for query_str in schema_statements(SCHEMA) {
            sqlx::query(&query_str).execute(&mut *conn).await.map_err(map_sqlx_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl BookStore for PostgresBookStore {
    async fn list_books(&self) -> DbResult<Vec<Book>> {
        let mut conn = self.conn().await?;

        let query_str = "SELECT id, title, author, price FROM books";
        let mut rows = sqlx::query(query_str).fetch(&mut *conn);

        let mut books = vec![];
        while let Some(row) = rows.try_next().await.map_err(map_sqlx_error)? {
            books.push(row_to_book(row)?);
        }
        debug!("Fetched {} books", books.len());
        Ok(books)
    }

    async fn get_book_by_id(&self, id: &BookId) -> DbResult<Book> {
        let mut conn = self.conn().await?;

        let query_str = "SELECT id, title, author, price FROM books WHERE id = $1";
        let row = sqlx::query(query_str)
            .bind(id.as_str())
            .fetch_one(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
        row_to_book(row)
    }

    async fn add_book(&self, book: &NewBook) -> DbResult<BookId> {
        let mut conn = self.conn().await?;

        let id = new_book_id();
        let query_str = "INSERT INTO books (id, title, author, price) VALUES ($1, $2, $3, $4)";
        let done = sqlx::query(query_str)
            .bind(id.as_str())
            .bind(book.title())
            .bind(book.author())
            .bind(book.price())
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
        ensure_one_insert(done.rows_affected())?;
        Ok(id)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
