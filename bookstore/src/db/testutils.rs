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

//! Test utilities for the database layer.

use crate::db::{BookStore, DbError, DbResult};
use crate::model::{Book, BookId, NewBook};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// Message carried by all errors returned by `BrokenBookStore`.
pub(crate) const BROKEN_STORE_ERROR: &str = "connection refused to books.internal:5432";

/// A book store whose operations all fail as if the database was unreachable.
#[derive(Default)]
pub(crate) struct BrokenBookStore {
    /// Whether `close` has been called.
    closed: AtomicBool,
}

impl BrokenBookStore {
    /// Returns true if the store has been closed.
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookStore for BrokenBookStore {
    async fn list_books(&self) -> DbResult<Vec<Book>> {
        Err(DbError::BackendError(BROKEN_STORE_ERROR.to_owned()))
    }

    async fn get_book_by_id(&self, _id: &BookId) -> DbResult<Book> {
        Err(DbError::BackendError(BROKEN_STORE_ERROR.to_owned()))
    }

    async fn add_book(&self, _book: &NewBook) -> DbResult<BookId> {
        Err(DbError::BackendError(BROKEN_STORE_ERROR.to_owned()))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
