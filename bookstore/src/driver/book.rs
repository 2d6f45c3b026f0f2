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

//! Operations on one book.

use crate::db::DbError;
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{Book, BookId};
use log::debug;

impl Driver {
    /// Gets the book identified by `id`.
    pub(crate) async fn get_book(self, id: &BookId) -> DriverResult<Book> {
        match self.db.get_book_by_id(id).await {
            Ok(book) => Ok(book),
            Err(DbError::NotFound) => {
                debug!("Book {} does not exist", id);
                Err(DriverError::NotFound("Book not found".to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
