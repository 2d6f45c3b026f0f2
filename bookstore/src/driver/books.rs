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

//! Operations on the collection of books.

use crate::driver::{Driver, DriverResult};
use crate::model::{Book, NewBook};
use log::info;

impl Driver {
    /// Gets all existing books in no particular order.
    pub(crate) async fn get_books(self) -> DriverResult<Vec<Book>> {
        let books = self.db.list_books().await?;
        Ok(books)
    }

    /// Stores `new` as a new book and returns it with its assigned identifier.
    pub(crate) async fn create_book(self, new: NewBook) -> DriverResult<Book> {
        let id = self.db.add_book(&new).await?;
        info!("Created book {} titled '{}'", id, new.title());
        Ok(new.into_book(id))
    }
}
