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

//! High-level data types.

use derive_getters::Getters;
use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};

/// Newtype pattern for the identifiers of the books in the store.
///
/// Identifiers are assigned by the database layer when a book is first stored and are opaque to
/// everything else.
#[derive(Clone, Constructor, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Returns a string view of the identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Contents of a book that has not been stored yet and thus lacks an identifier.
#[derive(Constructor, Getters)]
#[cfg_attr(test, derive(Clone, Debug, PartialEq))]
pub struct NewBook {
    /// Title of the book.
    title: String,

    /// Name of the book's author.
    author: String,

    /// Price of the book.  There are no restrictions on its value.
    price: f64,
}

impl NewBook {
    /// Attaches the identifier `id` to this book, converting it into a stored `Book`.
    pub fn into_book(self, id: BookId) -> Book {
        Book { id, title: self.title, author: self.author, price: self.price }
    }
}

/// A book as known by the store.
#[derive(Constructor, Getters, Serialize)]
#[cfg_attr(test, derive(Clone, Debug, Deserialize, PartialEq))]
pub struct Book {
    /// Unique identifier of the book.
    id: BookId,

    /// Title of the book.
    title: String,

    /// Name of the book's author.
    author: String,

    /// Price of the book.
    price: f64,
}
