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

//! API to create a new book.

use crate::driver::Driver;
use crate::model::NewBook;
use crate::rest::httputils::{JsonBody, RestError};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{http, Json};
use serde::Deserialize;

/// Message sent to the server to create a book.
///
/// Any `id` provided by the client is ignored because identifiers are assigned by the server.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct CreateBookRequest {
    /// Title of the new book.
    pub(crate) title: String,

    /// Author of the new book.
    pub(crate) author: String,

    /// Price of the new book.  Defaults to zero when not provided.
    #[serde(default)]
    pub(crate) price: f64,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    JsonBody(request): JsonBody<CreateBookRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let new = NewBook::new(request.title, request.author, request.price);
    let book = driver.create_book(new).await?;
    Ok((http::StatusCode::CREATED, Json(book)))
}
