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

//! Test utilities for the business layer.

use crate::db::sqlite::{testutils::setup, SqliteBookStore};
use crate::db::testutils::BrokenBookStore;
use crate::driver::Driver;
use std::sync::Arc;

/// State of a driver backed by an in-memory database that tests can inspect.
pub(crate) struct TestContext {
    /// The database backing the driver.
    db: Arc<SqliteBookStore>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver with an empty database.
    pub(crate) async fn setup() -> Self {
        let db = Arc::new(setup().await);
        let driver = Driver::new(db.clone());
        Self { db, driver }
    }

    pub(crate) fn db(&self) -> &SqliteBookStore {
        &self.db
    }

    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }
}

/// Creates a driver whose store fails every operation.
pub(crate) fn broken_driver() -> Driver {
    Driver::new(Arc::new(BrokenBookStore::default()))
}
