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

//! REST service to manage a collection of books.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use db::BookStore;
use driver::Driver;
use log::{info, warn};
use std::error::Error;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

pub mod db;
pub(crate) mod driver;
pub(crate) mod env;
use env::get_optional_var;
pub mod model;
mod rest;
use rest::app;

/// Default address to listen on when none is configured.
const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Default port to listen on when none is configured.
const DEFAULT_PORT: u16 = 3000;

/// Options to establish the listening socket of the server.
#[derive(Debug, PartialEq)]
pub struct ServeOptions {
    /// Address to bind to.
    pub host: IpAddr,

    /// Port to listen on.
    pub port: u16,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self { host: DEFAULT_HOST, port: DEFAULT_PORT }
    }
}

impl ServeOptions {
    /// Initializes a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_HOST` and `<prefix>_PORT`, both of which are
    /// optional.
    pub fn from_env(prefix: &str) -> Result<ServeOptions, String> {
        Ok(ServeOptions {
            host: get_optional_var::<IpAddr>(prefix, "HOST")?.unwrap_or(DEFAULT_HOST),
            port: get_optional_var::<u16>(prefix, "PORT")?.unwrap_or(DEFAULT_PORT),
        })
    }
}

/// Waits until the process is asked to terminate.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install signal handler; server will not stop cleanly: {}", e);
        futures::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Binds to the address in `opts` and serves `db` through the REST API until shutdown.
async fn run(opts: ServeOptions, db: Arc<dyn BookStore>) -> io::Result<()> {
    let driver = Driver::new(db);
    let app = app(driver);

    let addr = SocketAddr::new(opts.host, opts.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await
}

/// Instantiates all resources to serve the application as configured by `opts` using `db` for
/// persistence.
///
/// The store is closed once serving ends, whether it ends cleanly or not.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve(opts: ServeOptions, db: Arc<dyn BookStore>) -> Result<(), Box<dyn Error>> {
    let result = run(opts, db.clone()).await;
    db.close().await;
    result?;
    Ok(())
}
