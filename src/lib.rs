// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! StoryCraft: a backend for collaborative story writing.
//!
//! Writers sign up, create stories and fill them in through a three-step
//! wizard (title and cover, characters, chapters). Stories and users live in
//! MongoDB; uploaded images are written under the public directory.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::UploadStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub uploads: UploadStore,
}
