pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod resolver;
pub mod routes;
pub mod sources;
pub mod startup;
pub mod viewer;

use crate::resolver::Resolver;

/// AppState holds shared resources for the web server.
pub struct AppState {
    pub resolver: Resolver,
}
