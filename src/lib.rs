use std::sync::Arc;

use config::Config;
use services::AccountService;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod services;
pub mod utils;

pub use router::create_router;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: AccountService,
}

impl AppState {
    pub fn new(config: Config, accounts: AccountService) -> Self {
        Self {
            config: Arc::new(config),
            accounts,
        }
    }
}
