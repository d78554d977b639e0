//! Shared application state.

use crate::config::Config;
use crate::service::SpotSearch;

pub struct AppState {
    config: Config,
    search: SpotSearch,
}

impl AppState {
    pub fn new(config: Config, search: SpotSearch) -> Self {
        Self { config, search }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn search(&self) -> &SpotSearch {
        &self.search
    }
}
