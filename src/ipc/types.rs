use crate::config::Config;
use crate::store::ReportStore;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub store: ReportStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: ReportStore::default(),
        }
    }
}
