use serde::Deserialize;

use crate::config::Settings;
use crate::grading::BandScale;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub settings: Settings,
    pub scale: BandScale,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let scale = settings.grading_scale();
        Self { settings, scale }
    }
}
