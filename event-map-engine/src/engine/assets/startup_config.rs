use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Path of the startup configuration, relative to the asset root.
pub const STARTUP_CONFIG_PATH: &str = "config.json";

pub const DEFAULT_MODEL_PATH: &str = "test-1.glb";
pub const DEFAULT_ANCHOR_PREFIX: &str = "CCTV_";

/// Startup configuration as a Bevy asset. Every field is optional in JSON.
#[derive(Asset, Debug, Clone, PartialEq, Serialize, Deserialize, TypePath, Resource)]
#[serde(default)]
pub struct StartupConfig {
    /// glTF model path relative to the asset root.
    pub model: String,
    /// Event stream endpoint. Empty or absent disables the live stream.
    pub websocket_url: Option<String>,
    /// Scene nodes whose names start with this become anchors.
    pub camera_prefix: String,
    /// Start the simulator when there is no live stream.
    pub simulate_if_no_ws: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL_PATH.to_string(),
            websocket_url: None,
            camera_prefix: DEFAULT_ANCHOR_PREFIX.to_string(),
            simulate_if_no_ws: true,
        }
    }
}

impl StartupConfig {
    /// Blank `model` or `camera_prefix` values fall back to the defaults.
    /// An empty prefix would otherwise turn every named node into an anchor.
    pub fn normalized(mut self) -> Self {
        if self.model.trim().is_empty() {
            self.model = DEFAULT_MODEL_PATH.to_string();
        }
        if self.camera_prefix.is_empty() {
            self.camera_prefix = DEFAULT_ANCHOR_PREFIX.to_string();
        }
        self
    }

    /// The endpoint to connect to, if one is set.
    pub fn endpoint(&self) -> Option<&str> {
        self.websocket_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: StartupConfig = serde_json::from_str(r#"{ "model": "site.glb" }"#).unwrap();
        assert_eq!(config.model, "site.glb");
        assert_eq!(config.camera_prefix, "CCTV_");
        assert!(config.simulate_if_no_ws);
        assert_eq!(config.endpoint(), None);
    }

    #[test]
    fn blank_endpoint_counts_as_absent() {
        let config: StartupConfig =
            serde_json::from_str(r#"{ "websocket_url": "  ", "simulate_if_no_ws": false }"#).unwrap();
        assert_eq!(config.endpoint(), None);
        assert!(!config.simulate_if_no_ws);

        let config: StartupConfig =
            serde_json::from_str(r#"{ "websocket_url": "ws://localhost:8080" }"#).unwrap();
        assert_eq!(config.endpoint(), Some("ws://localhost:8080"));
    }

    #[test]
    fn blank_model_and_prefix_take_defaults() {
        let config: StartupConfig =
            serde_json::from_str(r#"{ "model": " ", "camera_prefix": "" }"#).unwrap();
        let config = config.normalized();
        assert_eq!(config.model, DEFAULT_MODEL_PATH);
        assert_eq!(config.camera_prefix, DEFAULT_ANCHOR_PREFIX);

        let custom: StartupConfig =
            serde_json::from_str(r#"{ "model": "yard.glb", "camera_prefix": "CAM-" }"#).unwrap();
        assert_eq!(custom.clone().normalized(), custom);
    }
}
