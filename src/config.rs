use serde::{Deserialize, Serialize};

/// Percentage of the raw pixel buffer to discard from each edge before
/// rendering, 0-100 per side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Image generation settings, passed through opaquely from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Nearest-neighbor resample factor applied after classification.
    pub scale: f64,
    pub trim: TrimConfig,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self { scale: 1.0, trim: TrimConfig::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_json() {
        let config: ImageConfig =
            serde_json::from_str(r#"{"scale":2.0,"trim":{"left":10.0,"bottom":5.0}}"#).unwrap();
        assert_eq!(config.scale, 2.0);
        assert_eq!(config.trim.left, 10.0);
        assert_eq!(config.trim.right, 0.0);
        assert_eq!(config.trim.bottom, 5.0);
    }

    #[test]
    fn test_config_defaults() {
        let config: ImageConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ImageConfig::default());
    }
}
