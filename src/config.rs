use crate::error::Result;
use crate::ir::{BACKING_EDGE_KEY, PROXY_LINK_KEY};
use crate::selector::Selector;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_EDGE_SELECTOR: &str = "edge";
const DEFAULT_PROXY_DATA: [&str; 1] = ["color"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Which elements count as edges for position and removal handling.
    pub edge_selector: String,
    /// Edge attributes copied onto a proxy node when it is created.
    pub proxy_data: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            edge_selector: DEFAULT_EDGE_SELECTOR.to_string(),
            proxy_data: DEFAULT_PROXY_DATA
                .iter()
                .map(|value| value.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub fn edge_selector(&self) -> Result<Selector> {
        Selector::parse(&self.edge_selector)
    }

    /// Propagated keys with the link attributes filtered out.
    pub fn propagated_keys(&self) -> Vec<String> {
        self.proxy_data
            .iter()
            .filter(|key| key.as_str() != PROXY_LINK_KEY && key.as_str() != BACKING_EDGE_KEY)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    edge_selector: Option<String>,
    proxy_data: Option<Vec<String>>,
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|_| json_err)
            .context("config is neither JSON nor JSON5")?,
    };

    let mut config = Config::default();
    if let Some(v) = parsed.edge_selector {
        config.edge_selector = v;
    }
    if let Some(v) = parsed.proxy_data {
        config.proxy_data = v;
    }
    config.edge_selector()?;
    Ok(config)
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_all_edges_and_propagate_color() {
        let config = Config::default();
        assert_eq!(config.edge_selector, "edge");
        assert_eq!(config.propagated_keys(), vec!["color".to_string()]);
        assert!(load_config(None).unwrap() == config);
    }

    #[test]
    fn parses_camel_case_json() {
        let config =
            parse_config(r#"{"edgeSelector": "edge.assoc", "proxyData": ["color", "label"]}"#)
                .unwrap();
        assert_eq!(config.edge_selector, "edge.assoc");
        assert_eq!(config.proxy_data, vec!["color", "label"]);
    }

    #[test]
    fn falls_back_to_json5() {
        let config = parse_config("{ edgeSelector: '.assoc', // only associations\n }").unwrap();
        assert_eq!(config.edge_selector, ".assoc");
        assert_eq!(config.proxy_data, vec!["color"]);
    }

    #[test]
    fn rejects_bad_selector() {
        assert!(parse_config(r#"{"edgeSelector": "edge > node"}"#).is_err());
    }

    #[test]
    fn link_keys_are_never_propagated() {
        let config = Config {
            proxy_data: vec![
                "color".to_string(),
                PROXY_LINK_KEY.to_string(),
                BACKING_EDGE_KEY.to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(config.propagated_keys(), vec!["color".to_string()]);
    }
}
