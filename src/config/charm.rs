//! Charm options set with `juju config`.

use serde::Deserialize;

use super::OperatorConfig;
use crate::error::HookToolError;
use crate::infrastructure::HookTools;

/// Options exposed in the charm's config.yaml
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CharmOptions {
    #[serde(default)]
    pub debug: Option<bool>,

    #[serde(default, rename = "enable-guesser")]
    pub enable_guesser: Option<bool>,
}

impl CharmOptions {
    /// Read the current options with `config-get`
    pub async fn fetch(tools: &HookTools) -> Result<Self, HookToolError> {
        tools.run_json("config-get", &["--format=json"]).await
    }

    /// Overlay the options that are set onto `config`
    pub fn apply(&self, config: &mut OperatorConfig) {
        if let Some(debug) = self.debug {
            config.debug = debug;
        }
        if self.enable_guesser.is_some() {
            config.enable_guesser = self.enable_guesser;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_get_output() {
        let options: CharmOptions =
            serde_json::from_str(r#"{"debug": false, "enable-guesser": true, "other": 1}"#).unwrap();
        assert_eq!(options.debug, Some(false));
        assert_eq!(options.enable_guesser, Some(true));
    }

    #[test]
    fn test_apply_only_set_options() {
        let mut config = OperatorConfig::default();
        CharmOptions {
            debug: None,
            enable_guesser: Some(false),
        }
        .apply(&mut config);

        assert!(config.debug);
        assert_eq!(config.enable_guesser, Some(false));
    }
}
