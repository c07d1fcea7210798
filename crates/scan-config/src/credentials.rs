use crate::error::ConfigurationError;
use serde_json::json;
use serde_yaml::{Mapping, Value};
use std::fmt;

pub const DEFAULT_SODA_CLOUD_HOST: &str = "cloud.soda.io";

const SODA_CLOUD_KEY: &str = "soda_cloud";

/// Authentication material for Soda Cloud.
///
/// The scan engine consumes it as a `soda_cloud` block inside the configuration YAML.
#[derive(Clone, PartialEq, Eq)]
pub struct SodaCloudCredentials {
    host: String,
    api_key_id: String,
    api_key_secret: String,
}

impl SodaCloudCredentials {
    pub fn new(
        api_key_id: impl Into<String>,
        api_key_secret: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let api_key_id = api_key_id.into();
        let api_key_secret = api_key_secret.into();

        if api_key_id.trim().is_empty() {
            return Err(ConfigurationError::Credentials(
                "api_key_id must not be empty".into(),
            ));
        }
        if api_key_secret.trim().is_empty() {
            return Err(ConfigurationError::Credentials(
                "api_key_secret must not be empty".into(),
            ));
        }

        Ok(Self {
            host: DEFAULT_SODA_CLOUD_HOST.to_string(),
            api_key_id,
            api_key_secret,
        })
    }

    /// Overrides the Soda Cloud host; blank values keep the default.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        if !host.trim().is_empty() {
            self.host = host;
        }
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn as_json(&self) -> serde_json::Value {
        json!({
            SODA_CLOUD_KEY: {
                "host": self.host,
                "api_key_id": self.api_key_id,
                "api_key_secret": self.api_key_secret,
            }
        })
    }

    pub fn as_yaml(&self) -> Result<String, ConfigurationError> {
        serde_yaml::to_string(&self.as_json()).map_err(|e| ConfigurationError::InvalidYaml {
            kind: "credentials",
            message: e.to_string(),
        })
    }

    /// Returns `configuration_yaml` with its `soda_cloud` block replaced by these credentials.
    pub fn merge_into(&self, configuration_yaml: &str) -> Result<String, ConfigurationError> {
        let invalid = |message: String| ConfigurationError::InvalidYaml {
            kind: "configuration",
            message,
        };

        let mut root = match serde_yaml::from_str::<Value>(configuration_yaml)
            .map_err(|e| invalid(e.to_string()))?
        {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => return Err(invalid("the configuration root must be a mapping".into())),
        };

        let block = serde_yaml::to_value(&self.as_json()[SODA_CLOUD_KEY])
            .map_err(|e| invalid(e.to_string()))?;
        root.insert(Value::String(SODA_CLOUD_KEY.to_string()), block);

        serde_yaml::to_string(&Value::Mapping(root)).map_err(|e| invalid(e.to_string()))
    }
}

impl fmt::Debug for SodaCloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SodaCloudCredentials")
            .field("host", &self.host)
            .field("api_key_id", &"***")
            .field("api_key_secret", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> SodaCloudCredentials {
        SodaCloudCredentials::new("key-id", "key-secret").unwrap()
    }

    #[test]
    fn test_default_host() {
        assert_eq!(credentials().host(), DEFAULT_SODA_CLOUD_HOST);
        assert_eq!(credentials().with_host("  ").host(), DEFAULT_SODA_CLOUD_HOST);
        assert_eq!(
            credentials().with_host("cloud.us.soda.io").host(),
            "cloud.us.soda.io"
        );
    }

    #[test]
    fn test_as_json() {
        assert_eq!(
            credentials().as_json(),
            json!({
                "soda_cloud": {
                    "host": "cloud.soda.io",
                    "api_key_id": "key-id",
                    "api_key_secret": "key-secret",
                }
            })
        );
    }

    #[test]
    fn test_as_yaml_parses_back() {
        let yaml = credentials().as_yaml().unwrap();
        let value: serde_json::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value, credentials().as_json());
    }

    #[test]
    fn test_empty_keys_rejected() {
        assert!(SodaCloudCredentials::new("", "secret").is_err());
        assert!(SodaCloudCredentials::new("id", " ").is_err());
    }

    #[test]
    fn test_merge_replaces_existing_block() {
        let config = "data_source sales:\n  type: postgres\nsoda_cloud:\n  host: old.example\n";
        let merged = credentials().merge_into(config).unwrap();
        let value: serde_json::Value = serde_yaml::from_str(&merged).unwrap();

        assert_eq!(value["data_source sales"]["type"], "postgres");
        assert_eq!(value["soda_cloud"]["host"], "cloud.soda.io");
        assert_eq!(value["soda_cloud"]["api_key_id"], "key-id");
    }

    #[test]
    fn test_merge_into_empty_and_non_mapping() {
        let merged = credentials().merge_into("").unwrap();
        assert!(merged.contains("soda_cloud"));

        assert!(credentials().merge_into("- just\n- a list\n").is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("key-secret"));
        assert!(!rendered.contains("key-id"));
    }
}
