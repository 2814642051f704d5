use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use flowload_core::LoadOverrides;

/// On-disk shape of `flowload.yaml`. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub register_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request_timeout: Option<YamlDuration>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub connect_timeout: Option<YamlDuration>,
}

impl ConfigFile {
    pub(crate) fn parse(contents: &str) -> anyhow::Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).context("invalid config YAML")
    }

    pub(crate) async fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("in {}", path.display()))
    }

    pub(crate) fn into_overrides(self) -> LoadOverrides {
        LoadOverrides {
            base_url: self.base_url,
            register_path: self.register_path,
            login_path: self.login_path,
            endpoints: self.endpoints,
            users: self.users,
            concurrency: self.concurrency,
            request_timeout: self.request_timeout.map(YamlDuration::into_inner),
            connect_timeout: self.connect_timeout.map(YamlDuration::into_inner),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct YamlDuration(Duration);

impl YamlDuration {
    fn into_inner(self) -> Duration {
        self.0
    }
}

impl Serialize for YamlDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(self.0).to_string())
    }
}

impl<'de> Deserialize<'de> for YamlDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;

        impl serde::de::Visitor<'_> for V {
            type Value = YamlDuration;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("duration as string (e.g. 10s), integer seconds, or float seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(YamlDuration(Duration::from_secs(v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(|v| YamlDuration(Duration::from_secs(v)))
                    .map_err(|_| E::custom("duration must not be negative"))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Duration::try_from_secs_f64(v)
                    .map(YamlDuration)
                    .map_err(|e| E::custom(format!("invalid duration {v}: {e}")))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                humantime::parse_duration(v.trim())
                    .map(YamlDuration)
                    .map_err(|e| E::custom(format!("invalid duration '{v}': {e}")))
            }
        }

        deserializer.deserialize_any(V)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_keys_and_durations() {
        let yaml = r#"
baseUrl: http://127.0.0.1:9000
registerPath: /r
loginPath: /l
endpoints:
  - /a
  - /b
users: 5
concurrency: 2
requestTimeout: 1500ms
connectTimeout: 2
"#;
        let file = match ConfigFile::parse(yaml) {
            Ok(v) => v,
            Err(err) => panic!("parse failed: {err:#}"),
        };
        let o = file.into_overrides();
        assert_eq!(o.base_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(o.register_path.as_deref(), Some("/r"));
        assert_eq!(o.login_path.as_deref(), Some("/l"));
        assert_eq!(o.endpoints, Some(vec!["/a".to_string(), "/b".to_string()]));
        assert_eq!(o.users, Some(5));
        assert_eq!(o.concurrency, Some(2));
        assert_eq!(o.request_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(o.connect_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn empty_file_sets_nothing() {
        let o = match ConfigFile::parse("  \n") {
            Ok(v) => v.into_overrides(),
            Err(err) => panic!("parse failed: {err:#}"),
        };
        assert!(o.base_url.is_none());
        assert!(o.users.is_none());
        assert!(o.endpoints.is_none());
    }

    #[test]
    fn rejects_unknown_keys_and_bad_durations() {
        assert!(ConfigFile::parse("vus: 3\n").is_err());
        assert!(ConfigFile::parse("requestTimeout: soon\n").is_err());
        assert!(ConfigFile::parse("users: -1\n").is_err());
    }

    #[test]
    fn float_seconds_are_range_checked() {
        let o = match ConfigFile::parse("requestTimeout: 1.5\n") {
            Ok(v) => v.into_overrides(),
            Err(err) => panic!("parse failed: {err:#}"),
        };
        assert_eq!(o.request_timeout, Some(Duration::from_millis(1500)));

        assert!(ConfigFile::parse("requestTimeout: 1e30\n").is_err());
        assert!(ConfigFile::parse("connectTimeout: -0.5\n").is_err());
        assert!(ConfigFile::parse("connectTimeout: .nan\n").is_err());
    }

    #[test]
    fn starter_file_round_trips_through_parser() {
        let o = match ConfigFile::parse(crate::init::STARTER_CONFIG) {
            Ok(v) => v.into_overrides(),
            Err(err) => panic!("starter config does not parse: {err:#}"),
        };
        assert_eq!(o.users, Some(flowload_core::DEFAULT_USERS));
        assert_eq!(o.request_timeout, Some(Duration::from_secs(10)));
    }
}
