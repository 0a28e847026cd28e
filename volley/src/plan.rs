use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use indexmap::IndexMap;
use serde::Deserialize;

/// YAML run description. Every field is optional; CLI flags take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub(crate) struct Plan {
    pub vus: Option<u64>,

    #[serde(default)]
    pub duration: Option<YamlDuration>,

    #[serde(default)]
    pub think_time: Option<YamlDuration>,

    #[serde(default)]
    pub target: TargetYaml,

    /// Check name -> expression (e.g. `"status was 200": "status == 200"`), in file order.
    #[serde(default)]
    pub checks: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub(crate) struct TargetYaml {
    pub method: Option<String>,
    pub url: Option<String>,

    #[serde(default, deserialize_with = "deserialize_headers")]
    pub headers: BTreeMap<String, String>,

    pub body: Option<String>,

    #[serde(default)]
    pub timeout: Option<YamlDuration>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct YamlDuration(Duration);

impl YamlDuration {
    pub(crate) fn into_inner(self) -> Duration {
        self.0
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
                if v <= 0 {
                    return Err(E::custom("duration must be positive"));
                }
                Ok(YamlDuration(Duration::from_secs(v as u64)))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if !v.is_finite() || v <= 0.0 {
                    return Err(E::custom("duration must be a positive, finite number"));
                }
                Ok(YamlDuration(Duration::from_secs_f64(v)))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let d = humantime::parse_duration(v.trim()).map_err(E::custom)?;
                Ok(YamlDuration(d))
            }
        }

        deserializer.deserialize_any(V)
    }
}

/// Header values may be written as YAML scalars of any kind (`x-retries: 3`).
fn deserialize_headers<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_yaml::Value>::deserialize(deserializer)?;
    let mut out = BTreeMap::new();

    for (k, v) in raw {
        let s = match v {
            serde_yaml::Value::Null => continue,
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::String(s) => s,
            _ => {
                return Err(serde::de::Error::custom(format!(
                    "header `{k}` must be a scalar value"
                )));
            }
        };
        out.insert(k, s);
    }

    Ok(out)
}

pub(crate) fn parse(yaml: &str) -> anyhow::Result<Plan> {
    if yaml.trim().is_empty() {
        return Ok(Plan::default());
    }
    serde_yaml::from_str(yaml).context("invalid plan file")
}

pub(crate) async fn load(path: &Path) -> anyhow::Result<Plan> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read plan file: {}", path.display()))?;
    parse(&raw).with_context(|| format!("failed to parse plan file: {}", path.display()))
}
