//! Service descriptor types.
//!
//! A [`ServiceDescriptor`] is the single declarative entry the harness is
//! responsible for splicing into a third-party configuration document. It
//! is built once at process start from static configuration and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Transport used to reach the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Streamable HTTP endpoint.
    Http,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Http => write!(f, "http"),
        }
    }
}

/// The service entry injected into external configuration.
///
/// The `name` is the unique key under the target document's `servers`
/// mapping. Unknown per-service fields live in `extra` and are carried
/// verbatim into the rendered entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Unique entry name.
    pub name: String,

    /// Transport kind (rendered as the `type` field).
    pub transport: Transport,

    /// Routable endpoint URL of the deployed service.
    pub endpoint_url: String,

    /// Additional per-service fields, preserved as-is.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ServiceDescriptor {
    /// Create a descriptor for an HTTP service.
    pub fn http(name: impl Into<String>, endpoint_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: Transport::Http,
            endpoint_url: endpoint_url.into(),
            extra: Map::new(),
        }
    }

    /// Attach an extra field carried verbatim into the rendered entry.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Render the entry value stored under `servers.<name>`.
    ///
    /// The on-disk form is `{"type": "<transport>", "url": "<endpoint>"}`
    /// plus any extra fields.
    pub fn to_config_value(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("type".into(), Value::String(self.transport.to_string()));
        entry.insert("url".into(), Value::String(self.endpoint_url.clone()));
        for (key, value) in &self.extra {
            entry.insert(key.clone(), value.clone());
        }
        Value::Object(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_value_shape() {
        let descriptor = ServiceDescriptor::http("svc", "http://localhost/mcp");
        assert_eq!(
            descriptor.to_config_value(),
            json!({"type": "http", "url": "http://localhost/mcp"})
        );
    }

    #[test]
    fn test_extra_fields_carried() {
        let descriptor = ServiceDescriptor::http("svc", "https://localhost/mcp")
            .with_extra("headers", json!({"Authorization": "Bearer x"}));

        let value = descriptor.to_config_value();
        assert_eq!(value["url"], "https://localhost/mcp");
        assert_eq!(value["headers"]["Authorization"], "Bearer x");
    }
}
