//! Tracing configuration types.

use serde::Deserialize;

/// Configuration for the tracing subsystem.
///
/// OTLP export is opt-in: with no endpoint configured the client logs to
/// stderr only, which is the right default for an interactive CLI.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Service name reported to the OTLP collector.
    pub service_name: String,

    /// OTLP collector endpoint (e.g. "http://localhost:4317").
    /// `None` disables span export entirely.
    pub otlp_endpoint: Option<String>,

    /// Transport protocol for OTLP export.
    pub protocol: OtlpProtocol,

    /// Filter directive (e.g. "info", "portal_client=debug,info").
    pub filter: String,
}

/// OTLP transport protocol.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OtlpProtocol {
    #[default]
    Grpc,
    Http,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "portal-client".to_string(),
            otlp_endpoint: None,
            protocol: OtlpProtocol::default(),
            filter: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_exporter() {
        let config = TracingConfig::default();
        assert_eq!(config.otlp_endpoint, None);
        assert_eq!(config.protocol, OtlpProtocol::Grpc);
    }

    #[test]
    fn protocol_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            protocol: OtlpProtocol,
        }
        let w: Wrapper = serde_json::from_str(r#"{"protocol":"http"}"#).unwrap();
        assert_eq!(w.protocol, OtlpProtocol::Http);
    }
}
