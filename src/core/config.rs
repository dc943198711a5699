//! Deployment descriptor configuration from YAML

use crate::core::Pipeline;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Top-level deployment descriptor loaded from YAML
///
/// Holds two independent sections: the reverse-proxy routing descriptor
/// and the CI pipeline descriptor. Either may be omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Reverse-proxy routing descriptor
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,

    /// CI pipeline descriptor
    #[serde(default)]
    pub pipeline: Option<PipelineConfig>,
}

/// Reverse-proxy descriptor: one upstream, path-based routing rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Listening port for the front-end server
    #[serde(default = "default_listen")]
    pub listen: u16,

    /// Default response charset
    #[serde(default = "default_charset")]
    pub charset: String,

    /// Maximum request body size, nginx-style size string (e.g. "75m")
    #[serde(default = "default_max_body_size")]
    pub max_body_size: String,

    /// Upstream read timeout in seconds
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    /// The single backend the catch-all forwards to
    pub upstream: UpstreamConfig,

    /// Routing rules, in declaration order
    pub routes: Vec<RouteRuleConfig>,
}

/// The backend server application requests are forwarded to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Upstream name referenced by routes (e.g. "django")
    pub name: String,

    /// Socket address (e.g. "unix:///tmp/boss.sock")
    pub addr: String,
}

/// A single routing rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRuleConfig {
    /// Path prefix (longest-prefix match, declaration order breaks ties)
    pub prefix: String,

    /// Where matching requests go
    pub target: RouteTargetConfig,

    /// Alias directory for `alias` rules, upstream name for `upstream` rules
    pub destination: String,

    /// Extra server directives carried verbatim into rendered output
    #[serde(default)]
    pub options: HashMap<String, String>,
}

/// Target kind for a route rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouteTargetConfig {
    /// Serve files directly from a filesystem directory
    Alias,
    /// Forward the request to the upstream backend
    Upstream,
}

/// CI pipeline descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Environment variables for the whole run, passed explicitly to every step
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Default timeout for steps (in seconds)
    #[serde(default)]
    pub default_timeout_secs: Option<u64>,

    /// Auxiliary background services bracketing the run
    #[serde(default)]
    pub services: Vec<ServiceConfig>,

    /// Pipeline steps, executed strictly in declared order
    pub steps: Vec<StepConfig>,
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name
    pub name: String,

    /// Shell command to execute
    pub command: String,

    /// Per-step environment overrides, layered over the run environment
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Whether a failure of this step is masked instead of aborting the run
    #[serde(default)]
    pub continue_on_failure: bool,

    /// Timeout for this step (overrides the pipeline default)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Auxiliary background service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Unique service identifier
    pub id: String,

    /// Shell command that starts the service in the foreground
    pub command: String,

    /// Fixed delay after spawning before steps run; no readiness probe exists
    #[serde(default)]
    pub startup_wait_ms: u64,
}

fn default_listen() -> u16 {
    80
}

fn default_charset() -> String {
    "utf-8".to_string()
}

fn default_max_body_size() -> String {
    "75m".to_string()
}

fn default_read_timeout_secs() -> u64 {
    600
}

impl DeployConfig {
    /// Load a deployment descriptor from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a deployment descriptor from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: DeployConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the descriptor before any request or step is processed
    pub fn validate(&self) -> Result<()> {
        if self.proxy.is_none() && self.pipeline.is_none() {
            anyhow::bail!("Descriptor has neither a proxy nor a pipeline section");
        }

        if let Some(proxy) = &self.proxy {
            proxy.validate()?;
        }

        if let Some(pipeline) = &self.pipeline {
            pipeline.validate()?;
        }

        Ok(())
    }
}

impl ProxyConfig {
    /// Validate the proxy section
    pub fn validate(&self) -> Result<()> {
        if self.routes.is_empty() {
            anyhow::bail!("Proxy section declares no routes");
        }

        let mut seen_prefixes = std::collections::HashSet::new();
        for route in &self.routes {
            if !route.prefix.starts_with('/') {
                anyhow::bail!("Route prefix '{}' must start with '/'", route.prefix);
            }
            if !seen_prefixes.insert(&route.prefix) {
                anyhow::bail!("Duplicate route prefix: {}", route.prefix);
            }
            if route.destination.is_empty() {
                anyhow::bail!("Route '{}' has an empty destination", route.prefix);
            }
            if route.target == RouteTargetConfig::Upstream && route.destination != self.upstream.name
            {
                anyhow::bail!(
                    "Route '{}' forwards to unknown upstream '{}' (declared: '{}')",
                    route.prefix,
                    route.destination,
                    self.upstream.name
                );
            }
        }

        parse_size(&self.max_body_size)?;

        Ok(())
    }

    /// Maximum request body size in bytes
    pub fn max_body_bytes(&self) -> Result<u64> {
        parse_size(&self.max_body_size)
    }
}

impl PipelineConfig {
    /// Validate the pipeline section
    pub fn validate(&self) -> Result<()> {
        let mut seen_ids = std::collections::HashSet::new();
        for step in &self.steps {
            if !seen_ids.insert(&step.id) {
                anyhow::bail!("Duplicate step ID: {}", step.id);
            }
            if step.command.trim().is_empty() {
                anyhow::bail!("Step '{}' has an empty command", step.id);
            }
        }

        let mut seen_services = std::collections::HashSet::new();
        for service in &self.services {
            if !seen_services.insert(&service.id) {
                anyhow::bail!("Duplicate service ID: {}", service.id);
            }
            if service.command.trim().is_empty() {
                anyhow::bail!("Service '{}' has an empty command", service.id);
            }
        }

        Ok(())
    }

    /// Convert config to a Pipeline domain model
    pub fn to_pipeline(&self) -> Pipeline {
        Pipeline::from_config(self)
    }
}

/// Parse an nginx-style size string ("75m", "512k", "1g", "1024") into bytes
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty size string");
    }

    let (digits, multiplier) = match s.chars().last() {
        Some(c) if c.is_ascii_digit() => (s, 1u64),
        Some('k') | Some('K') => (&s[..s.len() - 1], 1024),
        Some('m') | Some('M') => (&s[..s.len() - 1], 1024 * 1024),
        Some('g') | Some('G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        Some(c) => anyhow::bail!("Unknown size suffix '{}' in '{}'", c, s),
        None => unreachable!(),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size string: '{}'", s))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Size '{}' overflows", s))
}
