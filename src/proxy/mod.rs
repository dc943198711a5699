//! Reverse-proxy routing descriptor
//!
//! A static route table: literal path prefixes mapped to filesystem
//! aliases or to the single declared upstream. Request forwarding itself
//! belongs to the front-end server; this module only answers where a
//! request path goes and whether its body is acceptable.

pub mod nginx;

use crate::core::config::{ProxyConfig, RouteRuleConfig, RouteTargetConfig};
use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Where a matching request is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// Served directly from a filesystem directory
    StaticAlias,
    /// Forwarded to the upstream backend
    ProxyUpstream,
}

/// A routing rule in the table
#[derive(Debug, Clone)]
pub struct RouteRule {
    /// Path prefix this rule matches
    pub prefix: String,

    /// Target kind
    pub target: RouteTarget,

    /// Alias directory or upstream name
    pub destination: String,

    /// Extra directives carried into rendered output
    pub options: HashMap<String, String>,
}

/// Routing decision for one request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    /// Serve this file from disk
    Static { file: PathBuf },

    /// Forward to the upstream, relaying its response unchanged
    Upstream {
        name: String,
        addr: String,
        read_timeout: Duration,
    },
}

/// Errors surfaced to the requesting client
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Request body of {size} bytes exceeds the configured limit of {limit} bytes")]
    BodyTooLarge { size: u64, limit: u64 },

    #[error("No route matches path '{0}'")]
    NoRoute(String),
}

/// The route table built from a proxy descriptor
#[derive(Debug, Clone)]
pub struct RouteTable {
    /// Rules in declaration order
    rules: Vec<RouteRule>,
    upstream_name: String,
    upstream_addr: String,
    max_body_bytes: u64,
    read_timeout: Duration,
}

impl RouteTable {
    /// Build a route table from a validated proxy descriptor
    pub fn from_config(config: &ProxyConfig) -> Result<Self> {
        let rules = config.routes.iter().map(RouteRule::from_config).collect();

        Ok(Self {
            rules,
            upstream_name: config.upstream.name.clone(),
            upstream_addr: config.upstream.addr.clone(),
            max_body_bytes: config.max_body_bytes()?,
            read_timeout: Duration::from_secs(config.read_timeout_secs),
        })
    }

    /// Rules in declaration order
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Maximum accepted request body size in bytes
    pub fn max_body_bytes(&self) -> u64 {
        self.max_body_bytes
    }

    /// Select the rule for a request path
    ///
    /// Longest matching prefix wins; on equal length the first declared
    /// rule wins, so literal prefixes always beat the catch-all `/`.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let mut best: Option<&RouteRule> = None;

        for rule in &self.rules {
            if !path.starts_with(&rule.prefix) {
                continue;
            }
            match best {
                Some(b) if b.prefix.len() >= rule.prefix.len() => {}
                _ => best = Some(rule),
            }
        }

        best.map(|rule| match rule.target {
            RouteTarget::StaticAlias => RouteMatch::Static {
                file: resolve_alias(&rule.destination, &path[rule.prefix.len()..]),
            },
            RouteTarget::ProxyUpstream => RouteMatch::Upstream {
                name: self.upstream_name.clone(),
                addr: self.upstream_addr.clone(),
                read_timeout: self.read_timeout,
            },
        })
    }

    /// Route a request, rejecting oversized bodies before any forwarding
    pub fn route(&self, path: &str, body_len: u64) -> Result<RouteMatch, RouteError> {
        if body_len > self.max_body_bytes {
            return Err(RouteError::BodyTooLarge {
                size: body_len,
                limit: self.max_body_bytes,
            });
        }

        self.resolve(path)
            .ok_or_else(|| RouteError::NoRoute(path.to_string()))
    }
}

impl RouteRule {
    fn from_config(config: &RouteRuleConfig) -> Self {
        RouteRule {
            prefix: config.prefix.clone(),
            target: match config.target {
                RouteTargetConfig::Alias => RouteTarget::StaticAlias,
                RouteTargetConfig::Upstream => RouteTarget::ProxyUpstream,
            },
            destination: config.destination.clone(),
            options: config.options.clone(),
        }
    }
}

/// Join the request remainder onto the alias root
///
/// `..` segments are resolved lexically and never climb above the root.
fn resolve_alias(root: &str, remainder: &str) -> PathBuf {
    let mut file = PathBuf::from(root.trim_end_matches('/'));
    let base_depth = file.components().count();

    for segment in remainder.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if file.components().count() > base_depth {
                    file.pop();
                }
            }
            other => file.push(other),
        }
    }

    file
}
