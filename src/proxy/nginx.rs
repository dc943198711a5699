//! Render the proxy descriptor to an nginx server configuration
//!
//! The descriptor stays the single source of truth; the emitted file is
//! what the front-end server actually loads.

use crate::core::config::{ProxyConfig, RouteTargetConfig};

/// Render the full nginx configuration: upstream block plus server block
pub fn render(config: &ProxyConfig) -> String {
    let mut out = String::new();

    out.push_str("# Generated by deployctl; do not edit by hand.\n\n");

    out.push_str(&format!("upstream {} {{\n", config.upstream.name));
    out.push_str(&format!("    server {};\n", config.upstream.addr));
    out.push_str("}\n\n");

    out.push_str("server {\n");
    out.push_str(&format!("    listen {};\n", config.listen));
    out.push_str(&format!("    charset {};\n", config.charset));
    out.push_str(&format!(
        "    client_max_body_size {};\n",
        config.max_body_size
    ));

    for route in &config.routes {
        out.push('\n');
        out.push_str(&format!("    location {} {{\n", route.prefix));

        match route.target {
            RouteTargetConfig::Alias => {
                out.push_str(&format!("        alias {};\n", route.destination));
            }
            RouteTargetConfig::Upstream => {
                out.push_str("        include uwsgi_params;\n");
                out.push_str(&format!("        uwsgi_pass {};\n", route.destination));
                out.push_str(&format!(
                    "        uwsgi_read_timeout {}s;\n",
                    config.read_timeout_secs
                ));
            }
        }

        // Deterministic output for extra directives
        let mut options: Vec<_> = route.options.iter().collect();
        options.sort();
        for (directive, value) in options {
            out.push_str(&format!("        {} {};\n", directive, value));
        }

        out.push_str("    }\n");
    }

    out.push_str("}\n");
    out
}
