//! Test: route table precedence and body limits from a full descriptor

use deployctl::core::config::DeployConfig;
use deployctl::proxy::{nginx, RouteError, RouteMatch, RouteTable};
use std::path::PathBuf;
use std::time::Duration;

const BOSS_DESCRIPTOR: &str = r#"
proxy:
  listen: 80
  charset: utf-8
  max_body_size: 75m
  read_timeout_secs: 600
  upstream:
    name: django
    addr: unix:///tmp/boss.sock
  routes:
    - prefix: /static
      target: alias
      destination: /var/www/boss/static
    - prefix: /media
      target: alias
      destination: /var/www/boss/media
    - prefix: /
      target: upstream
      destination: django
"#;

fn boss_table() -> RouteTable {
    let config = DeployConfig::from_yaml(BOSS_DESCRIPTOR).unwrap();
    RouteTable::from_config(&config.proxy.unwrap()).unwrap()
}

#[test]
fn test_aliases_beat_catch_all() {
    let table = boss_table();

    assert_eq!(
        table.route("/static/css/site.css", 0).unwrap(),
        RouteMatch::Static {
            file: PathBuf::from("/var/www/boss/static/css/site.css")
        }
    );
    assert_eq!(
        table.route("/media/uploads/avatar.png", 0).unwrap(),
        RouteMatch::Static {
            file: PathBuf::from("/var/www/boss/media/uploads/avatar.png")
        }
    );
}

#[test]
fn test_everything_else_goes_to_the_socket() {
    let table = boss_table();

    for path in ["/", "/api/widgets", "/admin/", "/status"] {
        match table.route(path, 0).unwrap() {
            RouteMatch::Upstream {
                name,
                addr,
                read_timeout,
            } => {
                assert_eq!(name, "django");
                assert_eq!(addr, "unix:///tmp/boss.sock");
                assert_eq!(read_timeout, Duration::from_secs(600));
            }
            other => panic!("{} should go upstream, got {:?}", path, other),
        }
    }
}

/// Prefixes match raw strings, not path segments: `/staticky` falls under
/// the `/static` alias the same way an nginx prefix location would take it
#[test]
fn test_prefix_match_is_raw_string_prefix() {
    let table = boss_table();

    assert_eq!(
        table.route("/staticky", 0).unwrap(),
        RouteMatch::Static {
            file: PathBuf::from("/var/www/boss/static/ky")
        }
    );
}

#[test]
fn test_body_limit_is_75_megabytes() {
    let table = boss_table();
    let limit = 75 * 1024 * 1024;
    assert_eq!(table.max_body_bytes(), limit);

    assert!(table.route("/api/upload", limit).is_ok());
    assert!(matches!(
        table.route("/api/upload", limit + 1),
        Err(RouteError::BodyTooLarge { .. })
    ));

    // The limit also applies to paths that would be served from disk
    assert!(matches!(
        table.route("/static/app.css", limit + 1),
        Err(RouteError::BodyTooLarge { .. })
    ));
}

#[test]
fn test_rendered_nginx_config_round_trips_the_descriptor() {
    let config = DeployConfig::from_yaml(BOSS_DESCRIPTOR).unwrap();
    let rendered = nginx::render(&config.proxy.unwrap());

    for expected in [
        "listen 80;",
        "charset utf-8;",
        "client_max_body_size 75m;",
        "server unix:///tmp/boss.sock;",
        "location /static {",
        "alias /var/www/boss/static;",
        "location /media {",
        "uwsgi_pass django;",
        "uwsgi_read_timeout 600s;",
    ] {
        assert!(rendered.contains(expected), "missing '{}'", expected);
    }
}
