//! Sitemap HTTP server.
//!
//! A blocking `tiny_http` loop: every request builds a fresh [`Generator`]
//! against the store, routes the path, and answers with the rendered
//! document. Nothing is cached between requests.
//!
//! ```text
//! request ──► decode path ──► router::respond ──► tiny_http::Response
//!                                   │
//!                                   ▼
//!                        Generator (store + config)
//! ```

use crate::{config::SiteConfig, log, router, sitemap::Generator, store::ContentStore};
use anyhow::{Context, Result, anyhow};
use std::{borrow::Cow, io::Cursor, net::SocketAddr, sync::Arc};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve sitemaps until Ctrl+C is received.
pub fn serve_sitemaps(config: &SiteConfig, store: &dyn ContentStore) -> Result<()> {
    let interface: std::net::IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid interface `{}`", config.serve.interface))?;

    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}/sitemap.xml", addr);
    if config.serve.debug {
        log!("serve"; "debug mode, caching disabled");
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, config, store) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
fn handle_request(request: Request, config: &SiteConfig, store: &dyn ContentStore) -> Result<()> {
    // Decode URL-encoded characters (e.g., %20 → space)
    let url_path = urlencoding::decode(request.url())
        .map(Cow::into_owned)
        .unwrap_or_default();

    // Strip query string (e.g., ?t=123456) before routing
    let path = url_path.split('?').next().unwrap_or(&url_path);

    let response = route(config, store, path);

    log!("serve"; "{} {} {}", request.method(), path, response.status);
    request.respond(into_http(response)?)?;
    Ok(())
}

/// Render the response for `path`; store failures answer 500.
fn route(config: &SiteConfig, store: &dyn ContentStore, path: &str) -> router::Response {
    Generator::new(store, config)
        .and_then(|generator| router::respond(&generator, path, config.serve.debug))
        .unwrap_or_else(|e| {
            log!("error"; "{path}: {e}");
            router::Response::internal_error()
        })
}

/// Convert a routed response into a `tiny_http` response.
fn into_http(response: router::Response) -> Result<Response<Cursor<Vec<u8>>>> {
    let mut http = Response::from_string(response.body).with_status_code(StatusCode(response.status));
    for (name, value) in &response.headers {
        let header = Header::from_bytes(name.as_bytes(), value.as_bytes())
            .map_err(|()| anyhow!("Invalid header {name}: {value}"))?;
        http.add_header(header);
    }
    Ok(http)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FailingStore;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_into_http_copies_status_and_headers() {
        let response = router::Response {
            status: 404,
            headers: vec![
                ("Content-Type", router::CONTENT_TYPE.to_owned()),
                ("Cache-Control", "public, max-age=3600".to_owned()),
            ],
            body: "<error/>".to_owned(),
        };

        let http = into_http(response).unwrap();
        assert_eq!(http.status_code(), StatusCode(404));

        let cache = http
            .headers()
            .iter()
            .find(|h| h.field.equiv("Cache-Control"))
            .map(|h| h.value.as_str().to_owned());
        assert_eq!(cache.as_deref(), Some("public, max-age=3600"));
    }

    #[test]
    fn test_route_answers_500_when_store_fails() {
        let mut config = SiteConfig::default();
        config.base.url = Some("https://example.com".into());

        let response = route(&config, &FailingStore, "/sitemap.xml");
        assert_eq!(response.status, 500);
        assert_eq!(response.header("Content-Type"), Some("text/plain"));

        // Unrouted paths never touch the store
        let response = route(&config, &FailingStore, "/robots.txt");
        assert_eq!(response.status, 404);

        // Large-site sizing reads counts while building the generator
        config.sitemap.large_site.enable = true;
        let response = route(&config, &FailingStore, "/sitemap-post-type-post.xml");
        assert_eq!(response.status, 500);
    }

    #[test]
    fn test_try_bind_port_skips_busy_port() {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let (first, first_addr) = try_bind_port(localhost, 45_871, 10).unwrap();
        let (_second, second_addr) = try_bind_port(localhost, first_addr.port(), 10).unwrap();
        assert_ne!(first_addr.port(), second_addr.port());
        drop(first);
    }
}
