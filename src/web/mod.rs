//! Local dashboard server.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) that serves every
//! dashboard page as HTML with inline SVG charts:
//! - `GET /`, `/drivers`, `/users`, `/sustainability`, `/compare` with
//!   `?station=&filter=&page=&open=`
//! - `GET /login`, `POST /login`, `POST /logout`
//!
//! Each request re-runs the page loaders. The page refreshes itself through
//! `<meta http-equiv=refresh>` at the configured poll interval.
//!
//! Launched via `cargaboard serve` (default: `http://127.0.0.1:9747`).

pub mod html;

use std::io::Cursor;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::api::StatsApi;
use crate::auth::{self, AuthOutcome};
use crate::config::DashboardConfig;
use crate::pages::{
    Filter, PageEvent, RenderOptions, Station, chrome, dashboard, drivers, open_page, refresh_menus,
};
use html::{PageContext, Pager};

pub type HttpResponse = Response<Cursor<Vec<u8>>>;

/// Login route of the HTML dashboard.
pub const LOGIN_ROUTE: &str = "/login";

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user dashboard). A failing request gets a 500 without
/// stopping the server.
pub fn serve<A: StatsApi + ?Sized>(api: &A, config: &DashboardConfig) -> Result<()> {
    let addr = config.server.address.as_str();
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("cargaboard dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if config.server.open_browser {
        let _ = open_browser(&format!("http://{addr}"));
    }

    let opts = RenderOptions::from_config(config);
    let refresh_secs = config.poll.interval_secs;

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        // Read body up-front for methods that carry one
        let body = if matches!(method, Method::Post) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let resp = match dispatch(api, &opts, refresh_secs, &method, &url, body.as_deref()) {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(%url, error = %e, "request failed");
                text_response(500, format!("error: {e}"))
            }
        };
        let status = resp.status_code().0;
        let _ = request.respond(resp);

        tracing::info!(%method, %url, status, "served");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch a request to the matching handler.
pub fn dispatch<A: StatsApi + ?Sized>(
    api: &A,
    opts: &RenderOptions,
    refresh_secs: u64,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<HttpResponse> {
    let (path, raw_query) = url.split_once('?').unwrap_or((url, ""));
    let query = parse_query(raw_query);

    match (method, path) {
        (&Method::Get, LOGIN_ROUTE) | (&Method::Get, "/login.html") => {
            Ok(html_response(200, html::login_page(None)))
        }
        (&Method::Post, LOGIN_ROUTE) => {
            let form = parse_query(body.unwrap_or(""));
            let email = param(&form, "email").unwrap_or("");
            let password = param(&form, "password").unwrap_or("");
            match auth::login(api, email, password) {
                Ok(_) => redirect(auth::HOME_URL),
                Err(message) => Ok(html_response(401, html::login_page(Some(message)))),
            }
        }
        (&Method::Post, "/logout") => {
            auth::logout(api);
            redirect(LOGIN_ROUTE)
        }
        (&Method::Get, route) => render_route(api, opts, refresh_secs, route, &query),
        _ => Ok(text_response(405, "method not allowed".to_string())),
    }
}

/// Authenticate, load and render one page route.
fn render_route<A: StatsApi + ?Sized>(
    api: &A,
    opts: &RenderOptions,
    refresh_secs: u64,
    route: &str,
    query: &[(String, String)],
) -> Result<HttpResponse> {
    let station = Station::parse(param(query, "station").unwrap_or(""));
    let filter = Filter::parse(param(query, "filter").unwrap_or(""));
    let Some(mut page) = open_page(route, api, opts.clone(), station, filter) else {
        return Ok(text_response(404, "not found".to_string()));
    };

    if let AuthOutcome::Redirect(_) = auth::bootstrap(api, page.document_mut()) {
        return redirect(LOGIN_ROUTE);
    }
    refresh_menus(page.document_mut(), route, query);

    page.load();
    for id in html::open_set(query) {
        if let Some(event) = toggle_event(&id) {
            page.handle(event);
        }
    }
    if let Some(n) = param(query, "page").and_then(|p| p.parse::<usize>().ok()) {
        page.go_to_page(n);
    }

    let pager = page
        .pagination()
        .map(|(page, page_count)| Pager { page, page_count });
    let ctx = PageContext {
        path: route,
        query,
        refresh_secs,
        pager,
    };
    Ok(html_response(200, html::render_document(page.document(), &ctx)))
}

/// Map a toggle id from the `open` parameter to the event that opens it.
pub fn toggle_event(id: &str) -> Option<PageEvent> {
    Some(match id {
        chrome::FILTERS_TOGGLE => PageEvent::ToggleFilters,
        chrome::STATIONS_TOGGLE => PageEvent::ToggleStations,
        chrome::USER_BUTTON => PageEvent::ToggleUserMenu,
        drivers::USERS_TOGGLE => PageEvent::ToggleUsers,
        dashboard::UNCLASSIFIED_TOGGLE => PageEvent::ToggleUnclassified,
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Query parsing
// ---------------------------------------------------------------------------

/// Decode `a=1&b=two+words` (query strings and form bodies).
pub fn parse_query(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(k), decode(v))
        })
        .collect()
}

fn decode(s: &str) -> String {
    let s = s.replace('+', " ");
    urlencoding::decode(&s)
        .map(|d| d.into_owned())
        .unwrap_or(s)
}

/// Last value of `key`.
pub fn param<'q>(query: &'q [(String, String)], key: &str) -> Option<&'q str> {
    query
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name, value).map_err(|()| anyhow::anyhow!("invalid header {name}: {value}"))
}

fn html_response(status: u16, body: String) -> HttpResponse {
    let resp = Response::from_data(body.into_bytes()).with_status_code(StatusCode(status));
    match header("Content-Type", "text/html; charset=utf-8") {
        Ok(h) => resp.with_header(h),
        Err(_) => resp,
    }
}

fn text_response(status: u16, body: String) -> HttpResponse {
    let resp = Response::from_data(body.into_bytes()).with_status_code(StatusCode(status));
    match header("Content-Type", "text/plain; charset=utf-8") {
        Ok(h) => resp.with_header(h),
        Err(_) => resp,
    }
}

/// `302 Found` to `location`.
fn redirect(location: &str) -> Result<HttpResponse> {
    Ok(Response::from_data(Vec::new())
        .with_status_code(StatusCode(302))
        .with_header(header("Location", location)?))
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
