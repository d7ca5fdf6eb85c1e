/// Dashboard server routing tests.
///
/// Call `web::dispatch` directly with the in-memory backend and inspect the
/// status, headers and HTML of the response.
mod common;

use std::io::Read;

use cargaboard::api::ApiError;
use cargaboard::api::types::StationStats;
use cargaboard::auth::{self, AuthOutcome};
use cargaboard::pages::{Document, RenderOptions};
use cargaboard::web::{HttpResponse, dispatch};
use common::{FakeApi, driver};
use tiny_http::Method;

fn get(api: &FakeApi, url: &str) -> HttpResponse {
    dispatch(api, &RenderOptions::default(), 60, &Method::Get, url, None).unwrap()
}

fn body(resp: HttpResponse) -> String {
    let mut out = String::new();
    resp.into_reader().read_to_string(&mut out).unwrap();
    out
}

fn location(resp: &HttpResponse) -> Option<String> {
    resp.headers()
        .iter()
        .find(|h| h.field.equiv("Location"))
        .map(|h| h.value.as_str().to_string())
}

#[test]
fn unauthenticated_pages_redirect_to_login() {
    let api = FakeApi {
        me: Err(ApiError::Unauthorized),
        ..FakeApi::default()
    };
    for route in ["/", "/drivers", "/users", "/sustainability", "/compare"] {
        let resp = get(&api, route);
        assert_eq!(resp.status_code().0, 302, "{route}");
        assert_eq!(location(&resp).as_deref(), Some("/login"));
    }
    // No loader ran.
    assert_eq!(api.count("last"), 0);
    assert_eq!(api.count("users"), 0);
}

#[test]
fn dashboard_renders_kpis_and_inline_svg() {
    let api = FakeApi {
        stats: Ok(StationStats {
            total_cargas: 120,
            coches_electricos: 20,
            coches_hibridos: 14,
            ..StationStats::default()
        }),
        ..FakeApi::default()
    };
    let resp = get(&api, "/?station=Salvio&filter=mes");
    assert_eq!(resp.status_code().0, 200);
    let html = body(resp);
    assert!(html.contains("<meta http-equiv=\"refresh\" content=\"60\">"));
    assert!(html.contains("<b>120</b>"));
    assert!(html.contains("<svg"));
    assert!(html.contains("Ana Pérez"));
    assert!(html.contains("/?filter=mes&amp;station=Portobelo"));
    assert!(api.calls().contains(&"last Salvio mes".to_string()));
}

#[test]
fn open_param_expands_driver_list() {
    let api = FakeApi {
        users: Ok((0..15).map(|i| driver(&format!("U{i}"), None, i, None)).collect()),
        ..FakeApi::default()
    };
    let html = body(get(&api, "/drivers?open=toggleUsers&page=2"));
    assert!(html.contains("id=\"conductoresContainer\" aria-hidden=\"false\""));
    assert!(html.contains("Página 2 de 2"));
    assert!(html.contains("id=\"prevPage\""));
    assert!(!html.contains("id=\"nextPage\""));
    assert!(html.contains("Ocultar conductores"));
}

#[test]
fn unknown_route_is_404() {
    let api = FakeApi::default();
    assert_eq!(get(&api, "/nope").status_code().0, 404);
}

#[test]
fn login_form_posts() {
    let api = FakeApi::default();
    let ok = dispatch(
        &api,
        &RenderOptions::default(),
        60,
        &Method::Post,
        "/login",
        Some("email=ana%40example.com&password=secret"),
    )
    .unwrap();
    assert_eq!(ok.status_code().0, 302);
    assert_eq!(location(&ok).as_deref(), Some("/"));
    assert!(api.calls().contains(&"login ana@example.com -".to_string()));

    let bad = dispatch(
        &api,
        &RenderOptions::default(),
        60,
        &Method::Post,
        "/login",
        Some("email=ana%40example.com&password=wrong"),
    )
    .unwrap();
    assert_eq!(bad.status_code().0, 401);
    assert!(body(bad).contains("Credenciales inválidas"));
}

#[test]
fn logout_redirects_to_login() {
    let api = FakeApi::default();
    let resp = dispatch(&api, &RenderOptions::default(), 60, &Method::Post, "/logout", None).unwrap();
    assert_eq!(resp.status_code().0, 302);
    assert_eq!(location(&resp).as_deref(), Some("/login"));
    assert_eq!(api.count("logout"), 1);
}

#[test]
fn logout_requires_post() {
    let api = FakeApi::default();
    let resp = get(&api, "/logout");
    assert_eq!(resp.status_code().0, 404);
    assert_eq!(api.count("logout"), 0);

    let html = body(get(&api, "/"));
    assert!(html.contains(
        "<form method=\"post\" action=\"/logout\"><button type=\"submit\">Cerrar sesión</button></form>"
    ));
    assert!(!html.contains("href=\"/logout\""));
}

// ---------------------------------------------------------------------------
// Auth bootstrap
// ---------------------------------------------------------------------------

#[test]
fn bootstrap_redirects_on_transport_failure() {
    let api = FakeApi {
        me: Err(ApiError::Transport("connection refused".into())),
        ..FakeApi::default()
    };
    let mut doc = Document::new("t");
    assert_eq!(auth::bootstrap(&api, &mut doc), AuthOutcome::Redirect("/login.html"));
    assert_eq!(doc.redirect(), Some("/login.html"));
}

#[test]
fn bootstrap_redirects_on_decode_failure() {
    let api = FakeApi {
        me: Err(ApiError::Decode("expected value at line 1 column 1".into())),
        ..FakeApi::default()
    };
    let mut doc = Document::new("t");
    assert_eq!(auth::bootstrap(&api, &mut doc), AuthOutcome::Redirect("/login.html"));
    assert_eq!(doc.redirect(), Some("/login.html"));

    let resp = get(&api, "/sustainability");
    assert_eq!(resp.status_code().0, 302);
    assert_eq!(location(&resp).as_deref(), Some("/login"));
    assert_eq!(api.count("energy"), 0);
}

#[test]
fn bootstrap_keeps_page_on_server_error() {
    let api = FakeApi {
        me: Err(ApiError::Http {
            status: 500,
            body: r#"{"detail":"db down"}"#.into(),
        }),
        ..FakeApi::default()
    };
    let mut doc = Document::new("t");
    assert!(auth::bootstrap(&api, &mut doc).is_authenticated());
    assert_eq!(doc.redirect(), None);
}

#[test]
fn login_failure_has_fixed_message() {
    let api = FakeApi::default();
    assert_eq!(auth::login(&api, "ana@example.com", "bad"), Err("Credenciales inválidas"));
    assert!(auth::login(&api, " ana@example.com ", "secret").is_ok());
    assert!(api.calls().contains(&"login ana@example.com -".to_string()));
}
