/// HTML rendering of a page [`Document`].
///
/// Everything coming from the backend goes through [`escape_xml`]. Charts
/// are inlined as SVG. Toggles are plain links that flip their id in the
/// `open` query parameter, so the page works without any script.
use std::fmt::Write;

use crate::charts::svg::escape_xml;
use crate::pages::document::{Content, Node};
use crate::pages::{Document, href_with};

/// Query parameter listing the expanded toggles, comma separated.
pub const OPEN_PARAM: &str = "open";

/// Position in a paginated list, shown as prev / next links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: usize,
    pub page_count: usize,
}

/// Where the page was requested from, used to build its links.
pub struct PageContext<'a> {
    pub path: &'a str,
    pub query: &'a [(String, String)],
    pub refresh_secs: u64,
    pub pager: Option<Pager>,
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;background:#121212;color:#ddd;margin:0 auto;max-width:1040px;padding:16px}\
nav a{color:#8BC34A;margin-right:12px}a{color:#03A9F4}\
.kpi{display:inline-block;min-width:180px;margin:6px;padding:10px;background:#1e1e1e;border-radius:8px}\
.kpi b{display:block;font-size:1.4em;color:#fff}\
.card{display:inline-block;vertical-align:top;margin:6px;padding:10px;background:#1e1e1e;border-radius:8px;min-width:200px}\
.chart{margin:12px 0;background:#1e1e1e;border-radius:8px;padding:8px}\
.chart svg{max-width:100%;height:auto}\
[aria-hidden=true]{display:none}\
.disabled{color:#666}";

const NAV: [(&str, &str); 5] = [
    ("/", "Panel"),
    ("/drivers", "Conductores"),
    ("/users", "Usuarios"),
    ("/sustainability", "Sostenibilidad"),
    ("/compare", "Comparativas"),
];

fn head(out: &mut String, title: &str, refresh_secs: Option<u64>) {
    out.push_str("<!DOCTYPE html>\n<html lang=\"es\"><head><meta charset=\"utf-8\">");
    if let Some(secs) = refresh_secs {
        let _ = write!(out, "<meta http-equiv=\"refresh\" content=\"{secs}\">");
    }
    let _ = write!(out, "<title>{}</title><style>{STYLE}</style></head><body>", escape_xml(title));
}

/// Render a full page.
pub fn render_document(doc: &Document, ctx: &PageContext<'_>) -> String {
    let mut out = String::with_capacity(16 * 1024);
    head(&mut out, &doc.title, (ctx.refresh_secs > 0).then_some(ctx.refresh_secs));

    out.push_str("<nav>");
    for (href, label) in NAV {
        let _ = write!(out, "<a href=\"{href}\">{label}</a>");
    }
    out.push_str("</nav>");
    let _ = write!(out, "<h1>{}</h1>", escape_xml(&doc.title));

    let open = open_set(ctx.query);
    for toggle in doc.toggles() {
        let href = toggle_href(ctx.path, ctx.query, &open, &toggle.id);
        let _ = write!(
            out,
            "<a class=\"toggle\" id=\"{id}\" href=\"{href}\" aria-expanded=\"{exp}\" aria-controls=\"{controls}\">{label}</a> ",
            id = escape_xml(&toggle.id),
            href = escape_xml(&href),
            exp = toggle.aria_expanded(),
            controls = escape_xml(&toggle.controls.join(" ")),
            label = escape_xml(toggle.label()),
        );
    }

    for node in doc.nodes() {
        render_node(&mut out, node, ctx);
    }
    let _ = write!(out, "<footer data-generation=\"{}\"></footer>", doc.generation());
    out.push_str("</body></html>");
    out
}

fn render_node(out: &mut String, node: &Node, ctx: &PageContext<'_>) {
    let id = escape_xml(&node.id);
    let hidden = if node.hidden { "true" } else { "false" };
    let label = escape_xml(&node.label);
    match &node.content {
        Content::Text(text) => {
            let _ = write!(
                out,
                "<div class=\"kpi\" id=\"{id}\" aria-hidden=\"{hidden}\">{label}<b>{}</b>",
                escape_xml(text)
            );
            if node.id == "pageInfo"
                && let Some(pager) = ctx.pager
            {
                render_pager(out, pager, ctx);
            }
            out.push_str("</div>");
        }
        Content::Chart(chart) => {
            let _ = write!(out, "<div class=\"chart\" id=\"{id}\" aria-hidden=\"{hidden}\"><h3>{label}</h3>");
            if let Some(chart) = chart {
                out.push_str(&chart.svg.to_svg());
            }
            out.push_str("</div>");
        }
        Content::Items(items) => {
            let _ = write!(out, "<ul id=\"{id}\" aria-hidden=\"{hidden}\" aria-label=\"{label}\">");
            for item in items {
                let text = escape_xml(&item.text);
                match (&item.href, item.disabled) {
                    (_, true) => {
                        let _ = write!(out, "<li class=\"disabled\" aria-disabled=\"true\">{text}</li>");
                    }
                    (Some(href), false) if item.post => {
                        let _ = write!(
                            out,
                            "<li><form method=\"post\" action=\"{}\"><button type=\"submit\">{text}</button></form></li>",
                            escape_xml(href)
                        );
                    }
                    (Some(href), false) => {
                        let _ = write!(out, "<li><a href=\"{}\">{text}</a></li>", escape_xml(href));
                    }
                    (None, false) => {
                        let _ = write!(out, "<li>{text}</li>");
                    }
                }
            }
            out.push_str("</ul>");
        }
        Content::Cards(cards) => {
            let _ = write!(out, "<section id=\"{id}\" aria-hidden=\"{hidden}\">");
            for card in cards {
                let _ = write!(out, "<div class=\"card\"><h3>{}</h3>", escape_xml(&card.title));
                for (k, v) in &card.fields {
                    let _ = write!(out, "<div>{}: <b>{}</b></div>", escape_xml(k), escape_xml(v));
                }
                out.push_str("</div>");
            }
            out.push_str("</section>");
        }
    }
}

fn render_pager(out: &mut String, pager: Pager, ctx: &PageContext<'_>) {
    if pager.page > 1 {
        let href = href_with(ctx.path, ctx.query, "page", &(pager.page - 1).to_string());
        let _ = write!(out, " <a id=\"prevPage\" href=\"{}\">Anterior</a>", escape_xml(&href));
    }
    if pager.page < pager.page_count {
        let href = href_with(ctx.path, ctx.query, "page", &(pager.page + 1).to_string());
        let _ = write!(out, " <a id=\"nextPage\" href=\"{}\">Siguiente</a>", escape_xml(&href));
    }
}

/// Expanded toggle ids from the query.
pub fn open_set(query: &[(String, String)]) -> Vec<String> {
    query
        .iter()
        .filter(|(k, _)| k == OPEN_PARAM)
        .flat_map(|(_, v)| v.split(','))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Link that flips `id` in the `open` set.
fn toggle_href(path: &str, query: &[(String, String)], open: &[String], id: &str) -> String {
    let mut next: Vec<&str> = open.iter().map(String::as_str).filter(|o| *o != id).collect();
    if next.len() == open.len() {
        next.push(id);
    }
    href_with(path, query, OPEN_PARAM, &next.join(","))
}

/// Login form, with an optional error message.
pub fn login_page(error: Option<&str>) -> String {
    let mut out = String::new();
    head(&mut out, "Iniciar sesión", None);
    out.push_str("<h1>Iniciar sesión</h1>");
    if let Some(error) = error {
        let _ = write!(out, "<p id=\"loginError\" role=\"alert\">{}</p>", escape_xml(error));
    }
    out.push_str(
        "<form method=\"post\" action=\"/login\">\
<label>Email <input type=\"email\" name=\"email\" required></label><br>\
<label>Contraseña <input type=\"password\" name=\"password\" required></label><br>\
<button type=\"submit\">Entrar</button></form></body></html>",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::Item;

    fn ctx<'a>(query: &'a [(String, String)]) -> PageContext<'a> {
        PageContext {
            path: "/",
            query,
            refresh_secs: 60,
            pager: None,
        }
    }

    #[test]
    fn backend_text_is_escaped() {
        let mut doc = Document::new("Panel");
        doc.declare_items("unclassifiedPanel", "Modelos");
        doc.set_items("unclassifiedPanel", vec![Item::text("<script>x</script> — 1")]);
        let html = render_document(&doc, &ctx(&[]));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt; — 1"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<meta http-equiv=\"refresh\" content=\"60\">"));
    }

    #[test]
    fn toggles_flip_open_param() {
        let query = [("open".to_string(), "a,b".to_string())];
        let open = open_set(&query);
        assert_eq!(open, vec!["a", "b"]);
        assert_eq!(toggle_href("/", &query, &open, "a"), "/?open=b");
        assert_eq!(toggle_href("/", &query, &open, "c"), "/?open=a%2Cb%2Cc");
    }

    #[test]
    fn hidden_nodes_carry_aria() {
        let mut doc = Document::new("t");
        doc.declare_cards("conductoresContainer", "Conductores")
            .declare_disclosure("toggleUsers", &["conductoresContainer"], false, "Ver", "Ocultar");
        let html = render_document(&doc, &ctx(&[]));
        assert!(html.contains("id=\"conductoresContainer\" aria-hidden=\"true\""));
        assert!(html.contains("aria-expanded=\"false\""));
    }

    #[test]
    fn login_error_is_shown() {
        assert!(login_page(Some("Credenciales inválidas")).contains("Credenciales inválidas"));
        assert!(!login_page(None).contains("loginError"));
    }
}
