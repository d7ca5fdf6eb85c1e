/// Page model shared by every controller.
///
/// A [`Document`] is the server-side stand-in for a dashboard page: an
/// ordered set of nodes addressed by id (KPI text, charts, item lists and
/// card grids) plus disclosure toggles whose ARIA attributes mirror the
/// visibility of the nodes they control. Writes to an unknown id are
/// ignored, the way a page script skips elements a template does not have.
use serde_json::{Value, json};

use crate::charts::SvgCanvas;
use crate::charts::bars::{BarChartLayout, GroupedLayout};
use crate::charts::hbar::HBarLayout;
use crate::charts::heat::HeatCell;
use crate::charts::line::LineLayout;
use crate::charts::pie::PieLayout;

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Geometry of whatever was last drawn on a chart node.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    Bars(BarChartLayout),
    Grouped(GroupedLayout),
    HBar(HBarLayout),
    Pie(PieLayout),
    /// Coverage fraction in `[0, 1]`.
    Donut(f64),
    Heat(Vec<HeatCell>),
    Line(LineLayout),
}

impl Layout {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bars(_) => "bars",
            Self::Grouped(_) => "grouped-bars",
            Self::HBar(_) => "hbar",
            Self::Pie(_) => "pie",
            Self::Donut(_) => "donut",
            Self::Heat(_) => "heat",
            Self::Line(_) => "line",
        }
    }
}

/// A painted canvas together with its layout.
#[derive(Debug, Clone)]
pub struct Chart {
    pub svg: SvgCanvas,
    pub layout: Layout,
}

/// One entry of an item list (`<li>` or a menu link).
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub text: String,
    pub href: Option<String>,
    pub disabled: bool,
    /// `href` changes state and must be submitted with POST.
    pub post: bool,
}

impl Item {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: None,
            disabled: false,
            post: false,
        }
    }

    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: Some(href.into()),
            disabled: false,
            post: false,
        }
    }

    /// A button that POSTs to `href`.
    pub fn action(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            post: true,
            ..Self::link(text, href)
        }
    }

    pub fn disabled(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: None,
            disabled: true,
            post: false,
        }
    }
}

/// A titled card of `label: value` fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub enum Content {
    Text(String),
    Chart(Option<Chart>),
    Items(Vec<Item>),
    Cards(Vec<Card>),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub content: Content,
    pub hidden: bool,
}

/// A button that shows and hides other nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Disclosure {
    pub id: String,
    pub controls: Vec<String>,
    pub expanded: bool,
    pub collapsed_label: String,
    pub expanded_label: String,
}

impl Disclosure {
    /// Button text for the current state.
    pub fn label(&self) -> &str {
        if self.expanded {
            &self.expanded_label
        } else {
            &self.collapsed_label
        }
    }

    pub fn aria_expanded(&self) -> &'static str {
        if self.expanded { "true" } else { "false" }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub title: String,
    nodes: Vec<Node>,
    toggles: Vec<Disclosure>,
    redirect: Option<String>,
    generation: u64,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    fn push(&mut self, id: &str, label: &str, content: Content) -> &mut Self {
        self.nodes.push(Node {
            id: id.to_string(),
            label: label.to_string(),
            content,
            hidden: false,
        });
        self
    }

    // -- declaration (page skeleton) --------------------------------------

    /// Declare a text node showing `initial` until a loader fills it.
    pub fn declare_text(&mut self, id: &str, label: &str, initial: &str) -> &mut Self {
        self.push(id, label, Content::Text(initial.to_string()))
    }

    pub fn declare_chart(&mut self, id: &str, label: &str) -> &mut Self {
        self.push(id, label, Content::Chart(None))
    }

    pub fn declare_items(&mut self, id: &str, label: &str) -> &mut Self {
        self.push(id, label, Content::Items(Vec::new()))
    }

    pub fn declare_cards(&mut self, id: &str, label: &str) -> &mut Self {
        self.push(id, label, Content::Cards(Vec::new()))
    }

    /// Declare a toggle. The controlled nodes start hidden unless `expanded`.
    pub fn declare_disclosure(
        &mut self,
        id: &str,
        controls: &[&str],
        expanded: bool,
        collapsed_label: &str,
        expanded_label: &str,
    ) -> &mut Self {
        self.toggles.push(Disclosure {
            id: id.to_string(),
            controls: controls.iter().map(|c| c.to_string()).collect(),
            expanded,
            collapsed_label: collapsed_label.to_string(),
            expanded_label: expanded_label.to_string(),
        });
        for target in controls {
            if let Some(node) = self.node_mut(target) {
                node.hidden = !expanded;
            }
        }
        self
    }

    // -- lookup -----------------------------------------------------------

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        match &self.node(id)?.content {
            Content::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn chart(&self, id: &str) -> Option<&Chart> {
        match &self.node(id)?.content {
            Content::Chart(c) => c.as_ref(),
            _ => None,
        }
    }

    pub fn items(&self, id: &str) -> Option<&[Item]> {
        match &self.node(id)?.content {
            Content::Items(items) => Some(items),
            _ => None,
        }
    }

    pub fn cards(&self, id: &str) -> Option<&[Card]> {
        match &self.node(id)?.content {
            Content::Cards(cards) => Some(cards),
            _ => None,
        }
    }

    /// Every painted chart, in page order.
    pub fn charts(&self) -> impl Iterator<Item = (&str, &Chart)> {
        self.nodes.iter().filter_map(|n| match &n.content {
            Content::Chart(Some(c)) => Some((n.id.as_str(), c)),
            _ => None,
        })
    }

    pub fn toggles(&self) -> &[Disclosure] {
        &self.toggles
    }

    pub fn disclosure(&self, id: &str) -> Option<&Disclosure> {
        self.toggles.iter().find(|t| t.id == id)
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.node(id).is_some_and(|n| n.hidden)
    }

    /// `aria-hidden` of a node.
    pub fn aria_hidden(&self, id: &str) -> Option<&'static str> {
        self.node(id).map(|n| if n.hidden { "true" } else { "false" })
    }

    /// `aria-expanded` of a toggle.
    pub fn aria_expanded(&self, id: &str) -> Option<&'static str> {
        self.disclosure(id).map(Disclosure::aria_expanded)
    }

    // -- mutation ---------------------------------------------------------

    /// Returns `false` when the id is not a text node.
    pub fn set_text(&mut self, id: &str, value: impl Into<String>) -> bool {
        match self.node_mut(id).map(|n| &mut n.content) {
            Some(Content::Text(t)) => {
                *t = value.into();
                true
            }
            _ => false,
        }
    }

    pub fn set_chart(&mut self, id: &str, chart: Chart) -> bool {
        match self.node_mut(id).map(|n| &mut n.content) {
            Some(Content::Chart(slot)) => {
                *slot = Some(chart);
                true
            }
            _ => false,
        }
    }

    pub fn set_items(&mut self, id: &str, items: Vec<Item>) -> bool {
        match self.node_mut(id).map(|n| &mut n.content) {
            Some(Content::Items(slot)) => {
                *slot = items;
                true
            }
            _ => false,
        }
    }

    pub fn set_cards(&mut self, id: &str, cards: Vec<Card>) -> bool {
        match self.node_mut(id).map(|n| &mut n.content) {
            Some(Content::Cards(slot)) => {
                *slot = cards;
                true
            }
            _ => false,
        }
    }

    /// Open or close a toggle, mirroring the state onto its targets.
    /// Returns the previous state, or `None` for an unknown toggle.
    pub fn set_expanded(&mut self, id: &str, expanded: bool) -> Option<bool> {
        let toggle = self.toggles.iter_mut().find(|t| t.id == id)?;
        let previous = toggle.expanded;
        toggle.expanded = expanded;
        let targets = toggle.controls.clone();
        for target in &targets {
            if let Some(node) = self.node_mut(target) {
                node.hidden = !expanded;
            }
        }
        Some(previous)
    }

    /// Flip a toggle. Returns the new state.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let expanded = !self.disclosure(id)?.expanded;
        self.set_expanded(id, expanded);
        Some(expanded)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.disclosure(id).is_some_and(|t| t.expanded)
    }

    pub fn redirect_to(&mut self, url: impl Into<String>) {
        self.redirect = Some(url.into());
    }

    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stamp(&mut self, generation: u64) {
        self.generation = generation;
    }

    // -- export -----------------------------------------------------------

    /// Machine-readable snapshot: text, lists, cards, toggles and a chart
    /// summary (kind and CSS size).
    pub fn to_json(&self) -> Value {
        let nodes: Vec<Value> = self
            .nodes
            .iter()
            .map(|n| {
                let content = match &n.content {
                    Content::Text(t) => json!({ "text": t }),
                    Content::Chart(None) => json!({ "chart": null }),
                    Content::Chart(Some(c)) => {
                        let (w, h) = crate::charts::Canvas2d::css_size(&c.svg);
                        json!({ "chart": { "kind": c.layout.kind(), "width": w, "height": h } })
                    }
                    Content::Items(items) => json!({
                        "items": items.iter().map(|i| json!({
                            "text": i.text, "href": i.href, "disabled": i.disabled, "post": i.post
                        })).collect::<Vec<_>>()
                    }),
                    Content::Cards(cards) => json!({
                        "cards": cards.iter().map(|c| json!({
                            "title": c.title,
                            "fields": c.fields.iter().map(|(k, v)| json!([k, v])).collect::<Vec<_>>()
                        })).collect::<Vec<_>>()
                    }),
                };
                json!({ "id": n.id, "label": n.label, "hidden": n.hidden, "content": content })
            })
            .collect();
        let toggles: Vec<Value> = self
            .toggles
            .iter()
            .map(|t| json!({ "id": t.id, "expanded": t.expanded, "controls": t.controls }))
            .collect();
        json!({
            "title": self.title,
            "generation": self.generation,
            "redirect": self.redirect,
            "nodes": nodes,
            "toggles": toggles,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
