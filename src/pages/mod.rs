/// Dashboard pages.
///
/// One controller per page. A controller owns its [`Document`] and its
/// state (station, filter, pagination), fans its loaders out over scoped
/// threads on [`Page::load`], and reacts to a fixed set of [`PageEvent`]s
/// declared by [`Page::bindings`]. A failed loader is logged and leaves its
/// widgets as they were.
pub mod comparatives;
pub mod dashboard;
pub mod document;
pub mod drivers;
pub mod pagination;
pub mod sustainability;
pub mod users;

use std::fmt;
use std::thread::ScopedJoinHandle;

pub use comparatives::ComparativesPage;
pub use dashboard::DashboardPage;
pub use document::{Card, Chart, Document, Item, Layout};
pub use drivers::DriversPage;
pub use pagination::Pagination;
pub use sustainability::SustainabilityPage;
pub use users::UsersPage;

use crate::api::types::{DriverRecord, EnergySeriesPoint};
use crate::api::{ApiError, ApiResult, StatsApi};
use crate::charts::format::{Period, format_period_label};
use crate::charts::{SvgCanvas, setup_canvas};
use crate::config::DashboardConfig;

// ---------------------------------------------------------------------------
// Filter / station
// ---------------------------------------------------------------------------

/// Aggregation window selected on a page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    Total,
    Mes,
    Diario,
    Dia,
    /// Passed to the backend unchanged.
    Other(String),
}

impl Filter {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "total" => Self::Total,
            "mes" => Self::Mes,
            "diario" => Self::Diario,
            "dia" => Self::Dia,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Total => "total",
            Self::Mes => "mes",
            Self::Diario => "diario",
            Self::Dia => "dia",
            Self::Other(s) => s,
        }
    }

    /// Energy-series bucket size for this window.
    pub fn period(&self) -> Period {
        match self {
            Self::Mes => Period::Day,
            Self::Diario | Self::Dia => Period::Hour,
            _ => Period::Month,
        }
    }

    /// Options of the filter selector: `(value, label)`.
    pub const CHOICES: [(&'static str, &'static str); 3] =
        [("total", "Total"), ("mes", "Último mes"), ("diario", "Hoy")];
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Charging station shown on a page, or all of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Station {
    #[default]
    All,
    Portobelo,
    Salvio,
    Other(String),
}

impl Station {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Self::All
        } else if s.eq_ignore_ascii_case("portobelo") {
            Self::Portobelo
        } else if s.eq_ignore_ascii_case("salvio") {
            Self::Salvio
        } else {
            Self::Other(s.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Portobelo => "Portobelo",
            Self::Salvio => "Salvio",
            Self::Other(s) => s,
        }
    }

    /// Options of the station selector: `(value, label)`.
    pub const CHOICES: [(&'static str, &'static str); 3] =
        [("all", "Todas"), ("Portobelo", "Portobelo"), ("Salvio", "Salvio")];
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// User interaction on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    FilterChanged(Filter),
    StationChanged(Station),
    NextPage,
    PrevPage,
    ToggleFilters,
    ToggleStations,
    ToggleUserMenu,
    ToggleUsers,
    ToggleUnclassified,
    CloseUnclassified,
}

/// Discriminant of a [`PageEvent`], used for static bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    FilterChanged,
    StationChanged,
    NextPage,
    PrevPage,
    ToggleFilters,
    ToggleStations,
    ToggleUserMenu,
    ToggleUsers,
    ToggleUnclassified,
    CloseUnclassified,
}

impl PageEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::FilterChanged(_) => EventKind::FilterChanged,
            Self::StationChanged(_) => EventKind::StationChanged,
            Self::NextPage => EventKind::NextPage,
            Self::PrevPage => EventKind::PrevPage,
            Self::ToggleFilters => EventKind::ToggleFilters,
            Self::ToggleStations => EventKind::ToggleStations,
            Self::ToggleUserMenu => EventKind::ToggleUserMenu,
            Self::ToggleUsers => EventKind::ToggleUsers,
            Self::ToggleUnclassified => EventKind::ToggleUnclassified,
            Self::CloseUnclassified => EventKind::CloseUnclassified,
        }
    }
}

// ---------------------------------------------------------------------------
// Page trait
// ---------------------------------------------------------------------------

/// A dashboard page controller.
pub trait Page {
    /// Route the page is served at.
    fn route(&self) -> &'static str;
    fn document(&self) -> &Document;
    fn document_mut(&mut self) -> &mut Document;
    /// Run every loader and render the results.
    fn load(&mut self);
    /// Periodic refresh. Same loaders as [`Page::load`].
    fn poll(&mut self) {
        self.load();
    }
    /// Events this page reacts to.
    fn bindings(&self) -> &'static [EventKind];
    /// Apply an event. Returns `false` for events the page does not bind.
    fn handle(&mut self, event: PageEvent) -> bool;
    /// `(page, page_count)` of the page's list, if it has one.
    fn pagination(&self) -> Option<(usize, usize)> {
        None
    }
    /// Jump to a 1-based page of the list. Pages without a list ignore it.
    fn go_to_page(&mut self, _page: usize) {}
}

/// Every page route, in navigation order.
pub const ROUTES: [&str; 5] = [
    dashboard::ROUTE,
    drivers::ROUTE,
    users::ROUTE,
    sustainability::ROUTE,
    comparatives::ROUTE,
];

/// Controller for `route`, or `None` for an unknown route. The comparatives
/// page ignores `station`.
pub fn open_page<'a, A: StatsApi + ?Sized + 'a>(
    route: &str,
    api: &'a A,
    opts: RenderOptions,
    station: Station,
    filter: Filter,
) -> Option<Box<dyn Page + 'a>> {
    Some(match route {
        dashboard::ROUTE => Box::new(DashboardPage::new(api, opts, station, filter)),
        drivers::ROUTE => Box::new(DriversPage::new(api, opts, station, filter)),
        users::ROUTE => Box::new(UsersPage::new(api, opts, station, filter)),
        sustainability::ROUTE => Box::new(SustainabilityPage::new(api, opts, station, filter)),
        comparatives::ROUTE => Box::new(ComparativesPage::new(api, opts, filter)),
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Render options
// ---------------------------------------------------------------------------

/// Sizing and loader parameters shared by the page controllers.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub dpr: f64,
    /// Width of a chart card (the canvas parent) in CSS pixels.
    pub card_width: f64,
    pub page_size: usize,
    pub ranking_limit: u32,
    pub alert_threshold: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

impl RenderOptions {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            dpr: config.render.device_pixel_ratio,
            card_width: config.render.width,
            page_size: config.drivers.page_size.max(1),
            ranking_limit: config.drivers.ranking_limit,
            alert_threshold: config.drivers.alert_threshold,
        }
    }
}

/// Paint a chart on a fresh SVG canvas sized `width x height` CSS pixels.
pub(crate) fn paint(
    opts: &RenderOptions,
    width: f64,
    height: f64,
    draw: impl FnOnce(&mut SvgCanvas) -> Layout,
) -> Chart {
    let mut svg = SvgCanvas::default();
    setup_canvas(&mut svg, width, height, opts.dpr);
    let layout = draw(&mut svg);
    Chart { svg, layout }
}

// ---------------------------------------------------------------------------
// Shared loader helpers
// ---------------------------------------------------------------------------

/// Join a scoped loader thread, turning a panic into a failed call.
pub(crate) fn joined<T>(handle: ScopedJoinHandle<'_, ApiResult<T>>) -> ApiResult<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(ApiError::Transport("loader thread panicked".to_string())))
}

/// Keep a loader's result, or log the failure and drop it.
pub(crate) fn absorb<T>(loader: &str, result: ApiResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(loader, error = %e, "loader failed");
            None
        }
    }
}

/// Most recent points of an energy series shown in the bar chart.
pub const SERIES_WINDOW: usize = 30;

/// Labels and values of the last [`SERIES_WINDOW`] buckets.
pub fn series_bars(series: &[EnergySeriesPoint], period: Period) -> (Vec<String>, Vec<f64>) {
    let tail = &series[series.len().saturating_sub(SERIES_WINDOW)..];
    let labels = tail
        .iter()
        .map(|p| format_period_label(&p.period_start, period))
        .collect();
    let values = tail.iter().map(|p| p.energy_wh).collect();
    (labels, values)
}

/// Large bar chart size: `clamp(card - 32, 360, 1200)` wide, 0.6 aspect.
pub fn wide_bar_size(card_width: f64) -> (f64, f64) {
    let w = (card_width - 32.0).clamp(360.0, 1200.0);
    (w, 380.0_f64.max((w * 0.6).round()))
}

/// Card shown for a driver in the paginated lists.
pub fn driver_card(driver: &DriverRecord) -> Card {
    use crate::charts::format::plain_number;
    Card {
        title: driver.display_name().to_string(),
        fields: vec![
            ("Cargas".to_string(), driver.total_cargas.to_string()),
            ("Energía".to_string(), format!("{} Wh", plain_number(driver.total_energy_wh))),
            ("Modelo".to_string(), driver.model_label().to_string()),
            ("Tipo".to_string(), driver.vehicle_type().label().to_string()),
        ],
    }
}

// ---------------------------------------------------------------------------
// Page chrome
// ---------------------------------------------------------------------------

/// Ids of the header widgets every page carries.
pub mod chrome {
    pub const USER_NAME: &str = "userName";
    pub const USER_FULL_NAME: &str = "userFullName";
    pub const USER_EMAIL: &str = "userEmail";
    pub const USER_BUTTON: &str = "userBtn";
    pub const USER_MENU: &str = "userMenu";
    pub const STATIONS_TOGGLE: &str = "stationsToggle";
    pub const STATIONS_MENU: &str = "stationsMenu";
    pub const FILTERS_TOGGLE: &str = "filtersToggle";
    pub const FILTERS_DRAWER: &str = "filtersDrawer";
}

/// Declare the header: user menu, stations menu and filters drawer, all
/// closed.
pub(crate) fn declare_chrome(doc: &mut Document, route: &str, filter: &Filter) {
    doc.declare_text(chrome::USER_NAME, "Usuario", "")
        .declare_text(chrome::USER_FULL_NAME, "Nombre", "-")
        .declare_text(chrome::USER_EMAIL, "Email", "")
        .declare_items(chrome::USER_MENU, "Cuenta")
        .declare_items(chrome::STATIONS_MENU, "Estaciones")
        .declare_items(chrome::FILTERS_DRAWER, "Filtros")
        .declare_disclosure(chrome::USER_BUTTON, &[chrome::USER_MENU], false, "Cuenta", "Cuenta")
        .declare_disclosure(
            chrome::STATIONS_TOGGLE,
            &[chrome::STATIONS_MENU],
            false,
            "Estaciones",
            "Estaciones",
        )
        .declare_disclosure(
            chrome::FILTERS_TOGGLE,
            &[chrome::FILTERS_DRAWER],
            false,
            "Filtros",
            "Filtros",
        );
    doc.set_items(chrome::USER_MENU, vec![Item::action("Cerrar sesión", "/logout")]);
    doc.set_items(chrome::FILTERS_DRAWER, filter_menu(route, &[]));
    refresh_station_menu(doc, route, filter);
}

/// Rebuild the stations menu so its links carry the current filter.
pub(crate) fn refresh_station_menu(doc: &mut Document, route: &str, filter: &Filter) {
    let query = [("filter".to_string(), filter.as_str().to_string())];
    doc.set_items(chrome::STATIONS_MENU, station_menu(route, &query));
}

/// Entries of the stations menu. Links keep the other query parameters
/// and replace `station`.
pub fn station_menu(path: &str, query: &[(String, String)]) -> Vec<Item> {
    let href = |station: &str| href_with(path, query, "station", station);
    vec![
        Item::link("Todas", href("all")),
        Item::link("Portobelo", href("Portobelo")),
        Item::link("Salvio", href("Salvio")),
        Item::disabled("Futuras estaciones"),
    ]
}

/// Entries of the filters drawer. Links keep the other query parameters
/// and replace `filter`.
pub fn filter_menu(path: &str, query: &[(String, String)]) -> Vec<Item> {
    Filter::CHOICES
        .iter()
        .map(|(value, label)| Item::link(*label, href_with(path, query, "filter", value)))
        .collect()
}

/// Rebuild both header menus from the full query of a request.
pub fn refresh_menus(doc: &mut Document, path: &str, query: &[(String, String)]) {
    doc.set_items(chrome::STATIONS_MENU, station_menu(path, query));
    doc.set_items(chrome::FILTERS_DRAWER, filter_menu(path, query));
}

/// `path?query` with `key` moved to the end and set to `value`.
pub fn href_with(path: &str, query: &[(String, String)], key: &str, value: &str) -> String {
    let qs: Vec<String> = query
        .iter()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .chain([(key, value)])
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    format!("{path}?{}", qs.join("&"))
}

/// Handle the header toggles shared by every page. Returns `true` when the
/// event was one of them.
pub(crate) fn handle_chrome(doc: &mut Document, event: &PageEvent) -> bool {
    let id = match event {
        PageEvent::ToggleFilters => chrome::FILTERS_TOGGLE,
        PageEvent::ToggleStations => chrome::STATIONS_TOGGLE,
        PageEvent::ToggleUserMenu => chrome::USER_BUTTON,
        _ => return false,
    };
    doc.toggle(id).is_some()
}

/// Monotonic load counter stamped on a page's document.
#[derive(Debug, Default)]
pub(crate) struct LoadGeneration(u64);

impl LoadGeneration {
    pub(crate) fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_to_period() {
        assert_eq!(Filter::parse("total").period(), Period::Month);
        assert_eq!(Filter::parse("mes").period(), Period::Day);
        assert_eq!(Filter::parse("diario").period(), Period::Hour);
        assert_eq!(Filter::parse("dia").period(), Period::Hour);
        assert_eq!(Filter::parse("semana").period(), Period::Month);
        assert_eq!(Filter::parse("semana").as_str(), "semana");
        assert_eq!(Filter::parse(""), Filter::Total);
    }

    #[test]
    fn station_parse_is_lenient() {
        assert_eq!(Station::parse(""), Station::All);
        assert_eq!(Station::parse("ALL"), Station::All);
        assert_eq!(Station::parse("salvio").as_str(), "Salvio");
        assert_eq!(Station::parse("Norte").as_str(), "Norte");
    }

    #[test]
    fn station_menu_keeps_other_params() {
        let items = station_menu("/drivers", &[
            ("filter".to_string(), "mes".to_string()),
            ("station".to_string(), "Salvio".to_string()),
        ]);
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].text, "Todas");
        assert_eq!(items[1].href.as_deref(), Some("/drivers?filter=mes&station=Portobelo"));
        assert!(items[3].disabled);
        assert_eq!(items[3].href, None);
    }

    #[test]
    fn filter_menu_replaces_filter() {
        let items = filter_menu("/", &[
            ("filter".to_string(), "mes".to_string()),
            ("station".to_string(), "Salvio".to_string()),
        ]);
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].href.as_deref(), Some("/?station=Salvio&filter=diario"));
        assert_eq!(href_with("/users", &[], "page", "2"), "/users?page=2");
    }

    #[test]
    fn series_keeps_last_thirty() {
        let series: Vec<EnergySeriesPoint> = (0..40)
            .map(|i| EnergySeriesPoint {
                period_start: format!("2025-01-01T{:02}:00:00", i % 24),
                energy_wh: i as f64,
            })
            .collect();
        let (labels, values) = series_bars(&series, Period::Hour);
        assert_eq!(values.len(), 30);
        assert_eq!(values[0], 10.0);
        assert_eq!(labels[0], "10");
    }

    #[test]
    fn wide_bars_clamp() {
        assert_eq!(wide_bar_size(960.0), (928.0, 557.0));
        assert_eq!(wide_bar_size(100.0), (360.0, 380.0));
        assert_eq!(wide_bar_size(5000.0), (1200.0, 720.0));
    }

    #[test]
    fn chrome_toggles() {
        let mut doc = Document::new("x");
        declare_chrome(&mut doc, "/", &Filter::Mes);
        assert_eq!(
            doc.items(chrome::STATIONS_MENU).and_then(|i| i[2].href.clone()).as_deref(),
            Some("/?filter=mes&station=Salvio")
        );
        assert!(doc.is_hidden(chrome::STATIONS_MENU));
        assert!(handle_chrome(&mut doc, &PageEvent::ToggleStations));
        assert_eq!(doc.aria_expanded(chrome::STATIONS_TOGGLE), Some("true"));
        assert!(!handle_chrome(&mut doc, &PageEvent::NextPage));
    }
}
