/// Drivers page (`/drivers`).
///
/// Summary KPIs, the ranking chart with its top-driver KPI, the hourly heat
/// strip, the loyalty donut, and a paginated driver list hidden behind a
/// toggle. The list is only fetched while it is visible.
use std::thread;

use super::{
    Document, EventKind, Filter, Layout, LoadGeneration, Page, PageEvent, Pagination, RenderOptions,
    Station, absorb, declare_chrome, driver_card, handle_chrome, joined, paint, refresh_station_menu,
};
use crate::api::StatsApi;
use crate::api::types::{DriverRecord, DriversSummary, HabitsHistogram, LoyaltySummary, RankingItem};
use crate::charts::format::clip_chars;
use crate::charts::hbar::draw_hbar;
use crate::charts::heat::draw_heat_strip;
use crate::charts::pie::draw_donut;
use crate::charts::theme;

pub const ROUTE: &str = "/drivers";

pub const USERS_TOGGLE: &str = "toggleUsers";
const USERS_SECTION: &str = "conductoresContainer";
const PAGE_INFO: &str = "pageInfo";

/// Characters of the top driver's name kept in the KPI.
const TOP_DRIVER_CHARS: usize = 24;

const BINDINGS: &[EventKind] = &[
    EventKind::FilterChanged,
    EventKind::StationChanged,
    EventKind::ToggleUsers,
    EventKind::NextPage,
    EventKind::PrevPage,
    EventKind::ToggleFilters,
    EventKind::ToggleStations,
    EventKind::ToggleUserMenu,
];

/// `"{name} • {cargas}"` for the first ranked driver, `-` when empty.
pub fn top_driver_label(items: &[RankingItem]) -> String {
    match items.first() {
        Some(top) => format!(
            "{} • {}",
            clip_chars(top.display_name(), TOP_DRIVER_CHARS),
            top.total_cargas
        ),
        None => "-".to_string(),
    }
}

/// Ranking canvas: width `clamp(card - 16, 320, 920)`, 28 px per row plus
/// 40, clamped to `[220, 520]`.
pub fn ranking_size(card_width: f64, rows: usize) -> (f64, f64) {
    let w = (card_width - 16.0).clamp(320.0, 920.0);
    let h = (28.0 * rows as f64 + 40.0).clamp(220.0, 520.0);
    (w, h)
}

/// Heat strip and donut width: `max(260, card - 24)`.
pub fn strip_width(card_width: f64) -> f64 {
    260.0_f64.max(card_width - 24.0)
}

pub struct DriversPage<'a, A: StatsApi + ?Sized> {
    api: &'a A,
    opts: RenderOptions,
    station: Station,
    filter: Filter,
    drivers: Pagination<DriverRecord>,
    doc: Document,
    generation: LoadGeneration,
}

impl<'a, A: StatsApi + ?Sized> DriversPage<'a, A> {
    pub fn new(api: &'a A, opts: RenderOptions, station: Station, filter: Filter) -> Self {
        let mut doc = Document::new("Conductores");
        declare_chrome(&mut doc, ROUTE, &filter);
        doc.declare_text("kpiDrivers", "Conductores", "0")
            .declare_text("kpiCharges", "Cargas", "0")
            .declare_text("kpiAvg", "Media cargas/conductor", "0.0")
            .declare_text("kpiTopDriver", "Top conductor", "-")
            .declare_chart("rankingChart", "Ranking de conductores")
            .declare_chart("habitsGeneral", "Hábitos por hora")
            .declare_chart("loyaltyChart", "Fidelidad")
            .declare_cards(USERS_SECTION, "Conductores")
            .declare_text(PAGE_INFO, "Paginación", "Página 1 de 1")
            .declare_disclosure(
                USERS_TOGGLE,
                &[USERS_SECTION, PAGE_INFO],
                false,
                "Ver conductores",
                "Ocultar conductores",
            );
        Self {
            api,
            drivers: Pagination::new(opts.page_size),
            opts,
            station,
            filter,
            doc,
            generation: LoadGeneration::default(),
        }
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn list(&self) -> &Pagination<DriverRecord> {
        &self.drivers
    }

    // -- renderers --------------------------------------------------------

    fn render_summary(&mut self, summary: &DriversSummary) {
        self.doc.set_text("kpiDrivers", summary.total_drivers.to_string());
        self.doc.set_text("kpiCharges", summary.total_charges.to_string());
        self.doc
            .set_text("kpiAvg", format!("{:.1}", summary.avg_charges_per_driver));
    }

    fn render_ranking(&mut self, items: &[RankingItem]) {
        self.doc.set_text("kpiTopDriver", top_driver_label(items));
        let labels: Vec<String> = items.iter().map(|it| it.display_name().to_string()).collect();
        let values: Vec<f64> = items.iter().map(|it| it.total_cargas as f64).collect();
        let (w, h) = ranking_size(self.opts.card_width, labels.len());
        let chart = paint(&self.opts, w, h, |c| {
            Layout::HBar(draw_hbar(c, &labels, &values, theme::ORANGE))
        });
        self.doc.set_chart("rankingChart", chart);
    }

    fn render_habits(&mut self, habits: &HabitsHistogram) {
        let w = strip_width(self.opts.card_width);
        let chart = paint(&self.opts, w, 140.0, |c| {
            Layout::Heat(draw_heat_strip(c, &habits.histogram))
        });
        self.doc.set_chart("habitsGeneral", chart);
    }

    fn render_loyalty(&mut self, loyalty: &LoyaltySummary) {
        let w = strip_width(self.opts.card_width);
        let chart = paint(&self.opts, w, 240.0, |c| {
            Layout::Donut(draw_donut(
                c,
                loyalty.recurrentes as f64,
                loyalty.total() as f64,
                "recurrentes",
            ))
        });
        self.doc.set_chart("loyaltyChart", chart);
    }

    fn show_page(&mut self) {
        let cards = self.drivers.current().iter().map(driver_card).collect();
        self.doc.set_cards(USERS_SECTION, cards);
        self.doc.set_text(PAGE_INFO, self.drivers.label());
    }

    fn load_drivers(&mut self) {
        let result = self.api.users(self.station.as_str(), self.filter.as_str());
        if let Some(drivers) = absorb("drivers", result) {
            self.drivers.reset(drivers);
            self.show_page();
        }
    }

    fn users_visible(&self) -> bool {
        self.doc.is_expanded(USERS_TOGGLE)
    }
}

impl<A: StatsApi + ?Sized> Page for DriversPage<'_, A> {
    fn route(&self) -> &'static str {
        ROUTE
    }

    fn document(&self) -> &Document {
        &self.doc
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    fn load(&mut self) {
        let generation = self.generation.next();
        let api = self.api;
        let station = self.station.as_str().to_string();
        let filter = self.filter.as_str().to_string();
        let (limit, threshold) = (self.opts.ranking_limit, self.opts.alert_threshold);
        let with_drivers = self.users_visible();

        let (summary, ranking, habits, loyalty, drivers) = thread::scope(|s| {
            let summary = s.spawn(|| api.drivers_summary(&station, &filter, threshold));
            let ranking = s.spawn(|| api.ranking(&station, &filter, limit));
            let habits = s.spawn(|| api.habits(&station, &filter));
            let loyalty = s.spawn(|| api.loyalty(&station, &filter));
            let drivers = with_drivers.then(|| s.spawn(|| api.users(&station, &filter)));
            (
                joined(summary),
                joined(ranking),
                joined(habits),
                joined(loyalty),
                drivers.map(joined),
            )
        });

        if let Some(summary) = absorb("drivers summary", summary) {
            self.render_summary(&summary);
        }
        if let Some(ranking) = absorb("ranking", ranking) {
            self.render_ranking(&ranking);
        }
        if let Some(habits) = absorb("habits", habits) {
            self.render_habits(&habits);
        }
        if let Some(loyalty) = absorb("loyalty", loyalty) {
            self.render_loyalty(&loyalty);
        }
        if let Some(drivers) = drivers.and_then(|d| absorb("drivers", d)) {
            self.drivers.reset(drivers);
            self.show_page();
        }
        self.doc.stamp(generation);
    }

    fn bindings(&self) -> &'static [EventKind] {
        BINDINGS
    }

    fn pagination(&self) -> Option<(usize, usize)> {
        Some((self.drivers.page(), self.drivers.page_count()))
    }

    fn go_to_page(&mut self, page: usize) {
        self.drivers.go_to(page);
        self.show_page();
    }

    fn handle(&mut self, event: PageEvent) -> bool {
        if !BINDINGS.contains(&event.kind()) {
            return false;
        }
        if handle_chrome(&mut self.doc, &event) {
            return true;
        }
        match event {
            PageEvent::FilterChanged(filter) => {
                self.filter = filter;
                refresh_station_menu(&mut self.doc, ROUTE, &self.filter);
                self.doc.set_expanded(super::chrome::FILTERS_TOGGLE, false);
                self.load();
            }
            PageEvent::StationChanged(station) => {
                self.station = station;
                self.load();
            }
            PageEvent::ToggleUsers => {
                if self.doc.toggle(USERS_TOGGLE) == Some(true) {
                    self.load_drivers();
                }
            }
            PageEvent::NextPage => {
                if self.drivers.next() {
                    self.show_page();
                }
            }
            PageEvent::PrevPage => {
                if self.drivers.prev() {
                    self.show_page();
                }
            }
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(name: Option<&str>, code: Option<&str>, cargas: u64) -> RankingItem {
        RankingItem {
            user_name: name.map(String::from),
            user_code: code.map(String::from),
            total_cargas: cargas,
            ..RankingItem::default()
        }
    }

    #[test]
    fn top_driver_kpi() {
        assert_eq!(top_driver_label(&[ranked(Some("Ana"), None, 10)]), "Ana • 10");
        assert_eq!(top_driver_label(&[ranked(None, Some("U-9"), 3)]), "U-9 • 3");
        assert_eq!(top_driver_label(&[]), "-");
        let long = "Maximiliano Fernández de la Vega";
        assert_eq!(
            top_driver_label(&[ranked(Some(long), None, 1)]),
            format!("{} • 1", long.chars().take(24).collect::<String>())
        );
    }

    #[test]
    fn ranking_size_clamps() {
        assert_eq!(ranking_size(960.0, 2), (920.0, 220.0));
        assert_eq!(ranking_size(300.0, 10), (320.0, 320.0));
        assert_eq!(ranking_size(600.0, 30), (584.0, 520.0));
    }

    #[test]
    fn strip_width_floor() {
        assert_eq!(strip_width(200.0), 260.0);
        assert_eq!(strip_width(960.0), 936.0);
    }
}
