/// Station dashboard (`/`).
///
/// KPIs and charts for one station: cargas / usuarios bars, energy bar,
/// EV vs PHEV pie, CO2 avoided, the energy series, and the panel of vehicle
/// models that could not be classified.
use std::thread;

use super::{
    Chart, Document, EventKind, Filter, Item, Layout, LoadGeneration, Page, PageEvent, RenderOptions,
    Station, absorb, declare_chrome, handle_chrome, joined, paint, refresh_station_menu,
    series_bars, wide_bar_size,
};
use crate::api::StatsApi;
use crate::api::types::{EnergySeriesPoint, StationStats, UnclassifiedModel};
use crate::charts::bars::draw_bar_chart_with_grid;
use crate::charts::format::{Period, plain_number};
use crate::charts::pie::{LegendStyle, draw_pie_chart};
use crate::charts::theme;

pub const ROUTE: &str = "/";

pub const UNCLASSIFIED_TOGGLE: &str = "btnUnclassified";
const UNCLASSIFIED_PANEL: &str = "unclassifiedPanel";

pub const EMPTY_UNCLASSIFIED: &str = "No hay modelos sin clasificar";
pub const UNCLASSIFIED_ERROR: &str = "Error cargando no clasificados";

const BINDINGS: &[EventKind] = &[
    EventKind::FilterChanged,
    EventKind::StationChanged,
    EventKind::ToggleUnclassified,
    EventKind::CloseUnclassified,
    EventKind::ToggleFilters,
    EventKind::ToggleStations,
    EventKind::ToggleUserMenu,
];

/// Pie size: `clamp(card - 32, 360, 800)` wide, 0.75 aspect, 360 minimum.
pub fn pie_size(card_width: f64) -> (f64, f64) {
    let w = (card_width - 32.0).clamp(360.0, 800.0);
    (w, 360.0_f64.max((w * 0.75).round()))
}

/// `"{brand} {model} — {count}"` lines, or the empty-state message.
pub fn unclassified_items(models: &[UnclassifiedModel]) -> Vec<Item> {
    if models.is_empty() {
        return vec![Item::text(EMPTY_UNCLASSIFIED)];
    }
    models
        .iter()
        .map(|m| Item::text(format!("{} — {}", m.label(), m.count)))
        .collect()
}

pub struct DashboardPage<'a, A: StatsApi + ?Sized> {
    api: &'a A,
    opts: RenderOptions,
    station: Station,
    filter: Filter,
    doc: Document,
    generation: LoadGeneration,
}

impl<'a, A: StatsApi + ?Sized> DashboardPage<'a, A> {
    pub fn new(api: &'a A, opts: RenderOptions, station: Station, filter: Filter) -> Self {
        let mut doc = Document::new("Panel de estación");
        declare_chrome(&mut doc, ROUTE, &filter);
        doc.declare_text("totalCargas", "Total cargas", "0")
            .declare_text("totalUsuarios", "Total usuarios", "0")
            .declare_text("totalEnergia", "Energía (Wh)", "0")
            .declare_text("cochesHibridos", "Vehículos PHEV", "0")
            .declare_text("cochesElectricos", "Vehículos EV", "0")
            .declare_text("cochesTotales", "Vehículos totales", "0")
            .declare_text("co2Evitado", "CO2 evitado (kg)", "0")
            .declare_chart("barsCU", "Cargas y usuarios")
            .declare_chart("barsEnergy", "Energía")
            .declare_chart("pieCanvas", "EV vs PHEV")
            .declare_chart("energySeries", "Energía por periodo")
            .declare_items(UNCLASSIFIED_PANEL, "Modelos sin clasificar")
            .declare_disclosure(
                UNCLASSIFIED_TOGGLE,
                &[UNCLASSIFIED_PANEL],
                false,
                "Ver no clasificados",
                "Ver no clasificados",
            );
        Self {
            api,
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

    // -- renderers --------------------------------------------------------

    fn render_stats(&mut self, stats: &StationStats) {
        let doc = &mut self.doc;
        doc.set_text("totalCargas", stats.total_cargas.to_string());
        doc.set_text("totalUsuarios", stats.total_usuarios.to_string());
        doc.set_text("totalEnergia", plain_number(stats.total_energy_wh));
        doc.set_text("cochesHibridos", stats.coches_hibridos.to_string());
        doc.set_text("cochesElectricos", stats.coches_electricos.to_string());
        doc.set_text("cochesTotales", stats.coches_totales.to_string());

        let (bw, bh) = wide_bar_size(self.opts.card_width);
        let counts = [stats.total_cargas as f64, stats.total_usuarios as f64];
        let chart = paint(&self.opts, bw, bh, |c| {
            Layout::Bars(draw_bar_chart_with_grid(
                c,
                &["Cargas".to_string(), "Usuarios".to_string()],
                &counts,
                &[theme::ORANGE, theme::GREEN],
            ))
        });
        self.doc.set_chart("barsCU", chart);

        let chart = paint(&self.opts, bw, bh, |c| {
            Layout::Bars(draw_bar_chart_with_grid(
                c,
                &["Energía (Wh)".to_string()],
                &[stats.total_energy_wh],
                &[theme::LIGHT_BLUE],
            ))
        });
        self.doc.set_chart("barsEnergy", chart);

        let (pw, ph) = pie_size(self.opts.card_width);
        let vehicles = [stats.coches_electricos as f64, stats.coches_hibridos as f64];
        let chart = paint(&self.opts, pw, ph, |c| {
            Layout::Pie(draw_pie_chart(
                c,
                &vehicles,
                &[theme::LIGHT_BLUE, theme::LIGHT_GREEN],
                &["EV", "PHEV"],
                LegendStyle::COMPACT,
            ))
        });
        self.doc.set_chart("pieCanvas", chart);
    }

    fn render_series(&mut self, series: &[EnergySeriesPoint], period: Period) {
        let (labels, values) = series_bars(series, period);
        let (w, h) = wide_bar_size(self.opts.card_width);
        let chart: Chart = paint(&self.opts, w, h, |c| {
            Layout::Bars(draw_bar_chart_with_grid(c, &labels, &values, &[theme::SERIES_GREEN]))
        });
        self.doc.set_chart("energySeries", chart);
    }

    /// Fetch and fill the unclassified-models list.
    fn render_unclassified(&mut self) {
        let items = match self
            .api
            .unclassified_models(self.station.as_str(), self.filter.as_str())
        {
            Ok(models) => unclassified_items(&models),
            Err(e) => {
                tracing::warn!(loader = "unclassified models", error = %e, "loader failed");
                vec![Item::text(UNCLASSIFIED_ERROR)]
            }
        };
        self.doc.set_items(UNCLASSIFIED_PANEL, items);
    }

    fn reload_with_filter(&mut self, filter: Filter) {
        self.filter = filter;
        refresh_station_menu(&mut self.doc, ROUTE, &self.filter);
        self.doc.set_expanded(super::chrome::FILTERS_TOGGLE, false);
        self.load();
        if self.doc.is_expanded(UNCLASSIFIED_TOGGLE) {
            self.render_unclassified();
        }
    }
}

impl<A: StatsApi + ?Sized> Page for DashboardPage<'_, A> {
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
        let period = self.filter.period();

        let (stats, summary, series) = thread::scope(|s| {
            let stats = s.spawn(|| api.station_stats(&station, &filter));
            let summary = s.spawn(|| api.energy_summary(&station, &filter));
            let series = s.spawn(|| api.energy_series(&station, &filter, period));
            (joined(stats), joined(summary), joined(series))
        });

        if let Some(stats) = absorb("station stats", stats) {
            self.render_stats(&stats);
        }
        if let Some(summary) = absorb("energy summary", summary) {
            self.doc.set_text("co2Evitado", plain_number(summary.co2_avoided_kg));
        }
        if let Some(series) = absorb("energy series", series) {
            self.render_series(&series, period);
        }
        self.doc.stamp(generation);
    }

    fn bindings(&self) -> &'static [EventKind] {
        BINDINGS
    }

    fn handle(&mut self, event: PageEvent) -> bool {
        if !BINDINGS.contains(&event.kind()) {
            return false;
        }
        if handle_chrome(&mut self.doc, &event) {
            return true;
        }
        match event {
            PageEvent::FilterChanged(filter) => self.reload_with_filter(filter),
            PageEvent::StationChanged(station) => {
                self.station = station;
                self.load();
            }
            PageEvent::ToggleUnclassified => {
                if self.doc.is_expanded(UNCLASSIFIED_TOGGLE) {
                    self.doc.set_expanded(UNCLASSIFIED_TOGGLE, false);
                } else {
                    self.render_unclassified();
                    self.doc.set_expanded(UNCLASSIFIED_TOGGLE, true);
                }
            }
            PageEvent::CloseUnclassified => {
                self.doc.set_expanded(UNCLASSIFIED_TOGGLE, false);
            }
            _ => return false,
        }
        true
    }
}
