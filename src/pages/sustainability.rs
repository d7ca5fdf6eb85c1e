/// Sustainability page (`/sustainability`).
///
/// Energy and CO2 KPIs from the energy summary, the EV vs ICE per-100km
/// comparison, the two sensitivity sweeps, and the energy series. The three
/// CO2 charts are only drawn when the summary loads, since they depend on
/// the backend's assumptions.
use std::thread;

use super::{
    Document, EventKind, Filter, Layout, LoadGeneration, Page, PageEvent, RenderOptions, Station,
    absorb, declare_chrome, handle_chrome, joined, paint, refresh_station_menu, series_bars,
    wide_bar_size,
};
use crate::api::StatsApi;
use crate::api::types::EnergySummary;
use crate::charts::bars::draw_bar_chart_with_grid;
use crate::charts::format::plain_number;
use crate::charts::line::draw_line_chart_with_grid;
use crate::charts::theme;
use crate::co2::{self, Assumptions, Sweep};

pub const ROUTE: &str = "/sustainability";

const BINDINGS: &[EventKind] = &[
    EventKind::FilterChanged,
    EventKind::StationChanged,
    EventKind::ToggleFilters,
    EventKind::ToggleStations,
    EventKind::ToggleUserMenu,
];

/// CO2 chart size: `clamp(card - 32, 360, 800)` wide, 0.55 aspect, 320
/// minimum.
pub fn co2_chart_size(card_width: f64) -> (f64, f64) {
    let w = (card_width - 32.0).clamp(360.0, 800.0);
    (w, 320.0_f64.max((w * 0.55).round()))
}

pub struct SustainabilityPage<'a, A: StatsApi + ?Sized> {
    api: &'a A,
    opts: RenderOptions,
    station: Station,
    filter: Filter,
    doc: Document,
    generation: LoadGeneration,
}

impl<'a, A: StatsApi + ?Sized> SustainabilityPage<'a, A> {
    pub fn new(api: &'a A, opts: RenderOptions, station: Station, filter: Filter) -> Self {
        let mut doc = Document::new("Sostenibilidad");
        declare_chrome(&mut doc, ROUTE, &filter);
        doc.declare_text("totalKWh", "Energía (kWh)", "0")
            .declare_text("co2Red", "CO2 red eléctrica (kg)", "0")
            .declare_text("co2ICE", "CO2 equivalente ICE (kg)", "0")
            .declare_text("co2Evitado", "CO2 evitado (kg)", "0")
            .declare_chart("comp100km", "EV vs ICE cada 100 km")
            .declare_chart("sensGrid", "Sensibilidad a la red")
            .declare_chart("sensEff", "Sensibilidad a la eficiencia")
            .declare_chart("energySeries", "Energía por periodo");
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

    fn render_summary(&mut self, summary: &EnergySummary) {
        self.doc.set_text("totalKWh", plain_number(summary.energy_kwh));
        self.doc.set_text("co2Red", plain_number(summary.co2_grid_kg));
        self.doc.set_text("co2ICE", plain_number(summary.co2_ice_equiv_kg));
        self.doc.set_text("co2Evitado", plain_number(summary.co2_avoided_kg));

        let a = Assumptions::from_summary(summary);
        let (w, h) = co2_chart_size(self.opts.card_width);

        let per_100km = [
            co2::ev_kg_per_100km(a.grid, a.efficiency),
            co2::ice_kg_per_100km(a.ice),
        ];
        let chart = paint(&self.opts, w, h, |c| {
            Layout::Bars(draw_bar_chart_with_grid(
                c,
                &["EV (red)".to_string(), "ICE".to_string()],
                &per_100km,
                &[theme::LIGHT_BLUE, theme::LIGHT_GREEN],
            ))
        });
        self.doc.set_chart("comp100km", chart);

        self.render_sweep("sensGrid", &co2::grid_sweep(&a), theme::SWEEP_ORANGE, 2, w, h);
        self.render_sweep("sensEff", &co2::efficiency_sweep(&a), theme::SWEEP_BLUE, 1, w, h);
    }

    fn render_sweep(&mut self, id: &str, sweep: &Sweep, color: &str, decimals: usize, w: f64, h: f64) {
        let chart = paint(&self.opts, w, h, |c| {
            Layout::Line(draw_line_chart_with_grid(
                c,
                &sweep.xs,
                &sweep.ys,
                color,
                Some(sweep.current),
                |x| format!("{x:.decimals$}"),
            ))
        });
        self.doc.set_chart(id, chart);
    }
}

impl<A: StatsApi + ?Sized> Page for SustainabilityPage<'_, A> {
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

        let (summary, series) = thread::scope(|s| {
            let summary = s.spawn(|| api.energy_summary(&station, &filter));
            let series = s.spawn(|| api.energy_series(&station, &filter, period));
            (joined(summary), joined(series))
        });

        if let Some(summary) = absorb("energy summary", summary) {
            self.render_summary(&summary);
        }
        if let Some(series) = absorb("energy series", series) {
            let (labels, values) = series_bars(&series, period);
            let (w, h) = wide_bar_size(self.opts.card_width);
            let chart = paint(&self.opts, w, h, |c| {
                Layout::Bars(draw_bar_chart_with_grid(c, &labels, &values, &[theme::SERIES_GREEN]))
            });
            self.doc.set_chart("energySeries", chart);
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
            _ => return false,
        }
        true
    }
}
