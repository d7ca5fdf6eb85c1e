/// Station comparison page (`/compare`).
///
/// Fetches Portobelo and Salvio side by side. Nothing is rendered unless
/// both stations load, so the cards and charts never mix a fresh station
/// with a stale one.
use std::thread;

use super::{
    Card, Document, EventKind, Filter, Layout, LoadGeneration, Page, PageEvent, RenderOptions,
    Station, absorb, declare_chrome, handle_chrome, joined, paint, refresh_station_menu,
};
use crate::api::StatsApi;
use crate::api::types::StationStats;
use crate::charts::bars::{Series, draw_grouped_bar_chart};
use crate::charts::format::plain_number;
use crate::charts::pie::{LegendStyle, draw_pie_chart};
use crate::charts::theme;

pub const ROUTE: &str = "/compare";

pub const FILTER_SELECT: &str = "filterComparatives";
const CARDS: &str = "comparativesContainer";

const BINDINGS: &[EventKind] = &[
    EventKind::FilterChanged,
    EventKind::ToggleFilters,
    EventKind::ToggleStations,
    EventKind::ToggleUserMenu,
];

/// Comparison card for one station.
pub fn station_card(name: &str, stats: &StationStats) -> Card {
    Card {
        title: name.to_string(),
        fields: vec![
            ("Total Cargas".to_string(), stats.total_cargas.to_string()),
            ("Total Usuarios".to_string(), stats.total_usuarios.to_string()),
            ("Energía (Wh)".to_string(), plain_number(stats.total_energy_wh)),
            ("Vehículos PHEV".to_string(), stats.coches_hibridos.to_string()),
            ("Vehículos EV".to_string(), stats.coches_electricos.to_string()),
            ("Vehículos Totales".to_string(), stats.coches_totales.to_string()),
        ],
    }
}

/// Grouped bars: `clamp(card - 32, 480, 1000)` by 360.
pub fn grouped_size(card_width: f64) -> (f64, f64) {
    ((card_width - 32.0).clamp(480.0, 1000.0), 360.0)
}

/// Each of the two pies: `clamp(floor((card - 60) / 2), 280, 420)` by 300.
pub fn half_pie_size(card_width: f64) -> (f64, f64) {
    (((card_width - 60.0) / 2.0).floor().clamp(280.0, 420.0), 300.0)
}

pub struct ComparativesPage<'a, A: StatsApi + ?Sized> {
    api: &'a A,
    opts: RenderOptions,
    filter: Filter,
    doc: Document,
    generation: LoadGeneration,
}

impl<'a, A: StatsApi + ?Sized> ComparativesPage<'a, A> {
    pub fn new(api: &'a A, opts: RenderOptions, filter: Filter) -> Self {
        let mut doc = Document::new("Comparativas");
        declare_chrome(&mut doc, ROUTE, &filter);
        doc.declare_text(FILTER_SELECT, "Periodo", filter.as_str())
            .declare_cards(CARDS, "Estaciones")
            .declare_chart("barsCanvas", "Portobelo vs Salvio")
            .declare_chart("piePorto", "Portobelo EV vs PHEV")
            .declare_chart("pieSalvio", "Salvio EV vs PHEV");
        Self {
            api,
            opts,
            filter,
            doc,
            generation: LoadGeneration::default(),
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    fn render(&mut self, porto: &StationStats, salvio: &StationStats) {
        let names = [Station::Portobelo.as_str(), Station::Salvio.as_str()];
        self.doc.set_cards(
            CARDS,
            vec![station_card(names[0], porto), station_card(names[1], salvio)],
        );

        let metrics = |s: &StationStats| {
            vec![s.total_cargas as f64, s.total_usuarios as f64, s.total_energy_wh]
        };
        let labels = ["Cargas", "Usuarios", "Energía (Wh)"].map(String::from);
        let series = [
            Series {
                name: names[0],
                color: theme::ORANGE,
                values: metrics(porto),
            },
            Series {
                name: names[1],
                color: theme::LIGHT_BLUE,
                values: metrics(salvio),
            },
        ];
        let (w, h) = grouped_size(self.opts.card_width);
        let chart = paint(&self.opts, w, h, |c| {
            Layout::Grouped(draw_grouped_bar_chart(c, &labels, &series))
        });
        self.doc.set_chart("barsCanvas", chart);

        let (pw, ph) = half_pie_size(self.opts.card_width);
        for (id, stats) in [("piePorto", porto), ("pieSalvio", salvio)] {
            let vehicles = [stats.coches_electricos as f64, stats.coches_hibridos as f64];
            let chart = paint(&self.opts, pw, ph, |c| {
                Layout::Pie(draw_pie_chart(
                    c,
                    &vehicles,
                    &[theme::LIGHT_BLUE, theme::LIGHT_GREEN],
                    &["EV", "PHEV"],
                    LegendStyle::DETAILED,
                ))
            });
            self.doc.set_chart(id, chart);
        }
    }
}

impl<A: StatsApi + ?Sized> Page for ComparativesPage<'_, A> {
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
        let filter = self.filter.as_str().to_string();

        let (porto, salvio) = thread::scope(|s| {
            let porto = s.spawn(|| api.station_stats(Station::Portobelo.as_str(), &filter));
            let salvio = s.spawn(|| api.station_stats(Station::Salvio.as_str(), &filter));
            (joined(porto), joined(salvio))
        });

        let porto = absorb("portobelo stats", porto);
        let salvio = absorb("salvio stats", salvio);
        if let (Some(porto), Some(salvio)) = (porto, salvio) {
            self.render(&porto, &salvio);
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
                self.doc.set_text(FILTER_SELECT, filter.as_str());
                self.filter = filter;
                refresh_station_menu(&mut self.doc, ROUTE, &self.filter);
                self.load();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_fields() {
        let stats = StationStats {
            total_cargas: 7,
            total_energy_wh: 1500.0,
            coches_electricos: 2,
            ..StationStats::default()
        };
        let card = station_card("Salvio", &stats);
        assert_eq!(card.title, "Salvio");
        assert_eq!(card.fields.len(), 6);
        assert_eq!(card.fields[0], ("Total Cargas".to_string(), "7".to_string()));
        assert_eq!(card.fields[4].1, "2");
    }

    #[test]
    fn sizes_clamp() {
        assert_eq!(grouped_size(960.0), (928.0, 360.0));
        assert_eq!(grouped_size(300.0), (480.0, 360.0));
        assert_eq!(half_pie_size(960.0), (420.0, 300.0));
        assert_eq!(half_pie_size(700.0), (320.0, 300.0));
        assert_eq!(half_pie_size(100.0), (280.0, 300.0));
    }
}
