/// Page controller tests.
///
/// Drive each page through the public API against the in-memory backend in
/// `common`, then inspect the resulting document: KPI text, chart geometry,
/// toggles and pagination.
mod common;

use std::f64::consts::TAU;

use cargaboard::api::ApiError;
use cargaboard::api::types::{
    DriversSummary, EnergySeriesPoint, EnergySummary, HabitsHistogram, LoyaltySummary, StationStats,
    UnclassifiedModel,
};
use cargaboard::pages::{
    ComparativesPage, DashboardPage, DriversPage, Filter, Layout, Page, PageEvent, RenderOptions,
    Station, SustainabilityPage, UsersPage,
};
use common::{FakeApi, driver, ranked};

fn station_stats() -> StationStats {
    StationStats {
        total_cargas: 120,
        total_usuarios: 34,
        total_energy_wh: 58000.0,
        coches_hibridos: 14,
        coches_electricos: 20,
        coches_totales: 34,
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[test]
fn dashboard_kpis_and_pie() {
    let api = FakeApi {
        stats: Ok(station_stats()),
        ..FakeApi::default()
    };
    let mut page = DashboardPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    page.load();
    let doc = page.document();

    assert_eq!(doc.text("totalCargas"), Some("120"));
    assert_eq!(doc.text("totalUsuarios"), Some("34"));
    assert_eq!(doc.text("totalEnergia"), Some("58000"));
    assert_eq!(doc.text("cochesHibridos"), Some("14"));
    assert_eq!(doc.text("cochesElectricos"), Some("20"));
    assert_eq!(doc.text("cochesTotales"), Some("34"));

    let Some(Layout::Pie(pie)) = doc.chart("pieCanvas").map(|c| &c.layout) else {
        panic!("pie not drawn");
    };
    assert!(close(pie.slices[0].sweep, TAU * 20.0 / 34.0));
    assert!(close(pie.slices[1].sweep, TAU * 14.0 / 34.0));
    assert_eq!(doc.generation(), 1);
}

#[test]
fn dashboard_failed_loader_leaves_widgets() {
    let api = FakeApi {
        stats: Err(ApiError::Http {
            status: 500,
            body: "boom".into(),
        }),
        energy: Ok(EnergySummary {
            co2_avoided_kg: 12.5,
            ..EnergySummary::default()
        }),
        ..FakeApi::default()
    };
    let mut page = DashboardPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    page.load();
    let doc = page.document();
    assert_eq!(doc.text("totalCargas"), Some("0"));
    assert!(doc.chart("barsCU").is_none());
    assert_eq!(doc.text("co2Evitado"), Some("12.5"));
    assert!(doc.chart("energySeries").is_some());
}

#[test]
fn dashboard_series_uses_filter_period() {
    let api = FakeApi {
        series: Ok((0..45)
            .map(|d| EnergySeriesPoint {
                period_start: format!("2025-03-{:02}", d % 28 + 1),
                energy_wh: d as f64,
            })
            .collect()),
        ..FakeApi::default()
    };
    let mut page = DashboardPage::new(&api, RenderOptions::default(), Station::Salvio, Filter::Mes);
    page.load();
    assert!(api.calls().contains(&"series Salvio mes/day".to_string()));
    let Some(Layout::Bars(bars)) = page.document().chart("energySeries").map(|c| &c.layout) else {
        panic!("series not drawn");
    };
    assert_eq!(bars.bars.len(), 30);
}

#[test]
fn unclassified_panel_opens_and_closes() {
    let api = FakeApi {
        unclassified: Ok(vec![UnclassifiedModel {
            brand: Some("BYD".into()),
            model: Some("Dolphin".into()),
            count: 3,
        }]),
        ..FakeApi::default()
    };
    let mut page = DashboardPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    assert!(page.document().is_hidden("unclassifiedPanel"));

    assert!(page.handle(PageEvent::ToggleUnclassified));
    let doc = page.document();
    assert!(!doc.is_hidden("unclassifiedPanel"));
    assert_eq!(doc.aria_expanded("btnUnclassified"), Some("true"));
    assert_eq!(doc.items("unclassifiedPanel").unwrap()[0].text, "BYD Dolphin — 3");

    assert!(page.handle(PageEvent::CloseUnclassified));
    assert!(page.document().is_hidden("unclassifiedPanel"));
    assert_eq!(page.document().aria_hidden("unclassifiedPanel"), Some("true"));
}

#[test]
fn unclassified_error_message() {
    let api = FakeApi {
        unclassified: Err(ApiError::Transport("down".into())),
        ..FakeApi::default()
    };
    let mut page = DashboardPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    page.handle(PageEvent::ToggleUnclassified);
    assert_eq!(
        page.document().items("unclassifiedPanel").unwrap()[0].text,
        "Error cargando no clasificados"
    );
}

#[test]
fn filter_change_reloads_and_closes_drawer() {
    let api = FakeApi::default();
    let mut page = DashboardPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    page.handle(PageEvent::ToggleFilters);
    assert_eq!(page.document().aria_expanded("filtersToggle"), Some("true"));

    page.handle(PageEvent::FilterChanged(Filter::Diario));
    assert_eq!(page.filter(), &Filter::Diario);
    assert_eq!(page.document().aria_expanded("filtersToggle"), Some("false"));
    assert!(api.calls().contains(&"last all diario".to_string()));
    assert!(api.calls().contains(&"series all diario/hour".to_string()));
}

#[test]
fn unbound_events_are_rejected() {
    let api = FakeApi::default();
    let mut page = DashboardPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    assert!(!page.handle(PageEvent::NextPage));
    assert!(!page.handle(PageEvent::ToggleUsers));
    assert!(api.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

#[test]
fn drivers_ranking_heat_and_donut() {
    let api = FakeApi {
        ranking: Ok(vec![ranked("Ana", 10), ranked("Luis", 3)]),
        habits: Ok(HabitsHistogram::default()),
        loyalty: Ok(LoyaltySummary {
            recurrentes: 3,
            nuevos: 1,
        }),
        summary: Ok(DriversSummary {
            total_drivers: 2,
            total_charges: 13,
            avg_charges_per_driver: 6.5,
        }),
        ..FakeApi::default()
    };
    let mut page = DriversPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    page.load();
    let doc = page.document();

    assert_eq!(doc.text("kpiTopDriver"), Some("Ana • 10"));
    assert_eq!(doc.text("kpiDrivers"), Some("2"));
    assert_eq!(doc.text("kpiCharges"), Some("13"));
    assert_eq!(doc.text("kpiAvg"), Some("6.5"));

    let Some(Layout::HBar(hbar)) = doc.chart("rankingChart").map(|c| &c.layout) else {
        panic!("ranking not drawn");
    };
    assert!(close(hbar.rows[0].width, hbar.bar_max_width));
    assert!(close(hbar.rows[1].width, hbar.bar_max_width * 0.3));

    let Some(Layout::Heat(cells)) = doc.chart("habitsGeneral").map(|c| &c.layout) else {
        panic!("heat strip not drawn");
    };
    assert_eq!(cells.len(), 24);
    assert!(cells.iter().all(|c| close(c.opacity, 0.15)));

    let Some(Layout::Donut(fraction)) = doc.chart("loyaltyChart").map(|c| &c.layout) else {
        panic!("donut not drawn");
    };
    assert!(close(*fraction, 0.75));

    // The driver list is not fetched while hidden.
    assert_eq!(api.count("users"), 0);
}

#[test]
fn drivers_empty_ranking_shows_dash() {
    let api = FakeApi::default();
    let mut page = DriversPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    page.load();
    assert_eq!(page.document().text("kpiTopDriver"), Some("-"));
    assert_eq!(page.document().text("kpiAvg"), Some("0.0"));
}

#[test]
fn drivers_list_toggle_and_pagination() {
    let api = FakeApi {
        users: Ok((0..30)
            .map(|i| driver(&format!("U{i}"), None, i, Some("EV")))
            .collect()),
        ..FakeApi::default()
    };
    let mut page = DriversPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    page.load();
    assert!(page.document().is_hidden("conductoresContainer"));
    assert!(page.document().is_hidden("pageInfo"));
    assert_eq!(page.document().disclosure("toggleUsers").unwrap().label(), "Ver conductores");

    page.handle(PageEvent::ToggleUsers);
    let doc = page.document();
    assert!(!doc.is_hidden("conductoresContainer"));
    assert_eq!(doc.disclosure("toggleUsers").unwrap().label(), "Ocultar conductores");
    assert_eq!(doc.cards("conductoresContainer").unwrap().len(), 12);
    assert_eq!(doc.text("pageInfo"), Some("Página 1 de 3"));

    page.handle(PageEvent::NextPage);
    page.handle(PageEvent::NextPage);
    page.handle(PageEvent::NextPage);
    assert_eq!(page.document().text("pageInfo"), Some("Página 3 de 3"));
    assert_eq!(page.document().cards("conductoresContainer").unwrap().len(), 6);

    // A reload while visible refetches and returns to page 1.
    page.handle(PageEvent::FilterChanged(Filter::Mes));
    assert_eq!(page.document().text("pageInfo"), Some("Página 1 de 3"));
    assert_eq!(api.count("users"), 2);
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[test]
fn users_empty_list_has_one_page() {
    let api = FakeApi::default();
    let mut page = UsersPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    page.load();
    assert_eq!(page.document().text("pageInfo"), Some("Página 1 de 1"));
    assert_eq!(page.document().cards("usuariosContainer"), Some(&[][..]));
    assert_eq!(page.pagination(), Some((1, 1)));
}

#[test]
fn users_cards_and_station_change() {
    let api = FakeApi {
        users: Ok(vec![driver("U1", Some("Marta"), 4, Some("phev")), driver("U2", None, 1, None)]),
        ..FakeApi::default()
    };
    let mut page = UsersPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    page.load();
    let cards = page.document().cards("usuariosContainer").unwrap().to_vec();
    assert_eq!(cards[0].title, "Marta");
    assert_eq!(cards[0].fields[3], ("Tipo".to_string(), "PHEV".to_string()));
    assert_eq!(cards[1].title, "U2");
    assert_eq!(cards[1].fields[3].1, "-");

    page.handle(PageEvent::StationChanged(Station::Portobelo));
    assert_eq!(page.document().text("stationSelect"), Some("Portobelo"));
    assert!(api.calls().contains(&"users Portobelo total".to_string()));
}

// ---------------------------------------------------------------------------
// Sustainability
// ---------------------------------------------------------------------------

#[test]
fn sustainability_charts_need_summary() {
    let api = FakeApi {
        energy: Err(ApiError::Unauthorized),
        ..FakeApi::default()
    };
    let mut page = SustainabilityPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    page.load();
    assert!(page.document().chart("comp100km").is_none());
    assert!(page.document().chart("sensGrid").is_none());
    assert!(page.document().chart("energySeries").is_some());
}

#[test]
fn sustainability_uses_default_assumptions() {
    let api = FakeApi {
        energy: Ok(EnergySummary {
            energy_kwh: 58.0,
            co2_grid_kg: 11.6,
            co2_ice_equiv_kg: 59.16,
            co2_avoided_kg: 47.56,
            ..EnergySummary::default()
        }),
        ..FakeApi::default()
    };
    let mut page = SustainabilityPage::new(&api, RenderOptions::default(), Station::All, Filter::Total);
    page.load();
    let doc = page.document();
    assert_eq!(doc.text("totalKWh"), Some("58"));
    assert_eq!(doc.text("co2Evitado"), Some("47.56"));

    let Some(Layout::Bars(bars)) = doc.chart("comp100km").map(|c| &c.layout) else {
        panic!("comparison not drawn");
    };
    // 100 / 6 * 0.2 and 100 * 0.17
    assert!(close(bars.bars[0].value, 100.0 / 6.0 * 0.2));
    assert!(close(bars.bars[1].value, 17.0));

    let Some(Layout::Line(line)) = doc.chart("sensGrid").map(|c| &c.layout) else {
        panic!("grid sweep not drawn");
    };
    assert_eq!(line.points.len(), 21);
    assert_eq!(line.marker.map(|(i, _, _)| i), Some(5));
}

// ---------------------------------------------------------------------------
// Comparatives
// ---------------------------------------------------------------------------

#[test]
fn comparatives_render_both_stations() {
    let api = FakeApi {
        station_stats: vec![
            ("Portobelo".into(), Ok(station_stats())),
            (
                "Salvio".into(),
                Ok(StationStats {
                    total_cargas: 60,
                    ..StationStats::default()
                }),
            ),
        ],
        ..FakeApi::default()
    };
    let mut page = ComparativesPage::new(&api, RenderOptions::default(), Filter::Mes);
    page.load();
    let doc = page.document();
    let cards = doc.cards("comparativesContainer").unwrap();
    assert_eq!(cards[0].title, "Portobelo");
    assert_eq!(cards[1].fields[0].1, "60");

    let Some(Layout::Grouped(grouped)) = doc.chart("barsCanvas").map(|c| &c.layout) else {
        panic!("grouped bars not drawn");
    };
    assert_eq!(grouped.bars.len(), 6);
    assert_eq!(grouped.group_max[0], 120.0);
    assert!(doc.chart("piePorto").is_some());
    assert!(doc.chart("pieSalvio").is_some());

    let mut calls = api.calls();
    calls.sort();
    assert_eq!(calls, vec!["last Portobelo mes", "last Salvio mes"]);
}

#[test]
fn comparatives_skip_render_when_one_station_fails() {
    let api = FakeApi {
        station_stats: vec![("Salvio".into(), Err(ApiError::Transport("timeout".into())))],
        stats: Ok(station_stats()),
        ..FakeApi::default()
    };
    let mut page = ComparativesPage::new(&api, RenderOptions::default(), Filter::Total);
    page.load();
    let doc = page.document();
    assert_eq!(doc.cards("comparativesContainer"), Some(&[][..]));
    assert!(doc.chart("barsCanvas").is_none());
    assert!(doc.chart("piePorto").is_none());
}

#[test]
fn poll_bumps_generation() {
    let api = FakeApi::default();
    let mut page = ComparativesPage::new(&api, RenderOptions::default(), Filter::Total);
    page.load();
    page.poll();
    assert_eq!(page.document().generation(), 2);
}
