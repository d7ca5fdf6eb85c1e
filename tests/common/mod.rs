//! In-memory `StatsApi` shared by the integration tests.
#![allow(dead_code)]

use std::sync::Mutex;

use cargaboard::api::types::{
    DriverRecord, DriversSummary, EnergySeriesPoint, EnergySummary, HabitsHistogram, Identity,
    LoyaltySummary, RankingItem, StationStats, UnclassifiedModel,
};
use cargaboard::api::{ApiError, ApiResult, StatsApi};
use cargaboard::charts::format::Period;

/// Canned responses per endpoint. Every call is recorded as
/// `"{endpoint} {station} {filter}"`.
pub struct FakeApi {
    pub stats: ApiResult<StationStats>,
    /// Per-station override used by the comparatives page.
    pub station_stats: Vec<(String, ApiResult<StationStats>)>,
    pub users: ApiResult<Vec<DriverRecord>>,
    pub ranking: ApiResult<Vec<RankingItem>>,
    pub habits: ApiResult<HabitsHistogram>,
    pub loyalty: ApiResult<LoyaltySummary>,
    pub summary: ApiResult<DriversSummary>,
    pub unclassified: ApiResult<Vec<UnclassifiedModel>>,
    pub energy: ApiResult<EnergySummary>,
    pub series: ApiResult<Vec<EnergySeriesPoint>>,
    pub me: ApiResult<Identity>,
    pub password: String,
    pub calls: Mutex<Vec<String>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            stats: Ok(StationStats::default()),
            station_stats: Vec::new(),
            users: Ok(Vec::new()),
            ranking: Ok(Vec::new()),
            habits: Ok(HabitsHistogram::default()),
            loyalty: Ok(LoyaltySummary::default()),
            summary: Ok(DriversSummary::default()),
            unclassified: Ok(Vec::new()),
            energy: Ok(EnergySummary::default()),
            series: Ok(Vec::new()),
            me: Ok(Identity {
                name: Some("Ana Pérez".into()),
                email: Some("ana@example.com".into()),
            }),
            password: "secret".into(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    fn record(&self, endpoint: &str, station: &str, filter: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{endpoint} {station} {filter}"));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(' ').next() == Some(endpoint))
            .count()
    }
}

pub fn driver(code: &str, name: Option<&str>, cargas: u64, category: Option<&str>) -> DriverRecord {
    DriverRecord {
        user_code: code.into(),
        user_name: name.map(String::from),
        total_cargas: cargas,
        total_energy_wh: cargas as f64 * 1000.0,
        brand: Some("Renault".into()),
        model: Some("Zoe".into()),
        category: category.map(String::from),
    }
}

pub fn ranked(name: &str, cargas: u64) -> RankingItem {
    RankingItem {
        user_name: Some(name.into()),
        total_cargas: cargas,
        ..RankingItem::default()
    }
}

impl StatsApi for FakeApi {
    fn station_stats(&self, station: &str, filter: &str) -> ApiResult<StationStats> {
        self.record("last", station, filter);
        self.station_stats
            .iter()
            .find(|(s, _)| s == station)
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| self.stats.clone())
    }

    fn users(&self, station: &str, filter: &str) -> ApiResult<Vec<DriverRecord>> {
        self.record("users", station, filter);
        self.users.clone()
    }

    fn ranking(&self, station: &str, filter: &str, limit: u32) -> ApiResult<Vec<RankingItem>> {
        self.record("ranking", station, filter);
        self.ranking
            .clone()
            .map(|items| items.into_iter().take(limit as usize).collect())
    }

    fn habits(&self, station: &str, filter: &str) -> ApiResult<HabitsHistogram> {
        self.record("habits", station, filter);
        self.habits.clone()
    }

    fn loyalty(&self, station: &str, filter: &str) -> ApiResult<LoyaltySummary> {
        self.record("loyalty", station, filter);
        self.loyalty.clone()
    }

    fn drivers_summary(&self, station: &str, filter: &str, _threshold: f64) -> ApiResult<DriversSummary> {
        self.record("summary", station, filter);
        self.summary.clone()
    }

    fn unclassified_models(&self, station: &str, filter: &str) -> ApiResult<Vec<UnclassifiedModel>> {
        self.record("unclassified", station, filter);
        self.unclassified.clone()
    }

    fn energy_summary(&self, station: &str, filter: &str) -> ApiResult<EnergySummary> {
        self.record("energy", station, filter);
        self.energy.clone()
    }

    fn energy_series(&self, station: &str, filter: &str, period: Period) -> ApiResult<Vec<EnergySeriesPoint>> {
        self.record("series", station, &format!("{filter}/{}", period.as_str()));
        self.series.clone()
    }

    fn me(&self) -> ApiResult<Identity> {
        self.record("me", "-", "-");
        self.me.clone()
    }

    fn login(&self, email: &str, password: &str) -> ApiResult<Identity> {
        self.record("login", email, "-");
        if password == self.password {
            self.me.clone()
        } else {
            Err(ApiError::Unauthorized)
        }
    }

    fn logout(&self) -> ApiResult<()> {
        self.record("logout", "-", "-");
        Ok(())
    }

    fn refresh(&self) -> ApiResult<()> {
        self.record("refresh", "-", "-");
        Ok(())
    }
}
