/// Data-transfer shapes returned by the statistics API.
///
/// Every field is optional on the wire: absent or `null` values decode to
/// their defaults (0 for numbers, empty for lists), so a renderer never sees
/// a missing number.
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` as `T::default()`.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Station snapshot
// ---------------------------------------------------------------------------

/// `GET /api/stats/last`: KPIs for one station and filter window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationStats {
    #[serde(deserialize_with = "null_default")]
    pub total_cargas: u64,
    #[serde(deserialize_with = "null_default")]
    pub total_usuarios: u64,
    #[serde(rename = "total_energy_Wh", deserialize_with = "null_default")]
    pub total_energy_wh: f64,
    #[serde(deserialize_with = "null_default")]
    pub coches_hibridos: u64,
    #[serde(deserialize_with = "null_default")]
    pub coches_electricos: u64,
    #[serde(deserialize_with = "null_default")]
    pub coches_totales: u64,
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

/// Vehicle category of a driver, as shown on driver cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleType {
    Ev,
    Phev,
    Unknown,
}

impl VehicleType {
    /// Map a backend category (case-insensitive). Anything other than
    /// `EV` / `PHEV` is unknown.
    pub fn from_category(category: Option<&str>) -> Self {
        match category.map(str::to_ascii_uppercase).as_deref() {
            Some("EV") => Self::Ev,
            Some("PHEV") => Self::Phev,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ev => "EV",
            Self::Phev => "PHEV",
            Self::Unknown => "-",
        }
    }
}

/// One row of `GET /api/stats/users/{station}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverRecord {
    #[serde(deserialize_with = "null_default")]
    pub user_code: String,
    pub user_name: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub total_cargas: u64,
    #[serde(rename = "total_energy_Wh", deserialize_with = "null_default")]
    pub total_energy_wh: f64,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category: Option<String>,
}

impl DriverRecord {
    /// Name shown on the card: the user name, else the user code.
    pub fn display_name(&self) -> &str {
        match self.user_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.user_code,
        }
    }

    /// Model shown on the card, `-` when unknown.
    pub fn model_label(&self) -> &str {
        match self.model.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ => "-",
        }
    }

    pub fn vehicle_type(&self) -> VehicleType {
        VehicleType::from_category(self.category.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UsersResponse {
    #[serde(deserialize_with = "null_default")]
    pub usuarios: Vec<DriverRecord>,
}

/// One entry of `GET /api/stats/drivers/ranking`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingItem {
    pub user_code: Option<String>,
    pub user_name: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub total_cargas: u64,
    #[serde(rename = "total_energy_Wh", deserialize_with = "null_default")]
    pub total_energy_wh: f64,
    #[serde(deserialize_with = "null_default")]
    pub total_ingresos: f64,
}

impl RankingItem {
    /// Label of the ranking row: user name, else user code, else empty.
    pub fn display_name(&self) -> &str {
        [self.user_name.as_deref(), self.user_code.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RankingResponse {
    #[serde(deserialize_with = "null_default")]
    pub items: Vec<RankingItem>,
}

/// `GET /api/stats/drivers/summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriversSummary {
    #[serde(deserialize_with = "null_default")]
    pub total_drivers: u64,
    #[serde(deserialize_with = "null_default")]
    pub total_charges: u64,
    #[serde(deserialize_with = "null_default")]
    pub avg_charges_per_driver: f64,
}

/// `GET /api/stats/drivers/loyalty`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoyaltySummary {
    #[serde(deserialize_with = "null_default")]
    pub recurrentes: u64,
    #[serde(deserialize_with = "null_default")]
    pub nuevos: u64,
}

impl LoyaltySummary {
    pub fn total(&self) -> u64 {
        self.recurrentes + self.nuevos
    }
}

fn empty_day() -> Vec<f64> {
    vec![0.0; 24]
}

/// `GET /api/stats/habits/general`: sessions per hour of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitsHistogram {
    #[serde(default = "empty_day", deserialize_with = "null_default")]
    pub histogram: Vec<f64>,
}

impl Default for HabitsHistogram {
    fn default() -> Self {
        Self {
            histogram: empty_day(),
        }
    }
}

// ---------------------------------------------------------------------------
// Vehicle models
// ---------------------------------------------------------------------------

/// One entry of `GET /api/stats/unclassified-models`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnclassifiedModel {
    pub brand: Option<String>,
    pub model: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub count: u64,
}

impl UnclassifiedModel {
    /// `"{brand} {model}"`, each part `-` when missing.
    pub fn label(&self) -> String {
        let part = |s: &Option<String>| match s.as_deref() {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => "-".to_string(),
        };
        format!("{} {}", part(&self.brand), part(&self.model))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnclassifiedResponse {
    #[serde(deserialize_with = "null_default")]
    pub items: Vec<UnclassifiedModel>,
}

// ---------------------------------------------------------------------------
// Energy
// ---------------------------------------------------------------------------

/// Assumptions the backend used for its CO2 figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionSet {
    #[serde(rename = "GRID_CO2_KG_PER_KWH", deserialize_with = "null_default")]
    pub grid_co2_kg_per_kwh: f64,
    #[serde(rename = "EV_KM_PER_KWH", deserialize_with = "null_default")]
    pub ev_km_per_kwh: f64,
    #[serde(rename = "ICE_CO2_KG_PER_KM", deserialize_with = "null_default")]
    pub ice_co2_kg_per_km: f64,
}

/// `GET /api/stats/energy/summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergySummary {
    #[serde(rename = "energy_kWh", deserialize_with = "null_default")]
    pub energy_kwh: f64,
    #[serde(deserialize_with = "null_default")]
    pub co2_grid_kg: f64,
    #[serde(deserialize_with = "null_default")]
    pub co2_ice_equiv_kg: f64,
    #[serde(deserialize_with = "null_default")]
    pub co2_avoided_kg: f64,
    #[serde(deserialize_with = "null_default")]
    pub assumptions: AssumptionSet,
}

/// One bucket of `GET /api/stats/energy/series`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergySeriesPoint {
    #[serde(deserialize_with = "null_default")]
    pub period_start: String,
    #[serde(rename = "energy_Wh", deserialize_with = "null_default")]
    pub energy_wh: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnergySeries {
    #[serde(deserialize_with = "null_default")]
    pub series: Vec<EnergySeriesPoint>,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// `GET /api/stats/auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Body of `POST /api/stats/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
