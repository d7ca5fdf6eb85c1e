/// CO2-avoided model behind the sustainability page.
///
/// Compares the grid emissions of charging an EV for 100 km against the
/// tailpipe emissions of an equivalent combustion car, and sweeps one
/// assumption at a time to show how sensitive the result is.
use crate::api::types::EnergySummary;

/// Default grid carbon intensity (kg CO2 per kWh).
pub const DEFAULT_GRID_KG_PER_KWH: f64 = 0.20;
/// Default EV efficiency (km per kWh).
pub const DEFAULT_EV_KM_PER_KWH: f64 = 6.0;
/// Default ICE emission factor (kg CO2 per km).
pub const DEFAULT_ICE_KG_PER_KM: f64 = 0.17;

/// Efficiency floor guarding the EV per-100km division.
const MIN_EFFICIENCY: f64 = 0.1;

/// The three assumptions the backend used for its CO2 figures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assumptions {
    pub grid: f64,
    pub efficiency: f64,
    pub ice: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            grid: DEFAULT_GRID_KG_PER_KWH,
            efficiency: DEFAULT_EV_KM_PER_KWH,
            ice: DEFAULT_ICE_KG_PER_KM,
        }
    }
}

impl Assumptions {
    /// Read the assumptions from an energy summary. Missing or zero values
    /// fall back to the defaults.
    pub fn from_summary(summary: &EnergySummary) -> Self {
        let pick = |v: f64, default: f64| if v != 0.0 && v.is_finite() { v } else { default };
        let a = &summary.assumptions;
        Self {
            grid: pick(a.grid_co2_kg_per_kwh, DEFAULT_GRID_KG_PER_KWH),
            efficiency: pick(a.ev_km_per_kwh, DEFAULT_EV_KM_PER_KWH),
            ice: pick(a.ice_co2_kg_per_km, DEFAULT_ICE_KG_PER_KM),
        }
    }
}

/// Grid emissions of an EV driving 100 km.
pub fn ev_kg_per_100km(grid: f64, efficiency: f64) -> f64 {
    (100.0 / efficiency.max(MIN_EFFICIENCY)) * grid
}

/// Tailpipe emissions of a combustion car driving 100 km.
pub fn ice_kg_per_100km(ice: f64) -> f64 {
    100.0 * ice
}

/// CO2 avoided per 100 km by driving electric.
pub fn avoided_per_100km(grid: f64, efficiency: f64, ice: f64) -> f64 {
    ice_kg_per_100km(ice) - ev_kg_per_100km(grid, efficiency)
}

/// A one-assumption sweep: parallel x / y vectors plus the current x.
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub current: f64,
}

/// Sweep `count` evenly spaced x values from `start` by `step`, rounded to
/// `decimals`.
fn sweep_axis(start: f64, step: f64, count: usize, decimals: i32) -> Vec<f64> {
    let scale = 10f64.powi(decimals);
    (0..count)
        .map(|i| ((start + i as f64 * step) * scale).round() / scale)
        .collect()
}

/// Grid carbon intensity from 0.00 to 0.80 kg/kWh in 0.04 steps.
pub fn grid_sweep(a: &Assumptions) -> Sweep {
    let xs = sweep_axis(0.0, 0.04, 21, 2);
    let ys = xs
        .iter()
        .map(|&g| avoided_per_100km(g, a.efficiency, a.ice))
        .collect();
    Sweep {
        xs,
        ys,
        current: a.grid,
    }
}

/// EV efficiency from 4.0 to 8.0 km/kWh in 0.2 steps.
pub fn efficiency_sweep(a: &Assumptions) -> Sweep {
    let xs = sweep_axis(4.0, 0.2, 21, 1);
    let ys = xs
        .iter()
        .map(|&e| avoided_per_100km(a.grid, e, a.ice))
        .collect();
    Sweep {
        xs,
        ys,
        current: a.efficiency,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
