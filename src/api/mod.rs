/// Statistics backend API.
///
/// [`StatsApi`] is the seam every page loader goes through: one method per
/// `/api/stats/*` endpoint. [`StatsClient`] is the HTTP implementation;
/// tests substitute an in-memory fake.
pub mod client;
pub mod session;
pub mod types;

pub use client::StatsClient;
pub use session::Session;

use crate::charts::format::Period;
use types::{
    DriverRecord, DriversSummary, EnergySeriesPoint, EnergySummary, HabitsHistogram, Identity,
    LoyaltySummary, RankingItem, StationStats, UnclassifiedModel,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a single backend call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The backend rejected the session (HTTP 401).
    #[error("not authenticated")]
    Unauthorized,
    /// Any other non-2xx response.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// No response: connection refused, timeout, DNS.
    #[error("transport error: {0}")]
    Transport(String),
    /// A 2xx response whose body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// HTTP status, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// The seam
// ---------------------------------------------------------------------------

/// One method per statistics endpoint.
///
/// `station` and `filter` are passed through verbatim and percent-encoded by
/// the implementation. Implementations must be shareable across the scoped
/// threads used by the comparatives page.
pub trait StatsApi: Sync {
    /// `GET /api/stats/last`
    fn station_stats(&self, station: &str, filter: &str) -> ApiResult<StationStats>;
    /// `GET /api/stats/users/{station}`
    fn users(&self, station: &str, filter: &str) -> ApiResult<Vec<DriverRecord>>;
    /// `GET /api/stats/drivers/ranking`
    fn ranking(&self, station: &str, filter: &str, limit: u32) -> ApiResult<Vec<RankingItem>>;
    /// `GET /api/stats/habits/general`
    fn habits(&self, station: &str, filter: &str) -> ApiResult<HabitsHistogram>;
    /// `GET /api/stats/drivers/loyalty`
    fn loyalty(&self, station: &str, filter: &str) -> ApiResult<LoyaltySummary>;
    /// `GET /api/stats/drivers/summary`
    fn drivers_summary(&self, station: &str, filter: &str, threshold: f64) -> ApiResult<DriversSummary>;
    /// `GET /api/stats/unclassified-models`
    fn unclassified_models(&self, station: &str, filter: &str) -> ApiResult<Vec<UnclassifiedModel>>;
    /// `GET /api/stats/energy/summary`
    fn energy_summary(&self, station: &str, filter: &str) -> ApiResult<EnergySummary>;
    /// `GET /api/stats/energy/series`
    fn energy_series(&self, station: &str, filter: &str, period: Period) -> ApiResult<Vec<EnergySeriesPoint>>;

    /// `GET /api/stats/auth/me`
    fn me(&self) -> ApiResult<Identity>;
    /// `POST /api/stats/auth/login`
    fn login(&self, email: &str, password: &str) -> ApiResult<Identity>;
    /// `POST /api/stats/auth/logout`
    fn logout(&self) -> ApiResult<()>;
    /// `POST /api/stats/auth/refresh`
    fn refresh(&self) -> ApiResult<()>;
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

/// Build `path?k=v&...` with every value percent-encoded.
pub fn with_query(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect();
    format!("{path}?{}", query.join("&"))
}

/// Standard `station` / `filter` pair.
pub fn station_filter(station: &str, filter: &str) -> Vec<(&'static str, String)> {
    vec![("station", station.to_string()), ("filter", filter.to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_values_are_percent_encoded() {
        let url = with_query(
            "/api/stats/last",
            &[("station", "Puerto Banús".to_string()), ("filter", "a&b".to_string())],
        );
        assert_eq!(url, "/api/stats/last?station=Puerto%20Ban%C3%BAs&filter=a%26b");
        assert_eq!(with_query("/x", &[]), "/x");
    }

    #[test]
    fn error_status() {
        assert_eq!(ApiError::Unauthorized.status(), Some(401));
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert_eq!(ApiError::Transport("refused".into()).status(), None);
        let e = ApiError::Http {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(e.to_string(), "HTTP 500: boom");
    }
}
