/// HTTP implementation of [`StatsApi`] on a blocking `ureq` agent.
///
/// The session cookies live behind a mutex so one client can be shared by
/// the scoped threads of the comparatives page. Every call is appended to
/// the fetch log.
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::session::Session;
use super::types::{
    DriverRecord, DriversSummary, EnergySeries, EnergySeriesPoint, EnergySummary, HabitsHistogram,
    Identity, LoginRequest, LoyaltySummary, RankingItem, RankingResponse, StationStats,
    UnclassifiedModel, UnclassifiedResponse, UsersResponse,
};
use super::{ApiError, ApiResult, StatsApi, station_filter, with_query};
use crate::charts::format::Period;
use crate::config::DashboardConfig;
use crate::config::schema::expand_home;
use crate::diagnostics::fetch_log::{FetchLog, FetchLogEntry};

/// Longest error body kept in [`ApiError::Http`].
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    user: Identity,
}

pub struct StatsClient {
    agent: ureq::Agent,
    base_url: String,
    session: Mutex<Session>,
    session_path: Option<PathBuf>,
    log: FetchLog,
}

impl StatsClient {
    /// Client for `base_url` with an empty in-memory session and no fetch log.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url: normalize_base_url(base_url),
            session: Mutex::new(Session::default()),
            session_path: None,
            log: FetchLog::disabled(),
        }
    }

    /// Client wired from the resolved config: session file and fetch log.
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(&config.api.base_url, Duration::from_millis(config.api.timeout_ms))
            .with_session_file(expand_home(&config.api.session_path))
            .with_fetch_log(FetchLog::from_config(&config.logging))
    }

    /// Load cookies from `path` and write them back whenever they change.
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.session = Mutex::new(Session::load(&path));
        self.session_path = Some(path);
        self
    }

    pub fn with_fetch_log(mut self, log: FetchLog) -> Self {
        self.log = log;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session_path(&self) -> Option<&std::path::Path> {
        self.session_path.as_deref()
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.lock_session().clone()
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist_session(&self, session: &Session) {
        let Some(path) = &self.session_path else {
            return;
        };
        if let Err(e) = session.save(path) {
            tracing::warn!(error = %e, "could not persist session");
        }
    }

    fn absorb_cookies(&self, resp: &ureq::Response) {
        let headers = resp.all("set-cookie");
        if headers.is_empty() {
            return;
        }
        let mut session = self.lock_session();
        let mut changed = false;
        for header in headers {
            changed |= session.absorb_set_cookie(header);
        }
        if changed {
            self.persist_session(&session);
        }
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    fn send(&self, method: &str, path: &str, body: Option<serde_json::Value>) -> ApiResult<ureq::Response> {
        self.exchange(method, path, body).map_err(truncate_body)
    }

    /// Like [`send`](Self::send), but an [`ApiError::Http`] keeps the whole
    /// response body.
    fn exchange(&self, method: &str, path: &str, body: Option<serde_json::Value>) -> ApiResult<ureq::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.agent.request(method, &url);
        if let Some(cookie) = self.lock_session().cookie_header() {
            req = req.set("Cookie", &cookie);
        }

        let started = Instant::now();
        let result = match body {
            Some(json) => req.send_json(json),
            None => req.call(),
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(resp) => {
                tracing::debug!(method, path, status = resp.status(), latency_ms, "api call");
                self.log
                    .record(&FetchLogEntry::now(method, path, Some(resp.status()), latency_ms));
                self.absorb_cookies(&resp);
                Ok(resp)
            }
            Err(ureq::Error::Status(status, resp)) => {
                tracing::debug!(method, path, status, latency_ms, "api call failed");
                self.log.record(&FetchLogEntry::now(method, path, Some(status), latency_ms));
                self.absorb_cookies(&resp);
                if status == 401 {
                    return Err(ApiError::Unauthorized);
                }
                let body = resp.into_string().unwrap_or_default();
                Err(ApiError::Http { status, body })
            }
            Err(ureq::Error::Transport(t)) => {
                tracing::debug!(method, path, error = %t, "api transport failure");
                self.log.record(&FetchLogEntry::now(method, path, None, latency_ms));
                Err(ApiError::Transport(t.to_string()))
            }
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send("GET", path, None)?
            .into_json()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn post(&self, path: &str, body: Option<serde_json::Value>) -> ApiResult<ureq::Response> {
        self.send("POST", path, body)
    }
}

fn truncate_body(err: ApiError) -> ApiError {
    match err {
        ApiError::Http { status, body } => ApiError::Http {
            status,
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        },
        other => other,
    }
}

/// Strip trailing slashes and pin `localhost` to IPv4, so a backend bound
/// only to 127.0.0.1 does not stall on `::1` first.
fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').replace("://localhost", "://127.0.0.1")
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

impl StatsApi for StatsClient {
    fn station_stats(&self, station: &str, filter: &str) -> ApiResult<StationStats> {
        self.get_json(&with_query("/api/stats/last", &station_filter(station, filter)))
    }

    fn users(&self, station: &str, filter: &str) -> ApiResult<Vec<DriverRecord>> {
        let path = format!("/api/stats/users/{}", urlencoding::encode(station));
        let resp: UsersResponse = self.get_json(&with_query(&path, &[("filter", filter.to_string())]))?;
        Ok(resp.usuarios)
    }

    fn ranking(&self, station: &str, filter: &str, limit: u32) -> ApiResult<Vec<RankingItem>> {
        let mut params = station_filter(station, filter);
        params.push(("limit", limit.to_string()));
        let resp: RankingResponse = self.get_json(&with_query("/api/stats/drivers/ranking", &params))?;
        Ok(resp.items)
    }

    fn habits(&self, station: &str, filter: &str) -> ApiResult<HabitsHistogram> {
        self.get_json(&with_query("/api/stats/habits/general", &station_filter(station, filter)))
    }

    fn loyalty(&self, station: &str, filter: &str) -> ApiResult<LoyaltySummary> {
        self.get_json(&with_query("/api/stats/drivers/loyalty", &station_filter(station, filter)))
    }

    fn drivers_summary(&self, station: &str, filter: &str, threshold: f64) -> ApiResult<DriversSummary> {
        let mut params = station_filter(station, filter);
        params.push(("threshold", threshold.to_string()));
        self.get_json(&with_query("/api/stats/drivers/summary", &params))
    }

    fn unclassified_models(&self, station: &str, filter: &str) -> ApiResult<Vec<UnclassifiedModel>> {
        let resp: UnclassifiedResponse =
            self.get_json(&with_query("/api/stats/unclassified-models", &station_filter(station, filter)))?;
        Ok(resp.items)
    }

    fn energy_summary(&self, station: &str, filter: &str) -> ApiResult<EnergySummary> {
        self.get_json(&with_query("/api/stats/energy/summary", &station_filter(station, filter)))
    }

    fn energy_series(&self, station: &str, filter: &str, period: Period) -> ApiResult<Vec<EnergySeriesPoint>> {
        let mut params = station_filter(station, filter);
        params.push(("period", period.as_str().to_string()));
        let resp: EnergySeries = self.get_json(&with_query("/api/stats/energy/series", &params))?;
        Ok(resp.series)
    }

    /// An error response whose body is not JSON comes back as
    /// [`ApiError::Decode`], like an unreadable success body.
    fn me(&self) -> ApiResult<Identity> {
        match self.exchange("GET", "/api/stats/auth/me", None) {
            Ok(resp) => resp.into_json().map_err(|e| ApiError::Decode(e.to_string())),
            Err(ApiError::Http { status, body })
                if serde_json::from_str::<serde_json::Value>(&body).is_err() =>
            {
                Err(ApiError::Decode(format!("HTTP {status} with a non-JSON body")))
            }
            Err(e) => Err(truncate_body(e)),
        }
    }

    /// Any 2xx is a successful login. The `user` object is optional; the
    /// cookies set by the backend are kept and the session file is written.
    fn login(&self, email: &str, password: &str) -> ApiResult<Identity> {
        let body = serde_json::to_value(LoginRequest { email, password })
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let resp = self.post("/api/stats/auth/login", Some(body))?;
        let user = match resp.into_json::<LoginResponse>() {
            Ok(r) => r.user,
            Err(e) => {
                tracing::debug!(error = %e, "login response has no user object");
                Identity::default()
            }
        };

        let mut session = self.lock_session();
        session.email = Some(email.to_string());
        self.persist_session(&session);
        Ok(user)
    }

    /// The local session is discarded whether or not the backend call
    /// succeeds.
    fn logout(&self) -> ApiResult<()> {
        let result = self.post("/api/stats/auth/logout", None).map(|_| ());
        *self.lock_session() = Session::default();
        if let Some(path) = &self.session_path
            && let Err(e) = Session::delete(path)
        {
            tracing::warn!(error = %e, "could not remove session file");
        }
        result
    }

    fn refresh(&self) -> ApiResult<()> {
        self.post("/api/stats/auth/refresh", None).map(|_| ())
    }
}
