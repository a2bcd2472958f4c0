//! Designated fallback values served when the backend is unavailable.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::models::{
    Alert, AuthSession, FallbackMode, Role, Severity, Station, StationStatus, Trend, User,
    WaterLevel,
};
use crate::pipeline::report::alerts_csv;

/// Token handed out for sessions created without the backend.
pub const OFFLINE_TOKEN: &str = "mock-jwt-token";

/// Number of daily readings synthesized per station.
const SYNTHETIC_DAYS: i64 = 30;

/// Depth used for stations the fallback dataset does not know.
const DEFAULT_BASE_DEPTH_M: f64 = 5.0;

/// Synthesized readings never go shallower than this.
const MIN_DEPTH_M: f64 = 0.5;

/// Source of fallback values for the gateway.
#[derive(Debug, Clone)]
pub struct FallbackData {
    mode: FallbackMode,
    stations: Vec<Station>,
    alerts: Vec<Alert>,
    users: Vec<User>,
}

impl FallbackData {
    pub fn from_mode(mode: FallbackMode) -> Self {
        match mode {
            FallbackMode::Demo => Self::demo(),
            FallbackMode::Empty => Self::empty(),
        }
    }

    /// Built-in demonstration dataset.
    pub fn demo() -> Self {
        Self {
            mode: FallbackMode::Demo,
            stations: demo::stations(),
            alerts: demo::alerts(),
            users: demo::users(),
        }
    }

    /// Empty collections, absent records, no offline accounts.
    pub fn empty() -> Self {
        Self {
            mode: FallbackMode::Empty,
            stations: Vec::new(),
            alerts: Vec::new(),
            users: Vec::new(),
        }
    }

    pub fn mode(&self) -> FallbackMode {
        self.mode
    }

    pub fn stations(&self) -> Vec<Station> {
        self.stations.clone()
    }

    pub fn station(&self, id: &str) -> Option<Station> {
        self.stations.iter().find(|s| s.id == id).cloned()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.clone()
    }

    pub fn station_alerts(&self, station_id: &str) -> Vec<Alert> {
        self.alerts
            .iter()
            .filter(|a| a.station_id == station_id)
            .cloned()
            .collect()
    }

    pub fn alerts_report(&self) -> String {
        alerts_csv(&self.alerts)
    }

    /// Water-level history for a station ending now.
    ///
    /// Empty in `Empty` mode. In `Demo` mode one reading per day is
    /// synthesized, drifting with the station's trend plus random jitter.
    pub fn water_levels(&self, station_id: &str) -> Vec<WaterLevel> {
        match self.mode {
            FallbackMode::Empty => Vec::new(),
            FallbackMode::Demo => {
                let station = self.stations.iter().find(|s| s.id == station_id);
                synthesize_levels(station_id, station, Utc::now(), &mut rand::rng())
            }
        }
    }

    /// Offline sign-in: known demo users are accepted by email alone.
    pub fn login(&self, email: &str) -> Option<AuthSession> {
        self.users
            .iter()
            .find(|u| u.email == email)
            .map(|user| AuthSession {
                user: user.clone(),
                token: OFFLINE_TOKEN.to_string(),
            })
    }

    /// Offline registration: a new citizen account. Refused in `Empty` mode.
    pub fn register(&self, email: &str, name: &str) -> Option<AuthSession> {
        if self.mode == FallbackMode::Empty {
            return None;
        }
        let now = Utc::now();
        Some(AuthSession {
            user: User {
                id: format!("U{}", now.timestamp_millis()),
                email: email.to_string(),
                name: name.to_string(),
                role: Role::Citizen,
                created_at: now,
            },
            token: OFFLINE_TOKEN.to_string(),
        })
    }
}

impl Default for FallbackData {
    fn default() -> Self {
        Self::demo()
    }
}

/// Build `SYNTHETIC_DAYS` daily readings ending at `now`, oldest first.
fn synthesize_levels(
    station_id: &str,
    station: Option<&Station>,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Vec<WaterLevel> {
    let base_depth = station.map_or(DEFAULT_BASE_DEPTH_M, |s| s.current_depth_m);
    let trend = station.map(|s| s.trend);

    (0..SYNTHETIC_DAYS)
        .rev()
        .map(|days_ago| {
            let elapsed = (SYNTHETIC_DAYS - 1 - days_ago) as f64;
            let jitter = rng.random::<f64>() - 0.5;
            let variation = match trend {
                Some(Trend::Falling) => elapsed * 0.05 + jitter * 0.3,
                Some(Trend::Rising) => elapsed * -0.03 + jitter * 0.2,
                _ => jitter * 0.2,
            };

            WaterLevel {
                timestamp: now - Duration::days(days_ago),
                depth_m: (base_depth + variation).max(MIN_DEPTH_M),
                station_id: station_id.to_string(),
            }
        })
        .collect()
}

mod demo {
    use super::*;

    fn at(ts: &str) -> DateTime<Utc> {
        ts.parse().unwrap_or_default()
    }

    #[allow(clippy::too_many_arguments)]
    fn station(
        id: &str,
        name: &str,
        state: &str,
        district: &str,
        (latitude, longitude): (f64, f64),
        status: StationStatus,
        current_depth_m: f64,
        last_updated: &str,
        trend: Trend,
    ) -> Station {
        Station {
            id: id.into(),
            name: name.into(),
            state: state.into(),
            district: district.into(),
            latitude,
            longitude,
            status,
            current_depth_m,
            last_updated: at(last_updated),
            trend,
        }
    }

    fn alert(
        id: &str,
        station_id: &str,
        station_name: &str,
        severity: Severity,
        message: &str,
        date: &str,
        resolved: bool,
    ) -> Alert {
        Alert {
            id: id.into(),
            station_id: station_id.into(),
            station_name: station_name.into(),
            severity,
            message: message.into(),
            date: date.into(),
            resolved,
        }
    }

    pub fn stations() -> Vec<Station> {
        use StationStatus::*;
        use Trend::*;

        vec![
            station(
                "ST001",
                "Nagpur DWLR Station",
                "Maharashtra",
                "Nagpur",
                (21.1458, 79.0882),
                Safe,
                4.2,
                "2025-01-15T10:00:00Z",
                Stable,
            ),
            station(
                "ST002",
                "Pune Urban Observatory",
                "Maharashtra",
                "Pune",
                (18.5204, 73.8567),
                Warning,
                6.8,
                "2025-01-15T09:45:00Z",
                Falling,
            ),
            station(
                "ST003",
                "Jaipur Desert Monitor",
                "Rajasthan",
                "Jaipur",
                (26.9124, 75.7873),
                Critical,
                8.9,
                "2025-01-15T11:15:00Z",
                Falling,
            ),
            station(
                "ST004",
                "Bangalore Tech Hub",
                "Karnataka",
                "Bangalore Urban",
                (12.9716, 77.5946),
                Safe,
                3.5,
                "2025-01-15T10:30:00Z",
                Rising,
            ),
            station(
                "ST005",
                "Chennai Coastal Station",
                "Tamil Nadu",
                "Chennai",
                (13.0827, 80.2707),
                Critical,
                9.2,
                "2025-01-15T08:20:00Z",
                Falling,
            ),
            station(
                "ST006",
                "Kolkata River Basin",
                "West Bengal",
                "Kolkata",
                (22.5726, 88.3639),
                Safe,
                2.8,
                "2025-01-15T09:00:00Z",
                Stable,
            ),
        ]
    }

    pub fn alerts() -> Vec<Alert> {
        vec![
            alert(
                "AL001",
                "ST003",
                "Jaipur Desert Monitor",
                Severity::Critical,
                "Water table dropped below 9m threshold - immediate action required",
                "2025-01-15",
                false,
            ),
            alert(
                "AL002",
                "ST005",
                "Chennai Coastal Station",
                Severity::Critical,
                "Rapid water level decline detected - 0.5m drop in 48 hours",
                "2025-01-14",
                false,
            ),
            alert(
                "AL003",
                "ST002",
                "Pune Urban Observatory",
                Severity::Warning,
                "Water level approaching warning threshold of 7m depth",
                "2025-01-13",
                false,
            ),
            alert(
                "AL004",
                "ST001",
                "Nagpur DWLR Station",
                Severity::Info,
                "Station maintenance completed - monitoring resumed",
                "2025-01-12",
                true,
            ),
        ]
    }

    pub fn users() -> Vec<User> {
        vec![
            User {
                id: "U001".into(),
                email: "citizen@example.com".into(),
                name: "Citizen User".into(),
                role: Role::Citizen,
                created_at: at("2025-01-01T00:00:00Z"),
            },
            User {
                id: "U002".into(),
                email: "researcher@example.com".into(),
                name: "Research Analyst".into(),
                role: Role::Researcher,
                created_at: at("2025-01-01T00:00:00Z"),
            },
        ]
    }
}
