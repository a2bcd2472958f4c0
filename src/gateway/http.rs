//! REST backend client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, Result};
use crate::gateway::{FallbackData, Fetched, MonitorApi};
use crate::models::{
    Alert, ApiConfig, AuthSession, Credentials, Registration, Station, WaterLevel,
    sort_chronologically,
};

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &ApiConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Gateway backed by the REST API, falling back to [`FallbackData`].
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    offline: bool,
    fallback: FallbackData,
}

impl HttpGateway {
    /// Create a gateway from API settings.
    pub fn new(config: &ApiConfig, fallback: FallbackData) -> Result<Self> {
        let base_url = config.base_url()?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::config(format!(
                "Base URL '{}' cannot hold path segments",
                config.base_url
            )));
        }

        Ok(Self {
            client: create_async_client(config)?,
            base_url,
            offline: config.offline,
            fallback,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the URL of a resource by appending path segments to the base.
    ///
    /// Segments are percent-encoded, so identifiers cannot escape their slot.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::config("Base URL cannot hold path segments"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, turning non-success statuses into errors.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        if self.offline {
            return Err(AppError::Offline);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                status,
                url: response.url().to_string(),
            });
        }
        Ok(response)
    }

    /// GET a resource and decode its JSON body.
    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        log::debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        Ok(response.json::<T>().await?)
    }

    /// GET a resource as text.
    async fn get_text(&self, segments: &[&str]) -> Result<String> {
        let url = self.endpoint(segments)?;
        log::debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        Ok(response.text().await?)
    }

    /// POST a JSON body and decode the JSON reply.
    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        log::debug!("POST {}", url);
        let response = self.send(self.client.post(url).json(body)).await?;
        Ok(response.json::<T>().await?)
    }

    /// Record a failed request and hand back the substitute value.
    fn fall_back<T>(resource: &str, error: &AppError, value: T) -> Fetched<T> {
        log::warn!(
            "Request for {} failed, using fallback data: {}",
            resource,
            error
        );
        Fetched::Fallback(value)
    }

    /// Offline auth only applies when the backend could not be asked; an
    /// explicit rejection from the backend stands.
    fn offline_auth(
        &self,
        action: &str,
        error: AppError,
        offline: impl FnOnce(&FallbackData) -> Option<AuthSession>,
    ) -> Option<AuthSession> {
        if error.is_client_rejection() {
            log::info!("{} rejected by backend: {}", action, error);
            return None;
        }
        log::warn!("{} request failed, trying offline accounts: {}", action, error);
        offline(&self.fallback)
    }
}

#[async_trait]
impl MonitorApi for HttpGateway {
    async fn fetch_stations(&self) -> Fetched<Vec<Station>> {
        match self.get_json(&["stations"]).await {
            Ok(stations) => Fetched::Fresh(stations),
            Err(e) => Self::fall_back("stations", &e, self.fallback.stations()),
        }
    }

    async fn fetch_station(&self, id: &str) -> Fetched<Option<Station>> {
        match self.get_json(&["stations", id]).await {
            Ok(station) => Fetched::Fresh(Some(station)),
            Err(e) => Self::fall_back(&format!("station {id}"), &e, self.fallback.station(id)),
        }
    }

    async fn fetch_water_levels(&self, station_id: &str) -> Fetched<Vec<WaterLevel>> {
        let fetched = match self.get_json(&["water-levels", station_id]).await {
            Ok(levels) => Fetched::Fresh(levels),
            Err(e) => Self::fall_back(
                &format!("water levels of {station_id}"),
                &e,
                self.fallback.water_levels(station_id),
            ),
        };

        fetched.map(|mut levels: Vec<WaterLevel>| {
            sort_chronologically(&mut levels);
            levels
        })
    }

    async fn fetch_alerts(&self) -> Fetched<Vec<Alert>> {
        match self.get_json(&["alerts"]).await {
            Ok(alerts) => Fetched::Fresh(alerts),
            Err(e) => Self::fall_back("alerts", &e, self.fallback.alerts()),
        }
    }

    async fn fetch_station_alerts(&self, station_id: &str) -> Fetched<Vec<Alert>> {
        match self.get_json(&["alerts", "station", station_id]).await {
            Ok(alerts) => Fetched::Fresh(alerts),
            Err(e) => Self::fall_back(
                &format!("alerts of {station_id}"),
                &e,
                self.fallback.station_alerts(station_id),
            ),
        }
    }

    async fn export_alerts_report(&self) -> Fetched<String> {
        match self.get_text(&["reports", "alerts", "export"]).await {
            Ok(csv) => Fetched::Fresh(csv),
            Err(e) => Self::fall_back("alerts report", &e, self.fallback.alerts_report()),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Option<AuthSession> {
        let body = Credentials { email, password };
        match self.post_json(&["auth", "login"], &body).await {
            Ok(session) => Some(session),
            Err(e) => self.offline_auth("Login", e, |data| data.login(email)),
        }
    }

    async fn register_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Option<AuthSession> {
        let body = Registration {
            email,
            password,
            name,
        };
        match self.post_json(&["auth", "register"], &body).await {
            Ok(session) => Some(session),
            Err(e) => self.offline_auth("Registration", e, |data| data.register(email, name)),
        }
    }
}
