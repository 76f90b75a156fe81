//! REST client for the persistence backend (vehicles, waste points, start and
//! dump points, dashboard counts).

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use thiserror::Error;

use crate::model::{Coordinate, Vehicle, VehicleId};
use crate::traits::PointStore;

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{operation} failed: {source}")]
    Request {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} failed: HTTP {status}")]
    Status {
        operation: &'static str,
        status: u16,
    },
}

impl BackendError {
    pub fn operation(&self) -> &'static str {
        match self {
            BackendError::Request { operation, .. } | BackendError::Status { operation, .. } => {
                operation
            }
        }
    }
}

/// A start or dump point. The backend stores degrees as decimal strings.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub latitude: f64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub longitude: f64,
}

impl PointRecord {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

impl From<Coordinate> for PointRecord {
    fn from(point: Coordinate) -> Self {
        Self {
            latitude: point.lat,
            longitude: point.lng,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WastePointRecord {
    pub id: i64,
    pub name: String,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub latitude: f64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub longitude: f64,
}

impl WastePointRecord {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[serde_as]
#[derive(Debug, Serialize)]
struct WastePointBody<'a> {
    name: &'a str,
    #[serde_as(as = "DisplayFromStr")]
    latitude: f64,
    #[serde_as(as = "DisplayFromStr")]
    longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVehicle {
    pub plate: String,
    pub brand: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub vehicles: u64,
    pub waste_points: u64,
    pub routes: u64,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|source| BackendError::Request { operation, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                operation,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        Self::send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|source| BackendError::Request { operation, source })
    }

    pub async fn vehicles(&self) -> Result<Vec<Vehicle>, BackendError> {
        Self::fetch("list vehicles", self.client.get(self.url("/vehicles"))).await
    }

    pub async fn add_vehicle(&self, vehicle: &NewVehicle) -> Result<Vehicle, BackendError> {
        Self::fetch(
            "add vehicle",
            self.client.post(self.url("/vehicles")).json(vehicle),
        )
        .await
    }

    pub async fn delete_vehicle(&self, id: VehicleId) -> Result<(), BackendError> {
        Self::send(
            "delete vehicle",
            self.client.delete(self.url(&format!("/vehicles/{}", id))),
        )
        .await
        .map(|_| ())
    }

    pub async fn waste_points(&self) -> Result<Vec<WastePointRecord>, BackendError> {
        Self::fetch("list waste points", self.client.get(self.url("/waste-points"))).await
    }

    pub async fn add_waste_point(
        &self,
        name: &str,
        point: Coordinate,
    ) -> Result<WastePointRecord, BackendError> {
        let body = WastePointBody {
            name,
            latitude: point.lat,
            longitude: point.lng,
        };
        Self::fetch(
            "add waste point",
            self.client.post(self.url("/waste-points")).json(&body),
        )
        .await
    }

    pub async fn update_waste_point(
        &self,
        id: i64,
        name: &str,
        point: Coordinate,
    ) -> Result<WastePointRecord, BackendError> {
        let body = WastePointBody {
            name,
            latitude: point.lat,
            longitude: point.lng,
        };
        Self::fetch(
            "update waste point",
            self.client
                .put(self.url(&format!("/waste-points/{}", id)))
                .json(&body),
        )
        .await
    }

    pub async fn delete_waste_point(&self, id: i64) -> Result<(), BackendError> {
        Self::send(
            "delete waste point",
            self.client.delete(self.url(&format!("/waste-points/{}", id))),
        )
        .await
        .map(|_| ())
    }

    /// `None` when no start point has been saved yet.
    pub async fn start_point(&self) -> Result<Option<PointRecord>, BackendError> {
        self.optional_point("get start point", "/start-end-points/start")
            .await
    }

    /// `None` when no dump point has been saved yet.
    pub async fn dump_point(&self) -> Result<Option<PointRecord>, BackendError> {
        self.optional_point("get dump point", "/start-end-points/dump")
            .await
    }

    async fn optional_point(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<Option<PointRecord>, BackendError> {
        // The backend answers `null` or 404 before a point has been saved.
        match Self::fetch::<Option<PointRecord>>(operation, self.client.get(self.url(path))).await {
            Err(BackendError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            other => other,
        }
    }

    pub async fn save_start_point(&self, point: Coordinate) -> Result<PointRecord, BackendError> {
        self.save_point("save start point", "/start-end-points/start", point)
            .await
    }

    pub async fn save_dump_point(&self, point: Coordinate) -> Result<PointRecord, BackendError> {
        self.save_point("save dump point", "/start-end-points/dump", point)
            .await
    }

    async fn save_point(
        &self,
        operation: &'static str,
        path: &str,
        point: Coordinate,
    ) -> Result<PointRecord, BackendError> {
        Self::fetch(
            operation,
            self.client
                .post(self.url(path))
                .json(&PointRecord::from(point)),
        )
        .await
    }

    pub async fn counts(&self) -> Result<Counts, BackendError> {
        Self::fetch("get counts", self.client.get(self.url("/counts"))).await
    }
}

impl PointStore for BackendClient {
    async fn save_start_point(&self, point: Coordinate) -> Result<PointRecord, BackendError> {
        BackendClient::save_start_point(self, point).await
    }

    async fn save_dump_point(&self, point: Coordinate) -> Result<PointRecord, BackendError> {
        BackendClient::save_dump_point(self, point).await
    }

    async fn add_waste_point(
        &self,
        name: &str,
        point: Coordinate,
    ) -> Result<WastePointRecord, BackendError> {
        BackendClient::add_waste_point(self, name, point).await
    }
}
