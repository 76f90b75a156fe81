//! Service addresses and map settings, read from the environment.
//!
//! An optional `.env` file is loaded first. Unset variables fall back to the
//! defaults of each section.

use std::str::FromStr;

use thiserror::Error;

use crate::backend::BackendConfig;
use crate::map::MapConfig;
use crate::model::Coordinate;
use crate::osrm::OsrmConfig;
use crate::vroom::VroomConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub osrm: OsrmConfig,
    pub vroom: VroomConfig,
    pub backend: BackendConfig,
    pub map: MapConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();
        let vars = Vars(&lookup);

        if let Some(url) = vars.string("OSRM_BASE_URL") {
            config.osrm.base_url = url;
        }
        if let Some(profile) = vars.string("OSRM_PROFILE") {
            config.osrm.profile = profile;
        }
        if let Some(format) = vars.parse("OSRM_GEOMETRIES")? {
            config.osrm.geometries = format;
        }
        if let Some(secs) = vars.parse("OSRM_TIMEOUT_SECS")? {
            config.osrm.timeout_secs = secs;
        }
        if let Some(speed) = vars.parse::<f64>("OSRM_FALLBACK_SPEED_KMH")? {
            if !(speed.is_finite() && speed > 0.0) {
                return Err(ConfigError::Invalid {
                    key: "OSRM_FALLBACK_SPEED_KMH",
                    value: speed.to_string(),
                });
            }
            config.osrm.fallback_speed_kmh = speed;
        }

        if let Some(url) = vars.string("VROOM_URL") {
            config.vroom.url = url;
        }
        if let Some(secs) = vars.parse("VROOM_TIMEOUT_SECS")? {
            config.vroom.timeout_secs = secs;
        }

        if let Some(url) = vars.string("BACKEND_URL") {
            config.backend.base_url = url;
        }
        if let Some(secs) = vars.parse("BACKEND_TIMEOUT_SECS")? {
            config.backend.timeout_secs = secs;
        }

        if let Some(url) = vars.string("MAP_TILE_URL") {
            config.map.tile_url = url;
        }
        if let Some(attribution) = vars.string("MAP_ATTRIBUTION") {
            config.map.attribution = attribution;
        }
        if let Some(value) = vars.string("MAP_CENTER") {
            config.map.center = parse_center(&value).ok_or(ConfigError::Invalid {
                key: "MAP_CENTER",
                value,
            })?;
        }
        if let Some(zoom) = vars.parse("MAP_ZOOM")? {
            config.map.zoom = zoom;
        }
        if let Some(start) = vars.parse("ROUTE_START_TIME")? {
            config.map.route_start = start;
        }

        Ok(config)
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn parse<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        match self.string(key) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::Invalid { key, value }),
        }
    }
}

fn parse_center(value: &str) -> Option<Coordinate> {
    let (lat, lng) = value.split_once(',')?;
    let center = Coordinate::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?);
    center.validate().ok()?;
    Some(center)
}
