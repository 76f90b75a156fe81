//! Typed-in data entry: vehicles, named waste points and manually entered
//! start/dump coordinates.
//!
//! Forms hold raw user text. `validate` turns them into the values the
//! backend accepts, or says which field is wrong, without any I/O.

use thiserror::Error;

use crate::backend::NewVehicle;
use crate::model::{Coordinate, CoordinateError, Waypoint, WaypointRole};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntryError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: &'static str, value: String },

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleForm {
    pub plate: String,
    pub brand: String,
    pub model: String,
}

impl VehicleForm {
    pub fn new(plate: impl Into<String>) -> Self {
        Self {
            plate: plate.into(),
            ..Self::default()
        }
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Plates are stored upper-case; blank brand or model is left unset.
    pub fn validate(&self) -> Result<NewVehicle, EntryError> {
        let plate = self.plate.trim();
        if plate.is_empty() {
            return Err(EntryError::Missing("plate"));
        }
        Ok(NewVehicle {
            plate: plate.to_uppercase(),
            brand: optional(&self.brand),
            model: optional(&self.model),
        })
    }
}

/// Latitude and longitude as typed, before parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointForm {
    pub latitude: String,
    pub longitude: String,
}

impl PointForm {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }

    pub fn validate(&self, role: WaypointRole) -> Result<Waypoint, EntryError> {
        let coordinate = Coordinate::new(
            degrees("latitude", &self.latitude)?,
            degrees("longitude", &self.longitude)?,
        );
        coordinate.validate()?;
        Ok(Waypoint::new(coordinate, role))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WastePointForm {
    pub name: String,
    pub point: PointForm,
}

impl WastePointForm {
    pub fn new(
        name: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            point: PointForm::new(latitude, longitude),
        }
    }

    pub fn validate(&self) -> Result<Waypoint, EntryError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(EntryError::Missing("name"));
        }
        Ok(self.point.validate(WaypointRole::WastePoint)?.named(name))
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn degrees(field: &'static str, value: &str) -> Result<f64, EntryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EntryError::Missing(field));
    }
    value.parse().map_err(|_| EntryError::NotANumber {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_plate_required() {
        assert_eq!(
            VehicleForm::new("   ").validate(),
            Err(EntryError::Missing("plate"))
        );

        let vehicle = VehicleForm::new(" 34 abc 123 ")
            .brand("Ford")
            .model("  ")
            .validate()
            .unwrap();
        assert_eq!(vehicle.plate, "34 ABC 123");
        assert_eq!(vehicle.brand.as_deref(), Some("Ford"));
        assert_eq!(vehicle.model, None);
    }

    #[test]
    fn test_point_fields() {
        let form = PointForm::new("", "28.97");
        assert_eq!(
            form.validate(WaypointRole::Start),
            Err(EntryError::Missing("latitude"))
        );

        let form = PointForm::new("41,08", "28.97");
        assert!(matches!(
            form.validate(WaypointRole::Start),
            Err(EntryError::NotANumber { field: "latitude", .. })
        ));

        let form = PointForm::new("41.08", "-200");
        assert_eq!(
            form.validate(WaypointRole::Dump),
            Err(EntryError::InvalidCoordinate(CoordinateError::Longitude(-200.0)))
        );

        let waypoint = PointForm::new(" 41.081 ", "28.972")
            .validate(WaypointRole::Dump)
            .unwrap();
        assert_eq!(waypoint.coordinate, Coordinate::new(41.081, 28.972));
        assert_eq!(waypoint.role, WaypointRole::Dump);
        assert_eq!(waypoint.name, None);
    }

    #[test]
    fn test_waste_point_name_required() {
        assert_eq!(
            WastePointForm::new(" ", "41.03", "28.98").validate(),
            Err(EntryError::Missing("name"))
        );

        let waypoint = WastePointForm::new(" Taksim ", "41.037", "28.985")
            .validate()
            .unwrap();
        assert_eq!(waypoint.name.as_deref(), Some("Taksim"));
        assert_eq!(waypoint.role, WaypointRole::WastePoint);
    }
}
