//! Request and response bodies for the HTTP surface.

use geofleet::{Driver, DriverStatus, DriverWithDistance, Location};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AddDriverRequest {
    pub id: String,
    pub location: Location,
    pub status: DriverStatus,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub car_type: Option<String>,
}

impl AddDriverRequest {
    pub fn into_driver(self) -> Driver {
        Driver::new(self.id, self.location, self.status, self.rating, self.car_type)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub driver_id: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub driver_id: String,
    pub status: DriverStatus,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub location: Location,
    pub radius: f64,
    #[serde(default)]
    pub index_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: None,
        }
    }

    pub fn with_id(message: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: Some(id.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub drivers: Vec<DriverWithDistance>,
    pub count: usize,
    pub duration: String,
    pub index_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_request_accepts_the_documented_body() {
        let req: AddDriverRequest = serde_json::from_str(
            r#"{"id":"d1","location":{"lat":18.95,"lng":72.85},"status":"available","rating":4.8,"car_type":"sedan"}"#,
        )
        .unwrap();
        let driver = req.into_driver();
        assert_eq!(driver.id, "d1");
        assert_eq!(driver.rating, 4.8);
        assert_eq!(driver.car_type.as_deref(), Some("sedan"));
    }

    #[test]
    fn search_request_index_type_is_optional() {
        let req: SearchRequest =
            serde_json::from_str(r#"{"location":{"lat":18.95,"lng":72.85},"radius":5}"#).unwrap();
        assert!(req.index_type.is_none());
        assert_eq!(req.radius, 5.0);
    }

    #[test]
    fn message_response_omits_absent_id() {
        let json = serde_json::to_string(&MessageResponse::new("ok")).unwrap();
        assert!(!json.contains("\"id\""));
        let json =
            serde_json::to_string(&MessageResponse::with_id("Driver added successfully", "d1"))
                .unwrap();
        assert!(json.contains("\"id\":\"d1\""));
    }
}
