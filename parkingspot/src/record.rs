//! Parking facilities as published by the open-data feed.
use serde::Deserialize;
#[cfg(feature = "tracing")]
use tracing::warn;

use crate::distance::Coordinate;

/// A parking facility and its current number of free spaces.
///
/// Records are never modified after they are fetched, apart from the
/// distance to the user which is derived client-side.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParkingRecord {
    /// Facility id, used as the row key.
    #[serde(rename = "ParkingID", deserialize_with = "lenient_serde::text")]
    pub id: String,
    /// Display name.
    #[serde(rename = "ParkingName", deserialize_with = "lenient_serde::text")]
    pub name: String,
    /// Street address.
    #[serde(rename = "Address", default, deserialize_with = "lenient_serde::text")]
    pub address: String,
    /// Latitude in degrees.
    #[serde(rename = "Latitude", deserialize_with = "lenient_serde::float")]
    pub latitude: f64,
    /// Longitude in degrees.
    #[serde(rename = "Longitude", deserialize_with = "lenient_serde::float")]
    pub longitude: f64,
    /// Number of free spaces.
    #[serde(rename = "SurplusSpace", deserialize_with = "lenient_serde::integer")]
    pub free_spaces: i64,
    #[serde(skip)]
    distance: Option<f64>,
}

impl ParkingRecord {
    /// Create a record without a distance.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        location: Coordinate,
        free_spaces: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            latitude: location.latitude,
            longitude: location.longitude,
            free_spaces,
            distance: None,
        }
    }

    /// Location of the facility.
    #[must_use]
    pub const fn location(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Distance from the user in kilometers, if the user's position is
    /// known.
    #[must_use]
    pub const fn distance(&self) -> Option<f64> {
        self.distance
    }

    pub(crate) fn with_distance(mut self, km: f64) -> Self {
        self.distance = Some(km);
        self
    }
}

/// Decode a feed body: a JSON array of parking records.
///
/// Records that cannot be decoded are skipped so one broken facility does
/// not hide all the others. Only a body that is not a JSON array fails.
///
/// # Errors
///
/// Returns an error if `body` is not a JSON array.
pub fn from_feed(body: &[u8]) -> Result<Vec<ParkingRecord>, serde_json::Error> {
    let items: Vec<serde_json::Value> = serde_json::from_slice(body)?;

    let records = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(index, "skipping parking record: {e}");
                #[cfg(not(feature = "tracing"))]
                let _ = (index, e);
                None
            }
        })
        .collect();

    Ok(records)
}

/// The feed is not consistent about quoting: numbers show up both as
/// JSON numbers and as strings, and text fields are sometimes null.
mod lenient_serde {
    use std::fmt;

    use serde::{
        de::{self, Unexpected, Visitor},
        Deserialize, Deserializer,
    };

    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    struct RawVisitor;

    impl<'de> Visitor<'de> for RawVisitor {
        type Value = Raw;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Raw, E> {
            Ok(Raw::Int(v))
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Raw, E> {
            Ok(i64::try_from(v).map_or(Raw::Float(v as f64), Raw::Int))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Raw, E> {
            Ok(Raw::Float(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Raw, E> {
            Ok(Raw::Text(v.trim().to_owned()))
        }
    }

    impl<'de> Deserialize<'de> for Raw {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(RawVisitor)
        }
    }

    fn parse<T, E>(s: &str, expected: &str) -> Result<T, E>
    where
        T: std::str::FromStr,
        E: de::Error,
    {
        s.parse()
            .map_err(|_| E::invalid_value(Unexpected::Str(s), &expected))
    }

    pub(super) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            None => String::new(),
            Some(Raw::Int(n)) => n.to_string(),
            Some(Raw::Float(n)) => n.to_string(),
            Some(Raw::Text(s)) => s,
        })
    }

    #[allow(clippy::cast_precision_loss)]
    pub(super) fn float<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(n as f64),
            Raw::Float(n) => Ok(n),
            Raw::Text(s) => parse(&s, "a decimal number"),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(super) fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(n),
            Raw::Float(n) if n.fract() == 0.0 => Ok(n as i64),
            Raw::Float(n) => Err(de::Error::invalid_value(
                Unexpected::Float(n),
                &"a whole number",
            )),
            Raw::Text(s) => parse(&s, "a whole number"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{from_feed, ParkingRecord};

    #[test]
    fn parse_numbers() {
        let record: ParkingRecord = serde_json::from_str(
            r#"{
                "ParkingID": 1023,
                "ParkingName": "中央公園地下停車場",
                "Address": "高雄市前金區中山一路",
                "Latitude": 22.6273,
                "Longitude": 120.3014,
                "SurplusSpace": 57,
                "TotalSpace": 300
            }"#,
        )
        .unwrap();

        assert_eq!(record.id, "1023");
        assert_eq!(record.name, "中央公園地下停車場");
        assert_eq!(record.address, "高雄市前金區中山一路");
        assert!((record.latitude - 22.6273).abs() < 1e-9);
        assert!((record.longitude - 120.3014).abs() < 1e-9);
        assert_eq!(record.free_spaces, 57);
        assert_eq!(record.distance(), None);
    }

    #[test]
    fn parse_quoted_numbers() {
        let record: ParkingRecord = serde_json::from_str(
            r#"{
                "ParkingID": "P-07",
                "ParkingName": "三多立體停車場",
                "Address": null,
                "Latitude": " 22.6133 ",
                "Longitude": "120.3045",
                "SurplusSpace": "0"
            }"#,
        )
        .unwrap();

        assert_eq!(record.id, "P-07");
        assert_eq!(record.address, "");
        assert!((record.latitude - 22.6133).abs() < 1e-9);
        assert!((record.longitude - 120.3045).abs() < 1e-9);
        assert_eq!(record.free_spaces, 0);
    }

    #[test]
    fn missing_address() {
        let record: ParkingRecord = serde_json::from_str(
            r#"{"ParkingID":1,"ParkingName":"a","Latitude":22,"Longitude":120,"SurplusSpace":3.0}"#,
        )
        .unwrap();

        assert_eq!(record.address, "");
        assert_eq!(record.free_spaces, 3);
    }

    #[test]
    fn reject_garbage() {
        serde_json::from_str::<ParkingRecord>(
            r#"{"ParkingID":1,"ParkingName":"a","Latitude":"north","Longitude":120,"SurplusSpace":1}"#,
        )
        .unwrap_err();
        serde_json::from_str::<ParkingRecord>(
            r#"{"ParkingID":1,"ParkingName":"a","Latitude":22,"Longitude":120,"SurplusSpace":1.5}"#,
        )
        .unwrap_err();
    }

    #[test]
    fn errors_name_what_was_expected() {
        let err = serde_json::from_str::<ParkingRecord>(
            r#"{"ParkingID":1,"ParkingName":"a","Latitude":22,"Longitude":120,"SurplusSpace":null}"#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("expected a number or a numeric string"), "{err}");

        let err = serde_json::from_str::<ParkingRecord>(
            r#"{"ParkingID":1,"ParkingName":"a","Latitude":"","Longitude":120,"SurplusSpace":1}"#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("expected a decimal number"), "{err}");
    }

    #[test]
    fn feed_skips_broken_records() {
        let records = from_feed(
            br#"[
                {"ParkingID":1,"ParkingName":"ok","Latitude":22.62,"Longitude":120.30,"SurplusSpace":4},
                {"ParkingID":2,"ParkingName":"no count","Latitude":22.63,"Longitude":120.31,"SurplusSpace":null},
                {"ParkingID":3,"ParkingName":"no latitude","Latitude":"","Longitude":120.32,"SurplusSpace":1},
                "not a record",
                {"ParkingID":5,"ParkingName":"also ok","Latitude":"22.64","Longitude":120.33,"SurplusSpace":"0"}
            ]"#,
        )
        .unwrap();

        let ids: Vec<_> = records.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, ["1", "5"]);
    }

    #[test]
    fn feed_must_be_an_array() {
        from_feed(b"{\"ParkingID\":1}").unwrap_err();
        from_feed(b"<html>").unwrap_err();
        assert!(from_feed(b"[]").unwrap().is_empty());
    }
}
