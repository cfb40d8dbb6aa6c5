//! XML document shape of a cache file.
//!
//! ```xml
//! <CachedData version="1.2.0">
//!   <VehicleData vehicle="Team A #1">
//!     <FuelUsage average="3.397"/>
//!     <FastestLap type="NORMAL" sector1="28.8" sector2="29.2" sector3="25.7" lap="83.7"/>
//!   </VehicleData>
//! </CachedData>
//! ```
//!
//! Numeric attributes are kept as strings here so that one malformed value
//! only drops that value, not the whole file.

use serde::{Deserialize, Serialize};

use crate::{Result, TelemetryError};

/// Format version written by this crate. Files with a newer version are
/// rejected whole.
pub const CACHE_VERSION: [u32; 3] = [1, 2, 0];

pub(crate) fn version_string() -> String {
    let [major, minor, revision] = CACHE_VERSION;
    format!("{major}.{minor}.{revision}")
}

/// Root element, reduced to its version attribute.
#[derive(Debug, Deserialize)]
#[serde(rename = "CachedData")]
pub(crate) struct VersionProbe {
    #[serde(rename = "@version", default)]
    pub version: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "CachedData")]
pub(crate) struct CachedData {
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "VehicleData", default)]
    pub vehicles: Vec<VehicleData>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct VehicleData {
    #[serde(rename = "@vehicle")]
    pub vehicle: String,
    #[serde(rename = "FuelUsage", default, skip_serializing_if = "Option::is_none")]
    pub fuel_usage: Option<FuelUsage>,
    #[serde(rename = "FastestLap", default, skip_serializing_if = "Vec::is_empty")]
    pub fastest_laps: Vec<FastestLap>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct FuelUsage {
    #[serde(rename = "@average", default)]
    pub average: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct FastestLap {
    #[serde(rename = "@type", default)]
    pub lap_type: Option<String>,
    #[serde(rename = "@sector1", default)]
    pub sector1: Option<String>,
    #[serde(rename = "@sector2", default)]
    pub sector2: Option<String>,
    #[serde(rename = "@sector3", default)]
    pub sector3: Option<String>,
    #[serde(rename = "@lap", default)]
    pub lap: Option<String>,
}

/// Reject versions newer than [`CACHE_VERSION`] or unparsable ones.
///
/// Components are compared in order; missing trailing components count as
/// zero, so `"1.2"` equals `"1.2.0"`.
pub fn check_version(found: &str) -> Result<()> {
    let rejected = || TelemetryError::Version { supported: version_string(), found: found.to_owned() };

    let mut parts = Vec::new();
    for part in found.trim().split('.') {
        parts.push(part.parse::<u32>().map_err(|_| rejected())?);
    }

    let width = parts.len().max(CACHE_VERSION.len());
    let padded = |v: &[u32]| (0..width).map(|i| v.get(i).copied().unwrap_or(0)).collect::<Vec<_>>();

    if padded(&parts) > padded(&CACHE_VERSION) {
        return Err(rejected());
    }
    Ok(())
}

pub(crate) fn parse_document(context: &str, xml: &str) -> Result<CachedData> {
    let probe: VersionProbe =
        quick_xml::de::from_str(xml).map_err(|e| TelemetryError::parse(context, e.to_string()))?;
    check_version(probe.version.as_deref().unwrap_or(""))?;

    quick_xml::de::from_str(xml).map_err(|e| TelemetryError::parse(context, e.to_string()))
}

pub(crate) fn write_document(document: &CachedData) -> Result<String> {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let mut serializer = quick_xml::se::Serializer::new(&mut xml);
    serializer.indent(' ', 2);
    document
        .serialize(serializer)
        .map_err(|e| TelemetryError::parse("cache file", e.to_string()))?;
    xml.push('\n');
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_versions_are_rejected() {
        assert!(check_version("1.2.0").is_ok());
        assert!(check_version("1.0.0").is_ok());
        assert!(check_version("1.1.9").is_ok());
        assert!(check_version("1.2").is_ok());
        assert!(check_version("0.9.12").is_ok());

        for newer in ["2.0.0", "1.3.0", "1.2.1", "1.2.0.1"] {
            let err = check_version(newer).unwrap_err();
            assert!(matches!(err, TelemetryError::Version { .. }), "{newer}");
        }
    }

    #[test]
    fn unparsable_versions_are_rejected() {
        for bogus in ["", "one.two", "1..0", "1.2.x"] {
            assert!(check_version(bogus).is_err(), "{bogus:?}");
        }
    }

    #[test]
    fn document_round_trips_through_xml() {
        let document = CachedData {
            version: version_string(),
            vehicles: vec![VehicleData {
                vehicle: "Team A #1".into(),
                fuel_usage: Some(FuelUsage { average: Some("3.397".into()) }),
                fastest_laps: vec![FastestLap {
                    lap_type: Some("HOTLAP".into()),
                    sector1: Some("28.8".into()),
                    sector2: Some("29.2".into()),
                    sector3: Some("25.7".into()),
                    lap: Some("83.7".into()),
                }],
            }],
        };

        let xml = write_document(&document).unwrap();
        assert!(xml.contains("<CachedData version=\"1.2.0\">"));
        assert!(xml.contains("vehicle=\"Team A #1\""));

        let parsed = parse_document("test", &xml).unwrap();
        assert_eq!(parsed.vehicles.len(), 1);
        let vehicle = &parsed.vehicles[0];
        assert_eq!(vehicle.fuel_usage.as_ref().and_then(|f| f.average.as_deref()), Some("3.397"));
        assert_eq!(vehicle.fastest_laps[0].lap.as_deref(), Some("83.7"));
    }

    #[test]
    fn version_is_checked_before_the_body() {
        let xml = r#"<CachedData version="2.0.0"><Unknown shape="x"/></CachedData>"#;
        let err = parse_document("test", xml).unwrap_err();
        assert!(matches!(err, TelemetryError::Version { .. }));
    }
}
