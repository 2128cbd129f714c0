use std::io::Read;
use std::path::{Path, PathBuf};

use geojson::{Feature, GeoJson};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DataSourceError;
use crate::models::{LampType, SolarPoleRecord, StreetlightRecord};

pub const LIGHT_GEOJSON: &str =
    "https://opendata.arcgis.com/datasets/3bda41b12bbc4753b240b4866088080a_0.geojson";

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    /// Admit rows whose wattage could not be extracted.
    pub keep_unknown_wattage: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub records: Vec<StreetlightRecord>,
    pub dropped: usize,
}

/// First purely numeric `_`-separated segment of a WATT_TYPE code.
/// A segment too large for a wattage yields `None`.
pub fn extract_wattage(watt_type: &str) -> Option<u32> {
    watt_type
        .split('_')
        .find(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))?
        .parse()
        .ok()
}

fn text(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `(longitude, latitude)` of a Point geometry.
fn point(feature: &Feature) -> Option<(f64, f64)> {
    match &feature.geometry.as_ref()?.value {
        geojson::Value::Point(coords) if coords.len() >= 2 => {
            let (lon, lat) = (coords[0], coords[1]);
            (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
        }
        _ => None,
    }
}

fn clean_feature(feature: &Feature, options: CleanOptions) -> Option<StreetlightRecord> {
    let lamp_type = LampType::normalize(&text(feature, "LAMP_TYPE")?)?;
    let (longitude, latitude) = point(feature)?;
    let street_name = text(feature, "STREET_NAM")?;
    let street_type = text(feature, "STREET_TYP")?;
    let wattage = text(feature, "WATT_TYPE").as_deref().and_then(extract_wattage);
    if wattage.is_none() && !options.keep_unknown_wattage {
        return None;
    }

    Some(StreetlightRecord {
        street_name,
        street_type,
        lamp_type,
        longitude,
        latitude,
        wattage,
    })
}

/// Admits fully valid rows; everything else is counted in `dropped`.
pub fn clean_features(features: &[Feature], options: CleanOptions) -> CleanOutcome {
    let mut outcome = CleanOutcome::default();
    for (index, feature) in features.iter().enumerate() {
        match clean_feature(feature, options) {
            Some(record) => outcome.records.push(record),
            None => {
                debug!(row = index, "dropping incomplete streetlight row");
                outcome.dropped += 1;
            }
        }
    }
    outcome
}

pub fn parse_feature_collection(body: &str) -> Result<Vec<Feature>, DataSourceError> {
    match body.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(_) => Err(DataSourceError::NotFeatureCollection("Feature".to_string())),
        GeoJson::Geometry(_) => Err(DataSourceError::NotFeatureCollection("Geometry".to_string())),
    }
}

/// Reads the raw dataset from an `http(s)` URL or a local file.
pub async fn fetch_source(source: &str) -> Result<String, DataSourceError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        info!(url = source, "fetching streetlight assets");
        let to_fetch_error = |err: reqwest::Error| DataSourceError::Fetch {
            url: source.to_string(),
            source: err,
        };
        let response = reqwest::get(source)
            .await
            .and_then(|response| response.error_for_status())
            .map_err(to_fetch_error)?;
        response.text().await.map_err(to_fetch_error)
    } else {
        info!(path = source, "reading streetlight assets");
        std::fs::read_to_string(source).map_err(|err| DataSourceError::Io {
            path: source.to_string(),
            source: err,
        })
    }
}

pub async fn load_streetlights(
    source: &str,
    options: CleanOptions,
) -> Result<CleanOutcome, DataSourceError> {
    let body = fetch_source(source).await?;
    let features = parse_feature_collection(&body)?;
    let outcome = clean_features(&features, options);
    info!(
        admitted = outcome.records.len(),
        dropped = outcome.dropped,
        "cleaned streetlight assets"
    );
    Ok(outcome)
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "light.csv".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4()))
}

fn write_records(path: &Path, records: &[StreetlightRecord]) -> Result<(), DataSourceError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|err| DataSourceError::Io {
        path: path.display().to_string(),
        source: err,
    })
}

/// Writes the cleaned table next to `path` and renames it into place,
/// so a failed write never leaves a partial file behind.
pub fn write_light_csv(path: &Path, records: &[StreetlightRecord]) -> Result<(), DataSourceError> {
    let staging = staging_path(path);
    let result = write_records(&staging, records).and_then(|()| {
        std::fs::rename(&staging, path).map_err(|err| DataSourceError::Io {
            path: path.display().to_string(),
            source: err,
        })
    });

    if result.is_err() && staging.exists() {
        if let Err(err) = std::fs::remove_file(&staging) {
            warn!(path = %staging.display(), error = %err, "failed to remove staging file");
        }
    }
    result
}

pub fn read_light<R: Read>(reader: R) -> Result<Vec<StreetlightRecord>, DataSourceError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for result in reader.deserialize::<StreetlightRecord>() {
        records.push(result?);
    }
    Ok(records)
}

pub fn read_light_csv(path: &Path) -> Result<Vec<StreetlightRecord>, DataSourceError> {
    let file = open(path)?;
    let records = read_light(file)?;
    debug!(path = %path.display(), records = records.len(), "loaded streetlights");
    Ok(records)
}

pub fn read_solar<R: Read>(reader: R) -> Result<Vec<SolarPoleRecord>, DataSourceError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut poles = Vec::new();
    for (index, result) in reader.deserialize::<SolarPoleRecord>().enumerate() {
        let pole = result?;
        if !(1..=4).contains(&pole.implementation_year) {
            return Err(DataSourceError::InvalidRecord {
                row: index + 1,
                reason: format!(
                    "implementation year {} is outside 1..=4",
                    pole.implementation_year
                ),
            });
        }
        poles.push(pole);
    }
    Ok(poles)
}

pub fn read_solar_table(path: &Path) -> Result<Vec<SolarPoleRecord>, DataSourceError> {
    let file = open(path)?;
    let poles = read_solar(file)?;
    debug!(path = %path.display(), poles = poles.len(), "loaded solar pole table");
    Ok(poles)
}

fn open(path: &Path) -> Result<std::fs::File, DataSourceError> {
    std::fs::File::open(path).map_err(|err| DataSourceError::Io {
        path: path.display().to_string(),
        source: err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "properties": {"STREET_NAM": "MACQUARIE", "STREET_TYP": "ST", "LAMP_TYPE": "MV", "WATT_TYPE": "COBRA_400_MV"},
             "geometry": {"type": "Point", "coordinates": [147.329, -42.88]}},
            {"type": "Feature",
             "properties": {"STREET_NAM": "DAVEY", "STREET_TYP": "ST", "LAMP_TYPE": "MH", "WATT_TYPE": "70_MH"},
             "geometry": {"type": "Point", "coordinates": [147.33, -42.885]}},
            {"type": "Feature",
             "properties": {"STREET_NAM": "ELIZABETH", "STREET_TYP": "ST", "LAMP_TYPE": " ", "WATT_TYPE": "18_LED"},
             "geometry": {"type": "Point", "coordinates": [147.32, -42.87]}},
            {"type": "Feature",
             "properties": {"STREET_NAM": "HARRINGTON", "STREET_TYP": "ST", "LAMP_TYPE": "LED", "WATT_TYPE": "UNKNOWN_TYPE"},
             "geometry": {"type": "Point", "coordinates": [147.31, -42.86]}},
            {"type": "Feature",
             "properties": {"STREET_NAM": "MURRAY", "STREET_TYP": "ST", "LAMP_TYPE": "HPS", "WATT_TYPE": "250_HPS"},
             "geometry": null}
        ]
    }"#;

    #[test]
    fn extracts_first_numeric_segment() {
        assert_eq!(extract_wattage("COBRA_400_MV"), Some(400));
        assert_eq!(extract_wattage("400"), Some(400));
        assert_eq!(extract_wattage("POST_TOP_125"), Some(125));
        assert_eq!(extract_wattage("A_B_150_C_250"), Some(150));
        assert_eq!(extract_wattage("UNKNOWN_TYPE"), None);
        assert_eq!(extract_wattage("18W_LED"), None);
        assert_eq!(extract_wattage(""), None);
        assert_eq!(extract_wattage("__"), None);
    }

    #[test]
    fn oversized_first_segment_is_missing_not_skipped() {
        assert_eq!(extract_wattage("COBRA_99999999999_400"), None);
        assert_eq!(extract_wattage("4294967295_MV"), Some(u32::MAX));
    }

    #[test]
    fn null_properties_count_as_one_drop() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature",
                 "properties": {"STREET_NAM": "MACQUARIE", "STREET_TYP": "ST", "LAMP_TYPE": "HPS", "WATT_TYPE": "250_HPS"},
                 "geometry": {"type": "Point", "coordinates": [147.329, -42.88]}},
                {"type": "Feature",
                 "properties": null,
                 "geometry": {"type": "Point", "coordinates": [147.33, -42.885]}},
                {"type": "Feature",
                 "properties": {"STREET_NAM": "DAVEY", "STREET_TYP": "ST", "LAMP_TYPE": "LED", "WATT_TYPE": "18_LED"},
                 "geometry": {"type": "LineString", "coordinates": [[147.3, -42.8], [147.4, -42.9]]}}
            ]
        }"#;
        let features = parse_feature_collection(body).unwrap();
        assert_eq!(features.len(), 3);

        let outcome = clean_features(&features, CleanOptions::default());
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.dropped, 2);
        assert_eq!(outcome.records[0].lamp_type, LampType::Hps);
    }

    #[tokio::test]
    async fn loads_and_cleans_a_local_geojson_file() {
        let dir = std::env::temp_dir().join(format!("lights-out-source-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("streetlights.geojson");
        std::fs::write(&path, SAMPLE).unwrap();

        let outcome = load_streetlights(path.to_str().unwrap(), CleanOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.dropped, 3);
        assert_eq!(outcome.records[0].wattage, Some(400));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_source_is_a_data_source_error() {
        let path = std::env::temp_dir().join(format!("lights-out-absent-{}.geojson", Uuid::new_v4()));
        let err = load_streetlights(path.to_str().unwrap(), CleanOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DataSourceError::Io { .. }));
    }

    #[tokio::test]
    async fn malformed_source_is_a_data_source_error() {
        let dir = std::env::temp_dir().join(format!("lights-out-bad-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.geojson");
        std::fs::write(&path, "{\"type\": \"FeatureCollection\", \"features\": [").unwrap();

        let err = load_streetlights(path.to_str().unwrap(), CleanOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DataSourceError::GeoJson(_)));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cleans_and_drops_incomplete_rows() {
        let features = parse_feature_collection(SAMPLE).unwrap();
        assert_eq!(features.len(), 5);

        let outcome = clean_features(&features, CleanOptions::default());
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.dropped, 3);

        let mv = &outcome.records[0];
        assert_eq!(mv.lamp_type, LampType::Mv);
        assert_eq!(mv.wattage, Some(400));
        assert_eq!(mv.longitude, 147.329);
        assert_eq!(mv.latitude, -42.88);
        assert_eq!(outcome.records[1].lamp_type, LampType::Other);
    }

    #[test]
    fn unknown_wattage_can_be_admitted() {
        let features = parse_feature_collection(SAMPLE).unwrap();
        let outcome = clean_features(
            &features,
            CleanOptions {
                keep_unknown_wattage: true,
            },
        );
        assert_eq!(outcome.records.len(), 3);
        let led = outcome
            .records
            .iter()
            .find(|record| record.lamp_type == LampType::Led)
            .unwrap();
        assert_eq!(led.wattage, None);
    }

    #[test]
    fn blank_lamp_type_shrinks_the_set() {
        let mut features = parse_feature_collection(SAMPLE).unwrap();
        let before = clean_features(&features, CleanOptions::default()).records.len();
        features[0].set_property("LAMP_TYPE", "   ");
        let after = clean_features(&features, CleanOptions::default()).records.len();
        assert!(after < before);
    }

    #[test]
    fn rejects_non_collections() {
        let err = parse_feature_collection(r#"{"type": "Feature", "geometry": null, "properties": null}"#)
            .unwrap_err();
        assert!(matches!(err, DataSourceError::NotFeatureCollection(kind) if kind == "Feature"));
        assert!(matches!(
            parse_feature_collection("not json"),
            Err(DataSourceError::GeoJson(_))
        ));
    }

    #[test]
    fn reads_pandas_style_light_csv() {
        let csv = "street_name,street_type,lamp_type,longitude,latitude,wattage\n\
                   MACQUARIE,ST,MV,147.329,-42.88,400.0\n\
                   DAVEY,ST,LED,147.33,-42.885,18\n\
                   MURRAY,ST,HPS,147.31,-42.86,\n";
        let records = read_light(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].wattage, Some(400));
        assert_eq!(records[1].wattage, Some(18));
        assert_eq!(records[2].wattage, None);
        assert_eq!(records[2].lamp_type, LampType::Hps);
    }

    #[test]
    fn reads_solar_table_ignoring_extra_columns() {
        let csv = "Pole ID,Longitude,Latitude,Lamp type,Annual savings,Implementation year\n\
                   P1,147.3,-42.9,MV,120.5,1\n\
                   P2,147.31,-42.91,HPS,$98.25,2.0\n";
        let poles = read_solar(csv.as_bytes()).unwrap();
        assert_eq!(poles.len(), 2);
        assert_eq!(poles[1].implementation_year, 2);
        assert_eq!(poles[1].annual_savings, 98.25);
    }

    #[test]
    fn solar_year_outside_rollout_is_malformed() {
        let csv = "Longitude,Latitude,Lamp type,Annual savings,Implementation year\n\
                   147.3,-42.9,MV,120.5,5\n";
        assert!(matches!(
            read_solar(csv.as_bytes()),
            Err(DataSourceError::InvalidRecord { row: 1, .. })
        ));
    }

    #[test]
    fn writes_light_csv_atomically() {
        let dir = std::env::temp_dir().join(format!("lights-out-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("light.csv");

        let records = vec![StreetlightRecord {
            street_name: "MACQUARIE".to_string(),
            street_type: "ST".to_string(),
            lamp_type: LampType::Mv,
            longitude: 147.329,
            latitude: -42.88,
            wattage: Some(400),
        }];
        write_light_csv(&path, &records).unwrap();

        let loaded = read_light_csv(&path).unwrap();
        assert_eq!(loaded, records);
        let leftovers = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(leftovers, 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = std::env::temp_dir().join(format!("lights-out-missing-{}", Uuid::new_v4()));
        let path = dir.join("light.csv");
        assert!(write_light_csv(&path, &[]).is_err());
        assert!(!path.exists());
    }
}
