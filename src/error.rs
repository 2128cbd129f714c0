use thiserror::Error;

/// Failure to obtain or decode one of the input datasets.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("expected a GeoJSON FeatureCollection, found {0:?}")]
    NotFeatureCollection(String),
    #[error("invalid record {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },
}

/// A selection key with no mapping in the reference data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSelectionError {
    #[error("unknown lamp type {0:?} (expected one of MV, CFL, LED, HPS)")]
    LampType(String),
    #[error("unknown phase {0:?} (expected \"Year 1\"..\"Year 4\" or \"All Years\")")]
    Phase(String),
}
