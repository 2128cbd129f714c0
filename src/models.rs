use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::InvalidSelectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LampType {
    Mv,
    Cfl,
    Led,
    Hps,
    Other,
}

impl LampType {
    /// Types offered by the dashboard's lamp selector, in selector order.
    pub const SELECTABLE: [LampType; 4] = [LampType::Mv, LampType::Cfl, LampType::Led, LampType::Hps];

    pub fn code(self) -> &'static str {
        match self {
            LampType::Mv => "MV",
            LampType::Cfl => "CFL",
            LampType::Led => "LED",
            LampType::Hps => "HPS",
            LampType::Other => "OTHER",
        }
    }

    /// Maps a raw source code onto the restricted vocabulary.
    /// Blank codes yield `None`; anything outside the fixed set is `Other`.
    pub fn normalize(code: &str) -> Option<LampType> {
        match code.trim() {
            "" => None,
            "MV" => Some(LampType::Mv),
            "CFL" => Some(LampType::Cfl),
            "HPS" => Some(LampType::Hps),
            "LED" => Some(LampType::Led),
            _ => Some(LampType::Other),
        }
    }
}

impl fmt::Display for LampType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Parses a lamp selector key. Only the four selectable types are accepted.
impl FromStr for LampType {
    type Err = InvalidSelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_uppercase();
        LampType::SELECTABLE
            .into_iter()
            .find(|lamp| lamp.code() == key)
            .ok_or_else(|| InvalidSelectionError::LampType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetlightRecord {
    pub street_name: String,
    pub street_type: String,
    pub lamp_type: LampType,
    pub longitude: f64,
    pub latitude: f64,
    #[serde(deserialize_with = "lenient_optional_u32")]
    pub wattage: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarPoleRecord {
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Lamp type")]
    pub lamp_type: String,
    #[serde(rename = "Annual savings", deserialize_with = "lenient_amount")]
    pub annual_savings: f64,
    #[serde(rename = "Implementation year", deserialize_with = "lenient_u8")]
    pub implementation_year: u8,
}

/// Grouping key used on the lighting map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapLabel {
    Lamp(LampType),
    To250WLed,
    To18WLed,
}

impl MapLabel {
    pub fn is_replacement_candidate(self) -> bool {
        !matches!(self, MapLabel::Lamp(_))
    }
}

impl fmt::Display for MapLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapLabel::Lamp(lamp) => write!(f, "{lamp}"),
            MapLabel::To250WLed => f.write_str("To 250 W LED"),
            MapLabel::To18WLed => f.write_str("To 18 W LED"),
        }
    }
}

impl Serialize for MapLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub street_name: String,
    pub street_type: String,
    pub label: MapLabel,
    pub longitude: f64,
    pub latitude: f64,
    pub wattage: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: MapLabel,
    pub count: usize,
}

/// Known wattages sort ascending, `Unknown` sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WattageBucket {
    Known(u32),
    Unknown,
}

impl From<Option<u32>> for WattageBucket {
    fn from(wattage: Option<u32>) -> Self {
        wattage.map_or(WattageBucket::Unknown, WattageBucket::Known)
    }
}

impl WattageBucket {
    /// Label with a watt unit for known wattages only.
    pub fn with_unit(self) -> String {
        match self {
            WattageBucket::Known(watts) => format!("{watts} W"),
            WattageBucket::Unknown => "unknown".to_string(),
        }
    }
}

impl fmt::Display for WattageBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WattageBucket::Known(watts) => write!(f, "{watts}"),
            WattageBucket::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for WattageBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WattageBucket::Known(watts) => serializer.serialize_u32(*watts),
            WattageBucket::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WattageCount {
    pub wattage: WattageBucket,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEntry {
    pub lamp_type: LampType,
    pub label: String,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseSummary {
    pub lamp_type: String,
    pub poles: usize,
    pub annual_savings: f64,
}

fn parse_integral(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    (value.is_finite() && value.fract() == 0.0 && value >= 0.0).then_some(value)
}

// pandas writes integer columns holding NaN as floats ("400.0") and NaN as "" or "NaN".
fn lenient_optional_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else { return Ok(None) };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    match parse_integral(trimmed) {
        Some(value) if value <= f64::from(u32::MAX) => Ok(Some(value as u32)),
        _ => Err(serde::de::Error::custom(format!("invalid wattage {raw:?}"))),
    }
}

fn lenient_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match parse_integral(&raw) {
        Some(value) if value <= f64::from(u8::MAX) => Ok(value as u8),
        _ => Err(serde::de::Error::custom(format!("invalid year {raw:?}"))),
    }
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect();
    cleaned
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("invalid amount {raw:?}")))
}
