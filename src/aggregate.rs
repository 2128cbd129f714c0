use std::collections::{BTreeMap, HashMap};

use crate::error::InvalidSelectionError;
use crate::models::{
    CostEntry, LabelCount, LampType, MapLabel, MapPoint, PhaseSummary, SolarPoleRecord,
    StreetlightRecord, WattageBucket, WattageCount,
};
use crate::reference::{CostTable, PhaseTable, ReplacementRules};

pub fn cost_by_type(costs: &CostTable) -> Vec<CostEntry> {
    costs
        .entries
        .iter()
        .map(|(lamp_type, label, cost)| CostEntry {
            lamp_type: *lamp_type,
            label: label.to_string(),
            cost: *cost,
        })
        .collect()
}

/// Map grouping key for a record. Depends only on `(lamp_type, wattage)`.
pub fn relabel(rules: &ReplacementRules, lamp_type: LampType, wattage: Option<u32>) -> MapLabel {
    wattage
        .and_then(|watts| {
            rules
                .rules
                .iter()
                .find(|rule| rule.from == lamp_type && rule.wattages.contains(&watts))
        })
        .map_or(MapLabel::Lamp(lamp_type), |rule| rule.to)
}

pub fn map_points(rules: &ReplacementRules, records: &[StreetlightRecord]) -> Vec<MapPoint> {
    records
        .iter()
        .map(|record| MapPoint {
            street_name: record.street_name.clone(),
            street_type: record.street_type.clone(),
            label: relabel(rules, record.lamp_type, record.wattage),
            longitude: record.longitude,
            latitude: record.latitude,
            wattage: record.wattage,
        })
        .collect()
}

pub fn label_counts(points: &[MapPoint]) -> Vec<LabelCount> {
    let mut counts: BTreeMap<MapLabel, usize> = BTreeMap::new();
    for point in points {
        *counts.entry(point.label).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect()
}

/// Points of interest: relabeled replacement candidates only.
pub fn replacement_candidates(points: &[MapPoint]) -> Vec<&MapPoint> {
    points
        .iter()
        .filter(|point| point.label.is_replacement_candidate())
        .collect()
}

/// Counts records of `lamp_type` per wattage, ascending, missing wattage last.
pub fn wattage_histogram(records: &[StreetlightRecord], lamp_type: LampType) -> Vec<WattageCount> {
    let mut counts: BTreeMap<WattageBucket, usize> = BTreeMap::new();
    for record in records.iter().filter(|record| record.lamp_type == lamp_type) {
        *counts.entry(WattageBucket::from(record.wattage)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(wattage, count)| WattageCount { wattage, count })
        .collect()
}

pub fn filter_phase<'a>(
    phases: &PhaseTable,
    poles: &'a [SolarPoleRecord],
    phase: &str,
) -> Result<Vec<&'a SolarPoleRecord>, InvalidSelectionError> {
    let years = phases.years(phase)?;
    Ok(poles
        .iter()
        .filter(|pole| years.contains(&pole.implementation_year))
        .collect())
}

/// Pole count and total annual savings per lamp type, largest savings first.
pub fn phase_savings(poles: &[&SolarPoleRecord]) -> Vec<PhaseSummary> {
    let mut map: HashMap<&str, (usize, f64)> = HashMap::new();
    for pole in poles {
        let entry = map.entry(pole.lamp_type.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += pole.annual_savings;
    }

    let mut summaries: Vec<PhaseSummary> = map
        .into_iter()
        .map(|(lamp_type, (poles, annual_savings))| PhaseSummary {
            lamp_type: lamp_type.to_string(),
            poles,
            annual_savings,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.annual_savings
            .partial_cmp(&a.annual_savings)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.lamp_type.cmp(&b.lamp_type))
    });
    summaries
}
