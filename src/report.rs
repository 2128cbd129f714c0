use std::fmt::Write;

use anyhow::anyhow;
use chrono::{DateTime, Utc};

use crate::aggregate;
use crate::config::MapSettings;
use crate::models::{LampType, SolarPoleRecord, StreetlightRecord};
use crate::reference::DashboardReference;

/// What the viewer selected; keys are resolved per chart.
#[derive(Debug, Clone)]
pub struct Selection {
    pub lamp_types: Vec<String>,
    pub phase: String,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            lamp_types: LampType::SELECTABLE.iter().map(|lamp| lamp.code().to_string()).collect(),
            phase: "All Years".to_string(),
        }
    }
}

fn dataset<'a, T>(loaded: &'a anyhow::Result<Vec<T>>) -> anyhow::Result<&'a [T]> {
    loaded
        .as_ref()
        .map(Vec::as_slice)
        .map_err(|err| anyhow!("dataset unavailable: {err:#}"))
}

fn push_section(output: &mut String, title: &str, body: anyhow::Result<String>) {
    let _ = writeln!(output, "## {title}");
    match body {
        Ok(body) => output.push_str(&body),
        Err(err) => {
            let _ = writeln!(output, "> Unable to render this chart: {err:#}");
        }
    }
    let _ = writeln!(output);
}

pub fn costs_section(reference: &DashboardReference) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Operational cost over {} hours, standardised to {} lumen.",
        reference.costs.lifetime_hours, reference.costs.lumens
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "| Type of light | Operational cost |");
    let _ = writeln!(output, "| --- | ---: |");
    for entry in aggregate::cost_by_type(&reference.costs) {
        let _ = writeln!(output, "| {} | ${:.2} |", entry.label, entry.cost);
    }
    output
}

pub fn map_section(
    reference: &DashboardReference,
    map: &MapSettings,
    lights: anyhow::Result<&[StreetlightRecord]>,
) -> anyhow::Result<String> {
    let lights = lights?;
    let points = aggregate::map_points(&reference.replacements, lights);
    let counts = aggregate::label_counts(&points);
    let candidates = aggregate::replacement_candidates(&points);

    let mut output = String::new();
    let _ = writeln!(
        output,
        "Centered on ({}, {}) at zoom {} using the {} style.",
        map.center_lat, map.center_lon, map.zoom, map.style
    );
    let _ = writeln!(output);

    if counts.is_empty() {
        let _ = writeln!(output, "No streetlights to plot.");
        return Ok(output);
    }

    let _ = writeln!(output, "| Label | Lights |");
    let _ = writeln!(output, "| --- | ---: |");
    for count in &counts {
        let _ = writeln!(output, "| {} | {} |", count.label, count.count);
    }
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{} points of interest marked for LED replacement.",
        candidates.len()
    );
    Ok(output)
}

pub fn histogram_section(
    reference: &DashboardReference,
    lights: anyhow::Result<&[StreetlightRecord]>,
    lamp_key: &str,
) -> anyhow::Result<String> {
    let lamp_type: LampType = lamp_key.parse()?;
    let lights = lights?;
    let description = reference
        .descriptions
        .get(lamp_type)
        .ok_or_else(|| anyhow!("no description for {lamp_type}"))?;
    let histogram = aggregate::wattage_histogram(lights, lamp_type);

    let mut output = String::new();
    let _ = writeln!(output, "Distribution of {} in Hobart.", description.full_name);
    let _ = writeln!(output);
    for note in description.notes {
        let _ = writeln!(output, "- {note}");
    }
    let _ = writeln!(output);

    if histogram.is_empty() {
        let _ = writeln!(output, "No {lamp_type} lights recorded.");
        return Ok(output);
    }

    let _ = writeln!(output, "| Wattage | Number of lamps |");
    let _ = writeln!(output, "| --- | ---: |");
    for bucket in &histogram {
        let _ = writeln!(output, "| {} | {} |", bucket.wattage, bucket.count);
    }
    Ok(output)
}

pub fn solar_section(
    reference: &DashboardReference,
    poles: anyhow::Result<&[SolarPoleRecord]>,
    phase: &str,
) -> anyhow::Result<String> {
    let poles = poles?;
    let selected = aggregate::filter_phase(&reference.phases, poles, phase)?;
    let summaries = aggregate::phase_savings(&selected);

    let mut output = String::new();
    let _ = writeln!(output, "{} solar poles scheduled for {}.", selected.len(), phase.trim());
    let _ = writeln!(output);

    if summaries.is_empty() {
        return Ok(output);
    }

    let _ = writeln!(output, "| Lamp type | Poles | Annual savings |");
    let _ = writeln!(output, "| --- | ---: | ---: |");
    for summary in &summaries {
        let _ = writeln!(
            output,
            "| {} | {} | ${:.2} |",
            summary.lamp_type, summary.poles, summary.annual_savings
        );
    }
    Ok(output)
}

pub fn build_report(
    reference: &DashboardReference,
    map: &MapSettings,
    selection: &Selection,
    lights: &anyhow::Result<Vec<StreetlightRecord>>,
    poles: &anyhow::Result<Vec<SolarPoleRecord>>,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Lights Out!");
    let _ = writeln!(output, "Generated {}", generated_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(output);

    push_section(&mut output, "Operational Costs", Ok(costs_section(reference)));
    push_section(
        &mut output,
        "Lighting Map",
        map_section(reference, map, dataset(lights)),
    );
    for lamp_key in &selection.lamp_types {
        push_section(
            &mut output,
            &format!("Light Distribution: {}", lamp_key.trim()),
            histogram_section(reference, dataset(lights), lamp_key),
        );
    }
    push_section(
        &mut output,
        "Solar Pole Rollout",
        solar_section(reference, dataset(poles), &selection.phase),
    );

    output
}
