use crate::error::InvalidSelectionError;
use crate::models::{LampType, MapLabel};

#[derive(Debug, Clone, PartialEq)]
pub struct CostTable {
    /// Operational cost per type over `lifetime_hours` at `lumens`, in chart order.
    pub entries: Vec<(LampType, &'static str, f64)>,
    pub lifetime_hours: u32,
    pub lumens: u32,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            entries: vec![
                (LampType::Mv, "mercury-vapour lamp", 424.5),
                (LampType::Cfl, "compact fluorescent lamp", 360.0),
                (LampType::Led, "light-emitting diode", 210.0),
                (LampType::Hps, "high pressure sodium", 200.0),
            ],
            lifetime_hours: 25_000,
            lumens: 1700,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LampDescription {
    pub lamp_type: LampType,
    pub full_name: &'static str,
    pub notes: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq)]
pub struct LampDescriptions {
    pub entries: Vec<LampDescription>,
}

impl LampDescriptions {
    pub fn get(&self, lamp_type: LampType) -> Option<&LampDescription> {
        self.entries.iter().find(|entry| entry.lamp_type == lamp_type)
    }
}

impl Default for LampDescriptions {
    fn default() -> Self {
        Self {
            entries: vec![
                LampDescription {
                    lamp_type: LampType::Mv,
                    full_name: "Mercury-vapour lamp",
                    notes: &[
                        "MV lights cluster into two groups: up to 150 W in residential streets and above 150 W on major roads.",
                        "125 W and 150 W bulbs in residential areas can be replaced with 18 W LED lights.",
                        "400 W bulbs on major roads can be replaced with 250 W LED lights, assuming 250 W LED matches 250 W HPS luminosity.",
                    ],
                },
                LampDescription {
                    lamp_type: LampType::Cfl,
                    full_name: "Compact fluorescent lamp",
                    notes: &["Wattage is low enough that swapping to LED brings no monetary benefit."],
                },
                LampDescription {
                    lamp_type: LampType::Led,
                    full_name: "Light-emitting diode",
                    notes: &[
                        "Most LED lights are in residential areas, where dimming gives the greatest benefit.",
                        "Luminosity is similar to HPS, so replacing HPS with LED is not justified.",
                        "LED lights can join a smart network and are the recommended path towards a smart city.",
                    ],
                },
                LampDescription {
                    lamp_type: LampType::Hps,
                    full_name: "High Pressure Sodium",
                    notes: &["Luminosity is similar to LED, so replacing HPS lights is not justified."],
                },
            ],
        }
    }
}

const YEAR_1: &[u8] = &[1];
const YEAR_2: &[u8] = &[2];
const YEAR_3: &[u8] = &[3];
const YEAR_4: &[u8] = &[4];
const ALL_YEARS: &[u8] = &[1, 2, 3, 4];

/// Named rollout phases and the implementation years each one covers.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTable {
    pub phases: Vec<(&'static str, &'static [u8])>,
}

impl PhaseTable {
    pub fn years(&self, name: &str) -> Result<&'static [u8], InvalidSelectionError> {
        self.phases
            .iter()
            .find(|(phase, _)| *phase == name.trim())
            .map(|(_, years)| *years)
            .ok_or_else(|| InvalidSelectionError::Phase(name.to_string()))
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        Self {
            phases: vec![
                ("Year 1", YEAR_1),
                ("Year 2", YEAR_2),
                ("Year 3", YEAR_3),
                ("Year 4", YEAR_4),
                ("All Years", ALL_YEARS),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplacementRule {
    pub from: LampType,
    pub wattages: &'static [u32],
    pub to: MapLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementRules {
    pub rules: Vec<ReplacementRule>,
}

impl Default for ReplacementRules {
    fn default() -> Self {
        Self {
            rules: vec![
                ReplacementRule {
                    from: LampType::Mv,
                    wattages: &[400],
                    to: MapLabel::To250WLed,
                },
                ReplacementRule {
                    from: LampType::Mv,
                    wattages: &[125, 150],
                    to: MapLabel::To18WLed,
                },
            ],
        }
    }
}

/// Reference data passed into the aggregation and report functions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardReference {
    pub costs: CostTable,
    pub descriptions: LampDescriptions,
    pub phases: PhaseTable,
    pub replacements: ReplacementRules,
}
