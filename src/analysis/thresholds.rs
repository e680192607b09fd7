//! Threshold-based gas classification.
//!
//! Each channel is scored against an ordered ladder of ascending cutoffs;
//! a level at or above a boundary lands in the higher tier. Every tier
//! carries a fixed risk score and canned advisory text. Overall risk is
//! the maximum across the evaluated channels.

use std::collections::BTreeMap;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Specific gas channels reported by the MQ sensor array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasKind {
    Methane,
    Lpg,
    Smoke,
    Hydrogen,
    Alcohol,
}

/// Ascending cutoff ladder for one gas channel (ppm).
struct GasLadder {
    elevated: f64,
    caution: f64,
    dangerous: f64,
    critical: f64,
}

impl GasKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Methane => "methane",
            Self::Lpg => "lpg",
            Self::Smoke => "smoke",
            Self::Hydrogen => "hydrogen",
            Self::Alcohol => "alcohol",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "methane" => Some(Self::Methane),
            "lpg" => Some(Self::Lpg),
            "smoke" => Some(Self::Smoke),
            "hydrogen" => Some(Self::Hydrogen),
            "alcohol" => Some(Self::Alcohol),
            _ => None,
        }
    }

    pub const ALL: [GasKind; 5] = [
        GasKind::Methane,
        GasKind::Lpg,
        GasKind::Smoke,
        GasKind::Hydrogen,
        GasKind::Alcohol,
    ];

    fn ladder(&self) -> GasLadder {
        match self {
            Self::Methane => GasLadder {
                elevated: 500.0,
                caution: 2000.0,
                dangerous: 2500.0,
                critical: 5000.0,
            },
            // The sensor vendor's table listed caution and danger both at
            // 1000 ppm; the ladder here is strictly ascending so every
            // tier is reachable.
            Self::Lpg => GasLadder {
                elevated: 200.0,
                caution: 500.0,
                dangerous: 1000.0,
                critical: 2000.0,
            },
            Self::Smoke => GasLadder {
                elevated: 100.0,
                caution: 499.0,
                dangerous: 500.0,
                critical: 1000.0,
            },
            Self::Hydrogen => GasLadder {
                elevated: 1000.0,
                caution: 3999.0,
                dangerous: 10000.0,
                critical: 20000.0,
            },
            Self::Alcohol => GasLadder {
                elevated: 50.0,
                caution: 199.0,
                dangerous: 200.0,
                critical: 500.0,
            },
        }
    }

    fn properties(&self) -> GasProperties {
        match self {
            Self::Methane => GasProperties {
                explosive_range: Some("5-15%"),
                density: Some("lighter_than_air"),
                health_risk: Some("asphyxiant"),
                ignition_temp: Some("537C"),
                ..Default::default()
            },
            Self::Lpg => GasProperties {
                explosive_range: Some("1.8-9.5%"),
                density: Some("heavier_than_air"),
                health_risk: Some("narcotic"),
                ignition_temp: Some("470C"),
                ..Default::default()
            },
            Self::Hydrogen => GasProperties {
                explosive_range: Some("4-75%"),
                density: Some("lighter_than_air"),
                health_risk: Some("asphyxiant"),
                ignition_temp: Some("560C"),
                ..Default::default()
            },
            Self::Smoke => GasProperties {
                health_risk: Some("respiratory_toxin"),
                composition: Some("particles_and_gases"),
                visibility_impact: Some("severe"),
                temperature_indicator: Some("fire_presence"),
                ..Default::default()
            },
            Self::Alcohol => GasProperties::default(),
        }
    }
}

/// Physical/hazard properties of a gas, where known.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GasProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explosive_range: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_risk: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignition_temp: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_impact: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_indicator: Option<&'static str>,
}

/// Overall safety tier derived from the maximum channel risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallSafety {
    Safe,
    Elevated,
    Caution,
    Dangerous,
    Critical,
}

impl OverallSafety {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Elevated => "elevated",
            Self::Caution => "caution",
            Self::Dangerous => "dangerous",
            Self::Critical => "critical",
        }
    }

    pub fn from_risk(risk: u8) -> Self {
        match risk {
            8.. => Self::Critical,
            6..=7 => Self::Dangerous,
            4..=5 => Self::Caution,
            2..=3 => Self::Elevated,
            _ => Self::Safe,
        }
    }
}

/// Assessment of the MQ2 combustible-gas channel.
#[derive(Debug, Clone, Serialize)]
pub struct Mq2Assessment {
    pub level: f64,
    pub unit: &'static str,
    pub gas_type: &'static str,
    pub status: &'static str,
    pub risk_level: u8,
    pub health_impact: &'static str,
    pub fire_risk: &'static str,
    pub explosion_potential: &'static str,
}

/// Assessment of the MQ135 air-quality channel.
#[derive(Debug, Clone, Serialize)]
pub struct Mq135Assessment {
    pub level: f64,
    pub unit: &'static str,
    pub gas_type: &'static str,
    pub status: &'static str,
    pub risk_level: u8,
    pub health_impact: &'static str,
    pub breathing_safety: &'static str,
    pub long_term_effects: &'static str,
}

/// Assessment of one specific gas channel.
#[derive(Debug, Clone, Serialize)]
pub struct SpecificGasAssessment {
    pub gas_type: &'static str,
    pub level: f64,
    pub unit: &'static str,
    pub status: &'static str,
    pub risk_level: u8,
    pub properties: GasProperties,
    pub health_impact: &'static str,
    pub fire_explosion_risk: &'static str,
}

/// Environmental conditions affecting gas behavior.
///
/// No environmental sensors feed this yet; values are sampled from
/// plausible ranges through the injected RNG.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentalFactors {
    pub temperature: f64,
    pub humidity: f64,
    pub air_pressure: f64,
    pub wind_conditions: &'static str,
    pub ventilation_status: &'static str,
    pub building_type: &'static str,
}

/// Risk-tier-keyed guidance block.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GasGuidance {
    pub immediate_actions: Vec<&'static str>,
    pub safety_equipment: Vec<&'static str>,
    pub monitoring_recommendations: Vec<&'static str>,
    pub prevention_measures: Vec<&'static str>,
}

/// Full gas analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct GasAnalysis {
    pub timestamp: String,
    pub mq2_analysis: Mq2Assessment,
    pub mq135_analysis: Mq135Assessment,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub specific_gas_analysis: BTreeMap<&'static str, SpecificGasAssessment>,
    pub overall_safety: OverallSafety,
    pub recommendations: Vec<&'static str>,
    pub risk_level: u8,
    pub emergency_actions: Vec<&'static str>,
    pub environmental_factors: EnvironmentalFactors,
    pub gas_specific_guidance: GasGuidance,
}

/// Analyze the MQ2 combustible-gas level (raw analog reading).
pub fn analyze_mq2(level: f64) -> Mq2Assessment {
    let (status, risk_level, health_impact, fire_risk, explosion_potential) = if level >= 100.0 {
        (
            "critical",
            10,
            "severe - explosion risk imminent",
            "extreme",
            "high",
        )
    } else if level >= 90.0 {
        (
            "dangerous",
            8,
            "high - fire/explosion risk",
            "high",
            "moderate",
        )
    } else if level >= 80.0 {
        (
            "caution",
            5,
            "moderate - potential fire risk",
            "moderate",
            "low",
        )
    } else if level >= 60.0 {
        ("elevated", 2, "low - monitor levels", "low", "minimal")
    } else {
        ("safe", 0, "none", "low", "minimal")
    };

    Mq2Assessment {
        level,
        unit: "raw_reading",
        gas_type: "combustible (LPG, propane, methane, hydrogen)",
        status,
        risk_level,
        health_impact,
        fire_risk,
        explosion_potential,
    }
}

/// Analyze the MQ135 air-quality level (ppm).
pub fn analyze_mq135(level: f64) -> Mq135Assessment {
    let (status, risk_level, health_impact, breathing_safety, long_term_effects) = if level
        >= 500.0
    {
        (
            "hazardous",
            9,
            "severe - toxic exposure",
            "dangerous",
            "serious health consequences",
        )
    } else if level >= 400.0 {
        (
            "poor",
            7,
            "high - avoid prolonged exposure",
            "unsafe",
            "potential health impacts",
        )
    } else if level >= 300.0 {
        (
            "moderate",
            4,
            "moderate - limit exposure",
            "caution",
            "monitor health",
        )
    } else if level >= 150.0 {
        (
            "elevated",
            2,
            "low - acceptable for short periods",
            "acceptable",
            "minimal",
        )
    } else {
        ("good", 0, "none", "safe", "none")
    };

    Mq135Assessment {
        level,
        unit: "ppm",
        gas_type: "air quality (CO2, NH3, NOx, benzene, alcohol)",
        status,
        risk_level,
        health_impact,
        breathing_safety,
        long_term_effects,
    }
}

/// Analyze one specific gas channel (ppm).
pub fn analyze_specific_gas(kind: GasKind, level: f64) -> SpecificGasAssessment {
    let ladder = kind.ladder();

    let (status, risk_level, health_impact, fire_explosion_risk) = if level >= ladder.critical {
        ("critical", 10, "life_threatening", "extreme")
    } else if level >= ladder.dangerous {
        ("dangerous", 8, "severe", "high")
    } else if level >= ladder.caution {
        ("caution", 5, "moderate", "moderate")
    } else if level >= ladder.elevated {
        ("elevated", 2, "low", "low")
    } else {
        ("safe", 0, "minimal", "low")
    };

    SpecificGasAssessment {
        gas_type: kind.as_str(),
        level,
        unit: "ppm",
        status,
        risk_level,
        properties: kind.properties(),
        health_impact,
        fire_explosion_risk,
    }
}

/// Sample environmental conditions from plausible ranges.
pub fn assess_environmental_factors(rng: &mut impl Rng) -> EnvironmentalFactors {
    EnvironmentalFactors {
        temperature: rng.gen_range(20.0..35.0),
        humidity: rng.gen_range(40.0..80.0),
        air_pressure: rng.gen_range(1000.0..1020.0),
        wind_conditions: *["calm", "light_breeze", "moderate_wind", "strong_wind"]
            .choose(rng)
            .unwrap(),
        ventilation_status: *["poor", "adequate", "good", "excellent"].choose(rng).unwrap(),
        building_type: *["open_area", "enclosed_space", "basement", "multi_story"]
            .choose(rng)
            .unwrap(),
    }
}

fn guidance_for_risk(risk: u8) -> GasGuidance {
    let mut guidance = GasGuidance::default();

    if risk >= 8 {
        guidance.immediate_actions.extend([
            "Evacuate immediately",
            "Call emergency services",
            "Account for all personnel",
            "Do not re-enter until cleared",
        ]);
        guidance.safety_equipment.extend([
            "Self-contained breathing apparatus",
            "Gas detection equipment",
            "Emergency communication devices",
        ]);
    } else if risk >= 6 {
        guidance.immediate_actions.extend([
            "Clear the area",
            "Increase ventilation",
            "Monitor continuously",
            "Prepare evacuation plan",
        ]);
        guidance.safety_equipment.extend([
            "Portable gas detectors",
            "Respiratory protection",
            "Communication equipment",
        ]);
    }

    guidance.monitoring_recommendations.extend([
        "Install continuous gas monitoring",
        "Regular calibration of sensors",
        "Multiple detection points",
        "Data logging and trending",
    ]);

    guidance.prevention_measures.extend([
        "Regular equipment maintenance",
        "Leak detection surveys",
        "Ventilation system checks",
        "Personnel training programs",
    ]);

    guidance
}

/// Analyze the two MQ channels plus any specific gas levels.
///
/// Overall risk is the maximum of all channel risk scores; the overall
/// safety tier and its emergency-action/recommendation blocks follow from
/// that maximum.
pub fn analyze_gas_levels(
    mq2_level: f64,
    mq135_level: f64,
    specific_gases: &[(GasKind, f64)],
    rng: &mut impl Rng,
) -> GasAnalysis {
    let mq2_analysis = analyze_mq2(mq2_level);
    let mq135_analysis = analyze_mq135(mq135_level);

    let mut specific_gas_analysis = BTreeMap::new();
    for (kind, level) in specific_gases {
        specific_gas_analysis.insert(kind.as_str(), analyze_specific_gas(*kind, *level));
    }

    let specific_risk = specific_gas_analysis
        .values()
        .map(|a| a.risk_level)
        .max()
        .unwrap_or(0);
    let risk_level = mq2_analysis
        .risk_level
        .max(mq135_analysis.risk_level)
        .max(specific_risk);
    let overall_safety = OverallSafety::from_risk(risk_level);

    let mut recommendations = Vec::new();
    let mut emergency_actions = Vec::new();
    match overall_safety {
        OverallSafety::Critical => emergency_actions.extend([
            "IMMEDIATE EVACUATION REQUIRED",
            "Contact emergency services (119/110)",
            "Do not use electrical equipment",
            "Ventilate area if safely possible",
            "Account for all personnel",
        ]),
        OverallSafety::Dangerous => emergency_actions.extend([
            "Evacuate area immediately",
            "Ensure maximum ventilation",
            "Monitor levels continuously",
            "Prepare for emergency evacuation",
            "Contact safety personnel",
        ]),
        OverallSafety::Caution => recommendations.extend([
            "Limit exposure time",
            "Increase ventilation",
            "Monitor for symptoms",
            "Identify gas source",
            "Have evacuation plan ready",
        ]),
        OverallSafety::Elevated => recommendations.extend([
            "Monitor levels regularly",
            "Check ventilation systems",
            "Investigate potential sources",
        ]),
        OverallSafety::Safe => {}
    }

    GasAnalysis {
        timestamp: Utc::now().to_rfc3339(),
        mq2_analysis,
        mq135_analysis,
        specific_gas_analysis,
        overall_safety,
        recommendations,
        risk_level,
        emergency_actions,
        environmental_factors: assess_environmental_factors(rng),
        gas_specific_guidance: guidance_for_risk(risk_level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn mq2_tiers_resolve_at_boundaries() {
        assert_eq!(analyze_mq2(59.9).status, "safe");
        assert_eq!(analyze_mq2(60.0).status, "elevated");
        assert_eq!(analyze_mq2(80.0).status, "caution");
        assert_eq!(analyze_mq2(90.0).status, "dangerous");
        assert_eq!(analyze_mq2(100.0).status, "critical");
        assert_eq!(analyze_mq2(100.0).risk_level, 10);
    }

    #[test]
    fn mq135_tiers_resolve_at_boundaries() {
        assert_eq!(analyze_mq135(149.0).status, "good");
        assert_eq!(analyze_mq135(150.0).status, "elevated");
        assert_eq!(analyze_mq135(300.0).status, "moderate");
        assert_eq!(analyze_mq135(400.0).status, "poor");
        assert_eq!(analyze_mq135(500.0).status, "hazardous");
    }

    #[test]
    fn classification_is_monotonic_per_channel() {
        let mut last = 0;
        for level in 0..1200 {
            let risk = analyze_mq2(level as f64 / 10.0).risk_level;
            assert!(risk >= last, "mq2 risk decreased at {}", level);
            last = risk;
        }

        for kind in GasKind::ALL {
            let mut last = 0;
            for level in 0..25000 {
                let risk = analyze_specific_gas(kind, level as f64).risk_level;
                assert!(
                    risk >= last,
                    "{} risk decreased at {}",
                    kind.as_str(),
                    level
                );
                last = risk;
            }
        }
    }

    #[test]
    fn every_lpg_tier_is_reachable() {
        assert_eq!(analyze_specific_gas(GasKind::Lpg, 100.0).status, "safe");
        assert_eq!(analyze_specific_gas(GasKind::Lpg, 200.0).status, "elevated");
        assert_eq!(analyze_specific_gas(GasKind::Lpg, 500.0).status, "caution");
        assert_eq!(analyze_specific_gas(GasKind::Lpg, 1000.0).status, "dangerous");
        assert_eq!(analyze_specific_gas(GasKind::Lpg, 2000.0).status, "critical");
    }

    #[test]
    fn overall_risk_is_channel_maximum() {
        let mut rng = StdRng::seed_from_u64(7);
        let analysis = analyze_gas_levels(
            10.0,
            100.0,
            &[(GasKind::Methane, 6000.0), (GasKind::Alcohol, 10.0)],
            &mut rng,
        );
        assert_eq!(analysis.risk_level, 10);
        assert_eq!(analysis.overall_safety, OverallSafety::Critical);
        assert!(!analysis.emergency_actions.is_empty());
        assert!(analysis.recommendations.is_empty());
    }

    #[test]
    fn safe_analysis_has_no_actions() {
        let mut rng = StdRng::seed_from_u64(7);
        let analysis = analyze_gas_levels(10.0, 50.0, &[], &mut rng);
        assert_eq!(analysis.overall_safety, OverallSafety::Safe);
        assert!(analysis.emergency_actions.is_empty());
        assert!(analysis.recommendations.is_empty());
        assert!(analysis.gas_specific_guidance.immediate_actions.is_empty());
    }
}
