//! Safety report assembly.
//!
//! Composes the current gas analysis, the historical pattern analysis and
//! the canned risk-tier-keyed text blocks into one nested report.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;

use super::patterns::{detect_gas_patterns, PatternReport, Trend};
use super::thresholds::{analyze_gas_levels, GasAnalysis, GasKind, OverallSafety};
use crate::models::{GasEvent, RobotReading};

/// Full safety report.
#[derive(Debug, Clone, Serialize)]
pub struct SafetyReport {
    pub report_timestamp: String,
    pub report_id: String,
    pub executive_summary: String,
    pub current_conditions: CurrentConditions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_analysis: Option<PatternReport>,
    pub risk_assessment: RiskAssessment,
    pub recommendations: Vec<String>,
    pub emergency_procedures: EmergencyProcedures,
    pub monitoring_requirements: MonitoringRequirements,
    pub regulatory_compliance: RegulatoryCompliance,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentConditions {
    pub location: LocationSummary,
    pub environmental: EnvironmentalSummary,
    pub gas_levels: GasAnalysis,
    pub emergency_status: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationSummary {
    pub latitude: f64,
    pub longitude: f64,
    pub gps_valid: bool,
    pub satellites: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentalSummary {
    pub temperature: f64,
    pub system_health: bool,
    pub battery_level: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub overall_risk_score: u8,
    pub fire_explosion_risk: &'static str,
    pub health_risk: &'static str,
    pub immediate_threats: Vec<&'static str>,
    pub long_term_concerns: Vec<&'static str>,
    pub vulnerable_populations: VulnerablePopulations,
    pub business_continuity_impact: BusinessImpact,
}

#[derive(Debug, Clone, Serialize)]
pub struct VulnerablePopulations {
    pub elderly: &'static str,
    pub children: &'static str,
    pub pregnant_women: &'static str,
    pub respiratory_conditions: &'static str,
    pub heart_conditions: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BusinessImpact {
    pub operational_status: &'static str,
    pub evacuation_required: bool,
    pub equipment_shutdown: bool,
    pub estimated_downtime: &'static str,
    pub financial_impact: &'static str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmergencyProcedures {
    pub immediate_actions: Vec<&'static str>,
    pub evacuation_procedures: Vec<&'static str>,
    pub communication_plan: Vec<&'static str>,
    pub medical_response: Vec<&'static str>,
    pub incident_documentation: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitoringRequirements {
    pub monitoring_frequency: &'static str,
    pub calibration_schedule: &'static str,
    pub data_retention: &'static str,
    pub alert_thresholds: &'static str,
    pub personnel_requirements: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegulatoryCompliance {
    pub occupational_safety: &'static str,
    pub environmental_regulations: &'static str,
    pub fire_safety_codes: &'static str,
    pub building_codes: &'static str,
    pub reporting_requirements: Vec<&'static str>,
}

/// Build the full safety report from recent data.
///
/// `readings` is newest first (as returned by the repository);
/// `gas_history` is chronological. An empty `readings` slice produces a
/// report over all-zero current conditions.
pub fn generate_safety_report(
    readings: &[RobotReading],
    gas_history: &[GasEvent],
    rng: &mut impl Rng,
) -> SafetyReport {
    let latest = readings.first();

    let (mq2, mq135) = latest
        .map(|r| (r.mq2_gas_level, r.mq135_air_quality))
        .unwrap_or((0.0, 0.0));
    let specific_gases: Vec<(GasKind, f64)> = latest
        .map(|r| {
            vec![
                (GasKind::Methane, r.methane_ppm),
                (GasKind::Lpg, r.lpg_ppm),
                (GasKind::Smoke, r.smoke_ppm),
                (GasKind::Hydrogen, r.hydrogen_ppm),
                (GasKind::Alcohol, r.alcohol_ppm),
            ]
        })
        .unwrap_or_default();

    let gas_analysis = analyze_gas_levels(mq2, mq135, &specific_gases, rng);
    let emergency_mode = latest.map(|r| r.emergency_mode).unwrap_or(false);

    let historical_analysis = if gas_history.len() > 5 {
        detect_gas_patterns(gas_history).ok()
    } else {
        None
    };

    let now = Utc::now();
    let risk_assessment =
        build_risk_assessment(&gas_analysis, historical_analysis.as_ref(), latest);
    let recommendations = build_recommendations(
        &gas_analysis,
        historical_analysis.as_ref(),
        emergency_mode,
    );

    SafetyReport {
        report_timestamp: now.to_rfc3339(),
        report_id: format!("SR_{}", now.format("%Y%m%d_%H%M%S")),
        executive_summary: executive_summary(&gas_analysis, emergency_mode),
        current_conditions: CurrentConditions {
            location: LocationSummary {
                latitude: latest.map(|r| r.latitude).unwrap_or(0.0),
                longitude: latest.map(|r| r.longitude).unwrap_or(0.0),
                gps_valid: latest.map(|r| r.gps_valid).unwrap_or(false),
                satellites: latest.map(|r| r.satellites).unwrap_or(0),
            },
            environmental: EnvironmentalSummary {
                temperature: latest.map(|r| r.temperature).unwrap_or(0.0),
                system_health: latest.map(|r| r.system_healthy).unwrap_or(true),
                battery_level: latest.map(|r| r.battery_level).unwrap_or(0.0),
            },
            emergency_status: emergency_mode,
            gas_levels: gas_analysis.clone(),
        },
        historical_analysis,
        risk_assessment,
        recommendations,
        emergency_procedures: emergency_procedures(gas_analysis.overall_safety),
        monitoring_requirements: monitoring_requirements(gas_analysis.risk_level),
        regulatory_compliance: regulatory_compliance(gas_analysis.risk_level),
    }
}

fn executive_summary(analysis: &GasAnalysis, emergency_mode: bool) -> String {
    if emergency_mode {
        return "EMERGENCY SITUATION: Rover has activated emergency mode due to multiple \
                hazard detection. Immediate response required."
            .to_string();
    }
    match analysis.overall_safety {
        OverallSafety::Critical => {
            "CRITICAL: Life-threatening gas levels detected. Immediate evacuation and \
             emergency response required."
        }
        OverallSafety::Dangerous => {
            "DANGER: Hazardous gas levels detected. Area evacuation and safety measures \
             required immediately."
        }
        OverallSafety::Caution => {
            "CAUTION: Elevated gas levels require monitoring and limited exposure with \
             safety precautions."
        }
        OverallSafety::Elevated => {
            "NOTICE: Gas levels slightly elevated but within acceptable ranges with \
             continued monitoring."
        }
        OverallSafety::Safe => {
            "SAFE: All gas levels are within normal parameters. Continue standard \
             monitoring procedures."
        }
    }
    .to_string()
}

fn build_risk_assessment(
    analysis: &GasAnalysis,
    patterns: Option<&PatternReport>,
    latest: Option<&RobotReading>,
) -> RiskAssessment {
    let mq2_risk = analysis.mq2_analysis.risk_level;
    let mq135_risk = analysis.mq135_analysis.risk_level;
    let emergency_mode = latest.map(|r| r.emergency_mode).unwrap_or(false);
    let motion = latest.map(|r| r.motion_detected).unwrap_or(false);

    let mut immediate_threats = Vec::new();
    if mq2_risk >= 8 {
        immediate_threats.push("Imminent fire/explosion risk from combustible gases");
    }
    if mq135_risk >= 8 {
        immediate_threats.push("Life-threatening toxic exposure risk");
    }
    if mq2_risk >= 6 && mq135_risk >= 6 {
        immediate_threats.push("Multiple gas hazards present simultaneously");
    }
    if emergency_mode {
        immediate_threats.push("Rover emergency mode indicates multiple hazard conditions");
    }
    if motion && (mq2_risk >= 6 || mq135_risk >= 6) {
        immediate_threats.push("Personnel detected in hazardous gas environment");
    }

    let mut long_term_concerns = Vec::new();
    if mq2_risk >= 4 {
        long_term_concerns.push("Potential chronic combustible gas exposure");
    }
    if mq135_risk >= 4 {
        long_term_concerns.push("Air quality degradation affecting long-term health");
    }
    if let Some(patterns) = patterns {
        if patterns.trend_analysis.mq2_trend == Trend::Increasing {
            long_term_concerns.push("Worsening combustible gas conditions over time");
        }
        if patterns.trend_analysis.mq135_trend == Trend::Increasing {
            long_term_concerns.push("Deteriorating air quality trend");
        }
        if patterns.predictions.risk_probability > 0.5 {
            long_term_concerns.push("High probability of future dangerous conditions");
        }
    }
    if mq2_risk >= 2 || mq135_risk >= 2 {
        long_term_concerns.push("Need for continuous monitoring and maintenance");
    }

    RiskAssessment {
        overall_risk_score: analysis.risk_level,
        fire_explosion_risk: analysis.mq2_analysis.fire_risk,
        health_risk: analysis.mq135_analysis.health_impact,
        immediate_threats,
        long_term_concerns,
        vulnerable_populations: vulnerable_populations(analysis.risk_level),
        business_continuity_impact: business_impact(analysis.risk_level),
    }
}

fn build_recommendations(
    analysis: &GasAnalysis,
    patterns: Option<&PatternReport>,
    emergency_mode: bool,
) -> Vec<String> {
    let mut recommendations: Vec<String> = analysis
        .recommendations
        .iter()
        .map(|r| r.to_string())
        .collect();

    if let Some(patterns) = patterns {
        recommendations.extend(patterns.recommendations.iter().cloned());
    }

    if emergency_mode {
        recommendations.extend(
            [
                "Activate emergency response team",
                "Implement crisis communication plan",
                "Document all emergency actions",
                "Coordinate with local authorities",
            ]
            .map(String::from),
        );
    }

    let general: &[&str] = if analysis.risk_level >= 6 {
        &[
            "Install additional gas detection systems",
            "Establish emergency evacuation procedures",
            "Train personnel on emergency response",
            "Maintain emergency equipment inventory",
            "Establish communication with emergency services",
        ]
    } else if analysis.risk_level >= 4 {
        &[
            "Increase monitoring frequency",
            "Improve ventilation systems",
            "Conduct safety training",
            "Review emergency procedures",
            "Implement buddy system for personnel",
        ]
    } else if analysis.risk_level >= 2 {
        &[
            "Regular equipment maintenance",
            "Periodic safety inspections",
            "Update safety documentation",
            "Monitor trending data",
        ]
    } else {
        &[]
    };
    recommendations.extend(general.iter().map(|r| r.to_string()));

    // De-duplicate while keeping first-seen order
    let mut seen = std::collections::HashSet::new();
    recommendations.retain(|r| seen.insert(r.clone()));
    recommendations
}

fn emergency_procedures(safety: OverallSafety) -> EmergencyProcedures {
    let mut procedures = EmergencyProcedures::default();

    if matches!(safety, OverallSafety::Critical | OverallSafety::Dangerous) {
        procedures.immediate_actions = vec![
            "Sound alarm immediately",
            "Shut down non-essential electrical equipment",
            "Activate emergency lighting",
            "Initiate evacuation procedures",
            "Contact emergency services",
        ];
        procedures.evacuation_procedures = vec![
            "Use designated evacuation routes",
            "Proceed to assembly points",
            "Account for all personnel",
            "Do not use elevators",
            "Assist those needing help",
        ];
        procedures.communication_plan = vec![
            "Notify all personnel via emergency system",
            "Contact facility management",
            "Inform local emergency services",
            "Update stakeholders on situation",
            "Coordinate with neighboring facilities",
        ];
        procedures.medical_response = vec![
            "Assess personnel for exposure symptoms",
            "Provide first aid as needed",
            "Call medical emergency services",
            "Document any injuries or exposures",
            "Provide exposure information to medical personnel",
        ];
    }

    procedures.incident_documentation = vec![
        "Record time and nature of incident",
        "Document gas levels and readings",
        "List personnel present and actions taken",
        "Photograph conditions if safe to do so",
        "Preserve all monitoring data",
    ];

    procedures
}

fn monitoring_requirements(risk: u8) -> MonitoringRequirements {
    if risk >= 8 {
        MonitoringRequirements {
            monitoring_frequency: "continuous_with_redundancy",
            calibration_schedule: "weekly",
            data_retention: "5_years",
            alert_thresholds: "enhanced_sensitivity",
            personnel_requirements: "certified_gas_technician",
        }
    } else if risk >= 6 {
        MonitoringRequirements {
            monitoring_frequency: "continuous",
            calibration_schedule: "bi_weekly",
            data_retention: "3_years",
            alert_thresholds: "high_sensitivity",
            personnel_requirements: "trained_specialist",
        }
    } else if risk >= 4 {
        MonitoringRequirements {
            monitoring_frequency: "every_15_minutes",
            calibration_schedule: "weekly",
            data_retention: "2_years",
            alert_thresholds: "moderate_sensitivity",
            personnel_requirements: "certified_operator",
        }
    } else {
        MonitoringRequirements {
            monitoring_frequency: "standard",
            calibration_schedule: "monthly",
            data_retention: "1_year",
            alert_thresholds: "standard",
            personnel_requirements: "trained_operator",
        }
    }
}

fn regulatory_compliance(risk: u8) -> RegulatoryCompliance {
    if risk >= 8 {
        RegulatoryCompliance {
            occupational_safety: "non_compliant_critical",
            environmental_regulations: "requires_immediate_reporting",
            fire_safety_codes: "emergency_response_required",
            building_codes: "compliant",
            reporting_requirements: vec![
                "Immediate notification to regulatory authorities",
                "Incident report within 24 hours",
                "Corrective action plan within 72 hours",
                "Follow-up monitoring report",
            ],
        }
    } else if risk >= 6 {
        RegulatoryCompliance {
            occupational_safety: "non_compliant",
            environmental_regulations: "compliant",
            fire_safety_codes: "compliant",
            building_codes: "compliant",
            reporting_requirements: vec![
                "Incident notification required",
                "Investigation report needed",
                "Corrective action plan required",
            ],
        }
    } else if risk >= 4 {
        RegulatoryCompliance {
            occupational_safety: "compliant",
            environmental_regulations: "compliant",
            fire_safety_codes: "compliant",
            building_codes: "compliant",
            reporting_requirements: vec![
                "Document incident in safety log",
                "Review safety procedures",
                "Consider preventive measures",
            ],
        }
    } else {
        RegulatoryCompliance {
            occupational_safety: "compliant",
            environmental_regulations: "compliant",
            fire_safety_codes: "compliant",
            building_codes: "compliant",
            reporting_requirements: Vec::new(),
        }
    }
}

fn vulnerable_populations(risk: u8) -> VulnerablePopulations {
    if risk >= 6 {
        VulnerablePopulations {
            elderly: "high_risk",
            children: "high_risk",
            pregnant_women: "high_risk",
            respiratory_conditions: "extreme_risk",
            heart_conditions: "high_risk",
        }
    } else if risk >= 4 {
        VulnerablePopulations {
            elderly: "moderate_risk",
            children: "moderate_risk",
            pregnant_women: "moderate_risk",
            respiratory_conditions: "high_risk",
            heart_conditions: "moderate_risk",
        }
    } else {
        VulnerablePopulations {
            elderly: "low_risk",
            children: "low_risk",
            pregnant_women: "low_risk",
            respiratory_conditions: "moderate_risk",
            heart_conditions: "low_risk",
        }
    }
}

fn business_impact(risk: u8) -> BusinessImpact {
    if risk >= 8 {
        BusinessImpact {
            operational_status: "emergency_shutdown",
            evacuation_required: true,
            equipment_shutdown: true,
            estimated_downtime: "24-72_hours",
            financial_impact: "severe",
        }
    } else if risk >= 6 {
        BusinessImpact {
            operational_status: "partial_shutdown",
            evacuation_required: true,
            equipment_shutdown: true,
            estimated_downtime: "4-24_hours",
            financial_impact: "significant",
        }
    } else if risk >= 4 {
        BusinessImpact {
            operational_status: "restricted_operations",
            evacuation_required: false,
            equipment_shutdown: false,
            estimated_downtime: "1-4_hours",
            financial_impact: "moderate",
        }
    } else {
        BusinessImpact {
            operational_status: "normal",
            evacuation_required: false,
            equipment_shutdown: false,
            estimated_downtime: "none",
            financial_impact: "minimal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GasAlertLevel, TelemetryPayload};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn reading(mq2: f64, mq135: f64, emergency: bool) -> RobotReading {
        let mut reading = RobotReading::from_payload(TelemetryPayload::default());
        reading.mq2_gas_level = mq2;
        reading.mq135_air_quality = mq135;
        reading.emergency_mode = emergency;
        reading
    }

    fn gas_events(n: usize, mq2: f64) -> Vec<GasEvent> {
        (0..n)
            .map(|i| GasEvent {
                id: i as i64 + 1,
                timestamp: Utc::now(),
                mq2_level: mq2,
                mq135_level: 100.0,
                latitude: 0.0,
                longitude: 0.0,
                alert_triggered: false,
                alert_type: GasAlertLevel::Normal,
                methane_ppm: 0.0,
                hydrogen_ppm: 0.0,
                lpg_ppm: 0.0,
                smoke_ppm: 0.0,
                alcohol_ppm: 0.0,
            })
            .collect()
    }

    #[test]
    fn report_on_empty_data_is_safe() {
        let mut rng = StdRng::seed_from_u64(1);
        let report = generate_safety_report(&[], &[], &mut rng);
        assert!(report.report_id.starts_with("SR_"));
        assert!(report.executive_summary.starts_with("SAFE"));
        assert!(report.historical_analysis.is_none());
        assert_eq!(report.risk_assessment.overall_risk_score, 0);
        assert!(report.recommendations.is_empty());
        assert!(report.emergency_procedures.immediate_actions.is_empty());
        assert!(!report.emergency_procedures.incident_documentation.is_empty());
    }

    #[test]
    fn critical_reading_produces_critical_report() {
        let mut rng = StdRng::seed_from_u64(1);
        let readings = [reading(105.0, 100.0, false)];
        let report = generate_safety_report(&readings, &[], &mut rng);
        assert!(report.executive_summary.starts_with("CRITICAL"));
        assert_eq!(report.risk_assessment.overall_risk_score, 10);
        assert!(report
            .risk_assessment
            .immediate_threats
            .contains(&"Imminent fire/explosion risk from combustible gases"));
        assert_eq!(
            report.monitoring_requirements.monitoring_frequency,
            "continuous_with_redundancy"
        );
        assert_eq!(
            report.regulatory_compliance.occupational_safety,
            "non_compliant_critical"
        );
        assert!(report.risk_assessment.business_continuity_impact.evacuation_required);
    }

    #[test]
    fn emergency_mode_overrides_summary() {
        let mut rng = StdRng::seed_from_u64(1);
        let readings = [reading(10.0, 50.0, true)];
        let report = generate_safety_report(&readings, &[], &mut rng);
        assert!(report.executive_summary.starts_with("EMERGENCY"));
        assert!(report
            .recommendations
            .contains(&"Activate emergency response team".to_string()));
    }

    #[test]
    fn history_above_five_entries_enables_pattern_section() {
        let mut rng = StdRng::seed_from_u64(1);
        let readings = [reading(10.0, 50.0, false)];
        let report = generate_safety_report(&readings, &gas_events(6, 30.0), &mut rng);
        assert!(report.historical_analysis.is_some());

        let report = generate_safety_report(&readings, &gas_events(5, 30.0), &mut rng);
        assert!(report.historical_analysis.is_none());
    }

    #[test]
    fn recommendations_are_deduplicated() {
        let mut rng = StdRng::seed_from_u64(1);
        let readings = [reading(85.0, 100.0, false)];
        let report = generate_safety_report(&readings, &[], &mut rng);
        let mut sorted = report.recommendations.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), report.recommendations.len());
    }
}
