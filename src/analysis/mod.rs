//! Gas analytics: threshold classification, historical pattern statistics,
//! and safety report assembly.
//!
//! Everything here is stateless per call; functions take their full input
//! each time and randomness (environmental factors) comes in through an
//! injected RNG.

mod patterns;
mod report;
mod thresholds;

pub use patterns::{detect_gas_patterns, ChannelStats, PatternError, PatternReport, Trend};
pub use report::{generate_safety_report, SafetyReport};
pub use thresholds::{
    analyze_gas_levels, analyze_mq135, analyze_mq2, analyze_specific_gas,
    assess_environmental_factors, EnvironmentalFactors, GasAnalysis, GasKind, OverallSafety,
};
