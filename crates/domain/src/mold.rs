//! Mold risk — dew point, absolute humidity and a four-level classification.
//!
//! Everything here is pure. The assessment is consumed by the event detector
//! and the device controller, and exposed read-only to the dashboard.

use serde::{Deserialize, Serialize};

use crate::error::ReadingError;
use crate::reading::validate_climate;

/// Magnus coefficient `b` (dimensionless).
const MAGNUS_B: f64 = 17.62;
/// Magnus coefficient `c` in °C.
const MAGNUS_C: f64 = 243.12;
/// Specific gas constant of water vapour, J/(kg·K).
const WATER_VAPOUR_GAS_CONSTANT: f64 = 461.5;

/// Humidity-based mold risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Below 65 %.
    Low,
    /// 65 % up to 70 %.
    Medium,
    /// 70 % up to 75 %.
    High,
    /// 75 % and above.
    Critical,
}

impl RiskLevel {
    /// Classify a relative humidity value.
    #[must_use]
    pub fn from_humidity(relative_humidity: f64) -> Self {
        if relative_humidity >= 75.0 {
            Self::Critical
        } else if relative_humidity >= 70.0 {
            Self::High
        } else if relative_humidity >= 65.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Whether this tier forces the dehumidifier on.
    #[must_use]
    pub fn is_elevated(self) -> bool {
        self >= Self::High
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Low => "Low - mold cannot establish itself",
            Self::Medium => "Medium - sustained exposure favours mold",
            Self::High => "High - mold growth likely within days",
            Self::Critical => "Critical - active mold growth conditions",
        }
    }

    #[must_use]
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Low => "No action needed",
            Self::Medium => "Ventilate after showering",
            Self::High => "Run the dehumidifier or ventilate now",
            Self::Critical => "Dehumidify immediately and check for condensation",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => f.write_str("LOW"),
            Self::Medium => f.write_str("MEDIUM"),
            Self::High => f.write_str("HIGH"),
            Self::Critical => f.write_str("CRITICAL"),
        }
    }
}

/// Result of analysing one temperature / humidity pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoldRiskAssessment {
    pub temperature: f64,
    pub relative_humidity: f64,
    /// °C.
    pub dew_point: f64,
    /// g/m³.
    pub absolute_humidity: f64,
    pub level: RiskLevel,
    /// Surfaces near ambient temperature are close to the dew point.
    pub condensation_risk: bool,
}

/// Stateless analyser; the only knob is the condensation margin.
#[derive(Debug, Clone, Copy)]
pub struct MoldRiskAnalyzer {
    condensation_margin: f64,
}

impl Default for MoldRiskAnalyzer {
    fn default() -> Self {
        Self {
            condensation_margin: 3.0,
        }
    }
}

impl MoldRiskAnalyzer {
    /// Use a custom condensation margin (°C between ambient and dew point).
    #[must_use]
    pub fn with_condensation_margin(condensation_margin: f64) -> Self {
        Self {
            condensation_margin,
        }
    }

    /// Analyse a reading.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadingError`] when the reading is not physically plausible.
    pub fn assess(
        &self,
        temperature: f64,
        relative_humidity: f64,
    ) -> Result<MoldRiskAssessment, ReadingError> {
        let dew_point = dew_point(temperature, relative_humidity)?;
        let absolute_humidity = absolute_humidity(temperature, relative_humidity)?;

        Ok(MoldRiskAssessment {
            temperature,
            relative_humidity,
            dew_point,
            absolute_humidity,
            level: RiskLevel::from_humidity(relative_humidity),
            condensation_risk: temperature - dew_point < self.condensation_margin,
        })
    }
}

/// Dew point in °C using the Magnus approximation.
///
/// # Errors
///
/// Returns a [`ReadingError`] for implausible input.
pub fn dew_point(temperature: f64, relative_humidity: f64) -> Result<f64, ReadingError> {
    validate_climate(temperature, relative_humidity)?;
    let gamma =
        (relative_humidity / 100.0).ln() + (MAGNUS_B * temperature) / (MAGNUS_C + temperature);
    Ok((MAGNUS_C * gamma) / (MAGNUS_B - gamma))
}

/// Absolute humidity in g/m³.
///
/// Saturation vapour pressure from the Magnus formula, then the ideal gas law
/// for water vapour.
///
/// # Errors
///
/// Returns a [`ReadingError`] for implausible input.
pub fn absolute_humidity(temperature: f64, relative_humidity: f64) -> Result<f64, ReadingError> {
    validate_climate(temperature, relative_humidity)?;
    let saturation_hpa = 6.112 * ((MAGNUS_B * temperature) / (MAGNUS_C + temperature)).exp();
    let vapour_pa = saturation_hpa * 100.0 * relative_humidity / 100.0;
    let kelvin = temperature + 273.15;
    Ok(vapour_pa / (WATER_VAPOUR_GAS_CONSTANT * kelvin) * 1000.0)
}
