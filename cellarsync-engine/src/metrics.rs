//! Derived fermentation metrics.
//!
//! All quantities are computed from the apparent extract (AE) and original
//! extract (OE), both in degrees Plato. Every function returns `None` when an
//! input is unavailable or a denominator is zero; dependents short-circuit on
//! `None` instead of computing on a missing value.

use serde::{Deserialize, Serialize};

const SPECIFIC_WEIGHT_BASE: f64 = 1.0;
const SPECIFIC_WEIGHT_PER_PLATO: f64 = 0.004;
const BALLING_C1: f64 = 2.0665;
const BALLING_C2: f64 = 1.0665;
const ETHANOL_DENSITY: f64 = 0.794;
const REAL_EXTRACT_C4: f64 = 1.0665;
const REAL_EXTRACT_C5: f64 = 2.0665;

/// The five derived columns of a fermentation log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedMetric {
    SpecificWeight,
    RealAttenuation,
    AlcoholByWeight,
    AlcoholByVolume,
    RealExtract,
}

impl DerivedMetric {
    fn decimals(self) -> usize {
        match self {
            Self::SpecificWeight => 4,
            _ => 2,
        }
    }
}

/// Raw measurements feeding the calculator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FermentationInputs {
    pub original_extract: Option<f64>,
    pub apparent_extract: Option<f64>,
}

/// Computed metrics for one record.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DerivedMetrics {
    pub specific_weight: Option<f64>,
    pub real_attenuation: Option<f64>,
    pub alcohol_by_weight: Option<f64>,
    pub alcohol_by_volume: Option<f64>,
    pub real_extract: Option<f64>,
}

impl DerivedMetrics {
    /// Computes all five metrics in dependency order.
    pub fn compute(inputs: FermentationInputs) -> Self {
        let FermentationInputs {
            original_extract: oe,
            apparent_extract: ae,
        } = inputs;

        let specific_weight = specific_weight(ae);
        let real_attenuation = real_attenuation(oe, ae);
        let alcohol_by_weight = alcohol_by_weight(oe, ae);
        let alcohol_by_volume = alcohol_by_volume(alcohol_by_weight, specific_weight);
        let real_extract = real_extract(oe, alcohol_by_weight);

        Self {
            specific_weight,
            real_attenuation,
            alcohol_by_weight,
            alcohol_by_volume,
            real_extract,
        }
    }

    pub fn get(&self, metric: DerivedMetric) -> Option<f64> {
        match metric {
            DerivedMetric::SpecificWeight => self.specific_weight,
            DerivedMetric::RealAttenuation => self.real_attenuation,
            DerivedMetric::AlcoholByWeight => self.alcohol_by_weight,
            DerivedMetric::AlcoholByVolume => self.alcohol_by_volume,
            DerivedMetric::RealExtract => self.real_extract,
        }
    }

    /// Renders a metric for a cell; unavailable metrics render as "".
    pub fn render(&self, metric: DerivedMetric) -> String {
        self.get(metric)
            .map(|v| format!("{:.*}", metric.decimals(), v))
            .unwrap_or_default()
    }
}

const ZERO_TOLERANCE: f64 = 1e-9;

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

fn nonzero(v: f64) -> Option<f64> {
    (v.abs() >= ZERO_TOLERANCE).then_some(v)
}

pub fn specific_weight(apparent: Option<f64>) -> Option<f64> {
    finite(SPECIFIC_WEIGHT_BASE + SPECIFIC_WEIGHT_PER_PLATO * apparent?)
}

pub fn real_attenuation(original: Option<f64>, apparent: Option<f64>) -> Option<f64> {
    let (oe, ae) = (original?, apparent?);
    let oe_divisor = nonzero(oe)?;
    finite((oe - ae) / oe_divisor * 100.0)
}

pub fn alcohol_by_weight(original: Option<f64>, apparent: Option<f64>) -> Option<f64> {
    let (oe, ae) = (original?, apparent?);
    let denominator = nonzero(100.0 * BALLING_C1 - oe * BALLING_C2)?;
    finite(100.0 * (oe - ae) / denominator)
}

pub fn alcohol_by_volume(abw: Option<f64>, specific_weight: Option<f64>) -> Option<f64> {
    finite(abw? * specific_weight? / ETHANOL_DENSITY)
}

pub fn real_extract(original: Option<f64>, abw: Option<f64>) -> Option<f64> {
    let (oe, abw) = (original?, abw?);
    finite((oe * (REAL_EXTRACT_C4 * abw + 100.0)) / 100.0 - REAL_EXTRACT_C5 * abw)
}
