//! Comfort status and extreme-condition flags.
//!
//! Both work on canonical metric values (°C, mm, m/s), never display units.

use serde::Serialize;

use crate::domain::{PredictionMap, Thresholds, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comfort {
    Comfortable,
    Uncomfortable,
    Unknown,
}

impl Comfort {
    pub fn label(self) -> &'static str {
        match self {
            Comfort::Comfortable => "Comfortable",
            Comfort::Uncomfortable => "Uncomfortable",
            Comfort::Unknown => "Unknown",
        }
    }
}

pub fn classify(var: Variable, value: Option<f64>) -> Comfort {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return Comfort::Unknown;
    };
    let comfortable = match var {
        Variable::Temperature => (18.0..=28.0).contains(&v),
        Variable::Humidity => (30.0..=60.0).contains(&v),
        Variable::Wind => v <= 10.0,
        Variable::Rainfall => v == 0.0,
        Variable::UvIndex => v <= 5.0,
        Variable::HeatIndex => v <= 32.0,
    };
    if comfortable {
        Comfort::Comfortable
    } else {
        Comfort::Uncomfortable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtremeFlag {
    VeryHot,
    VeryCold,
    VeryWet,
    VeryWindy,
    VeryUncomfortable,
}

impl ExtremeFlag {
    pub fn label(self) -> &'static str {
        match self {
            ExtremeFlag::VeryHot => "very hot",
            ExtremeFlag::VeryCold => "very cold",
            ExtremeFlag::VeryWet => "very wet",
            ExtremeFlag::VeryWindy => "very windy",
            ExtremeFlag::VeryUncomfortable => "very uncomfortable",
        }
    }
}

/// Flags raised by the predicted values. Null predictions raise nothing.
pub fn extreme_flags(predictions: &PredictionMap, thresholds: &Thresholds) -> Vec<ExtremeFlag> {
    let mut flags = Vec::new();

    if let Some(t) = predictions.value(Variable::Temperature) {
        if t >= thresholds.very_hot {
            flags.push(ExtremeFlag::VeryHot);
        }
        if t <= thresholds.very_cold {
            flags.push(ExtremeFlag::VeryCold);
        }
    }
    if predictions
        .value(Variable::Rainfall)
        .is_some_and(|r| r >= thresholds.very_wet)
    {
        flags.push(ExtremeFlag::VeryWet);
    }
    if predictions
        .value(Variable::Wind)
        .is_some_and(|w| w >= thresholds.very_windy)
    {
        flags.push(ExtremeFlag::VeryWindy);
    }
    if predictions
        .value(Variable::HeatIndex)
        .is_some_and(|h| h >= thresholds.very_uncomfortable)
    {
        flags.push(ExtremeFlag::VeryUncomfortable);
    }

    flags
}
