//! Controlled gas definitions.
//!
//! The analyser exposes one analog input per gas; raw voltages are scaled
//! to concentration units by a fixed per-gas factor.

use serde::{Deserialize, Serialize};

use crate::consts::{CO2_ADC_CHANNEL, CO2_PPM_PER_VOLT, O3_ADC_CHANNEL, O3_PPB_PER_VOLT};

/// A gas species under closed-loop control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gas {
    /// Carbon dioxide, measured in ppm.
    Co2,
    /// Ozone, measured in ppb.
    O3,
}

/// All controlled gases, in cycle order (CO2 first).
pub const ALL_GASES: [Gas; 2] = [Gas::Co2, Gas::O3];

impl Gas {
    /// ADC channel of this gas's analyser on the DAQ.
    pub fn adc_channel(self) -> u8 {
        match self {
            Gas::Co2 => CO2_ADC_CHANNEL,
            Gas::O3 => O3_ADC_CHANNEL,
        }
    }

    /// Concentration units per volt of analyser output.
    pub fn scale(self) -> f64 {
        match self {
            Gas::Co2 => CO2_PPM_PER_VOLT,
            Gas::O3 => O3_PPB_PER_VOLT,
        }
    }

    /// Display unit for log lines.
    pub fn unit(self) -> &'static str {
        match self {
            Gas::Co2 => "ppm",
            Gas::O3 => "ppb",
        }
    }
}

impl std::fmt::Display for Gas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gas::Co2 => write!(f, "CO2"),
            Gas::O3 => write!(f, "O3"),
        }
    }
}
