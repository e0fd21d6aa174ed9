//! Initialization ranges of the trainable LTC parameters.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NcpError, Result};

/// Names of the randomly initialized LTC parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamName {
    Gleak,
    Vleak,
    Cm,
    W,
    Sigma,
    Mu,
    SensoryW,
    SensorySigma,
    SensoryMu,
}

impl ParamName {
    pub const ALL: [ParamName; 9] = [
        ParamName::Gleak,
        ParamName::Vleak,
        ParamName::Cm,
        ParamName::W,
        ParamName::Sigma,
        ParamName::Mu,
        ParamName::SensoryW,
        ParamName::SensorySigma,
        ParamName::SensoryMu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamName::Gleak => "gleak",
            ParamName::Vleak => "vleak",
            ParamName::Cm => "cm",
            ParamName::W => "w",
            ParamName::Sigma => "sigma",
            ParamName::Mu => "mu",
            ParamName::SensoryW => "sensory_w",
            ParamName::SensorySigma => "sensory_sigma",
            ParamName::SensoryMu => "sensory_mu",
        }
    }

    /// Parameters clamped at zero for the lifetime of the cell
    pub fn is_non_negative(&self) -> bool {
        matches!(
            self,
            ParamName::Gleak | ParamName::Cm | ParamName::W | ParamName::SensoryW
        )
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamName {
    type Err = NcpError;

    fn from_str(s: &str) -> Result<Self> {
        ParamName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| NcpError::UnknownParameter(s.to_string()))
    }
}

/// `(min, max)` uniform initialization range for every LTC parameter.
///
/// A range with `min == max` initializes the parameter to that constant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, (f64, f64)>",
    into = "BTreeMap<String, (f64, f64)>"
)]
pub struct InitRanges {
    gleak: (f64, f64),
    vleak: (f64, f64),
    cm: (f64, f64),
    w: (f64, f64),
    sigma: (f64, f64),
    mu: (f64, f64),
    sensory_w: (f64, f64),
    sensory_sigma: (f64, f64),
    sensory_mu: (f64, f64),
}

impl Default for InitRanges {
    fn default() -> Self {
        Self {
            gleak: (0.001, 1.0),
            vleak: (-0.2, 0.2),
            cm: (0.4, 0.6),
            w: (0.001, 1.0),
            sigma: (3.0, 8.0),
            mu: (0.3, 0.8),
            sensory_w: (0.001, 1.0),
            sensory_sigma: (3.0, 8.0),
            sensory_mu: (0.3, 0.8),
        }
    }
}

impl InitRanges {
    pub fn get(&self, name: ParamName) -> (f64, f64) {
        match name {
            ParamName::Gleak => self.gleak,
            ParamName::Vleak => self.vleak,
            ParamName::Cm => self.cm,
            ParamName::W => self.w,
            ParamName::Sigma => self.sigma,
            ParamName::Mu => self.mu,
            ParamName::SensoryW => self.sensory_w,
            ParamName::SensorySigma => self.sensory_sigma,
            ParamName::SensoryMu => self.sensory_mu,
        }
    }

    /// Override one range, rejecting reversed ranges and negative ranges for
    /// non-negative parameters
    pub fn set(mut self, name: ParamName, range: (f64, f64)) -> Result<Self> {
        let (min, max) = range;
        if name.is_non_negative() && min < 0.0 {
            return Err(NcpError::NegativeRange {
                name: name.as_str(),
                min,
            });
        }
        if min > max || min.is_nan() || max.is_nan() {
            return Err(NcpError::InvalidRange {
                name: name.as_str(),
                min,
                max,
            });
        }
        let slot = match name {
            ParamName::Gleak => &mut self.gleak,
            ParamName::Vleak => &mut self.vleak,
            ParamName::Cm => &mut self.cm,
            ParamName::W => &mut self.w,
            ParamName::Sigma => &mut self.sigma,
            ParamName::Mu => &mut self.mu,
            ParamName::SensoryW => &mut self.sensory_w,
            ParamName::SensorySigma => &mut self.sensory_sigma,
            ParamName::SensoryMu => &mut self.sensory_mu,
        };
        *slot = range;
        Ok(self)
    }

    /// Override a range by parameter name
    pub fn with_range(self, name: &str, range: (f64, f64)) -> Result<Self> {
        self.set(name.parse()?, range)
    }

    /// Defaults with the given `name -> (min, max)` overrides applied in order
    pub fn from_overrides<I, K>(overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, (f64, f64))>,
        K: AsRef<str>,
    {
        overrides
            .into_iter()
            .try_fold(Self::default(), |ranges, (name, range)| {
                ranges.with_range(name.as_ref(), range)
            })
    }
}

impl TryFrom<BTreeMap<String, (f64, f64)>> for InitRanges {
    type Error = NcpError;

    fn try_from(overrides: BTreeMap<String, (f64, f64)>) -> Result<Self> {
        Self::from_overrides(overrides)
    }
}

impl From<InitRanges> for BTreeMap<String, (f64, f64)> {
    fn from(ranges: InitRanges) -> Self {
        ParamName::ALL
            .into_iter()
            .map(|name| (name.as_str().to_string(), ranges.get(name)))
            .collect()
    }
}
