// extensions/interpolator.rs
//
// Pure time-remapping curves for actions.
// No dependencies on Node or SceneGraph.
//
// Usage:
//   let interp = Interpolator::ease_out(3.0).with_pingpong(true);
//   let eased = interp.evaluate(0.25);
//   let back = Interpolator::parse(&interp.describe())?;

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::error::{EngineError, EngineResult};

/// Exponent used by the power curves when a descriptor omits one.
pub const DEFAULT_EXPONENT: f64 = 2.0;
/// Period used by the elastic curves when a descriptor omits one.
pub const DEFAULT_ELASTIC_PERIOD: f64 = 0.3;
/// Overshoot of the back curves.
pub const BACK_OVERSHOOT: f64 = 1.70158;

/// Curve family with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    /// Identity.
    Linear,
    /// `t^exponent`.
    EaseIn { exponent: f64 },
    /// `1 - (1 - t)^exponent`.
    EaseOut { exponent: f64 },
    /// Power curve in on the first half, out on the second.
    EaseInOut { exponent: f64 },
    ExponentialIn,
    ExponentialOut,
    ExponentialInOut,
    SineIn,
    SineOut,
    SineInOut,
    /// Spring wind-up; overshoots below zero.
    ElasticIn { period: f64 },
    /// Spring settle; overshoots above one.
    ElasticOut { period: f64 },
    ElasticInOut { period: f64 },
    BounceIn,
    BounceOut,
    BounceInOut,
    /// Pulls back before moving forward.
    BackIn,
    /// Overshoots the end then settles.
    BackOut,
    BackInOut,
}

/// Parameterless name of an [`Easing`] family, as written in descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterpolatorKind {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseExponentialIn,
    EaseExponentialOut,
    EaseExponentialInOut,
    EaseSineIn,
    EaseSineOut,
    EaseSineInOut,
    EaseElasticIn,
    EaseElasticOut,
    EaseElasticInOut,
    EaseBounceIn,
    EaseBounceOut,
    EaseBounceInOut,
    EaseBackIn,
    EaseBackOut,
    EaseBackInOut,
}

impl InterpolatorKind {
    pub const ALL: [InterpolatorKind; 19] = [
        InterpolatorKind::Linear,
        InterpolatorKind::EaseIn,
        InterpolatorKind::EaseOut,
        InterpolatorKind::EaseInOut,
        InterpolatorKind::EaseExponentialIn,
        InterpolatorKind::EaseExponentialOut,
        InterpolatorKind::EaseExponentialInOut,
        InterpolatorKind::EaseSineIn,
        InterpolatorKind::EaseSineOut,
        InterpolatorKind::EaseSineInOut,
        InterpolatorKind::EaseElasticIn,
        InterpolatorKind::EaseElasticOut,
        InterpolatorKind::EaseElasticInOut,
        InterpolatorKind::EaseBounceIn,
        InterpolatorKind::EaseBounceOut,
        InterpolatorKind::EaseBounceInOut,
        InterpolatorKind::EaseBackIn,
        InterpolatorKind::EaseBackOut,
        InterpolatorKind::EaseBackInOut,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InterpolatorKind::Linear => "Linear",
            InterpolatorKind::EaseIn => "EaseIn",
            InterpolatorKind::EaseOut => "EaseOut",
            InterpolatorKind::EaseInOut => "EaseInOut",
            InterpolatorKind::EaseExponentialIn => "EaseExponentialIn",
            InterpolatorKind::EaseExponentialOut => "EaseExponentialOut",
            InterpolatorKind::EaseExponentialInOut => "EaseExponentialInOut",
            InterpolatorKind::EaseSineIn => "EaseSineIn",
            InterpolatorKind::EaseSineOut => "EaseSineOut",
            InterpolatorKind::EaseSineInOut => "EaseSineInOut",
            InterpolatorKind::EaseElasticIn => "EaseElasticIn",
            InterpolatorKind::EaseElasticOut => "EaseElasticOut",
            InterpolatorKind::EaseElasticInOut => "EaseElasticInOut",
            InterpolatorKind::EaseBounceIn => "EaseBounceIn",
            InterpolatorKind::EaseBounceOut => "EaseBounceOut",
            InterpolatorKind::EaseBounceInOut => "EaseBounceInOut",
            InterpolatorKind::EaseBackIn => "EaseBackIn",
            InterpolatorKind::EaseBackOut => "EaseBackOut",
            InterpolatorKind::EaseBackInOut => "EaseBackInOut",
        }
    }

    /// Build the family, taking `exponent`/`period` only where the family has one.
    pub fn with_params(self, exponent: f64, period: f64) -> Easing {
        match self {
            InterpolatorKind::Linear => Easing::Linear,
            InterpolatorKind::EaseIn => Easing::EaseIn { exponent },
            InterpolatorKind::EaseOut => Easing::EaseOut { exponent },
            InterpolatorKind::EaseInOut => Easing::EaseInOut { exponent },
            InterpolatorKind::EaseExponentialIn => Easing::ExponentialIn,
            InterpolatorKind::EaseExponentialOut => Easing::ExponentialOut,
            InterpolatorKind::EaseExponentialInOut => Easing::ExponentialInOut,
            InterpolatorKind::EaseSineIn => Easing::SineIn,
            InterpolatorKind::EaseSineOut => Easing::SineOut,
            InterpolatorKind::EaseSineInOut => Easing::SineInOut,
            InterpolatorKind::EaseElasticIn => Easing::ElasticIn { period },
            InterpolatorKind::EaseElasticOut => Easing::ElasticOut { period },
            InterpolatorKind::EaseElasticInOut => Easing::ElasticInOut { period },
            InterpolatorKind::EaseBounceIn => Easing::BounceIn,
            InterpolatorKind::EaseBounceOut => Easing::BounceOut,
            InterpolatorKind::EaseBounceInOut => Easing::BounceInOut,
            InterpolatorKind::EaseBackIn => Easing::BackIn,
            InterpolatorKind::EaseBackOut => Easing::BackOut,
            InterpolatorKind::EaseBackInOut => Easing::BackInOut,
        }
    }
}

impl fmt::Display for InterpolatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InterpolatorKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InterpolatorKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| EngineError::UnknownInterpolatorType(s.to_string()))
    }
}

impl Easing {
    pub fn kind(self) -> InterpolatorKind {
        match self {
            Easing::Linear => InterpolatorKind::Linear,
            Easing::EaseIn { .. } => InterpolatorKind::EaseIn,
            Easing::EaseOut { .. } => InterpolatorKind::EaseOut,
            Easing::EaseInOut { .. } => InterpolatorKind::EaseInOut,
            Easing::ExponentialIn => InterpolatorKind::EaseExponentialIn,
            Easing::ExponentialOut => InterpolatorKind::EaseExponentialOut,
            Easing::ExponentialInOut => InterpolatorKind::EaseExponentialInOut,
            Easing::SineIn => InterpolatorKind::EaseSineIn,
            Easing::SineOut => InterpolatorKind::EaseSineOut,
            Easing::SineInOut => InterpolatorKind::EaseSineInOut,
            Easing::ElasticIn { .. } => InterpolatorKind::EaseElasticIn,
            Easing::ElasticOut { .. } => InterpolatorKind::EaseElasticOut,
            Easing::ElasticInOut { .. } => InterpolatorKind::EaseElasticInOut,
            Easing::BounceIn => InterpolatorKind::EaseBounceIn,
            Easing::BounceOut => InterpolatorKind::EaseBounceOut,
            Easing::BounceInOut => InterpolatorKind::EaseBounceInOut,
            Easing::BackIn => InterpolatorKind::EaseBackIn,
            Easing::BackOut => InterpolatorKind::EaseBackOut,
            Easing::BackInOut => InterpolatorKind::EaseBackInOut,
        }
    }

    pub fn exponent(self) -> Option<f64> {
        match self {
            Easing::EaseIn { exponent }
            | Easing::EaseOut { exponent }
            | Easing::EaseInOut { exponent } => Some(exponent),
            _ => None,
        }
    }

    pub fn period(self) -> Option<f64> {
        match self {
            Easing::ElasticIn { period }
            | Easing::ElasticOut { period }
            | Easing::ElasticInOut { period } => Some(period),
            _ => None,
        }
    }

    /// Raw curve on an already pre-processed time value. Output is unbounded
    /// for the elastic and back families.
    #[inline]
    pub fn curve(self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,

            // Power
            Easing::EaseIn { exponent } => t.powf(exponent),
            Easing::EaseOut { exponent } => 1.0 - (1.0 - t).powf(exponent),
            Easing::EaseInOut { exponent } => {
                let t = t * 2.0;
                if t < 1.0 {
                    0.5 * t.powf(exponent)
                } else {
                    1.0 - 0.5 * (2.0 - t).powf(exponent)
                }
            }

            // Exponential
            Easing::ExponentialIn => {
                if t == 0.0 { 0.0 } else { 2.0_f64.powf(10.0 * (t - 1.0)) }
            }
            Easing::ExponentialOut => {
                if t == 1.0 { 1.0 } else { 1.0 - 2.0_f64.powf(-10.0 * t) }
            }
            Easing::ExponentialInOut => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let t = t * 2.0;
                if t < 1.0 {
                    0.5 * 2.0_f64.powf(10.0 * (t - 1.0))
                } else {
                    0.5 * (2.0 - 2.0_f64.powf(-10.0 * (t - 1.0)))
                }
            }

            // Sine
            Easing::SineIn => {
                if t == 0.0 || t == 1.0 { t } else { 1.0 - (t * PI / 2.0).cos() }
            }
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => -0.5 * ((PI * t).cos() - 1.0),

            // Elastic
            Easing::ElasticIn { period } => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let s = period / 4.0;
                let t = t - 1.0;
                -(2.0_f64.powf(10.0 * t)) * ((t - s) * PI * 2.0 / period).sin()
            }
            Easing::ElasticOut { period } => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let s = period / 4.0;
                2.0_f64.powf(-10.0 * t) * ((t - s) * PI * 2.0 / period).sin() + 1.0
            }
            Easing::ElasticInOut { period } => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let s = period / 4.0;
                let t = t * 2.0 - 1.0;
                let wave = ((t - s) * PI * 2.0 / period).sin();
                if t < 0.0 {
                    -0.5 * 2.0_f64.powf(10.0 * t) * wave
                } else {
                    2.0_f64.powf(-10.0 * t) * wave * 0.5 + 1.0
                }
            }

            // Bounce
            Easing::BounceIn => 1.0 - bounce_out(1.0 - t),
            Easing::BounceOut => bounce_out(t),
            Easing::BounceInOut => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - t * 2.0)) * 0.5
                } else {
                    bounce_out(t * 2.0 - 1.0) * 0.5 + 0.5
                }
            }

            // Back (overshoot)
            Easing::BackIn => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                t * t * ((BACK_OVERSHOOT + 1.0) * t - BACK_OVERSHOOT)
            }
            Easing::BackOut => {
                let t = t - 1.0;
                t * t * ((BACK_OVERSHOOT + 1.0) * t + BACK_OVERSHOOT) + 1.0
            }
            Easing::BackInOut => {
                const C2: f64 = BACK_OVERSHOOT * 1.525;
                let t = t * 2.0;
                if t < 1.0 {
                    (t * t * ((C2 + 1.0) * t - C2)) / 2.0
                } else {
                    let t = t - 2.0;
                    (t * t * ((C2 + 1.0) * t + C2)) / 2.0 + 1.0
                }
            }
        }
    }
}

#[inline]
fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// A curve plus the two input modifiers every family shares.
///
/// `pingpong` folds the input first (forward over the first half, backward
/// over the second), then `inverse` flips it to `1 - t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolator {
    easing: Easing,
    inverse: bool,
    pingpong: bool,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::linear()
    }
}

impl From<Easing> for Interpolator {
    fn from(easing: Easing) -> Self {
        Self::new(easing)
    }
}

impl Interpolator {
    pub fn new(easing: Easing) -> Self {
        Self { easing, inverse: false, pingpong: false }
    }

    pub fn linear() -> Self {
        Self::new(Easing::Linear)
    }

    pub fn ease_in(exponent: f64) -> Self {
        Self::new(Easing::EaseIn { exponent })
    }

    pub fn ease_out(exponent: f64) -> Self {
        Self::new(Easing::EaseOut { exponent })
    }

    pub fn ease_in_out(exponent: f64) -> Self {
        Self::new(Easing::EaseInOut { exponent })
    }

    pub fn elastic_in(period: f64) -> Self {
        Self::new(Easing::ElasticIn { period })
    }

    pub fn elastic_out(period: f64) -> Self {
        Self::new(Easing::ElasticOut { period })
    }

    pub fn elastic_in_out(period: f64) -> Self {
        Self::new(Easing::ElasticInOut { period })
    }

    // -- Builder methods --

    pub fn with_inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    pub fn with_pingpong(mut self, pingpong: bool) -> Self {
        self.pingpong = pingpong;
        self
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    pub fn is_pingpong(&self) -> bool {
        self.pingpong
    }

    #[inline]
    fn calc_time(&self, t: f64) -> f64 {
        let mut t = t;
        if self.pingpong {
            t = if t < 0.5 { t * 2.0 } else { 1.0 - (t - 0.5) * 2.0 };
        }
        if self.inverse {
            t = 1.0 - t;
        }
        t
    }

    /// Remap normalized time `t` in [0, 1].
    #[inline]
    pub fn evaluate(&self, t: f64) -> f64 {
        self.easing.curve(self.calc_time(t))
    }

    /// Same curve with `inverse` toggled. Reversing twice is the identity.
    pub fn reverse(&self) -> Self {
        Self { inverse: !self.inverse, ..*self }
    }

    /// Serializable descriptor that [`Interpolator::parse`] turns back into
    /// an equivalent interpolator.
    pub fn describe(&self) -> InterpolatorSpec {
        InterpolatorSpec {
            kind: self.easing.kind().name().to_string(),
            inverse: Some(self.inverse),
            pingpong: Some(self.pingpong),
            exponent: self.easing.exponent(),
            period: self.easing.period(),
        }
    }

    /// Build an interpolator from its descriptor.
    pub fn parse(spec: &InterpolatorSpec) -> EngineResult<Self> {
        let kind: InterpolatorKind = spec.kind.parse()?;

        let exponent = spec.exponent.unwrap_or(DEFAULT_EXPONENT);
        if !exponent.is_finite() {
            return Err(EngineError::invalid_value("exponent", format!("{exponent} is not finite")));
        }
        let period = spec.period.unwrap_or(DEFAULT_ELASTIC_PERIOD);
        if !(period.is_finite() && period > 0.0) {
            return Err(EngineError::invalid_value("period", format!("{period} must be positive")));
        }

        Ok(Self {
            easing: kind.with_params(exponent, period),
            inverse: spec.inverse.unwrap_or(false),
            pingpong: spec.pingpong.unwrap_or(false),
        })
    }
}

/// Wire form of an [`Interpolator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolatorSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pingpong: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exponent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
}

impl InterpolatorSpec {
    pub fn new(kind: InterpolatorKind) -> Self {
        Self {
            kind: kind.name().to_string(),
            inverse: None,
            pingpong: None,
            exponent: None,
            period: None,
        }
    }

    /// Parse a descriptor from a JSON string.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
