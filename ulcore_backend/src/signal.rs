//! Waveforms fed into the analog inputs of simulated boards.
//!
//! ## Main Structures:
//!
//! - `Signal`: the shape seen by one simulated input channel. `Const` holds a fixed value, `Sine`
//!   a sinusoid with optional amplitude, offset and phase, and `Ramp` a sawtooth that runs from
//!   `start` to `stop` once per `period` and then jumps back.
//!
//! ## Features:
//!
//! - Point evaluation with `Signal::eval` (single reads of the simulated library).
//! - In-place evaluation of an array of time stamps with `Signal::eval_inplace` (background scans).
//! - Serde representation tagged by `kind`, so a signal can be written inline in a board config:
//!   `{ kind = "sine", freq = 10.0, amplitude = 2.0 }`.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

fn default_amplitude() -> f64 {
    1.0
}

/// Shape of a simulated analog input, evaluated in engineering units against time in seconds.
///
/// ## Fields and defaults
/// 1. `Signal::Const`:
///    - `value`
/// 2. `Signal::Sine`:
///    - `freq`
///    - `amplitude`: Default is `1.0`
///    - `offset`: Default is `0.0`
///    - `phase`: Default is `0.0`
/// 3. `Signal::Ramp`:
///    - `start`, `stop`, `period`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Signal {
    Const {
        value: f64,
    },
    Sine {
        freq: f64,
        #[serde(default = "default_amplitude")]
        amplitude: f64,
        #[serde(default)]
        offset: f64,
        #[serde(default)]
        phase: f64,
    },
    Ramp {
        start: f64,
        stop: f64,
        period: f64,
    },
}

impl Default for Signal {
    fn default() -> Self {
        Signal::Const { value: 0.0 }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Signal::Const { value } => write!(f, "CONST({})", value),
            Signal::Sine { freq, amplitude, offset, phase } => write!(
                f,
                "SINE(freq={}, amplitude={}, offset={}, phase={})",
                freq, amplitude, offset, phase
            ),
            Signal::Ramp { start, stop, period } => {
                write!(f, "RAMP(start={}, stop={}, period={})", start, stop, period)
            }
        }
    }
}

impl Signal {
    pub fn new_const(value: f64) -> Signal {
        Signal::Const { value }
    }

    /// Sine with optional amplitude, phase and DC offset (defaults `1.0`, `0.0`, `0.0`).
    ///
    /// ```
    /// # use ulcore_backend::signal::*;
    /// let sine = Signal::new_sine(10.0, None, None, Some(1.0));
    /// assert_eq!(sine.eval(0.0), 1.0);
    /// ```
    pub fn new_sine(
        freq: f64,
        amplitude: Option<f64>,
        phase: Option<f64>,
        dc_offset: Option<f64>,
    ) -> Signal {
        Signal::Sine {
            freq,
            amplitude: amplitude.unwrap_or(1.0),
            offset: dc_offset.unwrap_or(0.0),
            phase: phase.unwrap_or(0.0),
        }
    }

    pub fn new_ramp(start: f64, stop: f64, period: f64) -> Signal {
        Signal::Ramp { start, stop, period }
    }

    /// Checks the parameters that would make evaluation meaningless.
    pub fn validate(&self) -> Result<(), String> {
        let finite = |name: &str, v: f64| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(format!("{} of {} is not finite", name, self))
            }
        };
        match *self {
            Signal::Const { value } => finite("value", value),
            Signal::Sine { freq, amplitude, offset, phase } => {
                finite("freq", freq)?;
                finite("amplitude", amplitude)?;
                finite("offset", offset)?;
                finite("phase", phase)?;
                if freq < 0.0 {
                    return Err(format!("negative frequency in {}", self));
                }
                Ok(())
            }
            Signal::Ramp { start, stop, period } => {
                finite("start", start)?;
                finite("stop", stop)?;
                if !period.is_finite() || period <= 0.0 {
                    return Err(format!("ramp period must be positive in {}", self));
                }
                Ok(())
            }
        }
    }

    /// Value of the signal at time `t` (seconds).
    pub fn eval(&self, t: f64) -> f64 {
        match *self {
            Signal::Const { value } => value,
            Signal::Sine { freq, amplitude, offset, phase } => {
                (2.0 * PI * freq * t + phase).sin() * amplitude + offset
            }
            Signal::Ramp { start, stop, period } => {
                let frac = (t / period).rem_euclid(1.0);
                start + (stop - start) * frac
            }
        }
    }

    /// Replaces every time stamp in `t_arr` with the signal value at that time.
    ///
    /// ```
    /// use ndarray::Array1;
    /// use ulcore_backend::signal::*;
    ///
    /// let mut t_arr = Array1::linspace(0.0, 1.0, 5);
    /// Signal::new_ramp(0.0, 1.0, 2.0).eval_inplace(&mut t_arr.view_mut());
    /// assert_eq!(t_arr.to_vec(), vec![0.0, 0.125, 0.25, 0.375, 0.5]);
    /// ```
    pub fn eval_inplace(&self, t_arr: &mut ndarray::ArrayViewMut1<f64>) {
        match self {
            Signal::Const { value } => t_arr.fill(*value),
            _ => t_arr.map_inplace(|t| *t = self.eval(*t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_const_fills() {
        let mut t = Array1::linspace(0.0, 1.0, 10);
        Signal::new_const(1.5).eval_inplace(&mut t.view_mut());
        assert!(t.iter().all(|&v| v == 1.5));
    }

    #[test]
    fn test_sine_quarter_period() {
        let s = Signal::new_sine(1.0, Some(2.0), None, Some(0.5));
        assert!((s.eval(0.25) - 2.5).abs() < 1e-12);
        assert!((s.eval(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ramp_wraps() {
        let s = Signal::new_ramp(-1.0, 1.0, 1.0);
        assert_eq!(s.eval(0.0), -1.0);
        assert_eq!(s.eval(0.5), 0.0);
        assert_eq!(s.eval(1.0), -1.0);
        assert_eq!(s.eval(1.25), -0.5);
    }

    #[test]
    fn test_validate() {
        assert!(Signal::new_ramp(0.0, 1.0, 0.0).validate().is_err());
        assert!(Signal::new_sine(-1.0, None, None, None).validate().is_err());
        assert!(Signal::new_const(f64::NAN).validate().is_err());
        assert!(Signal::new_sine(5.0, None, None, None).validate().is_ok());
    }

    #[test]
    fn test_serde_defaults() {
        #[derive(Deserialize)]
        struct Wrapper {
            s: Signal,
        }
        let w: Wrapper = toml::from_str("s = { kind = \"sine\", freq = 10.0 }").unwrap();
        assert_eq!(w.s, Signal::new_sine(10.0, None, None, None));
        let w: Wrapper = toml::from_str("s = { kind = \"const\", value = 2.0 }").unwrap();
        assert_eq!(w.s, Signal::new_const(2.0));
    }
}
