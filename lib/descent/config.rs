//! Run parameters for the protocol search.

use std::{ fs, path::Path };
use serde::{ Deserialize, Serialize };
use crate::{
    dynamics::MAX_QUBITS,
    error::{ Error, Result },
};

/// Largest number of protocol steps accepted by [`DescentConfig::validate`].
pub const MAX_STEPS: usize = 1 << 20;

/// Parameters for a [`StochasticDescent`][super::StochasticDescent] run.
///
/// Can be deserialized from TOML; every field without a default below must be
/// present.
/// ```toml
/// nqubits = 1
/// total_time = 1.0
/// dt = 0.05
/// iterations = 500
/// flips = 10.0
/// exp_decay_flip = true
/// field_list = [-4.0, 4.0]
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescentConfig {
    /// Number of qubits `L`.
    pub nqubits: usize,
    /// Total evolution time `T`.
    pub total_time: f64,
    /// Duration of a single protocol step.
    pub dt: f64,
    /// Number of mutation/acceptance iterations.
    pub iterations: usize,
    /// Base mutation rate, as a percentage of protocol steps.
    pub flips: f64,
    /// Decay the mutation rate exponentially from `flips` over the run.
    #[serde(default)]
    pub exp_decay_flip: bool,
    /// Allowed transverse field values.
    pub field_list: Vec<f64>,
    /// Longitudinal field strength.
    #[serde(default = "default_g")]
    pub g: f64,
    /// Metropolis inverse temperature.
    #[serde(default)]
    pub beta: f64,
    /// Accept non-improving candidates with the Metropolis probability.
    #[serde(default)]
    pub metropolis: bool,
    /// Log every iteration at debug rather than trace level.
    #[serde(default)]
    pub verbose: bool,
    /// Stop early if the evolved state drifts from unit norm.
    #[serde(default)]
    pub check_norm: bool,
    /// Largest tolerated `|1 - <psi|psi>|` when `check_norm` is set.
    #[serde(default = "default_norm_tol")]
    pub norm_tol: f64,
    /// Seed for the random number generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_g() -> f64 { 1.0 }

fn default_norm_tol() -> f64 { 1e-13 }

fn default_seed() -> u64 { 213 }

impl DescentConfig {
    /// Create a new config with the required parameters, using defaults for
    /// everything else.
    pub fn new(
        nqubits: usize,
        total_time: f64,
        dt: f64,
        iterations: usize,
        flips: f64,
        field_list: Vec<f64>,
    ) -> Self
    {
        Self {
            nqubits,
            total_time,
            dt,
            iterations,
            flips,
            exp_decay_flip: false,
            field_list,
            g: default_g(),
            beta: 0.0,
            metropolis: false,
            verbose: false,
            check_norm: false,
            norm_tol: default_norm_tol(),
            seed: default_seed(),
        }
    }

    /// Parse a config from a TOML string and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config from a TOML file and validate it.
    pub fn load<P>(path: P) -> Result<Self>
    where P: AsRef<Path>
    {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Number of protocol steps, `floor(total_time / dt)`.
    pub fn nsteps(&self) -> usize { (self.total_time / self.dt).floor() as usize }

    /// Dimension 2<sup>`L`</sup> of the state space.
    pub fn dim(&self) -> usize { 1 << self.nqubits }

    /// Check that all parameters are in range.
    pub fn validate(&self) -> Result<()> {
        if self.nqubits == 0 || self.nqubits > MAX_QUBITS {
            return Err(Error::config(format!(
                "number of qubits must be in [1, {}], got {}",
                MAX_QUBITS, self.nqubits,
            )));
        }
        if !self.total_time.is_finite() || self.total_time <= 0.0 {
            return Err(Error::config(format!(
                "total time must be finite and positive, got {}", self.total_time
            )));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(Error::config(format!(
                "timestep must be finite and positive, got {}", self.dt
            )));
        }
        let ratio = self.total_time / self.dt;
        if !ratio.is_finite() || ratio.floor() > MAX_STEPS as f64 {
            return Err(Error::config(format!(
                "number of steps must be at most {}, got total time {} / timestep {}",
                MAX_STEPS, self.total_time, self.dt,
            )));
        }
        if self.nsteps() < 1 {
            return Err(Error::config(format!(
                "total time {} is shorter than one timestep {}",
                self.total_time, self.dt,
            )));
        }
        if self.iterations < 1 {
            return Err(Error::config("iterations must be at least 1"));
        }
        if !self.flips.is_finite() || self.flips <= 0.0 || self.flips > 100.0 {
            return Err(Error::config(format!(
                "flip percentage must be in (0, 100], got {}", self.flips
            )));
        }
        if self.exp_decay_flip && self.flips <= 1.0 {
            return Err(Error::config(format!(
                "flip percentage must exceed 1 for exponential decay, got {}",
                self.flips,
            )));
        }
        if self.field_list.is_empty() {
            return Err(Error::config("field list must not be empty"));
        }
        if let Some(h) = self.field_list.iter().find(|h| !h.is_finite()) {
            return Err(Error::config(format!("field values must be finite, got {}", h)));
        }
        if !self.g.is_finite() {
            return Err(Error::config(format!(
                "longitudinal field must be finite, got {}", self.g
            )));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(Error::config(format!(
                "beta must be finite and non-negative, got {}", self.beta
            )));
        }
        if !self.norm_tol.is_finite() || self.norm_tol <= 0.0 {
            return Err(Error::config(format!(
                "norm tolerance must be finite and positive, got {}", self.norm_tol
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn base() -> DescentConfig {
        DescentConfig::new(1, 1.0, 0.5, 5, 50.0, vec![-1.0, 1.0])
    }

    #[test]
    fn defaults_from_toml() {
        let config = DescentConfig::from_toml_str(
            r#"
            nqubits = 1
            total_time = 1.0
            dt = 0.5
            iterations = 5
            flips = 50.0
            field_list = [-1.0, 1.0]
            "#
        ).unwrap();
        assert_eq!(config, base());
        assert_eq!(config.nsteps(), 2);
        assert_eq!(config.seed, 213);
        assert_eq!(config.g, 1.0);
        assert_eq!(config.norm_tol, 1e-13);
    }

    #[test]
    fn toml_round_trip() {
        let mut config = base();
        config.metropolis = true;
        config.beta = 30.0;
        config.exp_decay_flip = true;
        config.seed = 7;
        let s = toml::to_string(&config).unwrap();
        assert_eq!(DescentConfig::from_toml_str(&s).unwrap(), config);
    }

    #[test]
    fn unknown_and_missing_fields() {
        assert!(matches!(
            DescentConfig::from_toml_str("nqubits = 1\nbogus = 2"),
            Err(Error::Toml(_)),
        ));
        assert!(DescentConfig::from_toml_str("nqubits = 1").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, toml::to_string(&base()).unwrap()).unwrap();
        assert_eq!(DescentConfig::load(&path).unwrap(), base());
        assert!(matches!(
            DescentConfig::load(dir.path().join("missing.toml")),
            Err(Error::Io(_)),
        ));
    }

    #[test]
    fn invalid_configs_rejected() {
        let cases: &[fn(&mut DescentConfig)] = &[
            |c| c.nqubits = 0,
            |c| c.nqubits = MAX_QUBITS + 1,
            |c| c.dt = 0.0,
            |c| c.dt = -0.1,
            |c| c.total_time = f64::NAN,
            |c| c.total_time = 0.25,
            |c| { c.total_time = 1e6; c.dt = 1e-12; },
            |c| { c.dt = 1.0; c.total_time = (MAX_STEPS + 1) as f64; },
            |c| c.iterations = 0,
            |c| c.flips = 0.0,
            |c| c.flips = 150.0,
            |c| { c.exp_decay_flip = true; c.flips = 1.0; },
            |c| c.field_list.clear(),
            |c| c.field_list.push(f64::INFINITY),
            |c| c.g = f64::NAN,
            |c| c.beta = -1.0,
            |c| c.norm_tol = 0.0,
        ];
        assert!(base().validate().is_ok());
        let mut longest = base();
        longest.dt = 1.0;
        longest.total_time = MAX_STEPS as f64;
        assert!(longest.validate().is_ok());
        for modify in cases {
            let mut config = base();
            modify(&mut config);
            assert!(matches!(config.validate(), Err(Error::Config(_))), "{:?}", config);
        }
    }
}
