//! Stochastic descent over piecewise-constant field protocols.
//!
//! Starting from a protocol sampled uniformly from the allowed field values,
//! each iteration negates the field at a randomly chosen set of steps, evolves
//! the initial state under the resulting candidate, and keeps the candidate if
//! it brings the final state closer to the target. With Metropolis acceptance
//! enabled, a non-improving candidate is kept if a uniform draw falls below
//! `exp(-β (F_candidate - F_accepted))`.
//!
//! All randomness comes from a single seeded generator owned by the optimizer
//! and is consumed in a fixed order: the initial protocol (one draw per step),
//! then for each iteration the mutated step indices followed by, only when a
//! Metropolis decision is needed, one uniform draw.

use std::{ path::Path, sync::Arc };
use ndarray as nd;
use num_complex::Complex64 as C64;
use rand::{ rngs::StdRng, Rng, SeedableRng };
use tracing::{ debug, info, trace, warn };
use crate::{
    dynamics::SpectrumCache,
    error::Result,
    hilbert::{ check_state, fidelity },
    schrodinger::evolve_final,
    write_npz,
};

pub mod config;
pub use config::{ DescentConfig, MAX_STEPS };

/// Tolerance on `|1 - <psi|psi>|` for the initial and target states.
pub const STATE_NORM_TOL: f64 = 1e-10;

/// Diagnostic recorded when the evolved state's norm drifted past the
/// configured tolerance, ending the run early.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NormViolation {
    /// Iteration (0-based) at which the violation was detected.
    pub iteration: usize,
    /// Observed `|1 - <psi|psi>|`.
    pub deviation: f64,
}

/// Output of a protocol search.
#[derive(Clone, Debug, PartialEq)]
pub struct DescentResult {
    /// Final accepted protocol.
    pub protocol: Vec<f64>,
    /// Accepted fidelity before the first iteration and after each completed
    /// iteration.
    pub fidelities: Vec<f64>,
    /// Set if the run was cut short by a loss of norm.
    pub norm_violation: Option<NormViolation>,
    /// Number of candidates accepted for improving the fidelity.
    pub accepted_greedy: usize,
    /// Number of non-improving candidates accepted by the Metropolis rule.
    pub accepted_metropolis: usize,
}

impl DescentResult {
    /// Number of iterations completed.
    pub fn iterations_run(&self) -> usize { self.fidelities.len().saturating_sub(1) }

    /// Fidelity of the final accepted protocol.
    pub fn final_fidelity(&self) -> f64 {
        self.fidelities.last().copied().unwrap_or(0.0)
    }

    /// Return `true` if the run was not stopped early.
    pub fn completed(&self) -> bool { self.norm_violation.is_none() }

    /// Write the protocol and fidelity trace to a `.npz` archive as arrays
    /// `protocol` and `fidelities`.
    pub fn save<P>(&self, path: P) -> Result<()>
    where P: AsRef<Path>
    {
        let protocol = nd::Array1::from(self.protocol.clone());
        let fidelities = nd::Array1::from(self.fidelities.clone());
        write_npz!(
            path,
            arrays: {
                "protocol" => &protocol,
                "fidelities" => &fidelities,
            }
        )
    }
}

/// Stochastic-descent optimizer for the field protocol.
#[derive(Debug)]
pub struct StochasticDescent {
    config: DescentConfig,
    qstart: nd::Array1<C64>,
    qtarget: nd::Array1<C64>,
    cache: Arc<SpectrumCache>,
    rng: StdRng,
}

impl StochasticDescent {
    /// Create a new optimizer, validating all parameters and both states.
    ///
    /// States must have dimension 2<sup>`L`</sup> and unit norm to within
    /// [`STATE_NORM_TOL`].
    pub fn new(
        config: DescentConfig,
        qstart: nd::Array1<C64>,
        qtarget: nd::Array1<C64>,
    ) -> Result<Self>
    {
        config.validate()?;
        let dim = config.dim();
        check_state("initial state", &qstart, dim, STATE_NORM_TOL)?;
        check_state("target state", &qtarget, dim, STATE_NORM_TOL)?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self { config, qstart, qtarget, cache: Arc::default(), rng })
    }

    /// Use a shared spectrum cache, e.g. to reuse diagonalizations across runs
    /// with the same model.
    pub fn with_cache(mut self, cache: Arc<SpectrumCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Return a reference to the run parameters.
    pub fn config(&self) -> &DescentConfig { &self.config }

    /// Return a reference to the spectrum cache.
    pub fn cache(&self) -> &Arc<SpectrumCache> { &self.cache }

    /// Mutation rate, as a percentage of protocol steps, at iteration `j`.
    ///
    /// Constant at `flips` unless exponential decay is enabled, in which case
    /// it falls from `flips` at `j = 0` toward 1 at `j = iterations`.
    pub fn flip_rate(&self, j: usize) -> f64 {
        let DescentConfig { flips, iterations, exp_decay_flip, .. } = self.config;
        if exp_decay_flip {
            let tau = iterations as f64 / flips.ln();
            flips * (-(j as f64) / tau).exp()
        } else {
            flips
        }
    }

    /// Number of step indices drawn for mutation at iteration `j`.
    pub fn flip_count(&self, j: usize) -> usize {
        (self.config.nsteps() as f64 / 100.0 * self.flip_rate(j)).floor() as usize
    }

    fn evaluate(&self, protocol: &[f64]) -> Result<(nd::Array1<C64>, f64)> {
        let psi = evolve_final(
            &self.qstart, protocol, self.config.dt, self.config.g, &self.cache)?;
        let f = fidelity(&self.qtarget, &psi);
        Ok((psi, f))
    }

    /// Run the search.
    ///
    /// Only configuration and numerical failures are errors; a loss of norm
    /// detected with `check_norm` ends the run early with
    /// [`DescentResult::norm_violation`] set.
    ///
    /// The generator is re-seeded from [`DescentConfig::seed`] on every call,
    /// so repeated runs give identical results.
    pub fn run(&mut self) -> Result<DescentResult> {
        self.rng = StdRng::seed_from_u64(self.config.seed);
        let nsteps = self.config.nsteps();
        let nfields = self.config.field_list.len();
        let fields = &self.config.field_list;
        let rng = &mut self.rng;
        let mut protocol: Vec<f64>
            = (0..nsteps)
            .map(|_| fields[rng.gen_range(0..nfields)])
            .collect();

        let signed_fields: Vec<f64>
            = fields.iter().flat_map(|&h| [h, -h]).collect();
        self.cache.precompute(self.config.nqubits, &signed_fields, self.config.g)?;

        let (_, mut fid) = self.evaluate(&protocol)?;
        let mut fidelities: Vec<f64> = Vec::with_capacity(self.config.iterations + 1);
        fidelities.push(fid);
        let mut norm_violation: Option<NormViolation> = None;
        let mut accepted_greedy: usize = 0;
        let mut accepted_metropolis: usize = 0;
        let mut candidate: Vec<f64> = protocol.clone();
        debug!(nsteps, fidelity = fid, "initial protocol");

        for j in 0..self.config.iterations {
            let nflips = self.flip_count(j);
            candidate.copy_from_slice(&protocol);
            for _ in 0..nflips {
                let k = self.rng.gen_range(0..nsteps);
                candidate[k] = -protocol[k];
            }

            let (psi, candidate_fid) = self.evaluate(&candidate)?;
            if self.config.check_norm {
                let deviation = (1.0 - fidelity(&psi, &psi)).abs();
                if deviation > self.config.norm_tol {
                    warn!(
                        iteration = j,
                        deviation,
                        tol = self.config.norm_tol,
                        "norm is not conserved; stopping early",
                    );
                    norm_violation = Some(NormViolation { iteration: j, deviation });
                    break;
                }
            }

            let accept
                = if candidate_fid > fid {
                    accepted_greedy += 1;
                    true
                } else if self.config.metropolis {
                    let p = (-self.config.beta * (candidate_fid - fid)).exp();
                    let u: f64 = self.rng.gen();
                    let acc = u < p;
                    if acc { accepted_metropolis += 1; }
                    acc
                } else {
                    false
                };
            if accept {
                std::mem::swap(&mut protocol, &mut candidate);
                fid = candidate_fid;
            }
            fidelities.push(fid);

            if self.config.verbose {
                debug!(iteration = j, nflips, candidate = candidate_fid, accepted = fid, accept);
            } else {
                trace!(iteration = j, nflips, candidate = candidate_fid, accepted = fid, accept);
            }
        }

        let result = DescentResult {
            protocol,
            fidelities,
            norm_violation,
            accepted_greedy,
            accepted_metropolis,
        };
        if self.config.verbose {
            info!(
                iterations = result.iterations_run(),
                fidelity = result.final_fidelity(),
                accepted_greedy,
                accepted_metropolis,
                completed = result.completed(),
                "stochastic descent finished",
            );
        }
        Ok(result)
    }
}

/// Run a stochastic-descent search from `qstart` toward `qtarget`.
///
/// Shorthand for [`StochasticDescent::new`] followed by
/// [`StochasticDescent::run`].
pub fn stochastic_descent(
    qstart: &nd::Array1<C64>,
    qtarget: &nd::Array1<C64>,
    config: &DescentConfig,
) -> Result<DescentResult>
{
    StochasticDescent::new(config.clone(), qstart.clone(), qtarget.clone())?.run()
}

impl From<DescentResult> for (Vec<f64>, Vec<f64>) {
    fn from(result: DescentResult) -> Self { (result.protocol, result.fidelities) }
}
