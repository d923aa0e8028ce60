//! Memoization of Hamiltonian spectra.
//!
//! A [`Spectrum`] depends only on `(L, field, g)`, so a protocol search that
//! samples field values from a finite set needs only as many diagonalizations
//! as there are distinct values.

use std::sync::{ Arc, RwLock };
use itertools::Itertools;
use rayon::iter::{ IntoParallelIterator, ParallelIterator };
use rustc_hash::FxHashMap as HashMap;
use tracing::{ debug, trace };
use crate::{
    dynamics::{ HBuilderIsing, IsingParams, Spectrum },
    error::Result,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct SpectrumKey {
    nqubits: usize,
    field: u64,
    g: u64,
}

// -0.0 and 0.0 give the same Hamiltonian
fn canonical_bits(x: f64) -> u64 {
    if x == 0.0 { 0.0_f64.to_bits() } else { x.to_bits() }
}

impl From<&IsingParams> for SpectrumKey {
    fn from(params: &IsingParams) -> Self {
        Self {
            nqubits: params.nqubits,
            field: canonical_bits(params.field),
            g: canonical_bits(params.g),
        }
    }
}

/// Thread-safe store of [`Spectrum`]s keyed by model parameters.
///
/// Lookups take a shared lock; spectra are computed outside of any lock and
/// inserted afterward, so two threads racing on the same key both compute the
/// same result and the second insert simply replaces an equal value.
#[derive(Debug, Default)]
pub struct SpectrumCache {
    spectra: RwLock<HashMap<SpectrumKey, Arc<Spectrum>>>,
}

impl SpectrumCache {
    /// Create a new, empty cache.
    pub fn new() -> Self { Self::default() }

    fn lookup(&self, key: &SpectrumKey) -> Option<Arc<Spectrum>> {
        self.spectra.read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn insert(&self, key: SpectrumKey, spectrum: Arc<Spectrum>) {
        self.spectra.write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, spectrum);
    }

    /// Return the spectrum for `params`, diagonalizing on a miss.
    pub fn get_or_compute(&self, params: &IsingParams) -> Result<Arc<Spectrum>> {
        let key = SpectrumKey::from(params);
        if let Some(spectrum) = self.lookup(&key) {
            return Ok(spectrum);
        }
        trace!(
            nqubits = params.nqubits,
            field = params.field,
            g = params.g,
            "spectrum cache miss",
        );
        let spectrum = Arc::new(HBuilderIsing::new(*params)?.diagonalize()?);
        self.insert(key, Arc::clone(&spectrum));
        Ok(spectrum)
    }

    /// Diagonalize the Hamiltonians for all distinct values in `fields` in
    /// parallel and store the results.
    ///
    /// Fails with the first error encountered, in which case spectra computed
    /// before the failure may or may not have been stored.
    pub fn precompute(&self, nqubits: usize, fields: &[f64], g: f64)
        -> Result<()>
    {
        let todo: Vec<IsingParams>
            = fields.iter()
            .map(|&field| IsingParams::new(nqubits, field, g))
            .unique_by(|params| SpectrumKey::from(params))
            .filter(|params| self.lookup(&SpectrumKey::from(params)).is_none())
            .collect();
        debug!(nqubits, g, count = todo.len(), "precomputing spectra");
        let computed: Vec<(SpectrumKey, Arc<Spectrum>)>
            = todo.into_par_iter()
            .map(|params| {
                HBuilderIsing::new(params)?
                    .diagonalize()
                    .map(|spectrum| (SpectrumKey::from(&params), Arc::new(spectrum)))
            })
            .collect::<Result<_>>()?;
        let mut spectra = self.spectra.write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        spectra.extend(computed);
        Ok(())
    }

    /// Return the number of stored spectra.
    pub fn len(&self) -> usize {
        self.spectra.read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Return `true` if no spectra are stored.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Remove all stored spectra.
    pub fn clear(&self) {
        self.spectra.write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}
