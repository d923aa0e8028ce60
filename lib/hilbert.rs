//! State vectors over a chain of qubits and the overlap measures between them.
//!
//! A state of `L` qubits is a 1D complex-valued array of length 2<sup>`L`</sup>
//! in the computational basis, with qubit 0 as the most significant bit of the
//! basis index. This matches the ordering of the Kronecker products used to
//! build Hamiltonians in [`dynamics`][crate::dynamics].

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::error::{ Error, Result };

/// Compute the fidelity `|<a|b>|^2` between two pure states.
///
/// Symmetric in its arguments, and equal to 1 for `fidelity(x, x)` when `x` is
/// normalized.
///
/// *Panics* if the arrays have unequal lengths.
pub fn fidelity(a: &nd::Array1<C64>, b: &nd::Array1<C64>) -> f64 {
    a.mapv(|ak| ak.conj()).dot(b).norm_sqr()
}

/// Compute a "norm" of an object, treating it as a representation of a quantum
/// state.
pub trait StateNorm {
    fn norm(&self) -> f64;
}

/// The norm of an `ndarray::Array1<num_complex::Complex64>` is the quadrature
/// sum of its elements.
impl StateNorm for nd::Array1<C64> {
    fn norm(&self) -> f64 { self.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt() }
}

/// Return `true` if `|1 - <psi|psi>|` is no greater than `tol`.
pub fn is_normalized(psi: &nd::Array1<C64>, tol: f64) -> bool {
    (1.0 - fidelity(psi, psi)).abs() <= tol
}

/// Rescale a state to unit norm.
///
/// Fails if the state has zero (or non-finite) norm.
pub fn normalize(psi: &nd::Array1<C64>) -> Result<nd::Array1<C64>> {
    let N = psi.norm();
    if N == 0.0 || !N.is_finite() {
        return Err(Error::config("cannot normalize a state with zero or non-finite norm"));
    }
    Ok(psi / C64::from(N))
}

/// Return the number of qubits `L` such that `2^L == dim`.
///
/// Fails unless `dim` is a power of two no smaller than 2.
pub fn qubit_count(dim: usize) -> Result<usize> {
    if dim < 2 || !dim.is_power_of_two() {
        return Err(Error::config(format!(
            "state dimension {} is not 2^L for any L >= 1", dim
        )));
    }
    Ok(dim.trailing_zeros() as usize)
}

/// Construct the computational basis state with the given index over
/// `nqubits` qubits.
///
/// Bits of `index` are read with qubit 0 as the most significant, so
/// `basis_state(2, 0b01)` is |0⟩⊗|1⟩.
pub fn basis_state(nqubits: usize, index: usize) -> Result<nd::Array1<C64>> {
    if nqubits == 0 {
        return Err(Error::config("number of qubits must be at least 1"));
    }
    let dim = 1_usize.checked_shl(nqubits as u32)
        .ok_or_else(|| Error::config(format!("{} qubits is too many", nqubits)))?;
    if index >= dim {
        return Err(Error::config(format!(
            "basis index {} out of range for {} qubits", index, nqubits
        )));
    }
    let mut psi: nd::Array1<C64> = nd::Array1::zeros(dim);
    psi[index] = C64::from(1.0);
    Ok(psi)
}

/// Check that a state is usable as an input: finite, with the expected
/// dimension, and normalized to within `tol`.
pub(crate) fn check_state(
    name: &str,
    psi: &nd::Array1<C64>,
    dim: usize,
    tol: f64,
) -> Result<()>
{
    if psi.len() != dim {
        return Err(Error::config(format!(
            "{} has dimension {}, expected {}", name, psi.len(), dim
        )));
    }
    if psi.iter().any(|a| !a.re.is_finite() || !a.im.is_finite()) {
        return Err(Error::config(format!("{} has non-finite amplitudes", name)));
    }
    if !is_normalized(psi, tol) {
        return Err(Error::config(format!(
            "{} is not normalized (<psi|psi> = {})", name, fidelity(psi, psi)
        )));
    }
    Ok(())
}
