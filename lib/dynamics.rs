//! Constructs to build the Hamiltonian of an Ising spin chain under transverse
//! and longitudinal fields, and to hold its spectral decomposition.

use ndarray::{ self as nd, linalg::kron };
use num_complex::Complex64 as C64;

pub mod ising;
pub use ising::{ build, HBuilderIsing, IsingParams, Spectrum, MAX_QUBITS };

pub mod cache;
pub use cache::SpectrumCache;

/// Pauli σ<sub>*x*</sub> matrix.
pub fn sigma_x() -> nd::Array2<C64> {
    nd::array![
        [C64::new(0.0, 0.0), C64::new(1.0, 0.0)],
        [C64::new(1.0, 0.0), C64::new(0.0, 0.0)],
    ]
}

/// Pauli σ<sub>*z*</sub> matrix.
pub fn sigma_z() -> nd::Array2<C64> {
    nd::array![
        [C64::new(1.0, 0.0), C64::new(0.0, 0.0)],
        [C64::new(0.0, 0.0), C64::new(-1.0, 0.0)],
    ]
}

/// Embed an operator acting on a block of adjacent qubits into the space of a
/// chain of `nsites` qubits.
///
/// `a` must be a square matrix of size 2<sup>*k*</sup> for some *k*; the result
/// is identity on qubits `[0, site)`, `a` on qubits `[site, site + k)`, and
/// identity on the remainder.
///
/// *Panics* if `a` is not square with a power-of-two size, or the block does
/// not fit in the chain.
pub(crate) fn arraykron(
    nsites: usize,
    site: usize,
    a: &nd::Array2<C64>,
) -> nd::Array2<C64>
{
    if !a.is_square() || !a.nrows().is_power_of_two() {
        panic!("arraykron: operator block must be square with size 2^k");
    }
    let k = a.nrows().trailing_zeros() as usize;
    if site + k > nsites {
        panic!("arraykron: operator block does not fit in the chain");
    }
    let eyesize1 = 1_usize << site;
    let eyesize2 = 1_usize << (nsites - site - k);
    kron(&kron(&nd::Array2::eye(eyesize1), a), &nd::Array2::eye(eyesize2))
}
