//! A linear chain of qubits with nearest-neighbor σ<sub>*z*</sub>σ<sub>*z*</sub>
//! coupling under uniform transverse and longitudinal fields.

use ndarray::{ self as nd, s, linalg::kron };
use ndarray_linalg::{ EighInto, UPLO };
use num_complex::Complex64 as C64;
use crate::{
    dynamics::{ arraykron, sigma_x, sigma_z },
    error::{ Error, Result },
};

/// Largest chain length accepted by [`HBuilderIsing`]; the dense Hamiltonian
/// has 4<sup>`L`</sup> complex entries.
pub const MAX_QUBITS: usize = 12;

/// Initialization data for [`HBuilderIsing`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IsingParams {
    /// Number of qubits `L`.
    pub nqubits: usize,
    /// Transverse field strength, coupled to σ<sub>*x*</sub>.
    pub field: f64,
    /// Longitudinal field strength, coupled to σ<sub>*z*</sub>.
    pub g: f64,
}

impl IsingParams {
    pub fn new(nqubits: usize, field: f64, g: f64) -> Self {
        Self { nqubits, field, g }
    }

    /// Check that the parameters describe a buildable Hamiltonian.
    pub fn validate(&self) -> Result<()> {
        if self.nqubits == 0 {
            return Err(Error::config("number of qubits must be at least 1"));
        }
        if self.nqubits > MAX_QUBITS {
            return Err(Error::config(format!(
                "number of qubits must be at most {}, got {}",
                MAX_QUBITS, self.nqubits,
            )));
        }
        if !self.field.is_finite() {
            return Err(Error::config(format!(
                "transverse field must be finite, got {}", self.field
            )));
        }
        if !self.g.is_finite() {
            return Err(Error::config(format!(
                "longitudinal field must be finite, got {}", self.g
            )));
        }
        Ok(())
    }

    /// Dimension 2<sup>`L`</sup> of the state space.
    pub fn dim(&self) -> usize { 1 << self.nqubits }
}

/// Eigendecomposition of a Hermitian Hamiltonian.
///
/// `energies` are real and sorted in ascending order; `vectors` holds the
/// corresponding orthonormal eigenvectors as columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    pub energies: nd::Array1<f64>,
    pub vectors: nd::Array2<C64>,
}

impl Spectrum {
    /// Dimension of the space the spectrum acts on.
    pub fn dim(&self) -> usize { self.energies.len() }
}

/// Hamiltonian builder for an `L`-site Ising chain.
///
/// Produces
/// ```math
/// H = -\sum_{n = 0}^{L - 2} \sigma_n^z \sigma_{n + 1}^z
///     - h \sum_n \sigma_n^x
///     - g \sum_n \sigma_n^z
/// ```
/// with open boundary conditions, where `h` is the transverse field and `g` the
/// longitudinal field. For a single qubit the coupling sum is empty and this
/// reduces to `H = -h σx - g σz`.
#[derive(Clone, Debug)]
pub struct HBuilderIsing {
    pub(crate) params: IsingParams,
}

impl HBuilderIsing {
    /// Create a new `HBuilderIsing`.
    ///
    /// Fails if `L < 1`, `L > MAX_QUBITS`, or either field is non-finite.
    pub fn new(params: IsingParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Return all model parameters.
    pub fn params(&self) -> IsingParams { self.params }

    /// Compute the Hamiltonian matrix.
    pub fn gen(&self) -> nd::Array2<C64> {
        let IsingParams { nqubits: L, field, g } = self.params;
        let n = self.params.dim();
        let sx = sigma_x();
        let sz = sigma_z();
        let zz = kron(&sz, &sz);
        let mut H: nd::Array2<C64> = nd::Array2::zeros((n, n));
        for j in 0..L.saturating_sub(1) {
            H -= &arraykron(L, j, &zz);
        }
        for j in 0..L {
            H.scaled_add(C64::from(-field), &arraykron(L, j, &sx));
            H.scaled_add(C64::from(-g), &arraykron(L, j, &sz));
        }
        H
    }

    /// Diagonalize the Hamiltonian with a Hermitian eigensolver.
    pub fn diagonalize(&self) -> Result<Spectrum> {
        let (energies, vectors) = self.gen().eigh_into(UPLO::Lower)?;
        Ok(Spectrum { energies, vectors })
    }

    /// Diagonalize the Hamiltonian and return a ground state of the system.
    ///
    /// Note that, in general, there may be more than one state that minimizes
    /// the energy of the system; this method offers no guarantees about which
    /// ground state is returned.
    pub fn ground_state(&self) -> Result<(f64, nd::Array1<C64>)> {
        let Spectrum { energies, vectors } = self.diagonalize()?;
        let e: f64 = energies[0];
        let v: nd::Array1<C64> = vectors.slice(s![.., 0]).to_owned();
        Ok((e, v))
    }
}

/// Build the Hamiltonian for `nqubits` qubits at the given fields, and, if
/// `diagonalize` is `true`, its [`Spectrum`].
pub fn build(nqubits: usize, field: f64, g: f64, diagonalize: bool)
    -> Result<(nd::Array2<C64>, Option<Spectrum>)>
{
    let builder = HBuilderIsing::new(IsingParams::new(nqubits, field, g))?;
    let H = builder.gen();
    if diagonalize {
        let (energies, vectors) = H.clone().eigh_into(UPLO::Lower)?;
        Ok((H, Some(Spectrum { energies, vectors })))
    } else {
        Ok((H, None))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn is_hermitian(H: &nd::Array2<C64>) -> bool {
        H.indexed_iter()
            .all(|((i, j), hij)| (*hij - H[[j, i]].conj()).norm() < 1e-14)
    }

    #[test]
    fn single_qubit_closed_form() {
        let H = HBuilderIsing::new(IsingParams::new(1, 0.7, 1.3)).unwrap().gen();
        let expected = nd::array![
            [C64::from(-1.3), C64::from(-0.7)],
            [C64::from(-0.7), C64::from(1.3)],
        ];
        assert_eq!(H, expected);
    }

    #[test]
    fn two_qubit_zero_field_spectrum() {
        let (H, spectrum) = build(2, 0.0, 0.0, true).unwrap();
        let diag: Vec<f64> = H.diag().iter().map(|h| h.re).collect();
        assert_eq!(diag, vec![-1.0, 1.0, 1.0, -1.0]);
        let spectrum = spectrum.unwrap();
        let expected = [-1.0, -1.0, 1.0, 1.0];
        for (e, x) in spectrum.energies.iter().zip(expected) {
            assert!((e - x).abs() < 1e-12);
        }
    }

    #[test]
    fn hermitian_for_many_sites() {
        for L in 1..=4 {
            let H = HBuilderIsing::new(IsingParams::new(L, -0.4, 0.25))
                .unwrap()
                .gen();
            assert_eq!(H.dim(), (1 << L, 1 << L));
            assert!(is_hermitian(&H));
        }
    }

    #[test]
    fn eigenvectors_orthonormal_under_degeneracy() {
        // g = 0, h = 0 on three sites is heavily degenerate
        let spectrum = HBuilderIsing::new(IsingParams::new(3, 0.0, 0.0))
            .unwrap()
            .diagonalize()
            .unwrap();
        let V = &spectrum.vectors;
        let overlap = V.t().mapv(|v| v.conj()).dot(V);
        for ((i, j), o) in overlap.indexed_iter() {
            let target = if i == j { 1.0 } else { 0.0 };
            assert!((o - C64::from(target)).norm() < 1e-12);
        }
    }

    #[test]
    fn eigenpairs_satisfy_eigen_equation() {
        let builder = HBuilderIsing::new(IsingParams::new(3, 0.8, -0.3)).unwrap();
        let H = builder.gen();
        let spectrum = builder.diagonalize().unwrap();
        for (k, e) in spectrum.energies.iter().enumerate() {
            let v = spectrum.vectors.column(k);
            let residual = H.dot(&v) - v.mapv(|a| a * *e);
            assert!(residual.iter().all(|r| r.norm() < 1e-10));
        }
        let (e0, _) = builder.ground_state().unwrap();
        assert_eq!(e0, spectrum.energies[0]);
    }

    #[test]
    fn invalid_params_rejected() {
        assert!(matches!(HBuilderIsing::new(IsingParams::new(0, 1.0, 1.0)), Err(Error::Config(_))));
        assert!(HBuilderIsing::new(IsingParams::new(2, f64::NAN, 1.0)).is_err());
        assert!(HBuilderIsing::new(IsingParams::new(2, 1.0, f64::INFINITY)).is_err());
        assert!(HBuilderIsing::new(IsingParams::new(MAX_QUBITS + 1, 1.0, 1.0)).is_err());
        assert!(build(0, 1.0, 1.0, false).is_err());
    }
}
