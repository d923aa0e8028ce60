#![allow(non_snake_case)]

//! Stochastic-descent search for bang-bang transverse-field protocols that
//! drive a mixed-field Ising chain between two quantum states.

pub mod error;
pub mod utils;
pub mod hilbert;
pub mod dynamics;
pub mod schrodinger;
pub mod descent;

pub use error::{ Error, Result };
pub use utils::mkdir;
pub use descent::{ stochastic_descent, DescentConfig, DescentResult, StochasticDescent };
