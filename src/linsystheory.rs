extern crate nalgebra as na;

use na::ComplexField;

use crate::models::{Differentiable, TankState};

/// Determine if a discrete closed loop system is stable,
/// i.e. all eigenvalues lie strictly inside the unit circle.
#[allow(non_snake_case)]
pub fn is_stable(A_clp: &na::Matrix2<f64>) -> Option<bool> {
    // Convert to complex matrix to solve eigenvalues
    let A_clp_complex = A_clp.map(|x| na::Complex::new(x, 0.0));
    let eigenvalues = A_clp_complex.eigenvalues()?;
    Some(eigenvalues.iter().all(|eigenvalue| eigenvalue.abs() < 1.0))
}

/// Determine if (A, C) is detectable.
/// See PHB-test: https://en.wikipedia.org/wiki/Hautus_lemma
#[allow(non_snake_case)]
pub fn is_detectable(A: &na::Matrix2<f64>, C: &na::RowVector2<f64>) -> Option<bool> {
    let A_complex = A.map(|x| na::Complex::new(x, 0.0));
    let C_complex = C.map(|x| na::Complex::new(x, 0.0));
    let eigenvalues = A_complex.eigenvalues()?;

    for eigenvalue in eigenvalues.iter() {
        if eigenvalue.abs() < 1.0 {
            continue;
        }
        // check that rank [A - eigenvalue*I; C] = n
        let A_lambda_block = A_complex - na::Matrix2::from_diagonal_element(*eigenvalue);
        let phb_matrix = na::Matrix3x2::from_fn(|i, j| {
            if i < 2 {
                A_lambda_block[(i, j)]
            } else {
                C_complex[(0, j)]
            }
        });
        let eps = 1.0e-9;
        if phb_matrix.rank(eps) != 2 {
            return Some(false);
        }
    }
    Some(true)
}

/// Linearized error dynamics of an Euler discretized observer that measures tank 1.
/// e(k+1) = (I + T*(J - L*C)) * e(k), C = [1 0]
#[allow(non_snake_case)]
pub fn euler_error_dynamics<T: Differentiable<2, 1>>(
    model: &T,
    x: &TankState,
    u: f64,
    gain: &TankState,
    sample_time: f64,
) -> Option<na::Matrix2<f64>> {
    let J = model.jacobian(x, &na::Vector1::new(u))?;
    let C = na::RowVector2::new(1.0, 0.0);
    Some(na::Matrix2::identity() + (J - gain * C) * sample_time)
}
