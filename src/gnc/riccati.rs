// ---------------------------------------------------------------------------
// Continuous-time algebraic Riccati equation
// ---------------------------------------------------------------------------
//
// Solves `A'P + PA - P B R^-1 B' P + Q = 0` for the stabilizing solution
// through the matrix sign function of the Hamiltonian
//
//     H = [  A   -B R^-1 B' ]
//         [ -Q       -A'    ]
//
// `sign(H) + I` annihilates the stable invariant subspace `span [I; P]`,
// which gives an overdetermined linear system for `P`. The sign iteration
// runs on a diagonally rescaled state, `x = D z`, so that weak actuators or
// stiff couplings do not leave `H` spread over many orders of magnitude.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::{Result, SimError};

const MAX_ITERATIONS: usize = 100;
const SIGN_TOLERANCE: f64 = 1e-10;
const RESIDUAL_TOLERANCE: f64 = 1e-8;
const BALANCING_SWEEPS: usize = 30;

/// Stabilizing solution of the CARE.
///
/// `a` is n×n, `b` is n×m, `q` is n×n symmetric positive semi-definite and
/// `r` is m×m symmetric positive definite. The returned `P` is symmetric
/// positive definite and `A - B R^-1 B' P` is Hurwitz. Fails with
/// [`SimError::UncontrollablePair`] when no such `P` exists, which happens
/// when `(A, B)` is not stabilizable.
pub fn solve_care(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    q: &DMatrix<f64>,
    r: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    let n = a.nrows();
    let m = b.ncols();
    check_dims(a, b, q, r)?;

    if r.clone().cholesky().is_none() {
        return Err(SimError::uncontrollable("input weight R is not positive definite"));
    }
    let r_inv = r
        .clone()
        .try_inverse()
        .ok_or_else(|| SimError::uncontrollable("input weight R is singular"))?;
    let g = b * r_inv * b.transpose();

    // x = D z:  A -> D^-1 A D,  G -> D^-1 G D^-1,  Q -> D Q D,  P = D^-1 P_z D^-1
    let d = balancing_scales(a, &g, q);
    let d_inv = d.map(|v| 1.0 / v);
    let a_z = scale(a, &d_inv, &d);
    let g_z = scale(&g, &d_inv, &d_inv);
    let q_z = scale(q, &d, &d);

    let mut h = DMatrix::<f64>::zeros(2 * n, 2 * n);
    h.view_mut((0, 0), (n, n)).copy_from(&a_z);
    h.view_mut((0, n), (n, n)).copy_from(&(-&g_z));
    h.view_mut((n, 0), (n, n)).copy_from(&(-&q_z));
    h.view_mut((n, n), (n, n)).copy_from(&(-a_z.transpose()));

    let w = matrix_sign(h)?;
    let p = scale(&stable_graph(&w)?, &d_inv, &d_inv);
    let p = (&p + p.transpose()) * 0.5;

    if p.clone().cholesky().is_none() {
        return Err(SimError::uncontrollable("Riccati solution is not positive definite"));
    }

    let res = residual_with(a, &g, q, &p).norm();
    let size = 1.0 + q.norm() + (a.transpose() * &p).norm();
    if !(res / size < RESIDUAL_TOLERANCE) {
        return Err(SimError::uncontrollable(format!(
            "Riccati residual too large ({res:.3e})"
        )));
    }

    let stabilizing = (a - &g * &p)
        .try_schur(f64::EPSILON, 10_000)
        .is_some_and(|schur| schur.complex_eigenvalues().iter().all(|ev| ev.re < 0.0));
    if !stabilizing {
        return Err(SimError::uncontrollable("Riccati solution does not stabilize A - G P"));
    }

    debug!(n, m, residual = res, "solved continuous algebraic Riccati equation");
    Ok(p)
}

/// Solve `[W12; W22 + I] P = -[W11 + I; W21]` in the least-squares sense.
fn stable_graph(w: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let n = w.nrows() / 2;
    let identity = DMatrix::<f64>::identity(n, n);
    let mut lhs = DMatrix::<f64>::zeros(2 * n, n);
    lhs.view_mut((0, 0), (n, n)).copy_from(&w.view((0, n), (n, n)));
    lhs.view_mut((n, 0), (n, n))
        .copy_from(&(w.view((n, n), (n, n)) + &identity));
    let mut rhs = DMatrix::<f64>::zeros(2 * n, n);
    rhs.view_mut((0, 0), (n, n))
        .copy_from(&(-(w.view((0, 0), (n, n)) + &identity)));
    rhs.view_mut((n, 0), (n, n)).copy_from(&(-w.view((n, 0), (n, n))));

    let svd = lhs.svd(true, true);
    if svd.rank(1e-9 * svd.singular_values.max()) < n {
        return Err(SimError::uncontrollable("stable subspace is not a graph over the state"));
    }
    svd.solve(&rhs, 1e-14)
        .map_err(|e| SimError::uncontrollable(format!("least-squares solve failed: {e}")))
}

/// Power-of-two state scales that even out the entries of `H`.
///
/// Scaling state `i` by `f` multiplies column `i` of `A` and row and column
/// `i` of `Q` by `f`, and divides row `i` of `A` and row and column `i` of
/// `G` by `f`. Each sweep picks `f` so that both groups end up about the
/// same size. Powers of two keep the rescaling itself exact.
fn balancing_scales(a: &DMatrix<f64>, g: &DMatrix<f64>, q: &DMatrix<f64>) -> DVector<f64> {
    let n = a.nrows();
    let mut d = DVector::<f64>::from_element(n, 1.0);

    for _ in 0..BALANCING_SWEEPS {
        let mut settled = true;
        for i in 0..n {
            let mut grow = 0.0;
            let mut shrink = 0.0;
            for j in 0..n {
                if j != i {
                    grow += (a[(j, i)] * d[i] / d[j]).abs();
                    shrink += (a[(i, j)] * d[j] / d[i]).abs();
                }
                grow += (q[(i, j)].abs() + q[(j, i)].abs()) * d[i] * d[j];
                shrink += (g[(i, j)].abs() + g[(j, i)].abs()) / (d[i] * d[j]);
            }
            if !(grow > 0.0 && shrink > 0.0 && grow.is_finite() && shrink.is_finite()) {
                continue;
            }
            let f = (shrink / grow).sqrt().log2().round().exp2();
            if f.is_finite() && f > 0.0 && f != 1.0 {
                d[i] *= f;
                settled = false;
            }
        }
        if settled {
            break;
        }
    }

    d
}

/// `diag(left) * m * diag(right)`.
fn scale(m: &DMatrix<f64>, left: &DVector<f64>, right: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| left[i] * m[(i, j)] * right[j])
}

/// `A'P + PA - P B R^-1 B' P + Q`.
pub fn care_residual(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    q: &DMatrix<f64>,
    r: &DMatrix<f64>,
    p: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    let r_inv = r
        .clone()
        .try_inverse()
        .ok_or_else(|| SimError::uncontrollable("input weight R is singular"))?;
    let g = b * r_inv * b.transpose();
    Ok(residual_with(a, &g, q, p))
}

fn residual_with(a: &DMatrix<f64>, g: &DMatrix<f64>, q: &DMatrix<f64>, p: &DMatrix<f64>) -> DMatrix<f64> {
    a.transpose() * p + p * a - p * g * p + q
}

/// Matrix sign function by scaled Newton iteration.
fn matrix_sign(mut z: DMatrix<f64>) -> Result<DMatrix<f64>> {
    let dim = z.nrows() as f64;

    for iteration in 0..MAX_ITERATIONS {
        let z_inv = z.clone().try_inverse().ok_or_else(|| {
            SimError::uncontrollable("Hamiltonian has eigenvalues on the imaginary axis")
        })?;

        // Determinant scaling pulls the eigenvalues toward +-1 early on
        let det = z.determinant().abs();
        let c = if det.is_finite() && det > 0.0 {
            det.powf(1.0 / dim)
        } else {
            1.0
        };

        let next = (&z / c + z_inv * c) * 0.5;
        let change = (&next - &z).norm();
        let size = next.norm();
        z = next;

        if !change.is_finite() {
            break;
        }
        if change <= SIGN_TOLERANCE * size {
            debug!(iterations = iteration + 1, "matrix sign iteration converged");
            return Ok(z);
        }
    }

    Err(SimError::uncontrollable(
        "matrix sign iteration did not converge; Hamiltonian has eigenvalues near the imaginary axis",
    ))
}

fn check_dims(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    q: &DMatrix<f64>,
    r: &DMatrix<f64>,
) -> Result<()> {
    let n = a.nrows();
    let m = b.ncols();
    let ok = n > 0
        && a.is_square()
        && b.nrows() == n
        && q.shape() == (n, n)
        && r.shape() == (m, m);
    if ok {
        Ok(())
    } else {
        Err(SimError::uncontrollable(format!(
            "dimension mismatch: A {:?}, B {:?}, Q {:?}, R {:?}",
            a.shape(),
            b.shape(),
            q.shape(),
            r.shape()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn scalar_closed_form() {
        // a p + p a - p^2 b^2 / r + q = 0  =>  p = r (a + sqrt(a^2 + b^2 q / r)) / b^2
        let (a, b, q, r) = (1.5, 2.0, 3.0, 0.5);
        let p = solve_care(
            &DMatrix::from_element(1, 1, a),
            &DMatrix::from_element(1, 1, b),
            &DMatrix::from_element(1, 1, q),
            &DMatrix::from_element(1, 1, r),
        )
        .unwrap();
        let expected = r * (a + (a * a + b * b * q / r).sqrt()) / (b * b);
        assert_relative_eq!(p[(0, 0)], expected, epsilon = 1e-10);
    }

    #[test]
    fn double_integrator_closed_form() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]);
        let b = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let q = DMatrix::identity(2, 2);
        let r = DMatrix::identity(1, 1);
        let p = solve_care(&a, &b, &q, &r).unwrap();

        let s3 = 3.0_f64.sqrt();
        let expected = DMatrix::from_row_slice(2, 2, &[s3, 1.0, 1.0, s3]);
        assert_relative_eq!(p, expected, epsilon = 1e-9);
        assert!(care_residual(&a, &b, &q, &r, &p).unwrap().norm() < 1e-9);
    }

    #[test]
    fn solution_is_symmetric_and_stabilizing() {
        let a = DMatrix::from_row_slice(3, 3, &[0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 2.0, -1.0, 0.5]);
        let b = DMatrix::from_row_slice(3, 1, &[0.0, 0.0, 1.0]);
        let q = DMatrix::identity(3, 3) * 2.0;
        let r = DMatrix::identity(1, 1) * 0.3;
        let p = solve_care(&a, &b, &q, &r).unwrap();

        assert_relative_eq!(p.clone(), p.transpose(), epsilon = 1e-12);
        let k = r.clone().try_inverse().unwrap() * b.transpose() * &p;
        let closed = &a - &b * k;
        for ev in closed.complex_eigenvalues().iter() {
            assert!(ev.re < 0.0, "closed-loop pole {ev} not stable");
        }
    }

    #[test]
    fn weak_actuator_chain_is_solved() {
        // x <- vx <- theta <- omega <- u with a 5e-7 actuator: P spans ~11 decades
        let a = DMatrix::from_row_slice(
            4,
            4,
            &[
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, -9.8, 0.0, //
                0.0, 0.0, 0.0, 1.0, //
                0.0, 0.0, 0.0, 0.0,
            ],
        );
        let b = DMatrix::from_row_slice(4, 1, &[0.0, 0.0, 0.0, 5e-7]);
        let q = DMatrix::identity(4, 4) * 0.1;
        let r = DMatrix::identity(1, 1);
        let p = solve_care(&a, &b, &q, &r).unwrap();

        assert!(p[(3, 3)] > 1e11, "P[3,3] = {}", p[(3, 3)]);
        let res = care_residual(&a, &b, &q, &r, &p).unwrap().norm();
        let scale = 1.0 + q.norm() + (a.transpose() * &p).norm();
        assert!(res / scale < 1e-10, "relative residual {:.3e}", res / scale);

        // Position gain of an integrator chain is sqrt(q / r)
        let k = b.transpose() * &p;
        assert_relative_eq!(k[(0, 0)].abs(), 0.1_f64.sqrt(), max_relative = 1e-6);
    }

    #[test]
    fn balancing_scales_are_powers_of_two() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]);
        let g = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 1e-12]);
        let q = DMatrix::identity(2, 2);
        let d = balancing_scales(&a, &g, &q);
        for v in d.iter() {
            assert_eq!(v.log2().fract(), 0.0, "scale {v}");
        }
        assert!(d[1] < 1e-3);
    }

    #[test]
    fn unreachable_unstable_mode_is_rejected() {
        // Second state is an unstable mode the input cannot touch
        let a = DMatrix::from_row_slice(2, 2, &[-1.0, 0.0, 0.0, 1.0]);
        let b = DMatrix::from_row_slice(2, 1, &[1.0, 0.0]);
        let q = DMatrix::identity(2, 2);
        let r = DMatrix::identity(1, 1);
        let err = solve_care(&a, &b, &q, &r).unwrap_err();
        assert!(matches!(err, SimError::UncontrollablePair { .. }), "{err}");
    }

    #[test]
    fn zero_input_matrix_is_rejected() {
        let a = DMatrix::zeros(2, 2);
        let b = DMatrix::zeros(2, 1);
        let q = DMatrix::identity(2, 2);
        let r = DMatrix::identity(1, 1);
        assert!(solve_care(&a, &b, &q, &r).is_err());
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let a = DMatrix::identity(2, 2);
        let b = DMatrix::zeros(3, 1);
        let q = DMatrix::identity(2, 2);
        let r = DMatrix::identity(1, 1);
        assert!(solve_care(&a, &b, &q, &r).is_err());
    }
}
