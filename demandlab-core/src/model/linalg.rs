//! Small dense least-squares helpers for model fitting.

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` when the system is singular to working precision.
pub fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return None;
    }

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

/// Ridge-stabilized least squares: minimize `|y - X·β|² + ridge·|β[1..]|²`.
///
/// Column 0 is treated as the intercept and is not penalized.
pub fn least_squares(design: &[Vec<f64>], y: &[f64], ridge: f64) -> Option<Vec<f64>> {
    let p = design.first()?.len();
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];

    for (row, &target) in design.iter().zip(y) {
        for i in 0..p {
            xty[i] += row[i] * target;
            for j in i..p {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }
    for (i, row) in xtx.iter_mut().enumerate().skip(1) {
        row[i] += ridge;
    }

    solve(xtx, xty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_small_system() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve(a, vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn needs_pivoting() {
        let a = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let x = solve(a, vec![2.0, 3.0]).unwrap();
        assert_eq!(x, vec![3.0, 2.0]);
    }

    #[test]
    fn singular_system_is_none() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve(a, vec![1.0, 2.0]).is_none());
    }

    #[test]
    fn recovers_a_line() {
        let design: Vec<Vec<f64>> = (0..10).map(|t| vec![1.0, t as f64]).collect();
        let y: Vec<f64> = (0..10).map(|t| 4.0 + 0.5 * t as f64).collect();
        let beta = least_squares(&design, &y, 0.0).unwrap();
        assert!((beta[0] - 4.0).abs() < 1e-9);
        assert!((beta[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn ridge_resolves_collinear_columns() {
        let design: Vec<Vec<f64>> = (0..5).map(|t| vec![1.0, t as f64, t as f64]).collect();
        let y: Vec<f64> = (0..5).map(|t| 2.0 * t as f64).collect();
        assert!(least_squares(&design, &y, 0.0).is_none());
        let beta = least_squares(&design, &y, 1e-6).unwrap();
        assert!((beta[1] + beta[2] - 2.0).abs() < 1e-3);
    }
}
