//! Legendre polynomial evaluation.
//!
//! Legendre polynomials P_n(x) are orthogonal on [-1, 1] with weight 1. Their
//! roots are the Gauss-Legendre points used as solution points and as the
//! interior flux points of spectral-difference elements.

/// Evaluate Legendre polynomial P_n(x) using the three-term recurrence.
///
/// P_0(x) = 1, P_1(x) = x,
/// (k+1) P_{k+1}(x) = (2k+1) x P_k(x) - k P_{k-1}(x)
pub fn legendre(n: usize, x: f64) -> f64 {
    legendre_and_derivative(n, x).0
}

/// Evaluate both P_n(x) and P'_n(x) with a single recurrence sweep.
///
/// The derivative follows from P'_n(x) = n (x P_n - P_{n-1}) / (x² - 1),
/// with the closed forms P'_n(±1) = (±1)^{n+1} n(n+1)/2 at the endpoints.
pub fn legendre_and_derivative(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }

    let mut p_prev = 1.0;
    let mut p_curr = x;
    for k in 1..n {
        let p_next = ((2 * k + 1) as f64 * x * p_curr - k as f64 * p_prev) / (k + 1) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }

    let endpoint = (n * (n + 1)) as f64 / 2.0;
    let dp = if (x - 1.0).abs() < 1e-14 {
        endpoint
    } else if (x + 1.0).abs() < 1e-14 {
        if n % 2 == 0 { -endpoint } else { endpoint }
    } else {
        n as f64 * (x * p_curr - p_prev) / (x * x - 1.0)
    };

    (p_curr, dp)
}
