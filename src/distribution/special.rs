//! Special functions.

/// Log gamma function using the Lanczos approximation.
///
/// Relative error is below 2e-10 for positive arguments; non-positive
/// arguments return infinity.
pub fn ln_gamma(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::INFINITY;
    }

    let coefficients = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];

    let mut tmp = x + 5.5;
    tmp -= (x + 0.5) * tmp.ln();

    let mut ser = 1.000000000190015;
    for (j, &coef) in coefficients.iter().enumerate() {
        ser += coef / (x + 1.0 + j as f64);
    }

    -tmp + (2.5066282746310005 * ser / x).ln()
}
