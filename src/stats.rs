//! Explicit reducers used by the aggregator components. Grouping is done by
//! the callers; this module only folds value slices.

/// Result of an ordinary least-squares fit of y on x.
///
/// `p_value` and `r_value` are carried for availability; classification
/// downstream only looks at the slope.
#[derive(Debug, Clone, Copy)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_value: f64,
    pub p_value: f64,
    pub std_err: f64,
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Smallest value, `None` for an empty slice.
pub fn min(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Largest value, `None` for an empty slice.
pub fn max(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Most frequent value. Ties resolve to the value encountered first,
/// in slice order.
pub fn mode_first(values: &[f64]) -> Option<f64> {
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for &v in values {
        match counts.iter_mut().find(|(seen, _)| seen.to_bits() == v.to_bits()) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }

    let mut best: Option<(f64, usize)> = None;
    for (v, n) in counts {
        // strictly-greater keeps the first-encountered value on ties
        if best.is_none_or(|(_, bn)| n > bn) {
            best = Some((v, n));
        }
    }
    best.map(|(v, _)| v)
}

/// Fits y = intercept + slope * x by ordinary least squares.
///
/// Returns `None` when fewer than two points are given or when x has no
/// variance, since the slope is undefined in both cases. For a constant y
/// the correlation is reported as 0. The two-sided p-value comes from the
/// Student-t distribution with n - 2 degrees of freedom and is NaN when
/// n <= 2.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }
    let nf = n as f64;

    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for i in 0..n {
        let dx = x[i] - x_mean;
        let dy = y[i] - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let r_value = if syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };

    let df = nf - 2.0;
    let (p_value, std_err) = if df > 0.0 {
        let residual = ((1.0 - r_value * r_value) * syy / sxx / df).sqrt();
        let p = if r_value.abs() >= 1.0 {
            0.0
        } else {
            let t = r_value * (df / (1.0 - r_value * r_value)).sqrt();
            student_t_two_sided(t.abs(), df)
        };
        (p, residual)
    } else {
        (f64::NAN, f64::NAN)
    };

    Some(LinearFit {
        slope,
        intercept,
        r_value,
        p_value,
        std_err,
    })
}

/// Two-sided tail probability of the Student-t distribution,
/// P(|T| >= t) with `df` degrees of freedom.
fn student_t_two_sided(t: f64, df: f64) -> f64 {
    incomplete_beta(df / 2.0, 0.5, df / (df + t * t))
}

/// Regularized incomplete beta function I_x(a, b), evaluated with the
/// standard continued fraction (converges fast for the arguments the
/// t-distribution produces).
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let front = ((ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b)) + a * x.ln() + b * (1.0 - x).ln())
        .exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 3.0e-14;
    const TINY: f64 = 1.0e-30;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Lanczos approximation of ln(Gamma(x)) for x > 0.
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];

    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000000000190015;
    for c in COEFFS {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.5066282746310005 * ser / x).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_min_max_of_empty_slice_are_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(min(&[]), None);
        assert_eq!(max(&[]), None);
    }

    #[test]
    fn reducers_fold_simple_series() {
        let v = [3.0, 1.0, 2.0];
        assert_eq!(mean(&v), Some(2.0));
        assert_eq!(min(&v), Some(1.0));
        assert_eq!(max(&v), Some(3.0));
    }

    #[test]
    fn mode_counts_most_frequent_value() {
        let v = [180.0, 90.0, 180.0, 270.0, 180.0];
        assert_eq!(mode_first(&v), Some(180.0));
    }

    #[test]
    fn mode_tie_breaks_on_first_encountered() {
        let v = [90.0, 180.0, 180.0, 90.0];
        assert_eq!(mode_first(&v), Some(90.0));
        assert_eq!(mode_first(&[]), None);
    }

    #[test]
    fn regression_recovers_exact_line() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| 3.0 + 0.5 * v).collect();
        let fit = linear_regression(&x, &y).unwrap();
        assert!((fit.slope - 0.5).abs() < 1e-12);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
        assert!((fit.r_value - 1.0).abs() < 1e-12);
        assert_eq!(fit.p_value, 0.0);
    }

    #[test]
    fn regression_of_constant_series_is_flat() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y = vec![10.0; 10];
        let fit = linear_regression(&x, &y).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_value, 0.0);
        // a zero t-statistic is as insignificant as it gets
        assert!((fit.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn regression_needs_two_points_and_x_variance() {
        assert!(linear_regression(&[1.0], &[2.0]).is_none());
        assert!(linear_regression(&[2.0, 2.0], &[1.0, 3.0]).is_none());
    }

    #[test]
    fn noisy_slope_has_small_p_value() {
        // strong signal, deterministic "noise"
        let x: Vec<f64> = (0..40).map(|i| i as f64 / 4.0).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| 1.0 + 2.0 * v + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        let fit = linear_regression(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 0.05);
        assert!(fit.p_value < 1e-6);
        assert!(fit.std_err > 0.0);
    }
}
