//! Goodness-of-fit battery for candidate uniform batches.
//!
//! Three tests against the uniform-[0,1) null hypothesis:
//!
//! - mean test: sample mean inside `0.5 ± z · 1/√(12n)`;
//! - variance test: sample variance inside the chi-square interval
//!   around the theoretical 1/12;
//! - chi-square uniformity test: observed interval frequencies against
//!   the expected `n/k`.
//!
//! A batch is accepted when at least [`PASS_FRACTION`] of the tests
//! pass. Critical values come from quantile approximations of the
//! standard normal (Acklam) and chi-square (Wilson–Hilferty)
//! distributions.

use serde::{Deserialize, Serialize};

/// Fraction of battery tests that must pass for a batch to be accepted.
pub const PASS_FRACTION: f64 = 0.8;

/// Theoretical variance of the uniform distribution on [0, 1).
const UNIFORM_VARIANCE: f64 = 1.0 / 12.0;

/// Outcome of running the battery on one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryOutcome {
    /// Mean test result.
    pub mean_passed: bool,
    /// Variance test result.
    pub variance_passed: bool,
    /// Chi-square uniformity test result.
    pub chi_square_passed: bool,
}

impl BatteryOutcome {
    /// Fraction of tests that passed.
    #[must_use]
    pub fn fraction_passed(&self) -> f64 {
        let passed = u8::from(self.mean_passed)
            + u8::from(self.variance_passed)
            + u8::from(self.chi_square_passed);
        f64::from(passed) / 3.0
    }

    /// Whether the batch is accepted.
    #[must_use]
    pub fn accepted(&self) -> bool {
        self.fraction_passed() >= PASS_FRACTION
    }
}

/// Run the full battery at significance level `alpha` with `intervals`
/// chi-square bins.
#[must_use]
pub fn run_battery(numbers: &[f64], alpha: f64, intervals: usize) -> BatteryOutcome {
    BatteryOutcome {
        mean_passed: mean_test(numbers, alpha),
        variance_passed: variance_test(numbers, alpha),
        chi_square_passed: chi_square_test(numbers, intervals, alpha),
    }
}

/// Mean test: sample mean inside `0.5 ± z_{1-α/2} / √(12n)`.
#[must_use]
pub fn mean_test(numbers: &[f64], alpha: f64) -> bool {
    let n = numbers.len();
    if n == 0 {
        return false;
    }
    let mean = numbers.iter().sum::<f64>() / n as f64;
    let z = normal_quantile(1.0 - alpha / 2.0);
    let half_width = z / (12.0 * n as f64).sqrt();
    (0.5 - half_width..=0.5 + half_width).contains(&mean)
}

/// Variance test: sample variance inside the chi-square acceptance
/// interval around 1/12, with `n - 1` degrees of freedom.
#[must_use]
pub fn variance_test(numbers: &[f64], alpha: f64) -> bool {
    let n = numbers.len();
    if n < 2 {
        return false;
    }
    let mean = numbers.iter().sum::<f64>() / n as f64;
    let variance = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;

    let df = n - 1;
    let lower = chi_square_quantile(alpha / 2.0, df) / df as f64 * UNIFORM_VARIANCE;
    let upper = chi_square_quantile(1.0 - alpha / 2.0, df) / df as f64 * UNIFORM_VARIANCE;
    (lower..=upper).contains(&variance)
}

/// Chi-square uniformity test: split the observed range into equal
/// intervals and compare observed frequencies against `n/k`.
#[must_use]
pub fn chi_square_test(numbers: &[f64], intervals: usize, alpha: f64) -> bool {
    let n = numbers.len();
    if n == 0 || intervals < 2 || n < intervals {
        return false;
    }

    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if span <= 0.0 {
        return false;
    }

    let mut observed = vec![0usize; intervals];
    for &x in numbers {
        let idx = (((x - min) / span) * intervals as f64) as usize;
        // The maximum lands exactly on the upper edge of the last bin
        observed[idx.min(intervals - 1)] += 1;
    }

    let expected = n as f64 / intervals as f64;
    let statistic: f64 = observed
        .iter()
        .map(|&o| (o as f64 - expected).powi(2) / expected)
        .sum();

    statistic <= chi_square_quantile(1.0 - alpha, intervals - 1)
}

/// Standard normal quantile via Acklam's rational approximation.
/// Relative error below 1.15e-9 over (0, 1).
#[must_use]
#[allow(clippy::excessive_precision)]
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e+01,
        2.209_460_984_245_205e+02,
        -2.759_285_104_469_687e+02,
        1.383_577_518_672_690e+02,
        -3.066_479_806_614_716e+01,
        2.506_628_277_459_239e+00,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e+01,
        1.615_858_368_580_409e+02,
        -1.556_989_798_598_866e+02,
        6.680_131_188_771_972e+01,
        -1.328_068_155_288_572e+01,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-03,
        -3.223_964_580_411_365e-01,
        -2.400_758_277_161_838e+00,
        -2.549_732_539_343_734e+00,
        4.374_664_141_464_968e+00,
        2.938_163_982_698_783e+00,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-03,
        3.224_671_290_700_398e-01,
        2.445_134_137_142_996e+00,
        3.754_408_661_907_416e+00,
    ];
    const P_LOW: f64 = 0.024_25;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if !(0.0..=1.0).contains(&p) || p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

/// Chi-square quantile via the Wilson–Hilferty cube approximation.
#[must_use]
pub fn chi_square_quantile(p: f64, df: usize) -> f64 {
    let k = df as f64;
    let z = normal_quantile(p);
    let term = 2.0 / (9.0 * k);
    k * (1.0 - term + z * term.sqrt()).powi(3)
}
