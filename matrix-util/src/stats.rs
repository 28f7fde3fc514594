use nalgebra::DVector;
use special::{Error, Gamma};

/// 97.5% quantile of the standard normal; half-width of a 95% Wald
/// interval in standard errors
pub const Z_975: f64 = 1.959963984540054;

/// Compute two-sided p-value from z-score using normal CDF.
pub fn z_to_pvalue(z: f64) -> f64 {
    // p = erfc(|z| / sqrt(2))
    (z.abs() / std::f64::consts::SQRT_2).compl_error()
}

/// log(y!) = lgamma(y + 1)
pub fn ln_factorial(y: f64) -> f64 {
    Gamma::ln_gamma(y + 1.).0
}

/// y * log(y / mu) with the convention 0 * log(0) = 0
fn y_log_y_over_mu(y: f64, mu: f64) -> f64 {
    if y > 0. {
        y * (y / mu).ln()
    } else {
        0.
    }
}

/// Poisson log-likelihood including the log(y!) term
///
/// llik = sum_i y(i) * log(mu(i)) - mu(i) - log(y(i)!)
///
pub fn poisson_log_likelihood(y_n: &DVector<f64>, mu_n: &DVector<f64>) -> f64 {
    y_n.iter()
        .zip(mu_n.iter())
        .map(|(&y, &mu)| y * mu.ln() - mu - ln_factorial(y))
        .sum()
}

/// Poisson deviance
///
/// D = 2 * sum_i [ y(i) * log(y(i) / mu(i)) - (y(i) - mu(i)) ]
///
pub fn poisson_deviance(y_n: &DVector<f64>, mu_n: &DVector<f64>) -> f64 {
    2. * y_n
        .iter()
        .zip(mu_n.iter())
        .map(|(&y, &mu)| y_log_y_over_mu(y, mu) - (y - mu))
        .sum::<f64>()
}

/// Pearson chi-square statistic, sum_i (y(i) - mu(i))^2 / mu(i)
pub fn pearson_chi2(y_n: &DVector<f64>, mu_n: &DVector<f64>) -> f64 {
    y_n.iter()
        .zip(mu_n.iter())
        .map(|(&y, &mu)| (y - mu).powi(2) / mu)
        .sum()
}
