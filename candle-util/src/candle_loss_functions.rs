use candle_core::{Result, Tensor};

/// Lower bound applied to Poisson rates before taking `log`
pub const MIN_POISSON_RATE: f64 = 1e-10;

/// Poisson rate under the log link
///
/// rate(i) = max( exp(eta(i)), min_rate )
///
/// * `eta_n1` - linear predictor
/// * `min_rate` - keeps `log(rate)` finite when `eta` runs off to -inf
///
pub fn poisson_rate(eta_n1: &Tensor, min_rate: f64) -> Result<Tensor> {
    eta_n1.exp()?.clamp(min_rate, f64::MAX)
}

/// Poisson negative log-likelihood averaged over observations
///
/// loss = mean_i [ rate(i) - y(i) * log(rate(i)) ]
///
/// The `log(y!)` term does not depend on the coefficients and is
/// dropped.
///
/// * `y_n1` - observed counts
/// * `rate_n1` - predicted rates (strictly positive)
///
pub fn poisson_nll_loss(y_n1: &Tensor, rate_n1: &Tensor) -> Result<Tensor> {
    rate_n1.sub(&y_n1.mul(&rate_n1.log()?)?)?.mean_all()
}

/// Gradient of `poisson_nll_loss` w.r.t. the coefficients
///
/// score(k) = (1/N) * sum_i x(i,k) * [ rate(i) - y(i) ]
///
/// * `x_nk` - design matrix
/// * `y_n1` - observed counts
/// * `rate_n1` - predicted rates
///
pub fn poisson_nll_score(x_nk: &Tensor, y_n1: &Tensor, rate_n1: &Tensor) -> Result<Tensor> {
    let nn = x_nk.dim(0)? as f64;
    let resid_n1 = rate_n1.sub(y_n1)?;
    x_nk.t()?.matmul(&resid_n1)? / nn
}
