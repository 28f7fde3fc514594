use crate::candle_loss_functions::*;
use candle_core::{Result, Tensor};
use candle_nn::Module;

////////////////////////////////////
// Poisson log-linear regression  //
////////////////////////////////////

/// y(i) ~ Poisson( exp( sum_k x(i,k) * w(k) ) )
pub struct PoissonRegression {
    coef_k1: Tensor,
}

impl PoissonRegression {
    /// Register a `n_features x 1` coefficient vector, initialized at
    /// zero, in the variable map behind `vs`
    pub fn new(n_features: usize, vs: candle_nn::VarBuilder) -> Result<Self> {
        let coef_k1 = vs.get_with_hints((n_features, 1), "coef", candle_nn::init::ZERO)?;
        Ok(Self { coef_k1 })
    }

    pub fn coef(&self) -> &Tensor {
        &self.coef_k1
    }

    /// current coefficients as a plain vector
    pub fn coefficients(&self) -> Result<Vec<f64>> {
        self.coef_k1.flatten_all()?.to_vec1::<f64>()
    }

    /// predicted mean `exp(x * w)`, clamped below by `min_rate`
    pub fn rate(&self, x_nk: &Tensor, min_rate: f64) -> Result<Tensor> {
        poisson_rate(&self.forward(x_nk)?, min_rate)
    }

    /// averaged negative log-likelihood at the current coefficients
    pub fn loss(&self, x_nk: &Tensor, y_n1: &Tensor, min_rate: f64) -> Result<Tensor> {
        poisson_nll_loss(y_n1, &self.rate(x_nk, min_rate)?)
    }

    /// closed-form gradient of `loss` at the current coefficients
    pub fn score(&self, x_nk: &Tensor, y_n1: &Tensor, min_rate: f64) -> Result<Tensor> {
        poisson_nll_score(x_nk, y_n1, &self.rate(x_nk, min_rate)?)
    }
}

impl Module for PoissonRegression {
    /// linear predictor `eta = x * w`
    fn forward(&self, x_nk: &Tensor) -> Result<Tensor> {
        x_nk.matmul(&self.coef_k1)
    }
}
