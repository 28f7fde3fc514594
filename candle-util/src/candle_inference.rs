use crate::candle_loss_functions::MIN_POISSON_RATE;

/// Settings of the gradient-based Poisson fit
#[derive(Clone, Debug)]
pub struct GradientConfig {
    pub learning_rate: f64,
    /// number of Adam updates; the loop never checks convergence
    /// unless `tolerance` is set
    pub num_steps: usize,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    /// lower clamp of the predicted rates inside the loss
    pub min_rate: f64,
    /// stop once |loss(t) - loss(t-1)| drops below this value
    pub tolerance: Option<f64>,
    pub log_every: usize,
    pub device: candle_core::Device,
    pub verbose: bool,
    pub show_progress: bool,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            num_steps: 10_000,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            min_rate: MIN_POISSON_RATE,
            tolerance: None,
            log_every: 1_000,
            device: candle_core::Device::Cpu,
            verbose: false,
            show_progress: false,
        }
    }
}

impl GradientConfig {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_num_steps(mut self, num_steps: usize) -> Self {
        self.num_steps = num_steps;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn adam_params(&self) -> candle_nn::ParamsAdamW {
        candle_nn::ParamsAdamW {
            lr: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            eps: self.eps,
            weight_decay: 0.0,
        }
    }
}
