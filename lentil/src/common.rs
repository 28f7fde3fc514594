pub use clap::{Args, Parser, Subcommand};
pub use log::info;

pub use candle_util::candle_glm_inference::*;
pub use candle_util::candle_inference::GradientConfig;

pub use matrix_util::dmatrix_glm::*;
pub use matrix_util::simulate::*;
pub use matrix_util::traits::ConvertMatOps;

/// Synthetic data shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct SimulationArgs {
    /// number of observations
    #[arg(long, short = 'n', default_value_t = 10_000)]
    pub nobs: usize,

    /// true coefficients, intercept first (comma-separated)
    #[arg(
        long,
        value_delimiter(','),
        allow_hyphen_values = true,
        default_values_t = TRUE_COEFFICIENTS.to_vec()
    )]
    pub coef: Vec<f64>,

    /// random seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl SimulationArgs {
    pub fn sim_args(&self) -> SimArgs {
        SimArgs {
            nobs: self.nobs,
            coefficients: self.coef.clone(),
            rseed: self.seed,
        }
    }
}

/// Adam settings of the gradient-based fit
#[derive(Args, Debug, Clone)]
pub struct OptimizerArgs {
    /// learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// number of Adam steps
    #[arg(long, default_value_t = 10_000)]
    pub steps: usize,

    /// stop early once the loss changes less than this between steps
    #[arg(long)]
    pub tol: Option<f64>,

    /// report the loss every this many steps (with --verbose)
    #[arg(long, default_value_t = 1_000)]
    pub log_every: usize,
}

impl OptimizerArgs {
    pub fn gradient_config(&self, verbose: bool) -> GradientConfig {
        GradientConfig {
            log_every: self.log_every,
            verbose,
            show_progress: true,
            ..GradientConfig::default()
        }
        .with_learning_rate(self.lr)
        .with_num_steps(self.steps)
        .with_tolerance(self.tol)
    }
}

/// Stopping rule of the reference fit
#[derive(Args, Debug, Clone)]
pub struct IrlsArgs {
    /// maximum number of IRLS iterations
    #[arg(long, default_value_t = 100)]
    pub irls_max_iter: usize,

    /// absolute deviance change to declare convergence
    #[arg(long, default_value_t = 1e-8)]
    pub irls_tol: f64,
}

impl IrlsArgs {
    pub fn irls_options(&self) -> IrlsOptions {
        IrlsOptions {
            max_iter: self.irls_max_iter,
            tol: self.irls_tol,
        }
    }
}

pub fn init_logger(verbose: bool) {
    if verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
}

/// Gradient-based fit on simulated data
pub fn run_gradient_fit(sim: &SimOut, config: &GradientConfig) -> anyhow::Result<GradientFit> {
    let x_nk = sim.x_nk.to_tensor(&config.device)?;
    let y_n1 = sim.y_n.to_tensor(&config.device)?;
    fit_poisson_gradient(&x_nk, &y_n1, config)
}
