use log::info;
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand_distr::{Distribution, Poisson, Uniform};

/// Intercept followed by three slopes
pub const TRUE_COEFFICIENTS: [f64; 4] = [-2.0, 1.0, -0.5, 0.3];

pub struct SimArgs {
    pub nobs: usize,
    /// intercept first; one covariate is drawn per remaining entry
    pub coefficients: Vec<f64>,
    pub rseed: u64,
}

impl Default for SimArgs {
    fn default() -> Self {
        Self {
            nobs: 10_000,
            coefficients: TRUE_COEFFICIENTS.to_vec(),
            rseed: 42,
        }
    }
}

pub struct SimOut {
    /// N x K design; column 0 is all ones
    pub x_nk: DMatrix<f64>,
    /// true Poisson rates
    pub lambda_n: DVector<f64>,
    /// sampled counts
    pub y_n: DVector<f64>,
}

/// Generate a Poisson regression dataset
///
/// ```text
/// x(i,0) = 1,  x(i,k) ~ U[-1, 1]  for k > 0
/// y(i)   ~ Poisson( exp( sum_k x(i,k) * beta(k) ) )
/// ```
///
/// All draws come from one `StdRng` seeded with `args.rseed`, the
/// design matrix row by row first, then the counts.
///
pub fn generate_poisson_regression_data(args: &SimArgs) -> anyhow::Result<SimOut> {
    let nn = args.nobs;
    let kk = args.coefficients.len();

    if nn == 0 {
        anyhow::bail!("need at least one observation");
    }
    if kk == 0 {
        anyhow::bail!("empty coefficient vector");
    }
    if args.coefficients.iter().any(|b| !b.is_finite()) {
        anyhow::bail!("non-finite coefficients: {:?}", args.coefficients);
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(args.rseed);

    // 1. design matrix
    let runif = Uniform::new_inclusive(-1_f64, 1_f64)?;
    let mut x_nk = DMatrix::<f64>::zeros(nn, kk);
    for i in 0..nn {
        x_nk[(i, 0)] = 1.0;
        for k in 1..kk {
            x_nk[(i, k)] = runif.sample(&mut rng);
        }
    }

    // 2. rates under the log link
    let beta_k = DVector::<f64>::from_column_slice(&args.coefficients);
    let lambda_n = (&x_nk * &beta_k).map(|eta| eta.exp());

    // 3. counts
    let mut y_n = DVector::<f64>::zeros(nn);
    for (i, &lambda) in lambda_n.iter().enumerate() {
        let rpois = Poisson::new(lambda)
            .map_err(|e| anyhow::anyhow!("invalid Poisson rate {} at row {}: {}", lambda, i, e))?;
        y_n[i] = rpois.sample(&mut rng);
    }

    info!(
        "simulated {} x {} design, mean count {:.4}",
        nn,
        kk,
        y_n.mean()
    );

    Ok(SimOut {
        x_nk,
        lambda_n,
        y_n,
    })
}
