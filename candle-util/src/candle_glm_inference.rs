use crate::candle_inference::GradientConfig;
use crate::candle_model_poisson::PoissonRegression;

use candle_core::{DType, Tensor};
use candle_nn::{AdamW, Optimizer, VarBuilder, VarMap};
use indicatif::{ProgressBar, ProgressDrawTarget};
use log::info;

/// Outcome of `fit_poisson_gradient`
#[derive(Clone, Debug)]
pub struct GradientFit {
    /// fitted coefficients, one per column of the design matrix
    pub coefficients: Vec<f64>,
    /// loss evaluated right before each Adam update
    pub loss_trace: Vec<f64>,
    /// loss at the returned coefficients
    pub final_loss: f64,
    /// Euclidean norm of the closed-form gradient at the returned coefficients
    pub score_norm: f64,
    /// number of updates actually taken
    pub num_steps: usize,
}

/// Maximum-likelihood Poisson regression by Adam on the averaged
/// negative log-likelihood
///
/// ```text
/// w <- 0
/// repeat num_steps times:
///     rate = exp(X w)
///     loss = mean( rate - y * log(rate) )
///     w    <- adam( w, d loss / d w )
/// ```
///
/// * `x_nk` - design matrix (N x K)
/// * `y_n` - non-negative integer counts, shape (N,) or (N, 1)
/// * `config` - optimizer settings
///
pub fn fit_poisson_gradient(
    x_nk: &Tensor,
    y_n: &Tensor,
    config: &GradientConfig,
) -> anyhow::Result<GradientFit> {
    let device = &config.device;

    if x_nk.rank() != 2 {
        anyhow::bail!("design matrix must be 2D, got shape {:?}", x_nk.dims());
    }
    let (nn, kk) = x_nk.dims2()?;
    if nn == 0 || kk == 0 {
        anyhow::bail!("empty design matrix {} x {}", nn, kk);
    }
    if y_n.elem_count() != nn {
        anyhow::bail!(
            "response has {} elements, but the design matrix has {} rows",
            y_n.elem_count(),
            nn
        );
    }
    if !config.learning_rate.is_finite() || config.learning_rate <= 0. {
        anyhow::bail!("learning rate must be positive: {}", config.learning_rate);
    }
    if config.min_rate.is_nan() || config.min_rate <= 0. {
        anyhow::bail!("minimum rate must be positive: {}", config.min_rate);
    }

    let x_nk = x_nk.to_dtype(DType::F64)?.to_device(device)?;
    let y_n1 = y_n
        .to_dtype(DType::F64)?
        .reshape((nn, 1))?
        .to_device(device)?;

    let x_vec = x_nk.flatten_all()?.to_vec1::<f64>()?;
    if x_vec.iter().any(|x| !x.is_finite()) {
        anyhow::bail!("design matrix contains non-finite values");
    }
    let y_vec = y_n1.flatten_all()?.to_vec1::<f64>()?;
    if y_vec.iter().any(|&y| !y.is_finite() || y < 0. || y.fract() != 0.) {
        anyhow::bail!("counts must be non-negative integers");
    }

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F64, device);
    let model = PoissonRegression::new(kk, vb)?;

    // create optimizer AFTER the model so varmap contains the coefficients
    let mut adam = AdamW::new(varmap.all_vars(), config.adam_params())?;

    let pb = ProgressBar::new(config.num_steps as u64);

    if !config.show_progress || config.verbose {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    info!(
        "Adam on {} x {} design, lr = {}, {} steps",
        nn, kk, config.learning_rate, config.num_steps
    );

    let mut loss_trace = Vec::with_capacity(config.num_steps);

    for step in 0..config.num_steps {
        let loss = model.loss(&x_nk, &y_n1, config.min_rate)?;
        let loss_val = loss.to_scalar::<f64>()?;

        if !loss_val.is_finite() {
            anyhow::bail!("loss is not finite at step {}: {}", step, loss_val);
        }

        adam.backward_step(&loss)?;
        pb.inc(1);

        if config.verbose
            && config.log_every > 0
            && (step % config.log_every == 0 || step + 1 == config.num_steps)
        {
            info!("step {:6}: loss = {:12.6}", step, loss_val);
        }

        let prev = loss_trace.last().copied();
        loss_trace.push(loss_val);

        if let (Some(tol), Some(prev)) = (config.tolerance, prev) {
            if (prev - loss_val).abs() < tol {
                info!("stopped at step {}: |delta loss| < {}", step, tol);
                break;
            }
        }
    }
    pb.finish_and_clear();

    let final_loss = model.loss(&x_nk, &y_n1, config.min_rate)?.to_scalar::<f64>()?;
    let score_norm = model
        .score(&x_nk, &y_n1, config.min_rate)?
        .sqr()?
        .sum_all()?
        .sqrt()?
        .to_scalar::<f64>()?;

    let coefficients = model.coefficients()?;
    info!(
        "finished {} steps: loss = {:.6}, |score| = {:.3e}",
        loss_trace.len(),
        final_loss,
        score_norm
    );

    Ok(GradientFit {
        coefficients,
        num_steps: loss_trace.len(),
        loss_trace,
        final_loss,
        score_norm,
    })
}
