use crate::stats::*;
use log::{info, warn};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

/// Stopping rule of the IRLS iterations
#[derive(Clone, Debug)]
pub struct IrlsOptions {
    pub max_iter: usize,
    /// absolute change of the deviance between two iterations
    pub tol: f64,
}

impl Default for IrlsOptions {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tol: 1e-8,
        }
    }
}

/// Poisson GLM (log link) estimates with Wald inference
#[derive(Clone, Debug, Serialize)]
pub struct PoissonGlmFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub z_values: Vec<f64>,
    pub p_values: Vec<f64>,
    /// 95% Wald intervals
    pub conf_int: Vec<(f64, f64)>,
    #[serde(skip)]
    pub covariance: DMatrix<f64>,
    pub log_likelihood: f64,
    pub deviance: f64,
    pub null_deviance: f64,
    pub pearson_chi2: f64,
    pub aic: f64,
    pub bic: f64,
    pub nobs: usize,
    pub df_model: usize,
    pub df_resid: usize,
    pub iterations: usize,
    pub converged: bool,
}

/// X' diag(w) X
fn weighted_gram(x_nk: &DMatrix<f64>, w_n: &DVector<f64>) -> DMatrix<f64> {
    let mut xw_nk = x_nk.clone();
    for (mut xw_i, &w) in xw_nk.row_iter_mut().zip(w_n.iter()) {
        xw_i *= w;
    }
    x_nk.tr_mul(&xw_nk)
}

fn validate(x_nk: &DMatrix<f64>, y_n: &DVector<f64>) -> anyhow::Result<()> {
    let (nn, kk) = x_nk.shape();
    if kk == 0 {
        anyhow::bail!("design matrix has no columns");
    }
    if y_n.len() != nn {
        anyhow::bail!(
            "response has {} elements, but the design matrix has {} rows",
            y_n.len(),
            nn
        );
    }
    if nn < kk {
        anyhow::bail!("{} observations cannot identify {} coefficients", nn, kk);
    }
    if x_nk.iter().any(|x| !x.is_finite()) {
        anyhow::bail!("design matrix contains non-finite values");
    }
    if y_n.iter().any(|&y| !y.is_finite() || y < 0. || y.fract() != 0.) {
        anyhow::bail!("counts must be non-negative integers");
    }
    if y_n.iter().all(|&y| y == 0.) {
        anyhow::bail!("all counts are zero; the Poisson MLE does not exist");
    }
    Ok(())
}

/// Fit a Poisson log-linear model by iteratively reweighted least squares
///
/// ```text
/// mu   = (y + mean(y)) / 2,  eta = log(mu)
/// repeat:
///     z    = eta + (y - mu) / mu
///     beta = (X' W X)^-1 X' W z,   W = diag(mu)
///     eta  = X beta,  mu = exp(eta)
/// until |deviance - previous deviance| <= tol
/// ```
///
/// * `x_nk` - design matrix (N x K), including the intercept column
/// * `y_n` - non-negative integer counts
/// * `options` - iteration limits
///
pub fn fit_poisson_irls(
    x_nk: &DMatrix<f64>,
    y_n: &DVector<f64>,
    options: &IrlsOptions,
) -> anyhow::Result<PoissonGlmFit> {
    validate(x_nk, y_n)?;

    let (nn, kk) = x_nk.shape();
    let y_mean = y_n.mean();

    let mut mu_n = y_n.map(|y| (y + y_mean) / 2.);
    let mut eta_n = mu_n.map(|mu| mu.ln());
    let mut beta_k = DVector::<f64>::zeros(kk);
    let mut dev = poisson_deviance(y_n, &mu_n);
    let mut converged = false;
    let mut iterations = 0;

    for iter in 0..options.max_iter {
        let z_n = DVector::<f64>::from_iterator(
            nn,
            eta_n
                .iter()
                .zip(y_n.iter().zip(mu_n.iter()))
                .map(|(&eta, (&y, &mu))| eta + (y - mu) / mu),
        );

        let xtwx_kk = weighted_gram(x_nk, &mu_n);
        let xtwz_k = x_nk.tr_mul(&z_n.component_mul(&mu_n));

        let chol = xtwx_kk
            .cholesky()
            .ok_or_else(|| anyhow::anyhow!("X'WX is singular at iteration {}", iter + 1))?;
        beta_k = chol.solve(&xtwz_k);

        eta_n = x_nk * &beta_k;
        mu_n = eta_n.map(|eta| eta.exp());

        if mu_n.iter().any(|mu| !mu.is_finite() || *mu <= 0.) {
            anyhow::bail!("fitted means left (0, inf) at iteration {}", iter + 1);
        }

        let dev_new = poisson_deviance(y_n, &mu_n);
        iterations = iter + 1;
        let delta = (dev_new - dev).abs();
        dev = dev_new;

        if delta <= options.tol {
            converged = true;
            break;
        }
    }

    if converged {
        info!("IRLS converged after {} iterations, deviance = {:.4}", iterations, dev);
    } else {
        warn!(
            "IRLS stopped after {} iterations without convergence, deviance = {:.4}",
            iterations, dev
        );
    }

    // Wald inference from the Fisher information at the estimate
    let covariance = weighted_gram(x_nk, &mu_n)
        .cholesky()
        .ok_or_else(|| anyhow::anyhow!("Fisher information is singular"))?
        .inverse();

    let coefficients: Vec<f64> = beta_k.iter().copied().collect();
    let std_errors: Vec<f64> = covariance.diagonal().iter().map(|v| v.sqrt()).collect();
    let z_values: Vec<f64> = coefficients
        .iter()
        .zip(std_errors.iter())
        .map(|(b, se)| b / se)
        .collect();
    let p_values = z_values.iter().map(|&z| z_to_pvalue(z)).collect();
    let conf_int = coefficients
        .iter()
        .zip(std_errors.iter())
        .map(|(b, se)| (b - Z_975 * se, b + Z_975 * se))
        .collect();

    let log_likelihood = poisson_log_likelihood(y_n, &mu_n);
    let null_mu_n = DVector::<f64>::from_element(nn, y_mean);
    let null_deviance = poisson_deviance(y_n, &null_mu_n);

    let kk_f = kk as f64;

    Ok(PoissonGlmFit {
        coefficients,
        std_errors,
        z_values,
        p_values,
        conf_int,
        covariance,
        log_likelihood,
        deviance: dev,
        null_deviance,
        pearson_chi2: pearson_chi2(y_n, &mu_n),
        aic: -2. * log_likelihood + 2. * kk_f,
        bic: -2. * log_likelihood + kk_f * (nn as f64).ln(),
        nobs: nn,
        df_model: kk - 1,
        df_resid: nn - kk,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn intercept_only_recovers_log_mean() -> anyhow::Result<()> {
        let x = DMatrix::<f64>::from_element(6, 1, 1.);
        let y = DVector::from_vec(vec![0., 1., 2., 3., 4., 2.]);

        let fit = fit_poisson_irls(&x, &y, &IrlsOptions::default())?;

        assert!(fit.converged);
        assert_abs_diff_eq!(fit.coefficients[0], 2f64.ln(), epsilon = 1e-8);
        // var(log ybar) = 1 / (n * ybar)
        assert_abs_diff_eq!(fit.std_errors[0], (1f64 / 12.).sqrt(), epsilon = 1e-6);
        assert_abs_diff_eq!(fit.deviance, fit.null_deviance, epsilon = 1e-8);
        assert_eq!(fit.df_model, 0);
        assert_eq!(fit.df_resid, 5);
        Ok(())
    }

    #[test]
    fn two_group_design_matches_group_means() -> anyhow::Result<()> {
        // group indicator: log mu = b0 + b1 * g
        let g = [0., 0., 0., 1., 1., 1.];
        let x = DMatrix::<f64>::from_fn(6, 2, |i, j| if j == 0 { 1. } else { g[i] });
        let y = DVector::from_vec(vec![1., 2., 3., 4., 6., 8.]);

        let fit = fit_poisson_irls(&x, &y, &IrlsOptions::default())?;

        assert_abs_diff_eq!(fit.coefficients[0], 2f64.ln(), epsilon = 1e-8);
        assert_abs_diff_eq!(fit.coefficients[1], 3f64.ln(), epsilon = 1e-8);
        for (&(lb, ub), &b) in fit.conf_int.iter().zip(fit.coefficients.iter()) {
            assert!(lb < b && b < ub);
        }
        assert!(fit.p_values.iter().all(|p| (0. ..=1.).contains(p)));
        assert!(fit.deviance < fit.null_deviance);
        Ok(())
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let x = DMatrix::<f64>::from_fn(3, 2, |_, j| if j == 0 { 1. } else { 0. });
        let y = DVector::from_vec(vec![1., 2., 3.]);
        // an all-zero column leaves X'WX singular
        assert!(fit_poisson_irls(&x, &y, &IrlsOptions::default()).is_err());

        let x = DMatrix::<f64>::from_fn(3, 2, |i, j| if j == 0 { 1. } else { i as f64 });
        let zeros = DVector::from_vec(vec![0., 0., 0.]);
        assert!(fit_poisson_irls(&x, &zeros, &IrlsOptions::default()).is_err());

        let negative = DVector::from_vec(vec![1., -2., 3.]);
        assert!(fit_poisson_irls(&x, &negative, &IrlsOptions::default()).is_err());

        let short = DVector::from_vec(vec![1., 2.]);
        assert!(fit_poisson_irls(&x, &short, &IrlsOptions::default()).is_err());

        let fractional = DVector::from_vec(vec![1., 2.5, 3.]);
        assert!(fit_poisson_irls(&x, &fractional, &IrlsOptions::default()).is_err());
    }
}
