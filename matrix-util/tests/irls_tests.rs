use matrix_util::dmatrix_glm::*;
use matrix_util::simulate::*;

#[test]
fn irls_recovers_simulated_coefficients() -> anyhow::Result<()> {
    let args = SimArgs {
        nobs: 5_000,
        coefficients: TRUE_COEFFICIENTS.to_vec(),
        rseed: 42,
    };
    let sim = generate_poisson_regression_data(&args)?;

    let fit = fit_poisson_irls(&sim.x_nk, &sim.y_n, &IrlsOptions::default())?;

    assert!(fit.converged);
    assert!(fit.iterations < 30);
    assert_eq!(fit.nobs, 5_000);
    assert_eq!(fit.df_model, 3);
    assert_eq!(fit.df_resid, 4_996);

    for (k, &truth) in TRUE_COEFFICIENTS.iter().enumerate() {
        let est = fit.coefficients[k];
        let se = fit.std_errors[k];
        assert!(se > 0.0 && se < 0.2, "se[{}] = {}", k, se);
        assert!(
            (est - truth).abs() < 4.0 * se,
            "coef[{}] = {} vs {} (se {})",
            k,
            est,
            truth,
            se
        );
    }

    // every slope here is far from zero
    assert!(fit.p_values[1] < 1e-6);
    assert!(fit.deviance < fit.null_deviance);
    assert!(fit.log_likelihood < 0.0);
    assert!((fit.aic - (-2.0 * fit.log_likelihood + 8.0)).abs() < 1e-9);
    Ok(())
}

#[test]
fn fewer_iterations_without_convergence() -> anyhow::Result<()> {
    let sim = generate_poisson_regression_data(&SimArgs {
        nobs: 1_000,
        ..Default::default()
    })?;
    let options = IrlsOptions {
        max_iter: 1,
        tol: 0.0,
    };
    let fit = fit_poisson_irls(&sim.x_nk, &sim.y_n, &options)?;
    assert_eq!(fit.iterations, 1);
    assert!(!fit.converged);
    Ok(())
}
