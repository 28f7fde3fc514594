use crate::common::*;
use crate::report::*;

#[derive(Args, Debug)]
pub struct CompareArgs {
    #[command(flatten)]
    sim: SimulationArgs,

    #[command(flatten)]
    optim: OptimizerArgs,

    #[command(flatten)]
    irls: IrlsArgs,

    /// JSON report of both fits (`.json` or `.json.gz`)
    #[arg(long, short)]
    output: Option<Box<str>>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

pub struct ComparisonOut {
    pub sim: SimOut,
    pub gradient: GradientFit,
    pub irls: PoissonGlmFit,
    pub max_abs_diff: f64,
}

/// Simulate once and fit the same data by Adam and by IRLS
pub fn run_comparison(
    sim_args: &SimArgs,
    config: &GradientConfig,
    options: &IrlsOptions,
) -> anyhow::Result<ComparisonOut> {
    let sim = generate_poisson_regression_data(sim_args)?;

    info!("fitting by Adam");
    let gradient = run_gradient_fit(&sim, config)?;

    info!("fitting by IRLS");
    let irls = fit_poisson_irls(&sim.x_nk, &sim.y_n, options)?;

    let max_abs_diff = max_abs_difference(&gradient.coefficients, &irls.coefficients);
    info!("max |adam - irls| = {:.3e}", max_abs_diff);

    Ok(ComparisonOut {
        sim,
        gradient,
        irls,
        max_abs_diff,
    })
}

pub fn fit_compare(args: &CompareArgs) -> anyhow::Result<()> {
    init_logger(args.verbose);

    let config = args.optim.gradient_config(args.verbose);
    let out = run_comparison(&args.sim.sim_args(), &config, &args.irls.irls_options())?;

    print_table(&format_gradient_fit(&out.gradient, &config))?;
    print_table(&format_irls_fit(&out.irls))?;
    print_table(&format_comparison(
        &args.sim.coef,
        &out.gradient,
        &out.irls,
        out.max_abs_diff,
    ))?;

    if let Some(file) = args.output.as_deref() {
        let report = FitReport {
            nobs: out.sim.y_n.len(),
            seed: args.sim.seed,
            true_coefficients: &args.sim.coef,
            gradient: Some(GradientReport::new(&out.gradient, &config)),
            irls: Some(&out.irls),
        };
        write_json_report(&report, file)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn adam_agrees_with_irls_on_small_data() -> anyhow::Result<()> {
        let sim_args = SimArgs {
            nobs: 2_000,
            ..SimArgs::default()
        };
        let config = GradientConfig::default()
            .with_learning_rate(5e-3)
            .with_num_steps(4_000);

        let out = run_comparison(&sim_args, &config, &IrlsOptions::default())?;

        assert!(out.irls.converged);
        assert_eq!(out.gradient.coefficients.len(), 4);
        assert!(
            out.max_abs_diff < 0.02,
            "adam {:?} vs irls {:?}",
            out.gradient.coefficients,
            out.irls.coefficients
        );
        assert_abs_diff_eq!(
            out.max_abs_diff,
            max_abs_difference(&out.gradient.coefficients, &out.irls.coefficients)
        );
        Ok(())
    }
}
