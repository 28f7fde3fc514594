use crate::common::*;
use crate::report::*;

#[derive(Args, Debug)]
pub struct GradientArgs {
    #[command(flatten)]
    sim: SimulationArgs,

    #[command(flatten)]
    optim: OptimizerArgs,

    /// JSON report (`.json` or `.json.gz`)
    #[arg(long, short)]
    output: Option<Box<str>>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

pub fn fit_gradient(args: &GradientArgs) -> anyhow::Result<()> {
    init_logger(args.verbose);

    let sim = generate_poisson_regression_data(&args.sim.sim_args())?;
    let config = args.optim.gradient_config(args.verbose);
    let fit = run_gradient_fit(&sim, &config)?;

    print_table(&format_gradient_fit(&fit, &config))?;

    if let Some(file) = args.output.as_deref() {
        let report = FitReport {
            nobs: sim.y_n.len(),
            seed: args.sim.seed,
            true_coefficients: &args.sim.coef,
            gradient: Some(GradientReport::new(&fit, &config)),
            irls: None,
        };
        write_json_report(&report, file)?;
    }
    Ok(())
}
