use crate::common::*;
use crate::report::*;

#[derive(Args, Debug)]
pub struct ReferenceFitArgs {
    #[command(flatten)]
    sim: SimulationArgs,

    #[command(flatten)]
    irls: IrlsArgs,

    /// JSON report (`.json` or `.json.gz`)
    #[arg(long, short)]
    output: Option<Box<str>>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

pub fn fit_irls(args: &ReferenceFitArgs) -> anyhow::Result<()> {
    init_logger(args.verbose);

    let sim = generate_poisson_regression_data(&args.sim.sim_args())?;
    let fit = fit_poisson_irls(&sim.x_nk, &sim.y_n, &args.irls.irls_options())?;

    print_table(&format_irls_fit(&fit))?;

    if let Some(file) = args.output.as_deref() {
        let report = FitReport {
            nobs: fit.nobs,
            seed: args.sim.seed,
            true_coefficients: &args.sim.coef,
            gradient: None,
            irls: Some(&fit),
        };
        write_json_report(&report, file)?;
    }
    Ok(())
}
