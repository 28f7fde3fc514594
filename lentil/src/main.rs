mod common;
mod fit_compare;
mod fit_gradient;
mod fit_irls;
mod report;

use common::*;
use fit_compare::*;
use fit_gradient::*;
use fit_irls::*;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Poisson regression by gradient-based maximum likelihood and IRLS",
    long_about = "Simulate Poisson regression data and estimate the coefficients\n\
		  by Adam on the negative log-likelihood and by IRLS."
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Fit the same simulated data by Adam and IRLS",
        long_about = "Compare the two estimators in three stages: \n\
		      (1) Simulate counts under a log-linear Poisson model\n\
		      (2) Minimize the negative log-likelihood by Adam\n\
		      (3) Refit by IRLS and tabulate both coefficient vectors.\n"
    )]
    Compare(CompareArgs),

    /// Fit simulated data by Adam on the negative log-likelihood
    Gradient(GradientArgs),

    #[command(
        about = "Fit simulated data by IRLS",
        long_about = "Fit a Poisson GLM with log link by iteratively reweighted\n\
		      least squares and report standard errors, z-values,\n\
		      p-values, 95% confidence intervals and the deviance.\n"
    )]
    Irls(ReferenceFitArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.commands {
        Commands::Compare(args) => {
            fit_compare(args)?;
        }
        Commands::Gradient(args) => {
            fit_gradient(args)?;
        }
        Commands::Irls(args) => {
            fit_irls(args)?;
        }
    }

    info!("Done");
    Ok(())
}
