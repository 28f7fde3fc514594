use crate::common::*;
use matrix_util::common_io::{mkdir, open_buf_writer, write_lines};
use serde::Serialize;
use std::io::Write;

const RULE_WIDTH: usize = 78;

/// `intercept`, `x1`, `x2`, ...
pub fn coefficient_names(kk: usize) -> Vec<String> {
    (0..kk)
        .map(|k| {
            if k == 0 {
                "intercept".to_string()
            } else {
                format!("x{}", k)
            }
        })
        .collect()
}

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

fn centered(title: &str) -> String {
    format!("{:^width$}", title, width = RULE_WIDTH)
}

/// Print a table to `stdout`, followed by an empty line
pub fn print_table(lines: &[String]) -> anyhow::Result<()> {
    let mut lines = lines.to_vec();
    lines.push(String::new());
    write_lines(&lines, "stdout")
}

pub fn format_gradient_fit(fit: &GradientFit, config: &GradientConfig) -> Vec<String> {
    let mut lines = vec![
        rule('='),
        centered("Poisson regression by Adam (maximum likelihood)"),
        rule('='),
        format!(
            "{:<20}{:>18}    {:<20}{:>14}",
            "Learning rate:", config.learning_rate, "Steps:", fit.num_steps
        ),
        format!(
            "{:<20}{:>18.6}    {:<20}{:>14.3e}",
            "Final loss:", fit.final_loss, "|gradient|:", fit.score_norm
        ),
        rule('-'),
        format!("{:<12}{:>12}", "", "coef"),
        rule('-'),
    ];

    let names = coefficient_names(fit.coefficients.len());
    for (name, coef) in names.iter().zip(fit.coefficients.iter()) {
        lines.push(format!("{:<12}{:>12.4}", name, coef));
    }
    lines.push(rule('='));
    lines
}

pub fn format_irls_fit(fit: &PoissonGlmFit) -> Vec<String> {
    let mut lines = vec![
        rule('='),
        centered("Poisson GLM, log link (IRLS)"),
        rule('='),
        format!(
            "{:<20}{:>18}    {:<20}{:>14}",
            "No. Observations:", fit.nobs, "Df Residuals:", fit.df_resid
        ),
        format!(
            "{:<20}{:>18}    {:<20}{:>14}",
            "Df Model:", fit.df_model, "Iterations:", fit.iterations
        ),
        format!(
            "{:<20}{:>18.3}    {:<20}{:>14.3}",
            "Log-Likelihood:", fit.log_likelihood, "Deviance:", fit.deviance
        ),
        format!(
            "{:<20}{:>18.3}    {:<20}{:>14.3}",
            "Null Deviance:", fit.null_deviance, "Pearson chi2:", fit.pearson_chi2
        ),
        format!(
            "{:<20}{:>18.3}    {:<20}{:>14.3}",
            "AIC:", fit.aic, "BIC:", fit.bic
        ),
        format!("{:<20}{:>18}", "Converged:", fit.converged),
        rule('-'),
        format!(
            "{:<12}{:>10}{:>10}{:>10}{:>10}{:>13}{:>13}",
            "", "coef", "std err", "z", "P>|z|", "[0.025", "0.975]"
        ),
        rule('-'),
    ];

    let names = coefficient_names(fit.coefficients.len());
    for (k, name) in names.iter().enumerate() {
        let (lb, ub) = fit.conf_int[k];
        lines.push(format!(
            "{:<12}{:>10.4}{:>10.4}{:>10.3}{:>10.3}{:>13.4}{:>13.4}",
            name,
            fit.coefficients[k],
            fit.std_errors[k],
            fit.z_values[k],
            fit.p_values[k],
            lb,
            ub
        ));
    }
    lines.push(rule('='));
    lines
}

/// max_k |a(k) - b(k)|
pub fn max_abs_difference(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0_f64, f64::max)
}

/// Side-by-side table of the true and both estimated coefficients
///
/// * `max_diff` - largest |adam - irls| over the coefficients
///
pub fn format_comparison(
    truth: &[f64],
    gradient: &GradientFit,
    irls: &PoissonGlmFit,
    max_diff: f64,
) -> Vec<String> {
    let mut lines = vec![
        rule('='),
        centered("Adam vs. IRLS"),
        rule('='),
        format!(
            "{:<12}{:>12}{:>12}{:>12}{:>12}",
            "", "true", "adam", "irls", "|diff|"
        ),
        rule('-'),
    ];

    let names = coefficient_names(irls.coefficients.len());
    for (k, name) in names.iter().enumerate() {
        let (g, r) = (gradient.coefficients[k], irls.coefficients[k]);
        let t = truth
            .get(k)
            .map(|t| format!("{:.4}", t))
            .unwrap_or_default();
        lines.push(format!(
            "{:<12}{:>12}{:>12.4}{:>12.4}{:>12.2e}",
            name,
            t,
            g,
            r,
            (g - r).abs()
        ));
    }
    lines.push(rule('-'));
    lines.push(format!("{:<48}{:>12.2e}", "max |adam - irls|", max_diff));
    lines.push(rule('='));
    lines
}

#[derive(Serialize)]
pub struct GradientReport<'a> {
    pub coefficients: &'a [f64],
    pub final_loss: f64,
    pub score_norm: f64,
    pub num_steps: usize,
    pub learning_rate: f64,
}

impl<'a> GradientReport<'a> {
    pub fn new(fit: &'a GradientFit, config: &GradientConfig) -> Self {
        Self {
            coefficients: &fit.coefficients,
            final_loss: fit.final_loss,
            score_norm: fit.score_norm,
            num_steps: fit.num_steps,
            learning_rate: config.learning_rate,
        }
    }
}

#[derive(Serialize)]
pub struct FitReport<'a> {
    pub nobs: usize,
    pub seed: u64,
    pub true_coefficients: &'a [f64],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientReport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irls: Option<&'a PoissonGlmFit>,
}

/// Write the report as JSON; `.gz` output is compressed
pub fn write_json_report(report: &FitReport, file: &str) -> anyhow::Result<()> {
    mkdir(file)?;
    let mut buf = open_buf_writer(file)?;
    serde_json::to_writer_pretty(&mut buf, report)?;
    writeln!(buf)?;
    buf.flush()?;
    info!("wrote {}", file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_gradient_fit() -> GradientFit {
        GradientFit {
            coefficients: vec![-2.01, 1.02, -0.49],
            loss_trace: vec![1.0, 0.5],
            final_loss: 0.4,
            score_norm: 1e-4,
            num_steps: 2,
        }
    }

    fn contains(lines: &[String], pat: &str) -> bool {
        lines.iter().any(|l| l.contains(pat))
    }

    #[test]
    fn names_start_with_intercept() {
        assert_eq!(coefficient_names(3), vec!["intercept", "x1", "x2"]);
        assert!(coefficient_names(0).is_empty());
    }

    #[test]
    fn largest_gap_between_estimates() {
        let gap = max_abs_difference(&[1., -2., 0.5], &[1.1, -2.3, 0.5]);
        assert!((gap - 0.3).abs() < 1e-12);
        assert_eq!(max_abs_difference(&[], &[]), 0.);
    }

    #[test]
    fn gradient_table_lists_every_term() -> anyhow::Result<()> {
        let lines = format_gradient_fit(&toy_gradient_fit(), &GradientConfig::default());
        assert!(contains(&lines, "intercept"));
        assert!(contains(&lines, "x2"));
        assert!(contains(&lines, "-2.0100"));
        print_table(&lines)?;
        Ok(())
    }

    #[test]
    fn comparison_reports_largest_gap() -> anyhow::Result<()> {
        use candle_util::candle_core::Device;
        let sim = generate_poisson_regression_data(&SimArgs {
            nobs: 300,
            coefficients: vec![0.5, 0.2, -0.3],
            rseed: 3,
        })?;
        let irls = fit_poisson_irls(&sim.x_nk, &sim.y_n, &IrlsOptions::default())?;
        let gradient = toy_gradient_fit();
        let max_diff = max_abs_difference(&gradient.coefficients, &irls.coefficients);

        let lines = format_comparison(&[0.5, 0.2, -0.3], &gradient, &irls, max_diff);
        let last_row = &lines[lines.len() - 2];
        assert!(last_row.starts_with("max |adam - irls|"));
        assert!(last_row.ends_with(&format!("{:.2e}", max_diff)));
        assert!(contains(&lines, "0.5000"));

        let summary = format_irls_fit(&irls);
        assert!(contains(&summary, "P>|z|"));
        assert!(contains(&summary, "x2"));

        // conversion used by the subcommands keeps the shape
        let x = sim.x_nk.to_tensor(&Device::Cpu)?;
        assert_eq!(x.dims(), &[300, 3]);
        Ok(())
    }

    #[test]
    fn json_report_skips_missing_fits() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("report").join("fit.json");
        let file = file.to_str().ok_or(anyhow::anyhow!("path"))?;

        let fit = toy_gradient_fit();
        let config = GradientConfig::default();
        let report = FitReport {
            nobs: 10,
            seed: 42,
            true_coefficients: &TRUE_COEFFICIENTS,
            gradient: Some(GradientReport::new(&fit, &config)),
            irls: None,
        };
        write_json_report(&report, file)?;

        let text = std::fs::read_to_string(file)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value["seed"], 42);
        assert_eq!(value["gradient"]["num_steps"], 2);
        assert!(value.get("irls").is_none());
        Ok(())
    }
}
