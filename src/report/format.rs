//! Formatted terminal output for fits and projections.
//!
//! We keep formatting code in one place so:
//! - the estimation code stays clean and testable
//! - output changes are localized

use crate::domain::{CoefficientTable, ForecastTable};
use crate::fit::QuantileFit;

/// Format the run summary (sample, setup and convergence).
pub fn format_run_summary(fit: &QuantileFit<'_>) -> String {
    let proj = fit.proj();
    let mut out = String::new();

    out.push_str("=== qlp - Quantile Local Projections ===\n");
    out.push_str(&format!(
        "Formulas: {}\n",
        proj.depvars()
            .first()
            .and_then(|dv| proj.formula(dv))
            .map(|f| f.to_string())
            .unwrap_or_default()
    ));
    out.push_str(&format!(
        "Sample: n={} | dropped={} (missing values)\n",
        proj.data().n_rows(),
        proj.dropped_rows()
    ));
    out.push_str(&format!("Horizons: {}\n", fmt_list(proj.horizons())));
    out.push_str(&format!("Quantiles: {}\n", fmt_list(fit.quantiles())));
    out.push_str(&format!(
        "Intervals: {:.0}% (alpha={})\n",
        100.0 * (1.0 - fit.alpha()),
        fit.alpha()
    ));

    let records = fit.records();
    let stalled: Vec<String> = records
        .iter()
        .filter(|r| !r.model.converged())
        .map(|r| format!("h={} tau={}", r.horizon, r.tau))
        .collect();
    out.push_str(&format!(
        "Regressions: {} estimated, {} stopped at the iteration cap",
        records.len(),
        stalled.len()
    ));
    if !stalled.is_empty() {
        out.push_str(&format!(" ({})", stalled.join(", ")));
    }
    out.push_str("\n\n");

    out
}

/// Format the coefficient table, one line per (horizon, τ, regressor).
pub fn format_coefficients(table: &CoefficientTable) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:>3} {:>6} {:<16} {:>10} {:>8} {:>7} {:>10} {:>10} {:>8}",
            "h", "tau", "regressor", "coeff", "tval", "pval", "lower_ci", "upper_ci", "pseudo_r2"
        ),
    );
    push_line(
        &mut out,
        format!(
            "{:-<3} {:-<6} {:-<16} {:-<10} {:-<8} {:-<7} {:-<10} {:-<10} {:-<8}",
            "", "", "", "", "", "", "", "", ""
        ),
    );

    for r in table.rows() {
        let flag = if r.converged { "" } else { " *" };
        push_line(
            &mut out,
            format!(
                "{:>3} {:>6.3} {:<16} {:>10.4} {:>8.2} {:>7.3} {:>10.4} {:>10.4} {:>8.3}{flag}",
                r.horizon,
                r.tau,
                truncate(&r.regressor, 16),
                r.coeff,
                r.tval,
                r.pval,
                r.lower_ci,
                r.upper_ci,
                r.pseudo_r2,
            ),
        );
    }
    if table.rows().iter().any(|r| !r.converged) {
        out.push_str("* stopped at the iteration cap\n");
    }

    out
}

/// Format the forecast table, one line per (horizon, τ, scenario).
pub fn format_forecasts(table: &ForecastTable) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:<16} {:>3} {:>6} {:>10} {:>9} {:>10} {:>10} {:>10} {:>10}",
            "index", "h", "tau", "mean", "se", "mean_lo", "mean_hi", "obs_lo", "obs_hi"
        ),
    );
    push_line(
        &mut out,
        format!(
            "{:-<16} {:-<3} {:-<6} {:-<10} {:-<9} {:-<10} {:-<10} {:-<10} {:-<10}",
            "", "", "", "", "", "", "", "", ""
        ),
    );
    for r in table.rows() {
        push_line(
            &mut out,
            format!(
                "{:<16} {:>3} {:>6.3} {:>10.4} {:>9.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                truncate(&r.index, 16),
                r.horizon,
                r.tau,
                r.mean,
                r.mean_se,
                r.mean_ci_lower,
                r.mean_ci_upper,
                r.obs_ci_lower,
                r.obs_ci_upper,
            ),
        );
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_list<T: ToString>(v: &[T]) -> String {
    let parts: Vec<String> = v.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
