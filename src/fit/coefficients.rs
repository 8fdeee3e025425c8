//! Long-format coefficient table assembly.

use crate::domain::{CoefficientRow, CoefficientTable};
use crate::fit::fitter::FitRecord;

/// One row per (fit, regressor), in record order then regressor order.
///
/// Intervals cover `1 - alpha`.
pub fn coefficient_table(records: &[FitRecord], alpha: f64) -> CoefficientTable {
    let mut rows = Vec::new();
    for rec in records {
        let m = &rec.model;
        let tvals = m.tvalues();
        let pvals = m.pvalues();
        let ci = m.conf_int(alpha);
        for (j, name) in m.names().iter().enumerate() {
            rows.push(CoefficientRow {
                regressor: name.clone(),
                tau: rec.tau,
                horizon: rec.horizon,
                coeff: m.params()[j],
                tval: tvals[j],
                pval: pvals[j],
                lower_ci: ci[j].0,
                upper_ci: ci[j].1,
                pseudo_r2: m.prsquared(),
                iterations: m.iterations(),
                converged: m.converged(),
            });
        }
    }
    CoefficientTable::new(rows)
}
