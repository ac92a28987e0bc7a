//! Persistence layer.
//!
//! Saves and loads the policy report to/from a JSON file for the
//! reporting layer. Nothing here feeds back into the computation.

use anyhow::{Context, Result};
use std::io::ErrorKind;
use tracing::debug;

use crate::strategy::PolicyReport;

/// Default report file path.
pub const DEFAULT_REPORT_FILE: &str = "lendscore_report.json";

/// Save a policy report to a JSON file, replacing any previous one.
pub fn save_report(report: &PolicyReport, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_REPORT_FILE);
    let json = serde_json::to_string_pretty(report).context("Failed to serialise policy report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write report to {path}"))?;

    debug!(path, run_id = %report.run_id, "Report saved");
    Ok(())
}

/// Load the last saved report. `Ok(None)` when no report has been written yet.
pub fn load_report(path: Option<&str>) -> Result<Option<PolicyReport>> {
    let path = path.unwrap_or(DEFAULT_REPORT_FILE);
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read report from {path}")),
    };

    let report: PolicyReport =
        serde_json::from_str(&json).with_context(|| format!("Failed to parse report from {path}"))?;

    debug!(
        path,
        run_id = %report.run_id,
        records = report.record_count,
        "Report loaded from disk"
    );
    Ok(Some(report))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::CreditStrategy;
    use crate::types::{LoanRecord, Outcome};
    use rust_decimal_macros::dec;

    fn temp_path() -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("lendscore_test_report_{}.json", uuid::Uuid::new_v4()));
        p.to_string_lossy().to_string()
    }

    fn make_report() -> PolicyReport {
        let records = vec![
            LoanRecord::new(Outcome::PaidInFull, 0.1, dec!(1000)),
            LoanRecord::new(Outcome::Default, 0.6, dec!(2000)),
            LoanRecord::new(Outcome::PaidInFull, 0.3, dec!(500)),
        ];
        CreditStrategy::default().run(&records).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path();
        let report = make_report();
        save_report(&report, Some(&path)).unwrap();

        let loaded = load_report(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.run_id, report.run_id);
        assert_eq!(loaded.record_count, 3);
        assert_eq!(loaded.threshold.best_threshold, 0.31);
        assert_eq!(loaded.threshold.best_profit, dec!(75));
        assert_eq!(loaded.threshold.curve.len(), 100);
        assert_eq!(loaded.allocation.curve.len(), 3);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_overwrites_previous_run() {
        let path = temp_path();
        let first = make_report();
        let second = make_report();
        save_report(&first, Some(&path)).unwrap();
        save_report(&second, Some(&path)).unwrap();

        let loaded = load_report(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.run_id, second.run_id);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_money_survives_round_trip_exactly() {
        let path = temp_path();
        let mut report = make_report();
        report.threshold.best_profit = dec!(12345678901234567.89);
        report.threshold.curve[0].net_profit = Some(dec!(-98765432109876543.21));
        report.allocation.curve[0].cumulative_profit = dec!(1234567890123456789.01);
        save_report(&report, Some(&path)).unwrap();

        let loaded = load_report(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.threshold.best_profit, dec!(12345678901234567.89));
        assert_eq!(
            loaded.threshold.curve[0].net_profit,
            Some(dec!(-98765432109876543.21))
        );
        assert_eq!(
            loaded.allocation.curve[0].cumulative_profit,
            dec!(1234567890123456789.01)
        );
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_nonexistent() {
        let loaded = load_report(Some("/tmp/lendscore_nonexistent_report_12345.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_corrupt_file() {
        let path = temp_path();
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_report(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse report"));
        std::fs::remove_file(&path).unwrap();
    }
}
