//! # Check Reports
//!
//! Every verify command prints one JSON object:
//!
//! ```json
//! {"overall_status": "PASS", "checks": [{"check": "...", "status": "PASS", "detail": "..."}]}
//! ```
//!
//! `overall_status` is `PASS` only when every check passed. The process exit
//! code follows it (0 / 1).

use serde::Serialize;

/// Result of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
}

/// Outcome of one named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// Check name, e.g. `hash_chain_integrity`.
    pub check: String,
    /// Pass or fail.
    pub status: CheckStatus,
    /// Reason tag or summary.
    pub detail: String,
}

/// Ordered list of check results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    checks: Vec<CheckResult>,
}

impl CheckReport {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a passing check.
    pub fn pass(&mut self, check: impl Into<String>, detail: impl Into<String>) {
        self.push(check, CheckStatus::Pass, detail);
    }

    /// Record a failing check.
    pub fn fail(&mut self, check: impl Into<String>, detail: impl Into<String>) {
        self.push(check, CheckStatus::Fail, detail);
    }

    /// Pass when `ok`, fail otherwise.
    pub fn record(&mut self, check: impl Into<String>, ok: bool, detail: impl Into<String>) {
        let status = if ok { CheckStatus::Pass } else { CheckStatus::Fail };
        self.push(check, status, detail);
    }

    fn push(&mut self, check: impl Into<String>, status: CheckStatus, detail: impl Into<String>) {
        self.checks.push(CheckResult {
            check: check.into(),
            status,
            detail: detail.into(),
        });
    }

    /// Checks in the order they ran.
    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    /// Whether every check passed. An empty report passes.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.status == CheckStatus::Pass)
    }

    /// `Pass` when every check passed.
    pub fn overall_status(&self) -> CheckStatus {
        if self.passed() {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        }
    }

    /// JSON form printed by the CLI.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "overall_status": self.overall_status(),
            "checks": self.checks,
        })
    }

    /// Print the report to stdout and return the process exit code.
    pub fn emit(&self) -> anyhow::Result<u8> {
        println!("{}", serde_json::to_string_pretty(&self.to_value())?);
        Ok(if self.passed() { 0 } else { 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_status_follows_checks() {
        let mut report = CheckReport::new();
        assert!(report.passed());
        report.pass("a", "ok");
        assert_eq!(report.overall_status(), CheckStatus::Pass);
        report.record("b", false, "bad");
        assert_eq!(report.overall_status(), CheckStatus::Fail);

        let value = report.to_value();
        assert_eq!(value["overall_status"], "FAIL");
        assert_eq!(value["checks"][1]["check"], "b");
        assert_eq!(value["checks"][1]["status"], "FAIL");
        assert_eq!(value["checks"][0]["detail"], "ok");
    }
}
