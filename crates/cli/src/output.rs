use crate::error::CliError;
use serde::Serialize;
use std::path::Path;

fn generate_report_json<T: Serialize>(report: &T) -> Result<String, CliError> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}

pub async fn write_report<T: Serialize>(report: &T, path: &Path) -> Result<(), CliError> {
    let report_json = generate_report_json(report)?;
    tokio::fs::write(path, report_json).await?;
    Ok(())
}

pub fn print_report<T: Serialize>(report: &T) -> Result<(), CliError> {
    let report_json = generate_report_json(report)?;
    println!("{report_json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scan_runtime::ScanOutcome;

    #[tokio::test]
    async fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outcome.json");
        let outcome = ScanOutcome::ChecksFailed {
            logs: vec!["1/1 check FAILED".into()],
        };

        write_report(&outcome, &path).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["status"], "checks_failed");
        assert_eq!(written["logs"][0], "1/1 check FAILED");
    }
}
