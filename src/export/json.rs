use crate::error::Result;
use crate::export::export_failed;
use std::path::Path;

/// Export any serializable data structure to pretty-printed JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<()>
where
    T: serde::Serialize,
    P: AsRef<Path>,
{
    let mut json_data = serde_json::to_string_pretty(data)?;
    json_data.push('\n');

    let output_path = output_path.as_ref();
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| export_failed(output_path, e))?;
        }
    }

    std::fs::write(output_path, json_data).map_err(|e| export_failed(output_path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personal_bests::PersonalBest;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_export_personal_bests() {
        let bests = vec![PersonalBest {
            distance: dec!(100),
            time: dec!(10.9),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            improvement: None,
            session_type: Some("competition".to_string()),
        }];

        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("pbs.json");
        export_json(&bests, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"time\": \"10.9\""));
        assert!(content.contains("\"date\": \"2024-02-01\""));
        assert!(content.contains("\"improvement\": null"));

        let parsed: Vec<PersonalBest> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, bests);
    }

    #[test]
    fn test_export_to_unwritable_path() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = export_json(&vec![1, 2, 3], blocker.join("report.json")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::VelocistaError::ImportExport(
                crate::error::ImportExportError::ExportFailed { .. }
            )
        ));
        assert!(err.user_message().contains("report.json"));
    }
}
