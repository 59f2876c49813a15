//! File classifier: short-circuit tiered evaluation
//!
//! Order matters: a risky extension suffix wins outright before the archive
//! check runs, so `setup.zip.exe` is Risky, never Unknown.

use warden_core::{RiskLevel, ARCHIVE_MARKERS, RISKY_FILE_EXTENSIONS};

use crate::url::Evaluation;

/// Reason used for archive files
pub const ARCHIVE_REASON: &str = "Archive file, treat with caution";

/// Reason used when nothing fires
pub const CLEAN_FILE_REASON: &str = "No obvious risk detected";

/// Evaluate a lowercased file name. First matching risky extension wins;
/// otherwise an archive marker anywhere in the name downgrades to Unknown.
pub fn evaluate_file(file: &str) -> Evaluation {
    for ext in RISKY_FILE_EXTENSIONS {
        if file.ends_with(ext) {
            return Evaluation {
                level: RiskLevel::Risky,
                reasons: vec![format!("File type flagged as risky ({ext})")],
            };
        }
    }

    if ARCHIVE_MARKERS.iter().any(|marker| file.contains(marker)) {
        return Evaluation {
            level: RiskLevel::Unknown,
            reasons: vec![ARCHIVE_REASON.to_string()],
        };
    }

    Evaluation {
        level: RiskLevel::Trusted,
        reasons: vec![CLEAN_FILE_REASON.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risky_extension_names_extension() {
        let eval = evaluate_file("invoice.pdf.exe");
        assert_eq!(eval.level, RiskLevel::Risky);
        assert!(eval.reasons[0].contains(".exe"));
    }

    #[test]
    fn test_risky_suffix_beats_archive_substring() {
        // Contains .zip but ends in .exe: order-sensitive, Risky wins
        let eval = evaluate_file("backup.zip.exe");
        assert_eq!(eval.level, RiskLevel::Risky);
        assert!(eval.reasons[0].contains(".exe"));
    }

    #[test]
    fn test_archive_is_unknown() {
        let eval = evaluate_file("photos.zip");
        assert_eq!(eval.level, RiskLevel::Unknown);
        assert_eq!(eval.reasons, vec![ARCHIVE_REASON.to_string()]);

        let eval = evaluate_file("photos.rar.txt");
        assert_eq!(eval.level, RiskLevel::Unknown);
    }

    #[test]
    fn test_plain_file_is_trusted() {
        let eval = evaluate_file("report.pdf");
        assert_eq!(eval.level, RiskLevel::Trusted);
        assert_eq!(eval.reasons, vec![CLEAN_FILE_REASON.to_string()]);
    }

    #[test]
    fn test_all_risky_extensions() {
        for ext in RISKY_FILE_EXTENSIONS {
            let eval = evaluate_file(&format!("payload{ext}"));
            assert_eq!(eval.level, RiskLevel::Risky, "extension {ext}");
        }
    }
}
