// 📂 Input Discovery - full<N>.lex files in numeric order

use crate::error::AuditError;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn input_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^full([0-9]+)\.lex$").expect("static regex"))
}

/// Sequence number of an input file name, `None` if the name does not match
pub fn input_number(file_name: &str) -> Option<u64> {
    input_pattern()
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|n| n.as_str().parse().ok())
}

/// Regular files named `full<N>.lex`, sorted by N then by name
///
/// A missing or unlistable folder is fatal; an empty match list is not.
pub fn discover_input_files(folder: &Path) -> Result<Vec<PathBuf>, AuditError> {
    let input_error = |source| AuditError::InputFolder {
        path: folder.to_path_buf(),
        source,
    };

    let mut found: Vec<(u64, String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(folder).map_err(input_error)? {
        let entry = entry.map_err(input_error)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(number) = input_number(&name) else {
            continue;
        };
        if entry.path().is_file() {
            found.push((number, name, entry.path()));
        }
    }

    found.sort();
    Ok(found.into_iter().map(|(_, _, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_input_number() {
        assert_eq!(input_number("full1.lex"), Some(1));
        assert_eq!(input_number("full0012.lex"), Some(12));
        assert_eq!(input_number("full.lex"), None);
        assert_eq!(input_number("full1.lex.bak"), None);
        assert_eq!(input_number("xfull1.lex"), None);
    }

    #[test]
    fn test_numeric_order_and_filtering() {
        let dir = TempDir::new().unwrap();
        for name in ["full10.lex", "full2.lex", "full1.lex", "notes.txt", "full3.LEX"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("full4.lex")).unwrap();

        let files = discover_input_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["full1.lex", "full2.lex", "full10.lex"]);
    }

    #[test]
    fn test_missing_folder_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = discover_input_files(&dir.path().join("absent"));
        assert!(matches!(result, Err(AuditError::InputFolder { .. })));
    }
}
