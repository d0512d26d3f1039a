//! This module provides the `MachineLoader` struct, responsible for loading machine
//! descriptions from files, directories and strings.

use crate::parser::parse;
use crate::types::{Machine, MachineError};
use std::fs;
use std::path::{Path, PathBuf};

/// The file extension of machine description files.
pub const DESCRIPTION_EXTENSION: &str = "tm";

/// `MachineLoader` is a utility struct for loading machine descriptions.
pub struct MachineLoader;

impl MachineLoader {
    /// Loads a single machine from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Machine)` if the file is read and parsed.
    /// * `Err(MachineError::FileError)` if the file cannot be read.
    /// * `Err(MachineError::Parse)` if the file content is not a valid description.
    pub fn load_machine(path: &Path) -> Result<Machine, MachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Ok(parse(&content)?)
    }

    /// Loads a single machine from the provided description text.
    pub fn load_machine_from_string(content: &str) -> Result<Machine, MachineError> {
        Ok(parse(content)?)
    }

    /// Loads every `.tm` file in a directory.
    ///
    /// Directories and files with other extensions are skipped. Each loaded file yields
    /// its own result, so one broken description does not hide the others.
    pub fn load_machines(directory: &Path) -> Vec<Result<(PathBuf, Machine), MachineError>> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(MachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        return Some(Err(MachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                if path.is_dir()
                    || path
                        .extension()
                        .is_none_or(|ext| ext != DESCRIPTION_EXTENSION)
                {
                    return None;
                }

                Some(Self::load_machine(&path).map(|machine| (path, machine)))
            })
            .collect();

        // read_dir order is platform dependent
        results.sort_by(|a, b| match (a, b) {
            (Ok((a, _)), Ok((b, _))) => a.cmp(b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const VALID: &str = "start, stop\ninit start\naccept stop\nstart:\n\ta, b, >, stop\n";

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_valid_machine() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "valid.tm", VALID);

        let machine = MachineLoader::load_machine(&path).unwrap();
        assert_eq!(machine.initial_state().name(), "start");
        assert!(machine.is_accepting("stop"));
    }

    #[test]
    fn test_load_invalid_machine() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "invalid.tm", "A\naccept A\n");

        let result = MachineLoader::load_machine(&path);
        assert!(matches!(result, Err(MachineError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = MachineLoader::load_machine(&dir.path().join("absent.tm"));

        assert!(matches!(result, Err(MachineError::FileError(_))));
    }

    #[test]
    fn test_load_from_string() {
        assert!(MachineLoader::load_machine_from_string(VALID).is_ok());
        assert!(MachineLoader::load_machine_from_string("").is_err());
    }

    #[test]
    fn test_load_machines_from_directory() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "valid.tm", VALID);
        write_file(dir.path(), "invalid.tm", "This is not a valid machine");
        write_file(dir.path(), "ignored.txt", "This file should be ignored");
        std::fs::create_dir(dir.path().join("nested.tm")).unwrap();

        let results = MachineLoader::load_machines(dir.path());

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_load_machines_from_missing_directory() {
        let dir = tempdir().unwrap();
        let results = MachineLoader::load_machines(&dir.path().join("nope"));

        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(MachineError::FileError(_))));
    }
}
