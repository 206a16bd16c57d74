// Pre-flight validation of the source argument.
// Strict mode fails fast with an actionable message; compat mode only logs,
// leaving the compiler to report whatever is wrong.

use crate::config::types::{Result, SequencerError, SequencerMode};
use crate::core::types::{ArtifactPath, SourcePath};

/// Extensions the system compiler recognizes as a single translation unit
const KNOWN_EXTENSIONS: &[&str] = &["s", "S", "sx", "asm", "c", "i"];

/// Validation result with detailed errors
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate the source/artifact pair before anything touches the filesystem
pub fn validate_source(
    source: &SourcePath,
    artifact: &ArtifactPath,
    mode: SequencerMode,
) -> Result<ValidationResult> {
    let mut result = ValidationResult::default();
    let path = source.as_path();

    if path.as_os_str().is_empty() {
        result.add_error("source path is empty".to_string());
    } else if !path.exists() {
        result.add_error(format!("{} does not exist", path.display()));
    } else if path.is_dir() {
        result.add_error(format!("{} is a directory", path.display()));
    }

    // Without an extension the artifact is the source itself; compiling would
    // overwrite it and cleanup would delete it.
    if artifact.as_path() == path && !path.as_os_str().is_empty() {
        result.add_error(format!(
            "{} has no extension, so the compiled binary would replace it",
            path.display()
        ));
    }

    match source.extension() {
        Some(ext) if KNOWN_EXTENSIONS.contains(&ext) => {}
        Some(ext) => result.add_warning(format!(
            "unrecognized extension '.{}'; the compiler may treat {} as linker input",
            ext,
            path.display()
        )),
        None => {}
    }

    for warning in &result.warnings {
        log::warn!("{}", warning);
    }

    if mode == SequencerMode::Strict && !result.is_valid() {
        return Err(SequencerError::InvalidSource(result.errors.join("; ")));
    }
    for error in &result.errors {
        log::warn!("continuing despite invalid source: {}", error);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pair(path: &std::path::Path) -> (SourcePath, ArtifactPath) {
        let source = SourcePath::new(path);
        let artifact = source.artifact_path();
        (source, artifact)
    }

    #[test]
    fn test_valid_assembly_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ret42.s");
        fs::write(&file, "").unwrap();

        let (source, artifact) = pair(&file);
        let result = validate_source(&source, &artifact, SequencerMode::Strict).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_source_rejected_in_strict_mode() {
        let dir = tempfile::tempdir().unwrap();
        let (source, artifact) = pair(&dir.path().join("absent.s"));

        let err = validate_source(&source, &artifact, SequencerMode::Strict).unwrap_err();
        assert!(matches!(err, SequencerError::InvalidSource(ref msg) if msg.contains("does not exist")));
    }

    #[test]
    fn test_missing_source_tolerated_in_compat_mode() {
        let dir = tempfile::tempdir().unwrap();
        let (source, artifact) = pair(&dir.path().join("absent.s"));

        let result = validate_source(&source, &artifact, SequencerMode::Compat).unwrap();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_extensionless_source_would_be_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prog");
        fs::write(&file, "").unwrap();

        let (source, artifact) = pair(&file);
        let err = validate_source(&source, &artifact, SequencerMode::Strict).unwrap_err();
        assert!(err.to_string().contains("no extension"));
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("src.d");
        fs::create_dir(&sub).unwrap();

        let (source, artifact) = pair(&sub);
        let err = validate_source(&source, &artifact, SequencerMode::Strict).unwrap_err();
        assert!(err.to_string().contains("is a directory"));
    }

    #[test]
    fn test_unknown_extension_is_only_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prog.txt");
        fs::write(&file, "").unwrap();

        let (source, artifact) = pair(&file);
        let result = validate_source(&source, &artifact, SequencerMode::Strict).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }
}
