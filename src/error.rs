use std::io;
use std::path::{Path, PathBuf};

use crate::csharp::ParseError;

/// Failures that abort a generation run. A failed run never touches the
/// previously generated output.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        path: PathBuf,
        source_code: String,
        message: String,
        /// Byte offset of the failure, when known.
        offset: Option<usize>,
    },
    #[error("malformed override file {}: {source}", path.display())]
    OverrideLoad {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenerateError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        GenerateError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn from_csharp(path: &Path, source_code: &str, err: ParseError) -> Self {
        GenerateError::Parse {
            path: path.to_path_buf(),
            source_code: source_code.to_string(),
            message: err.message,
            offset: Some(err.pos),
        }
    }

    pub fn from_json(path: &Path, source_code: &str, err: serde_json::Error) -> Self {
        let offset = line_column_offset(source_code, err.line(), err.column());
        GenerateError::Parse {
            path: path.to_path_buf(),
            source_code: source_code.to_string(),
            message: err.to_string(),
            offset,
        }
    }
}

/// A copy destination that could not be written. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Could not write file to \"{}\"\nReason: {message}", path.display())]
pub struct WriteFailure {
    pub path: PathBuf,
    pub message: String,
}

/// serde_json reports 1-based lines and columns; `line == 0` means unknown.
fn line_column_offset(text: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let mut offset = 0;
    for (idx, content) in text.split_inclusive('\n').enumerate() {
        if idx + 1 == line {
            let column = column.saturating_sub(1).min(content.len());
            return Some(offset + column);
        }
        offset += content.len();
    }
    Some(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_point_into_the_document() {
        let text = "{\n  \"types\": [,]\n}";
        let err = serde_json::from_str::<serde_json::Value>(text).unwrap_err();
        let GenerateError::Parse { offset, .. } =
            GenerateError::from_json(Path::new("a.types.json"), text, err)
        else {
            panic!("expected parse error");
        };
        let offset = offset.unwrap();
        let line_start = text.find('\n').unwrap() + 1;
        assert!((line_start..=text.find(']').unwrap()).contains(&offset));
    }

    #[test]
    fn test_write_failure_message() {
        let failure = WriteFailure {
            path: PathBuf::from("/out/a.d.ts"),
            message: "denied".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "Could not write file to \"/out/a.d.ts\"\nReason: denied"
        );
    }
}
