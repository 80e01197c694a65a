use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the analysis library
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal conditions that abort a run.
///
/// Recoverable conditions (missing units, ambiguous aliases, skipped enum
/// constants, malformed validation operands) never surface here; they are
/// reported through the `log` facade and processing continues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no usable declaration group in unit '{unit}'")]
    NoUsableGroup { unit: String },

    #[error("failed to generate definition for type '{type_name}' referenced by field '{field}' in unit '{unit}'")]
    UnresolvedType {
        type_name: String,
        field: String,
        unit: String,
    },

    #[error("failed to find definition for embedded member {host}:{embedded}")]
    UnresolvedEmbedded { host: String, embedded: String },

    #[error("failed to parse {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    #[error("invalid manifest {}: {message}", file.display())]
    Manifest { file: PathBuf, message: String },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_type_names_type_and_field() {
        let err = Error::UnresolvedType {
            type_name: "models.Missing".to_string(),
            field: "owner".to_string(),
            unit: "services/api".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("models.Missing"));
        assert!(message.contains("owner"));
        assert!(message.contains("services/api"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = Error::io(
            "/missing/Cargo.toml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("/missing/Cargo.toml"));
    }
}
