use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum BomError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Format error in {file}: {message}")]
    Format { file: String, message: String },

    #[error("Structural error at part {part_number} ({}): {message}", .files.join(", "))]
    Structural {
        part_number: String,
        files: Vec<String>,
        message: String,
    },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

impl BomError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn format(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn structural<I, S>(part_number: impl Into<String>, files: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Structural {
            part_number: part_number.into(),
            files: files.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<String>, error: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Format { .. } => "FORMAT_ERROR",
            Self::Structural { .. } => "STRUCTURAL_ERROR",
            Self::Io { .. } => "IO_ERROR",
        }
    }

    /// Process exit status reported by the command line front end.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io { .. } => 1,
            Self::Configuration { .. } => 2,
            Self::Format { .. } => 3,
            Self::Structural { .. } => 4,
        }
    }
}

pub type BomResult<T> = Result<T, BomError>;

/// Non-fatal conditions collected while building a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BomWarning {
    /// A sub-assembly file that no row in the master's tree references.
    UnattachedFile { file: String },
}

impl std::fmt::Display for BomWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnattachedFile { file } => write!(
                f,
                "Unattached sub-assembly: {} is not referenced by the master or any attached sub-assembly",
                file
            ),
        }
    }
}
