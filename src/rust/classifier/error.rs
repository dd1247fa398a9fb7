use std::fmt;

/// Represents the different types of errors that can occur in the symptom classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// Error occurred due to invalid input parameters
    ValidationError(String),
    /// The report contained no symptom known to the vocabulary
    NoRecognizableSymptoms,
    /// A feature vector or classifier width disagrees with the vocabulary
    DimensionMismatch { expected: usize, actual: usize },
    /// A disease name was not seen when the encoder was fitted
    UnknownLabel(String),
    /// A classifier produced a code the encoder cannot decode
    DecodeOutOfRange { code: usize, classes: usize },
    /// Error occurred during the build phase
    BuildError(String),
    /// Error occurred while fitting or running one of the classifiers
    ModelError(String),
}

impl ClassifierError {
    /// True for errors that point at an inconsistent bundle rather than bad input.
    pub fn is_internal_consistency(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. } | Self::DecodeOutOfRange { .. }
        )
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::NoRecognizableSymptoms => write!(f, "No valid symptoms provided"),
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "Dimension mismatch: expected {} features, got {}",
                expected, actual
            ),
            Self::UnknownLabel(label) => write!(f, "Unknown disease label: {}", label),
            Self::DecodeOutOfRange { code, classes } => write!(
                f,
                "Label code {} is outside the trained range (0..{})",
                code, classes
            ),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}
