use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    EmptyDataset,
    InvalidSplit {
        test_size: f64,
        samples: usize,
    },
    NotFitted {
        what: &'static str,
    },
    SingularMatrix,
    Distribution(String),
    Artifact(String),
    Io(io::Error),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => format!("There's a size mismatch in {what}, got {got} and expected {expected}"),
            MlErr::EmptyDataset => "Cannot operate on an empty dataset".to_string(),
            MlErr::InvalidSplit { test_size, samples } => format!(
                "A test size of {test_size} over {samples} samples leaves one of the splits empty"
            ),
            MlErr::NotFitted { what } => format!("The {what} must be fitted before predicting"),
            MlErr::SingularMatrix => {
                "The normal equations are singular, the features are collinear".to_string()
            }
            MlErr::Distribution(e) => format!("Invalid sampling distribution: {e}"),
            MlErr::Artifact(e) => format!("Invalid model artifact: {e}"),
            MlErr::Io(e) => format!("io error: {e}"),
        };

        write!(f, "{s}")
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for MlErr {
    fn from(value: serde_json::Error) -> Self {
        match value.io_error_kind() {
            Some(kind) => Self::Io(io::Error::new(kind, value)),
            None => Self::Artifact(value.to_string()),
        }
    }
}

impl From<rand::distr::uniform::Error> for MlErr {
    fn from(value: rand::distr::uniform::Error) -> Self {
        Self::Distribution(value.to_string())
    }
}

impl From<rand_distr::NormalError> for MlErr {
    fn from(value: rand_distr::NormalError) -> Self {
        Self::Distribution(value.to_string())
    }
}
