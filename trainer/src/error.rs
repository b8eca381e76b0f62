use std::{error::Error, fmt};

use machine_learning::MlErr;

/// The trainer module's result type.
pub type Result<T> = std::result::Result<T, TrainErr>;

/// Training pipeline failures.
#[derive(Debug)]
pub enum TrainErr {
    Ml(MlErr),
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for TrainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainErr::Ml(e) => write!(f, "{e}"),
            TrainErr::InvalidVar { var, value, reason } => {
                write!(f, "invalid value {value:?} for {var}: {reason}")
            }
        }
    }
}

impl Error for TrainErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainErr::Ml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for TrainErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_are_the_source() {
        let err = TrainErr::from(MlErr::SingularMatrix);
        assert_eq!(err.to_string(), MlErr::SingularMatrix.to_string());
        assert!(err.source().is_some());

        let err = TrainErr::InvalidVar {
            var: "FOREST_TREES",
            value: "0".to_string(),
            reason: "number would be zero for non-zero type".to_string(),
        };
        assert!(err.source().is_none());
        assert!(err.to_string().starts_with("invalid value \"0\" for FOREST_TREES"));
    }
}
