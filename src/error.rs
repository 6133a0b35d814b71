use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{what} must have {expected} components, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("sample time must be a positive finite number, got {0}")]
    InvalidSampleTime(f64),
    #[error("invalid tank parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("invalid {what}: {value}")]
    InvalidValue { what: &'static str, value: f64 },
    #[error("observer used before its {missing} was set")]
    Uninitialized { missing: &'static str },
}
