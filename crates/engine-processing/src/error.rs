use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Targets of sheet '{expected}' cannot be written to sheet '{actual}'")]
    SheetMismatch { expected: String, actual: String },
}
