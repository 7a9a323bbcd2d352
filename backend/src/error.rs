//! Errors raised while compiling a pixel function.

use thiserror::Error;

use crate::regcache::Purpose;

/// Why a pixel function could not be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("code buffer full: {remaining} bytes free, {needed} required")]
    CodeBufferFull { remaining: usize, needed: usize },

    #[error("out of registers while binding {0:?}")]
    OutOfRegisters(Purpose),

    #[error("no register is bound to {0:?}")]
    UnboundPurpose(Purpose),
}

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
