//! Typed host errors.
//!
//! The kernel contract treats mis-sized buffers as caller bugs. The host is
//! that caller, so it checks every precondition before `eval` and reports
//! violations here instead.

use std::fmt;

use evalkern_kernel::function::memory::MemoryError;
use evalkern_kernel::proof::manifest::ManifestError;

/// Which side of the call a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSide {
    /// Input slot.
    Input,
    /// Output slot.
    Output,
}

impl fmt::Display for SlotSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Failure of a host operation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// Wrong number of input or output buffers.
    ArityMismatch {
        side: SlotSide,
        expected: usize,
        actual: usize,
    },
    /// A present buffer is shorter than its slot's nonzero count.
    BufferTooSmall {
        side: SlotSide,
        slot: usize,
        expected: usize,
        actual: usize,
    },
    /// A name-keyed call used a name the kernel does not declare.
    UnknownSlotName { side: SlotSide, name: String },
    /// Opening another session would exceed `max_sessions`.
    SessionLimit { max_sessions: usize },
    /// The kernel's memory lifecycle failed.
    Memory(MemoryError),
    /// The kernel returned a non-zero status.
    EvalFailed { kernel: String, status: i32, detail: String },
    /// The kernel's manifest could not be built.
    Manifest(ManifestError),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArityMismatch {
                side,
                expected,
                actual,
            } => write!(f, "expected {expected} {side} buffers, got {actual}"),
            Self::BufferTooSmall {
                side,
                slot,
                expected,
                actual,
            } => write!(
                f,
                "{side} {slot} needs {expected} nonzeros, buffer holds {actual}"
            ),
            Self::UnknownSlotName { side, name } => write!(f, "no {side} named {name:?}"),
            Self::SessionLimit { max_sessions } => {
                write!(f, "session limit of {max_sessions} reached")
            }
            Self::Memory(e) => write!(f, "memory lifecycle failed: {e}"),
            Self::EvalFailed {
                kernel,
                status,
                detail,
            } => write!(f, "kernel {kernel} returned status {status}: {detail}"),
            Self::Manifest(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for HostError {}

impl From<MemoryError> for HostError {
    fn from(e: MemoryError) -> Self {
        Self::Memory(e)
    }
}

impl From<ManifestError> for HostError {
    fn from(e: ManifestError) -> Self {
        Self::Manifest(e)
    }
}
