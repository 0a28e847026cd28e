#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// One or more checks failed at least once.
    ChecksFailed = 10,

    /// Invalid CLI/config/plan (bad flags, invalid durations, unknown variables, bad checks, etc.).
    InvalidInput = 30,

    /// Internal/runtime error (IO errors, output failures).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_checks(checks_failed: bool) -> Self {
        if checks_failed {
            Self::ChecksFailed
        } else {
            Self::Success
        }
    }
}
