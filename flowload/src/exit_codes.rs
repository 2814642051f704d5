#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// The run completed, recorded failed requests, and `--fail-on-errors` was set.
    FailuresRecorded = 10,

    /// Invalid CLI/config input (bad flags, bad URL, zero users, unreadable config file).
    InvalidInput = 30,

    /// Internal/runtime error (IO errors writing results, task join failures).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_run(total_errors: u64, fail_on_errors: bool) -> Self {
        if fail_on_errors && total_errors > 0 {
            Self::FailuresRecorded
        } else {
            Self::Success
        }
    }
}
