//! Exit status accumulation.

use parking_lot::Mutex;

/// Exit status for a successful invocation.
pub const SUCCESS: i32 = 0;

/// Exit status for a failed handler or an output failure.
pub const FAILURE: i32 = 1;

/// Exit status reserved for usage errors (unknown command, bad flags,
/// malformed help invocation).
pub const USAGE_ERROR: i32 = 2;

/// Monotone exit-status accumulator.
///
/// Starts at [`SUCCESS`]. Every error path raises it; nothing lowers it.
#[derive(Debug, Default)]
pub struct ExitStatus {
    code: Mutex<i32>,
}

impl ExitStatus {
    /// Create an accumulator at [`SUCCESS`].
    pub fn new() -> Self {
        Self {
            code: Mutex::new(SUCCESS),
        }
    }

    /// Raise the status to at least `code`.
    pub fn raise(&self, code: i32) {
        let mut current = self.code.lock();
        if *current < code {
            *current = code;
        }
    }

    /// Current accumulated status.
    pub fn get(&self) -> i32 {
        *self.code.lock()
    }

    /// Whether any error path has raised the status.
    pub fn is_failure(&self) -> bool {
        self.get() != SUCCESS
    }
}

/// Map an accumulated status onto the range a process can exit with.
///
/// Codes outside `0..=255` become [`FAILURE`], so they never wrap to success.
pub fn process_code(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(FAILURE as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_success() {
        let status = ExitStatus::new();
        assert_eq!(status.get(), SUCCESS);
        assert!(!status.is_failure());
    }

    #[test]
    fn test_raise_never_lowers() {
        let status = ExitStatus::new();
        status.raise(USAGE_ERROR);
        status.raise(FAILURE);
        assert_eq!(status.get(), USAGE_ERROR);

        status.raise(SUCCESS);
        assert_eq!(status.get(), USAGE_ERROR);
        assert!(status.is_failure());
    }

    #[test]
    fn test_process_code_never_wraps_to_success() {
        assert_eq!(process_code(SUCCESS), 0);
        assert_eq!(process_code(USAGE_ERROR), 2);
        assert_eq!(process_code(255), 255);
        assert_eq!(process_code(256), 1);
        assert_eq!(process_code(512), 1);
        assert_eq!(process_code(-3), 1);
    }

    #[test]
    fn test_raise_to_custom_code() {
        let status = ExitStatus::new();
        status.raise(FAILURE);
        status.raise(42);
        assert_eq!(status.get(), 42);
    }
}
