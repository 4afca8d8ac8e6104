/// Collapse an `ExitStatus` into a single integer exit code.
///
/// A child terminated by signal `n` reports `128 + n`, matching what a shell
/// would print for `$?`.
pub fn normalize_exit(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(code) = status.code() {
            code
        } else if let Some(sig) = status.signal() {
            128 + sig
        } else {
            1
        }
    }
    #[cfg(windows)]
    {
        status.code().unwrap_or(1)
    }
}
