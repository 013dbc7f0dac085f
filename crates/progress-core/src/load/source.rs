//! Where the current system load comes from.

/// A "current system load" query. `None` means the mechanism is unavailable.
pub trait LoadSource {
    fn current_load(&mut self) -> Option<f64>;
}

/// One-minute load average from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLoad;

impl LoadSource for SystemLoad {
    #[cfg(unix)]
    fn current_load(&mut self) -> Option<f64> {
        let mut avg = [0f64; 1];
        let n = unsafe { libc::getloadavg(avg.as_mut_ptr(), 1) };
        if n < 1 {
            tracing::debug!(ret = n, "getloadavg failed");
            return None;
        }
        Some(avg[0])
    }

    #[cfg(not(unix))]
    fn current_load(&mut self) -> Option<f64> {
        None
    }
}

impl<F> LoadSource for F
where
    F: FnMut() -> Option<f64>,
{
    fn current_load(&mut self) -> Option<f64> {
        self()
    }
}
