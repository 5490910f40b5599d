use std::time::Instant;

/// Logs the wall time of one pipeline pass when dropped.
pub struct PassTimer {
    pass: &'static str,
    start: Instant,
}

impl PassTimer {
    pub fn new(pass: &'static str) -> Self {
        Self {
            pass,
            start: Instant::now(),
        }
    }
}

impl Drop for PassTimer {
    fn drop(&mut self) {
        log::debug!("{} finished in {:?}", self.pass, self.start.elapsed());
    }
}
