/// Suppresses repeats of the same diagnostic until valid input resumes.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticLatch {
    latched: Option<String>,
}

impl DiagnosticLatch {
    /// Returns true when `reason` should be logged, i.e. it differs from the
    /// diagnostic already latched.
    pub fn report(&mut self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        if self.latched.as_deref() == Some(reason.as_str()) {
            return false;
        }
        self.latched = Some(reason);
        true
    }

    /// Release the latch. Returns true if something was latched.
    pub fn clear(&mut self) -> bool {
        self.latched.take().is_some()
    }
}
