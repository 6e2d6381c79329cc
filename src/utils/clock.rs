use chrono::{DateTime, SubsecRound, Utc};

/// Represents an entity responsible for providing dates across application. This can allow it to
/// be used for testing
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Sync + Send + 'static {
    /// Current moment. Records are stored with whole seconds, so implementations are expected to
    /// drop the fractional part.
    fn time(&self) -> DateTime<Utc>;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}
