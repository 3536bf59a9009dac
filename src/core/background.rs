//! Background execution grant while the alarm is armed.
//!
//! A backgrounded process may be suspended by its host. While an alarm is armed we ask
//! the host for a time-limited grant under the task name `AlarmTimer`. The grant is
//! released on foreground, cancel and fire. An expired grant is released and not retried.

use chrono::{DateTime, Duration, Local};

use crate::backend::{GrantId, HostLifecycle};
use crate::common::constants::BACKGROUND_TASK_NAME;

#[derive(Debug, Clone, Copy)]
struct ActiveGrant {
    id: GrantId,
    expires_at: DateTime<Local>,
}

pub struct BackgroundKeeper {
    host: Box<dyn HostLifecycle>,
    grant: Option<ActiveGrant>,
    backgrounded: bool,
    grant_length: Duration,
}

impl BackgroundKeeper {
    pub fn new(host: Box<dyn HostLifecycle>, grant_length: Duration) -> Self {
        Self {
            host,
            grant: None,
            backgrounded: false,
            grant_length,
        }
    }

    /// The process went to the background. Requests a grant when an alarm is armed.
    pub fn enter_background(&mut self, now: DateTime<Local>, armed: bool) {
        self.backgrounded = true;
        if armed {
            self.request(now);
        }
    }

    /// The process is in front again; no grant is needed.
    pub fn enter_foreground(&mut self) {
        self.backgrounded = false;
        self.release();
    }

    /// An alarm was armed. Requests a grant if already in the background.
    pub fn on_armed(&mut self, now: DateTime<Local>) {
        if self.backgrounded {
            self.request(now);
        }
    }

    /// Release the grant if one is held.
    pub fn release(&mut self) {
        if let Some(grant) = self.grant.take() {
            self.host.end_background_task(grant.id);
        }
    }

    /// Release an expired grant. Returns true when a grant expired on this tick.
    pub fn tick(&mut self, now: DateTime<Local>) -> bool {
        match self.grant {
            Some(grant) if now >= grant.expires_at => {
                self.release();
                true
            }
            _ => false,
        }
    }

    fn request(&mut self, now: DateTime<Local>) {
        if self.grant.is_some() {
            return;
        }
        match self.host.begin_background_task(BACKGROUND_TASK_NAME) {
            Some(id) => {
                self.grant = Some(ActiveGrant {
                    id,
                    expires_at: now + self.grant_length,
                });
            }
            None => {
                log_warning!("Background execution was refused; the alarm may be delayed");
            }
        }
    }

    pub fn has_grant(&self) -> bool {
        self.grant.is_some()
    }

    pub fn is_backgrounded(&self) -> bool {
        self.backgrounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockHostLifecycle;
    use crate::common::logger::Log;
    use chrono::TimeZone;
    use mockall::predicate::eq;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 15, 23, 0, 0).single().unwrap()
    }

    #[test]
    fn test_grant_requested_only_when_armed() {
        let mut host = MockHostLifecycle::new();
        host.expect_begin_background_task()
            .withf(|name| name == "AlarmTimer")
            .times(1)
            .return_const(Some(GrantId(7)));
        host.expect_end_background_task()
            .with(eq(GrantId(7)))
            .times(1)
            .return_const(());

        let mut keeper = BackgroundKeeper::new(Box::new(host), Duration::seconds(30));
        keeper.enter_background(now(), false);
        assert!(!keeper.has_grant());

        keeper.enter_foreground();
        keeper.enter_background(now(), true);
        assert!(keeper.has_grant());

        keeper.enter_foreground();
        assert!(!keeper.has_grant());
    }

    #[test]
    fn test_expired_grant_is_released_and_not_retried() {
        let mut host = MockHostLifecycle::new();
        host.expect_begin_background_task()
            .times(1)
            .return_const(Some(GrantId(1)));
        host.expect_end_background_task().times(1).return_const(());

        let mut keeper = BackgroundKeeper::new(Box::new(host), Duration::seconds(30));
        keeper.enter_background(now(), true);

        assert!(!keeper.tick(now() + Duration::seconds(29)));
        assert!(keeper.tick(now() + Duration::seconds(30)));
        assert!(!keeper.tick(now() + Duration::seconds(31)));
        assert!(!keeper.has_grant());
        assert!(keeper.is_backgrounded());
    }

    #[test]
    fn test_arming_while_backgrounded_requests_grant() {
        let mut host = MockHostLifecycle::new();
        host.expect_begin_background_task()
            .times(1)
            .return_const(Some(GrantId(3)));

        let mut keeper = BackgroundKeeper::new(Box::new(host), Duration::seconds(30));
        keeper.enter_background(now(), false);
        keeper.on_armed(now());
        keeper.on_armed(now());
        assert!(keeper.has_grant());
    }

    #[test]
    fn test_refused_grant_is_logged_not_fatal() {
        Log::set_enabled(false);
        let mut host = MockHostLifecycle::new();
        host.expect_begin_background_task().return_const(None);
        host.expect_end_background_task().never();

        let mut keeper = BackgroundKeeper::new(Box::new(host), Duration::seconds(30));
        keeper.enter_background(now(), true);
        assert!(!keeper.has_grant());
        keeper.release();
    }
}
