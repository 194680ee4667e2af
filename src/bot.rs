use std::thread::sleep;
use std::time::Duration;

use chrono::Utc;

use crate::error::BotError;
use crate::practicum::HomeworkSource;
use crate::status::parse_status;
use crate::telegram::Notifier;
use crate::validate::check_response;

const FAILURE_PREFIX: &str = "Сбой в работе программы";

/// The polling loop: fetch, validate, format, notify, sleep.
pub struct Bot<S, N> {
    source: S,
    notifier: N,
    /// Start of the next polling window, in seconds since the Unix epoch.
    timestamp: i64,
    /// Last failure report that reached the chat, since the last successful cycle.
    last_failure: Option<String>,
    retry_period: Duration,
}

impl<S: HomeworkSource, N: Notifier> Bot<S, N> {
    /// Creates a bot that polls from the current time onwards.
    #[must_use]
    pub fn new(source: S, notifier: N, retry_period: Duration) -> Self {
        Self::with_timestamp(source, notifier, retry_period, Utc::now().timestamp())
    }

    #[must_use]
    pub const fn with_timestamp(
        source: S,
        notifier: N,
        retry_period: Duration,
        timestamp: i64,
    ) -> Self {
        Self {
            source,
            notifier,
            timestamp,
            last_failure: None,
            retry_period,
        }
    }

    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Runs one cycle without any failure handling.
    /// The cursor only advances if the whole cycle succeeds.
    ///
    /// # Errors
    /// Whatever the fetch, validation, formatting or delivery step fails with.
    pub fn iteration(&mut self) -> Result<(), BotError> {
        log::debug!("Iteration (from_date={})", self.timestamp);

        let response = self.source.fetch(self.timestamp)?;
        let checked = check_response(&response)?;

        if let Some(homework) = checked.latest() {
            let message = parse_status(homework)?;
            self.notifier.notify(&message)?;
        } else {
            log::debug!("No new statuses");
        }

        self.timestamp = checked.current_date;
        Ok(())
    }

    /// Runs one cycle and reports its failure, if any. Never panics on errors.
    /// A successful cycle forgets the last failure, so a recurring outage is reported again.
    pub fn tick(&mut self) {
        match self.iteration() {
            Ok(()) => self.last_failure = None,
            Err(err) => self.report_failure(&err),
        }
    }

    fn report_failure(&mut self, err: &BotError) {
        if !err.is_reportable() {
            log::error!("{err}");
            return;
        }

        let message = format!("{FAILURE_PREFIX}: {err}");
        if self.last_failure.as_deref() == Some(message.as_str()) {
            log::debug!("Not repeating failure report: {message}");
            return;
        }

        log::error!("{message}");
        match self.notifier.notify(&message) {
            Ok(()) => self.last_failure = Some(message),
            Err(e) => log::error!("Could not deliver failure report: {e}"),
        }
    }

    /// Polls forever. The sleep happens after every cycle, failed or not.
    pub fn run(&mut self) -> ! {
        log::info!("Polling every {:?}", self.retry_period);
        loop {
            self.tick();
            sleep(self.retry_period);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use serde_json::{Value as JsonValue, json};

    use super::*;

    #[derive(Default)]
    struct FakeSource {
        replies: RefCell<VecDeque<Result<JsonValue, BotError>>>,
        requested: RefCell<Vec<i64>>,
    }

    impl FakeSource {
        fn new(replies: impl IntoIterator<Item = Result<JsonValue, BotError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into_iter().collect()),
                requested: RefCell::default(),
            }
        }
    }

    impl HomeworkSource for FakeSource {
        fn fetch(&self, from_date: i64) -> Result<JsonValue, BotError> {
            self.requested.borrow_mut().push(from_date);
            self.replies
                .borrow_mut()
                .pop_front()
                .expect("fetch called more often than expected")
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        sent: RefCell<Vec<String>>,
        attempts: Cell<usize>,
        broken: Cell<bool>,
    }

    impl Notifier for FakeNotifier {
        fn notify(&self, text: &str) -> Result<(), BotError> {
            self.attempts.set(self.attempts.get() + 1);
            if self.broken.get() {
                return Err(BotError::Telegram(String::from("chat not found")));
            }
            self.sent.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    fn bot(replies: Vec<Result<JsonValue, BotError>>) -> Bot<FakeSource, FakeNotifier> {
        Bot::with_timestamp(
            FakeSource::new(replies),
            FakeNotifier::default(),
            Duration::ZERO,
            1,
        )
    }

    fn connection_refused() -> Result<JsonValue, BotError> {
        Err(BotError::api_unavailable("connection refused"))
    }

    #[test]
    fn status_change_is_sent_and_cursor_advances() {
        let mut bot = bot(vec![Ok(json!({
            "homeworks": [{"homework_name": "hw1", "status": "reviewing"}],
            "current_date": 1000,
        }))]);
        bot.tick();

        assert_eq!(
            *bot.notifier.sent.borrow(),
            ["Изменился статус проверки работы \"hw1\". Работа взята на проверку ревьюером."]
        );
        assert_eq!(bot.timestamp(), 1000);
        assert_eq!(*bot.source.requested.borrow(), [1]);
    }

    #[test]
    fn only_latest_homework_is_reported() {
        let mut bot = bot(vec![Ok(json!({
            "homeworks": [
                {"homework_name": "new", "status": "approved"},
                {"homework_name": "old", "status": "rejected"},
            ],
            "current_date": 7,
        }))]);
        bot.tick();

        let sent = bot.notifier.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("\"new\""));
    }

    #[test]
    fn empty_homeworks_send_nothing_but_advance_cursor() {
        let mut bot = bot(vec![Ok(json!({"homeworks": [], "current_date": 1000}))]);
        bot.tick();

        assert_eq!(bot.notifier.attempts.get(), 0);
        assert_eq!(bot.timestamp(), 1000);
    }

    #[test]
    fn connection_error_is_reported_and_loop_continues() {
        let mut bot = bot(vec![
            connection_refused(),
            Ok(json!({"homeworks": [], "current_date": 50})),
        ]);
        bot.tick();

        {
            let sent = bot.notifier.sent.borrow();
            assert_eq!(sent.len(), 1);
            assert!(sent[0].starts_with("Сбой в работе программы:"));
            assert!(sent[0].contains("Сбой при запросе к эндпоинту"));
        }
        assert_eq!(bot.timestamp(), 1);

        bot.tick();
        assert_eq!(bot.timestamp(), 50);
        assert_eq!(*bot.source.requested.borrow(), [1, 1]);
    }

    #[test]
    fn identical_consecutive_failures_are_sent_once() {
        let mut bot = bot(vec![connection_refused(), connection_refused()]);
        bot.tick();
        bot.tick();

        assert_eq!(bot.notifier.sent.borrow().len(), 1);
    }

    #[test]
    fn distinct_failures_are_each_sent() {
        let mut bot = bot(vec![
            connection_refused(),
            Ok(json!({"current_date": 1})),
            connection_refused(),
        ]);
        bot.tick();
        bot.tick();
        bot.tick();

        let sent = bot.notifier.sent.borrow();
        assert_eq!(sent.len(), 3);
        assert!(sent[1].contains("\"homeworks\""));
    }

    #[test]
    fn invalid_response_keeps_cursor() {
        let mut bot = bot(vec![Ok(json!({"homeworks": "nope", "current_date": 99}))]);
        bot.tick();

        assert_eq!(bot.timestamp(), 1);
        assert_eq!(bot.notifier.sent.borrow().len(), 1);
    }

    #[test]
    fn unknown_status_is_reported() {
        let mut bot = bot(vec![Ok(json!({
            "homeworks": [{"homework_name": "hw", "status": "lost"}],
            "current_date": 2,
        }))]);
        bot.tick();

        let sent = bot.notifier.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("lost"));
        assert_eq!(bot.timestamp(), 1);
    }

    #[test]
    fn failed_delivery_is_retried_next_cycle() {
        let mut bot = bot(vec![connection_refused(), connection_refused()]);
        bot.notifier.broken.set(true);
        bot.tick();
        assert_eq!(bot.notifier.attempts.get(), 1);

        bot.notifier.broken.set(false);
        bot.tick();
        assert_eq!(bot.notifier.attempts.get(), 2);
        assert_eq!(bot.notifier.sent.borrow().len(), 1);
    }

    #[test]
    fn failed_status_delivery_is_not_reported_and_keeps_cursor() {
        let mut bot = bot(vec![Ok(json!({
            "homeworks": [{"homework_name": "hw", "status": "approved"}],
            "current_date": 10,
        }))]);
        bot.notifier.broken.set(true);
        bot.tick();

        // Only the status message was attempted; no failure report follows.
        assert_eq!(bot.notifier.attempts.get(), 1);
        assert_eq!(bot.timestamp(), 1);
    }

    #[test]
    fn failure_after_recovery_is_sent_again() {
        let mut bot = bot(vec![
            connection_refused(),
            Ok(json!({"homeworks": [], "current_date": 2})),
            connection_refused(),
        ]);
        bot.tick();
        bot.tick();
        bot.tick();

        let sent = bot.notifier.sent.borrow();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }
}
