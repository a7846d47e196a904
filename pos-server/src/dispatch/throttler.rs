//! Dispatch Throttler
//!
//! The pacing engine behind bulk sends. Recipients are processed
//! strictly one at a time with randomized gaps between sends, so a
//! campaign looks like a person working through a contact list rather
//! than a bot. A per-recipient gateway failure increments the `failed`
//! counter and moves on; only pre-flight validation aborts a run.

use super::personalize;
use super::{CommunicationLog, MessageTransport};
use async_trait::async_trait;
use rand::Rng;
use shared::models::{DispatchConfig, DispatchProgress, Recipient};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const TYPING_MIN_MS: u64 = 1000;
const TYPING_MAX_MS: u64 = 2000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Recipient list is empty")]
    NoRecipients,
    #[error("Message template is empty")]
    EmptyTemplate,
    #[error("Recipient count {count} exceeds the daily limit of {limit}")]
    LimitExceeded { count: usize, limit: usize },
}

/// Sleep abstraction so tests can run the loop without real delays.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct BulkDispatcher {
    transport: Arc<dyn MessageTransport>,
    comm_log: Arc<dyn CommunicationLog>,
    pacer: Arc<dyn Pacer>,
}

impl BulkDispatcher {
    pub fn new(
        transport: Arc<dyn MessageTransport>,
        comm_log: Arc<dyn CommunicationLog>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            transport,
            comm_log,
            pacer,
        }
    }

    /// Pre-flight checks. Nothing is sent and no counter moves until
    /// these pass.
    pub fn validate(
        template: &str,
        recipients: &[Recipient],
        config: &DispatchConfig,
    ) -> Result<(), DispatchError> {
        if recipients.is_empty() {
            return Err(DispatchError::NoRecipients);
        }
        if template.trim().is_empty() {
            return Err(DispatchError::EmptyTemplate);
        }
        if recipients.len() > config.daily_limit {
            return Err(DispatchError::LimitExceeded {
                count: recipients.len(),
                limit: config.daily_limit,
            });
        }
        Ok(())
    }

    /// Run a campaign to completion, publishing progress after every
    /// recipient. Returns the final tally.
    pub async fn run(
        &self,
        template: &str,
        recipients: &[Recipient],
        config: &DispatchConfig,
        progress_tx: &watch::Sender<DispatchProgress>,
    ) -> Result<DispatchProgress, DispatchError> {
        Self::validate(template, recipients, config)?;

        let total = recipients.len() as u32;
        let mut progress = DispatchProgress {
            current: 0,
            total,
            success: 0,
            failed: 0,
        };
        let _ = progress_tx.send(progress);

        for (index, recipient) in recipients.iter().enumerate() {
            if config.simulate_typing {
                self.simulate_typing(&recipient.phone).await;
            }

            let content = personalize::render(template, recipient, config.personalize);
            match self.transport.send(&recipient.phone, &content).await {
                Ok(()) => {
                    progress.success += 1;
                    self.comm_log
                        .record(&recipient.phone, self.transport.channel(), &content)
                        .await;
                }
                Err(e) => {
                    progress.failed += 1;
                    tracing::warn!("Send to {} failed: {}", recipient.phone, e);
                }
            }
            progress.current = index as u32 + 1;
            let _ = progress_tx.send(progress);

            if index + 1 < recipients.len() {
                self.pacer.pause(self.inter_send_gap(config, index)).await;
            }
        }

        Ok(progress)
    }

    /// Typing runs for 1-2 seconds, but only when the gateway accepted
    /// the typing notification.
    async fn simulate_typing(&self, phone: &str) {
        match self.transport.notify_typing(phone).await {
            Ok(()) => {
                let ms = rand::thread_rng().gen_range(TYPING_MIN_MS..=TYPING_MAX_MS);
                self.pacer.pause(Duration::from_millis(ms)).await;
            }
            Err(e) => {
                tracing::debug!("Typing notification to {} failed: {}", phone, e);
            }
        }
    }

    /// Gap before the next recipient. A batch break replaces the
    /// regular gap at batch boundaries.
    fn inter_send_gap(&self, config: &DispatchConfig, index: usize) -> Duration {
        if let Some(batch_size) = config.batch_size
            && batch_size > 0
            && (index as u32 + 1) % batch_size == 0
        {
            return Duration::from_secs(config.batch_delay_seconds);
        }
        let seconds = if config.random_delay && config.max_delay_seconds > config.min_delay_seconds
        {
            rand::thread_rng().gen_range(config.min_delay_seconds..=config.max_delay_seconds)
        } else {
            config.min_delay_seconds
        };
        Duration::from_secs(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::NoopCommunicationLog;
    use crate::dispatch::transport::TransportError;
    use shared::models::MessageChannel;
    use std::sync::Mutex;

    struct ScriptedTransport {
        // phone -> outcome, everything else succeeds
        failing: Vec<String>,
        sent: Mutex<Vec<(String, String)>>,
        typing_ok: bool,
        typing_calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn all_ok() -> Self {
            Self {
                failing: Vec::new(),
                sent: Mutex::new(Vec::new()),
                typing_ok: true,
                typing_calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_for(phones: &[&str]) -> Self {
            Self {
                failing: phones.iter().map(|p| p.to_string()).collect(),
                ..Self::all_ok()
            }
        }
    }

    #[async_trait]
    impl MessageTransport for ScriptedTransport {
        fn channel(&self) -> MessageChannel {
            MessageChannel::Sms
        }

        async fn send(&self, phone: &str, content: &str) -> Result<(), TransportError> {
            if self.failing.iter().any(|p| p == phone) {
                return Err(TransportError::Rejected("scripted failure".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((phone.to_string(), content.to_string()));
            Ok(())
        }

        async fn notify_typing(&self, phone: &str) -> Result<(), TransportError> {
            self.typing_calls.lock().unwrap().push(phone.to_string());
            if self.typing_ok {
                Ok(())
            } else {
                Err(TransportError::Rejected("no typing support".to_string()))
            }
        }
    }

    struct RecordingPacer {
        pauses: Mutex<Vec<Duration>>,
    }

    impl RecordingPacer {
        fn new() -> Self {
            Self {
                pauses: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Pacer for RecordingPacer {
        async fn pause(&self, duration: Duration) {
            self.pauses.lock().unwrap().push(duration);
        }
    }

    fn recipients(phones: &[&str]) -> Vec<Recipient> {
        phones
            .iter()
            .map(|p| Recipient {
                phone: p.to_string(),
                display_name: Some("Amina".to_string()),
            })
            .collect()
    }

    fn fixed_config() -> DispatchConfig {
        DispatchConfig {
            personalize: true,
            random_delay: false,
            min_delay_seconds: 5,
            max_delay_seconds: 5,
            simulate_typing: false,
            daily_limit: 100,
            batch_size: None,
            batch_delay_seconds: 60,
        }
    }

    fn dispatcher(transport: Arc<ScriptedTransport>, pacer: Arc<RecordingPacer>) -> BulkDispatcher {
        BulkDispatcher::new(transport, Arc::new(NoopCommunicationLog), pacer)
    }

    #[test]
    fn validate_rejects_empty_recipients() {
        let config = fixed_config();
        assert_eq!(
            BulkDispatcher::validate("Hi", &[], &config),
            Err(DispatchError::NoRecipients)
        );
    }

    #[test]
    fn validate_rejects_blank_template() {
        let config = fixed_config();
        assert_eq!(
            BulkDispatcher::validate("   ", &recipients(&["+1"]), &config),
            Err(DispatchError::EmptyTemplate)
        );
    }

    #[test]
    fn validate_rejects_over_daily_limit() {
        let config = DispatchConfig {
            daily_limit: 2,
            ..fixed_config()
        };
        let list = recipients(&["+1", "+2", "+3"]);
        assert_eq!(
            BulkDispatcher::validate("Hi", &list, &config),
            Err(DispatchError::LimitExceeded { count: 3, limit: 2 })
        );
    }

    #[tokio::test]
    async fn sends_sequentially_with_gaps_between_sends_only() {
        let transport = Arc::new(ScriptedTransport::all_ok());
        let pacer = Arc::new(RecordingPacer::new());
        let d = dispatcher(transport.clone(), pacer.clone());
        let (tx, _rx) = watch::channel(DispatchProgress::default());

        let tally = d
            .run("Hi {name}", &recipients(&["+1", "+2", "+3"]), &fixed_config(), &tx)
            .await
            .unwrap();

        assert_eq!(tally.success, 3);
        assert_eq!(tally.failed, 0);
        assert_eq!(tally.current, 3);

        let sent = transport.sent.lock().unwrap();
        let order: Vec<&str> = sent.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(order, vec!["+1", "+2", "+3"]);
        assert_eq!(sent[0].1, "Hi Amina");

        // Two gaps for three recipients, none after the last
        let pauses = pacer.pauses.lock().unwrap();
        assert_eq!(*pauses, vec![Duration::from_secs(5), Duration::from_secs(5)]);
    }

    #[tokio::test]
    async fn failed_sends_are_counted_not_fatal() {
        let transport = Arc::new(ScriptedTransport::failing_for(&["+2"]));
        let pacer = Arc::new(RecordingPacer::new());
        let d = dispatcher(transport.clone(), pacer.clone());
        let (tx, rx) = watch::channel(DispatchProgress::default());

        let tally = d
            .run("Hi", &recipients(&["+1", "+2", "+3"]), &fixed_config(), &tx)
            .await
            .unwrap();

        assert_eq!(tally.success, 2);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.current, 3);
        assert_eq!(rx.borrow().current, 3);
    }

    #[tokio::test]
    async fn typing_pause_only_when_gateway_accepts() {
        let mut transport = ScriptedTransport::all_ok();
        transport.typing_ok = false;
        let transport = Arc::new(transport);
        let pacer = Arc::new(RecordingPacer::new());
        let d = dispatcher(transport.clone(), pacer.clone());
        let (tx, _rx) = watch::channel(DispatchProgress::default());

        let config = DispatchConfig {
            simulate_typing: true,
            ..fixed_config()
        };
        d.run("Hi", &recipients(&["+1"]), &config, &tx).await.unwrap();

        assert_eq!(transport.typing_calls.lock().unwrap().len(), 1);
        // Single recipient: no inter-send gap, and rejected typing adds no pause
        assert!(pacer.pauses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn typing_pause_is_one_to_two_seconds() {
        let transport = Arc::new(ScriptedTransport::all_ok());
        let pacer = Arc::new(RecordingPacer::new());
        let d = dispatcher(transport.clone(), pacer.clone());
        let (tx, _rx) = watch::channel(DispatchProgress::default());

        let config = DispatchConfig {
            simulate_typing: true,
            ..fixed_config()
        };
        d.run("Hi", &recipients(&["+1"]), &config, &tx).await.unwrap();

        let pauses = pacer.pauses.lock().unwrap();
        assert_eq!(pauses.len(), 1);
        assert!(pauses[0] >= Duration::from_millis(1000));
        assert!(pauses[0] <= Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn random_gaps_stay_within_configured_bounds() {
        let transport = Arc::new(ScriptedTransport::all_ok());
        let pacer = Arc::new(RecordingPacer::new());
        let d = dispatcher(transport.clone(), pacer.clone());
        let (tx, _rx) = watch::channel(DispatchProgress::default());

        let config = DispatchConfig {
            random_delay: true,
            min_delay_seconds: 3,
            max_delay_seconds: 8,
            ..fixed_config()
        };
        let list = recipients(&["+1", "+2", "+3", "+4", "+5"]);
        d.run("Hi", &list, &config, &tx).await.unwrap();

        let pauses = pacer.pauses.lock().unwrap();
        assert_eq!(pauses.len(), 4);
        for p in pauses.iter() {
            assert!(*p >= Duration::from_secs(3));
            assert!(*p <= Duration::from_secs(8));
        }
    }

    #[tokio::test]
    async fn batch_break_replaces_regular_gap_at_boundary() {
        let transport = Arc::new(ScriptedTransport::all_ok());
        let pacer = Arc::new(RecordingPacer::new());
        let d = dispatcher(transport.clone(), pacer.clone());
        let (tx, _rx) = watch::channel(DispatchProgress::default());

        let config = DispatchConfig {
            batch_size: Some(2),
            batch_delay_seconds: 120,
            ..fixed_config()
        };
        let list = recipients(&["+1", "+2", "+3", "+4"]);
        d.run("Hi", &list, &config, &tx).await.unwrap();

        let pauses = pacer.pauses.lock().unwrap();
        assert_eq!(
            *pauses,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(120),
                Duration::from_secs(5),
            ]
        );
    }

    #[tokio::test]
    async fn validation_failure_sends_nothing() {
        let transport = Arc::new(ScriptedTransport::all_ok());
        let pacer = Arc::new(RecordingPacer::new());
        let d = dispatcher(transport.clone(), pacer.clone());
        let (tx, _rx) = watch::channel(DispatchProgress::default());

        let config = DispatchConfig {
            daily_limit: 1,
            ..fixed_config()
        };
        let result = d
            .run("Hi", &recipients(&["+1", "+2"]), &config, &tx)
            .await;

        assert!(matches!(result, Err(DispatchError::LimitExceeded { .. })));
        assert!(transport.sent.lock().unwrap().is_empty());
    }
}
