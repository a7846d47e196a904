//! Bulk Message Dispatch
//!
//! Sequential, paced delivery of templated messages to a recipient
//! list. The throttler is deliberately slow: one recipient at a time
//! with randomized gaps, to keep gateway accounts off carrier and
//! WhatsApp ban radars.

pub mod personalize;
pub mod service;
pub mod throttler;
pub mod transport;

use async_trait::async_trait;
use shared::models::MessageChannel;

pub use service::DispatchService;
pub use throttler::{BulkDispatcher, DispatchError, Pacer, TokioPacer};
pub use transport::{MessageTransport, SmsGateway, TransportError, WhatsAppGateway};

/// Per-message delivery trail. Failures are swallowed by callers; a
/// lost log row never fails a send.
#[async_trait]
pub trait CommunicationLog: Send + Sync {
    async fn record(&self, phone: &str, channel: MessageChannel, content: &str);
}

/// Log sink for tests and for transports that carry their own history.
pub struct NoopCommunicationLog;

#[async_trait]
impl CommunicationLog for NoopCommunicationLog {
    async fn record(&self, _phone: &str, _channel: MessageChannel, _content: &str) {}
}
