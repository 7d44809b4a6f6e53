// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background reply pipeline.
//!
//! The webhook handler acknowledges the platform synchronously and hands the
//! accepted event here. Each event runs context fetch, backend routing, and
//! the reply send in its own task. A semaphore caps how many pipelines run at
//! once; when no permit is free the event is dropped rather than queued, so a
//! delivery flood cannot pile up unbounded work behind the webhook.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{info, warn};

use larkrelay_core::{ConversationId, InboundEvent, MessageId, ReplyRequest};
use larkrelay_platform::PlatformClient;
use larkrelay_prometheus::{record_dispatch_latency, set_dispatch_in_flight};
use larkrelay_router::BackendRouter;

use crate::stats::RelayStats;

/// Spawns and bounds the per-event reply pipelines.
pub struct Dispatcher {
    platform: Arc<PlatformClient>,
    router: Arc<BackendRouter>,
    stats: Arc<RelayStats>,
    semaphore: Arc<Semaphore>,
    max_in_flight: usize,
    history_limit: u32,
}

impl Dispatcher {
    pub fn new(
        platform: Arc<PlatformClient>,
        router: Arc<BackendRouter>,
        stats: Arc<RelayStats>,
        max_in_flight: usize,
        history_limit: u32,
    ) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            platform,
            router,
            stats,
            semaphore: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            history_limit,
        }
    }

    /// Start a reply pipeline for an admitted text message.
    ///
    /// Returns `false` when every pipeline slot is busy; the event is counted
    /// as dropped and no reply will be produced for it.
    pub fn dispatch(self: &Arc<Self>, event: InboundEvent, text: String) -> bool {
        let permit = match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(
                    conversation = %event.conversation_id.0,
                    max_in_flight = self.max_in_flight,
                    "reply pipelines saturated, dropping event"
                );
                self.stats.record_dropped();
                return false;
            }
        };

        self.record_in_flight();
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            dispatcher.process(event, text).await;
            drop(permit);
            dispatcher.record_in_flight();
        });
        true
    }

    async fn process(&self, event: InboundEvent, text: String) {
        let task_id = uuid::Uuid::new_v4();
        let started = Instant::now();
        info!(
            task_id = %task_id,
            conversation = %event.conversation_id.0,
            sender = %event.sender_id.0,
            "reply pipeline started"
        );

        let history = self
            .platform
            .fetch_history(&event.conversation_id, self.history_limit)
            .await;

        let request = ReplyRequest {
            message: text,
            sender_id: Some(event.sender_id.0.clone()),
            conversation_id: Some(event.conversation_id.0.clone()),
            history,
        };
        let reply = self.router.reply(&request).await;

        let sent = self
            .platform
            .send_reply(&event.conversation_id, &reply, event.message_id.as_ref())
            .await;
        self.stats.record_reply(sent);
        record_dispatch_latency(started.elapsed().as_secs_f64());

        if sent {
            info!(
                task_id = %task_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "reply pipeline finished"
            );
        } else {
            warn!(
                task_id = %task_id,
                conversation = %event.conversation_id.0,
                "reply pipeline finished but delivery failed"
            );
        }
    }

    /// Send a fixed notice outside the pipeline (courtesy replies for
    /// unsupported message types and denied senders). Notices do not consume
    /// a pipeline slot.
    pub fn dispatch_notice(
        self: &Arc<Self>,
        conversation: ConversationId,
        text: String,
        in_reply_to: Option<MessageId>,
    ) {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            let sent = dispatcher
                .platform
                .send_reply(&conversation, &text, in_reply_to.as_ref())
                .await;
            if !sent {
                warn!(conversation = %conversation.0, "courtesy notice delivery failed");
            }
        });
    }

    fn record_in_flight(&self) {
        let in_flight = self.max_in_flight - self.semaphore.available_permits();
        set_dispatch_in_flight(in_flight as f64);
    }
}
