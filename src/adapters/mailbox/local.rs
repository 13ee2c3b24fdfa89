//! Local Transport - In-Process Mailbox Fabric
//!
//! Implements the mailbox contract inside one process: dispatches go
//! onto an unbounded queue and a pump task delivers them to handlers
//! registered per `(domain, address)`. Delivery is asynchronous and
//! decoupled from dispatch, matching the contract's "eventually, at
//! some later time" semantics; nothing here suppresses duplicates or
//! orders messages across senders.
//!
//! Each `LocalMailbox` endpoint is bound to one sending identity: the
//! delivered notification carries that identity as the message
//! sender, which is how the relay context propagates who dispatched.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ports::mailbox::{DispatchReceipt, Mailbox, MessageHandler};

/// One queued message.
#[derive(Debug, Clone)]
struct Envelope {
    message_id: Uuid,
    origin_domain: u32,
    sender: Address,
    destination_domain: u32,
    recipient: Address,
    payload: Bytes,
}

type Routes = Arc<RwLock<HashMap<(u32, Address), Arc<dyn MessageHandler>>>>;

/// Shared in-process transport fabric.
///
/// Clone-cheap handle: endpoints and the pump share the same queue
/// and route table.
#[derive(Clone)]
pub struct LocalTransport {
    tx: mpsc::UnboundedSender<Envelope>,
    routes: Routes,
}

impl LocalTransport {
    /// Create the fabric and its delivery pump.
    ///
    /// The pump must be spawned (`DeliveryPump::run`) for deliveries
    /// to happen; until then dispatches queue up.
    pub fn new() -> (Self, DeliveryPump) {
        let (tx, rx) = mpsc::unbounded_channel();
        let routes: Routes = Arc::new(RwLock::new(HashMap::new()));

        let transport = Self {
            tx,
            routes: Arc::clone(&routes),
        };
        let pump = DeliveryPump { rx, routes };

        (transport, pump)
    }

    /// Register a recipient handler at `(domain, address)`.
    pub async fn register(
        &self,
        domain: u32,
        address: Address,
        handler: Arc<dyn MessageHandler>,
    ) {
        self.routes.write().await.insert((domain, address), handler);
        info!(domain, address = %address, "Transport recipient registered");
    }

    /// Create a dispatching endpoint bound to one sending identity on
    /// one origin domain.
    pub fn endpoint(&self, origin_domain: u32, sender: Address) -> LocalMailbox {
        LocalMailbox {
            origin_domain,
            sender,
            tx: self.tx.clone(),
        }
    }
}

/// Dispatching endpoint for one `(origin domain, sender)` identity.
pub struct LocalMailbox {
    origin_domain: u32,
    sender: Address,
    tx: mpsc::UnboundedSender<Envelope>,
}

#[async_trait]
impl Mailbox for LocalMailbox {
    async fn dispatch(
        &self,
        destination_domain: u32,
        recipient: Address,
        payload: Bytes,
    ) -> Result<DispatchReceipt> {
        let message_id = Uuid::new_v4();
        let envelope = Envelope {
            message_id,
            origin_domain: self.origin_domain,
            sender: self.sender,
            destination_domain,
            recipient,
            payload,
        };

        // Queue closed means the pump is gone: a synchronous dispatch
        // failure the caller must surface.
        self.tx
            .send(envelope)
            .map_err(|_| anyhow::anyhow!("transport pump is not running"))?;

        debug!(
            message_id = %message_id,
            destination_domain,
            recipient = %recipient,
            "Message queued for delivery"
        );

        Ok(DispatchReceipt {
            message_id,
            destination_domain,
            recipient,
        })
    }
}

/// Consumes the queue and invokes registered handlers.
pub struct DeliveryPump {
    rx: mpsc::UnboundedReceiver<Envelope>,
    routes: Routes,
}

impl DeliveryPump {
    /// Deliver messages until shutdown or all senders are dropped.
    ///
    /// A handler rejection (decode/authorization) is terminal for
    /// that delivery: it is logged and dropped, never retried, since
    /// redelivery of a rejected message can only be rejected again.
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("Transport delivery pump started");

        loop {
            let envelope = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Delivery pump received shutdown signal");
                    break;
                }
                next = self.rx.recv() => match next {
                    Some(envelope) => envelope,
                    None => {
                        info!("All transport endpoints dropped, pump exiting");
                        break;
                    }
                },
            };

            self.deliver(envelope).await;
        }

        Ok(())
    }

    async fn deliver(&self, envelope: Envelope) {
        let handler = {
            let routes = self.routes.read().await;
            routes
                .get(&(envelope.destination_domain, envelope.recipient))
                .cloned()
        };

        let Some(handler) = handler else {
            warn!(
                destination_domain = envelope.destination_domain,
                recipient = %envelope.recipient,
                "No recipient registered, dropping message"
            );
            return;
        };

        match handler
            .handle_message(envelope.origin_domain, envelope.sender, &envelope.payload)
            .await
        {
            Ok(()) => debug!(message_id = %envelope.message_id, "Message delivered"),
            Err(e) => warn!(
                message_id = %envelope.message_id,
                error = %e,
                "Recipient rejected message"
            ),
        }
    }
}
