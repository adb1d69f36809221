//! Hands accepted messages to the destination router.

use std::fmt::Debug;

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    host::Host,
    message::{ForwardedMessage, RampEvent},
    proxy::CallContext,
};

/// The entry point of a destination router. A router only ever sees the forwarded message and
/// has no access to the bridge, so it cannot call back into it while a call is in progress.
pub trait Router: Debug + Send + Sync {
    fn accept_message(&self, message: &ForwardedMessage) -> Result<()>;
}

/// What happened when a forwarded message was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    Rejected(String),
    NoRouter,
}

/// Announces `message` and queues it for delivery. Delivery happens once the call that
/// accepted the message has been committed.
pub fn forward(ctx: &mut CallContext<'_>, message: ForwardedMessage) {
    ctx.emit(RampEvent::ForwardMessageCalled(message.clone()));
    ctx.enqueue(message);
}

/// Delivers `message` to the router deployed at its receiver. Failures are reported but never
/// retried and never undo the acceptance of the message.
pub fn deliver(host: &Host, message: &ForwardedMessage) -> Delivery {
    let message_id = message.message_id;
    let receiver = message.receiver;
    let Some(router) = host.router(&receiver) else {
        warn!(%message_id, %receiver, "no router deployed at receiver");
        return Delivery::NoRouter;
    };

    match router.accept_message(message) {
        Ok(()) => {
            info!(%message_id, %receiver, "message delivered");
            Delivery::Accepted
        }
        Err(e) => {
            warn!(%message_id, %receiver, error = %e, "router rejected message");
            Delivery::Rejected(e.to_string())
        }
    }
}
