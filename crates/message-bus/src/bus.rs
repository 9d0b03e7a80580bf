// FIFO message bus between collaborators and the player's owning context

use crate::message::{ComponentId, MessagePayload, PlayerMessage};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use frc_core::PlayerError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    /// The bus was released; nothing posted now will ever be delivered
    #[error("message bus is closed")]
    Closed,
    /// Bounded bus is at capacity
    #[error("message bus is full")]
    Full,
}

impl From<BusError> for PlayerError {
    fn from(err: BusError) -> Self {
        PlayerError::Bus(err.to_string())
    }
}

/// Completion signal for a blocking post. Dropping it without calling
/// [`DeliveryAck::complete`] wakes the poster with [`BusError::Closed`].
#[derive(Debug, Default)]
pub struct DeliveryAck(Option<Sender<()>>);

impl DeliveryAck {
    pub fn complete(mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.0.is_some()
    }
}

/// A queued message plus its position in the global delivery order
#[derive(Debug)]
pub struct Envelope {
    pub sequence: u64,
    pub message: PlayerMessage,
    pub ack: DeliveryAck,
}

/// Cloneable posting side of the bus, safe to hand to other threads
#[derive(Clone)]
pub struct BusHandle {
    sender: Sender<Envelope>,
    // Held while sending so sequence numbers match channel order
    next_sequence: Arc<Mutex<u64>>,
}

impl BusHandle {
    /// Enqueue a message for asynchronous delivery. Returns its sequence number.
    pub fn post(&self, target: ComponentId, payload: MessagePayload) -> Result<u64, BusError> {
        self.enqueue(PlayerMessage::new(target, payload), DeliveryAck::default())
    }

    pub fn post_message(&self, message: PlayerMessage) -> Result<u64, BusError> {
        self.enqueue(message, DeliveryAck::default())
    }

    /// Enqueue and wait until the owning context has delivered the message.
    ///
    /// Must not be called from the owning context itself: nothing would
    /// ever deliver the message and the call would never return.
    pub fn blocking_post(&self, target: ComponentId, payload: MessagePayload) -> Result<u64, BusError> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let sequence = self.enqueue(PlayerMessage::new(target, payload), DeliveryAck(Some(tx)))?;
        rx.recv().map_err(|_| BusError::Closed)?;
        Ok(sequence)
    }

    /// Enqueue a batch in order, all or nothing. On a bounded bus without
    /// room for every message this fails with [`BusError::Full`] and queues
    /// none of them. Returns the number of messages queued.
    pub fn post_all(&self, messages: Vec<PlayerMessage>) -> Result<usize, BusError> {
        // Other posters wait on the lock; the receiver only frees room
        let mut next = self.next_sequence.lock();
        if let Some(capacity) = self.sender.capacity() {
            let free = capacity.saturating_sub(self.sender.len());
            if messages.len() > free {
                log::warn!(
                    "Message bus has room for {} of {} messages, rejecting batch",
                    free,
                    messages.len()
                );
                return Err(BusError::Full);
            }
        }

        let count = messages.len();
        for message in messages {
            Self::send_locked(&self.sender, &mut *next, message, DeliveryAck::default())?;
        }
        Ok(count)
    }

    fn enqueue(&self, message: PlayerMessage, ack: DeliveryAck) -> Result<u64, BusError> {
        let mut next = self.next_sequence.lock();
        Self::send_locked(&self.sender, &mut *next, message, ack)
    }

    fn send_locked(
        sender: &Sender<Envelope>,
        next: &mut u64,
        message: PlayerMessage,
        ack: DeliveryAck,
    ) -> Result<u64, BusError> {
        let sequence = *next;
        let target = message.target();
        let envelope = Envelope {
            sequence,
            message,
            ack,
        };

        match sender.try_send(envelope) {
            Ok(()) => {
                *next += 1;
                log::trace!("Posted message #{} to {}", sequence, target);
                Ok(sequence)
            }
            Err(TrySendError::Full(_)) => {
                log::warn!("Message bus full, rejecting message to {}", target);
                Err(BusError::Full)
            }
            Err(TrySendError::Disconnected(_)) => Err(BusError::Closed),
        }
    }
}

/// Receiving side of the bus, owned by the player's single context.
///
/// Delivery is FIFO across all targets and all posting threads.
pub struct MessageBus {
    receiver: Receiver<Envelope>,
    handle: BusHandle,
}

impl MessageBus {
    /// `None` for an unbounded queue
    pub fn new(capacity: Option<usize>) -> Self {
        let (sender, receiver) = match capacity {
            Some(cap) => crossbeam_channel::bounded(cap),
            None => crossbeam_channel::unbounded(),
        };

        Self {
            receiver,
            handle: BusHandle {
                sender,
                next_sequence: Arc::new(Mutex::new(0)),
            },
        }
    }

    pub fn handle(&self) -> BusHandle {
        self.handle.clone()
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    pub fn try_next(&self) -> Option<Envelope> {
        self.receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next message
    pub fn next_timeout(&self, timeout: Duration) -> Option<Envelope> {
        match self.receiver.recv_timeout(timeout) {
            Ok(envelope) => Some(envelope),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drop every pending message without delivering it
    pub fn drain_discard(&self) -> usize {
        self.receiver.try_iter().count()
    }

    /// Discard pending messages and shut the bus. Later posts fail with
    /// [`BusError::Closed`]. Returns the number of discarded messages.
    pub fn close(self) -> usize {
        let discarded = self.drain_discard();
        log::debug!("Message bus closed, {} pending messages discarded", discarded);
        discarded
    }
}
