// Component message bus for the FRC playback core

pub mod bus;
pub mod message;

pub use bus::{BusError, BusHandle, DeliveryAck, Envelope, MessageBus};
pub use message::{BufferSignal, ComponentId, MessagePayload, PlayerMessage};
