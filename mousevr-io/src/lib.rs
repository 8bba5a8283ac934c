pub mod channel;
pub mod error;
pub mod serial;
pub mod sink;

pub use channel::{ChannelProducer, InboundChannel, InboundMessage, Outbound, UdpListener};
pub use error::{ChannelError, DeviceError, SinkError};
pub use serial::{RewardDevice, SerialLine};
pub use sink::JsonLinesSink;
