//! Inbound message channel between the UDP listener thread and the control
//! loop. The crossbeam queue is the only state the two sides share, apart
//! from the outbound socket and the last peer address.

use crate::error::ChannelError;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const RECV_BUFFER_SIZE: usize = 4096;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One datagram as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub payload: Vec<u8>,
    /// Monotonic milliseconds since the channel was created
    pub timestamp_ms: u64,
}

/// Bounded queue drained by the control loop
pub struct InboundChannel {
    tx: Sender<InboundMessage>,
    rx: Receiver<InboundMessage>,
    dropped: Arc<AtomicU64>,
    epoch: Instant,
}

impl InboundChannel {
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = channel::bounded(capacity);
        Self {
            tx,
            rx,
            dropped: Arc::new(AtomicU64::new(0)),
            epoch: Instant::now(),
        }
    }

    /// Handle for the producing side
    pub fn producer(&self) -> ChannelProducer {
        ChannelProducer {
            tx: self.tx.clone(),
            dropped: Arc::clone(&self.dropped),
            epoch: self.epoch,
        }
    }

    /// Every message queued right now, oldest first. Never blocks.
    pub fn drain(&self) -> Vec<InboundMessage> {
        self.rx.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Messages discarded because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[derive(Clone)]
pub struct ChannelProducer {
    tx: Sender<InboundMessage>,
    dropped: Arc<AtomicU64>,
    epoch: Instant,
}

impl ChannelProducer {
    /// Stamps and enqueues a payload; returns false if it was dropped
    pub fn push(&self, payload: Vec<u8>) -> bool {
        let message = InboundMessage {
            payload,
            timestamp_ms: self.epoch.elapsed().as_millis() as u64,
        };
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("inbound channel full, message dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Reply path back to whoever sent the latest datagram
#[derive(Clone)]
pub struct Outbound {
    socket: Arc<UdpSocket>,
    peer: Arc<Mutex<Option<SocketAddr>>>,
}

impl Outbound {
    pub fn send(&self, payload: &[u8]) -> Result<usize, ChannelError> {
        let peer = (*self.peer.lock()).ok_or(ChannelError::NoPeer)?;
        Ok(self.socket.send_to(payload, peer)?)
    }
}

/// Background UDP reader feeding an [`InboundChannel`]
pub struct UdpListener {
    local_addr: SocketAddr,
    outbound: Outbound,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl UdpListener {
    pub fn bind(addr: &str, producer: ChannelProducer) -> Result<Self, ChannelError> {
        let socket = UdpSocket::bind(addr).map_err(|source| ChannelError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let local_addr = socket.local_addr()?;

        let socket = Arc::new(socket);
        let peer = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let socket = Arc::clone(&socket);
            let peer = Arc::clone(&peer);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("mousevr-udp".into())
                .spawn(move || Self::read_loop(&socket, &peer, &stop, &producer))?
        };

        info!(%local_addr, "channel listening");
        Ok(Self {
            local_addr,
            outbound: Outbound { socket, peer },
            stop,
            handle: Some(handle),
        })
    }

    fn read_loop(
        socket: &UdpSocket,
        peer: &Mutex<Option<SocketAddr>>,
        stop: &AtomicBool,
        producer: &ChannelProducer,
    ) {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        while !stop.load(Ordering::Relaxed) {
            match socket.recv_from(&mut buf) {
                Ok((len, from)) => {
                    *peer.lock() = Some(from);
                    producer.push(buf[..len].to_vec());
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(e) => {
                    warn!("channel receive failed: {}", e);
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }
        debug!("channel reader exiting");
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn outbound(&self) -> Outbound {
        self.outbound.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the reader thread; safe to call more than once
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("channel reader panicked");
            }
            info!("channel stopped");
        }
    }
}

impl Drop for UdpListener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait_for(channel: &InboundChannel, n: usize) -> Vec<InboundMessage> {
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut got = Vec::new();
        while got.len() < n && Instant::now() < deadline {
            got.extend(channel.drain());
            thread::sleep(Duration::from_millis(5));
        }
        got
    }

    #[test]
    fn empty_channel_drains_immediately() {
        let channel = InboundChannel::bounded(4);
        assert!(channel.drain().is_empty());
    }

    #[test]
    fn drain_preserves_arrival_order() {
        let channel = InboundChannel::bounded(8);
        let producer = channel.producer();
        for i in 0..5u8 {
            assert!(producer.push(vec![i]));
        }
        let payloads: Vec<Vec<u8>> = channel.drain().into_iter().map(|m| m.payload).collect();
        assert_eq!(payloads, (0..5u8).map(|i| vec![i]).collect::<Vec<_>>());
        assert!(channel.is_empty());
    }

    #[test]
    fn full_channel_drops_and_counts() {
        let channel = InboundChannel::bounded(2);
        let producer = channel.producer();
        assert!(producer.push(b"a".to_vec()));
        assert!(producer.push(b"b".to_vec()));
        assert!(!producer.push(b"c".to_vec()));
        assert_eq!(channel.dropped(), 1);
        assert_eq!(channel.drain().len(), 2);
    }

    #[test]
    fn producer_works_from_another_thread() {
        let channel = InboundChannel::bounded(64);
        let producer = channel.producer();
        let worker = thread::spawn(move || {
            for i in 0..32u8 {
                producer.push(vec![i]);
            }
        });
        worker.join().unwrap();
        let messages = channel.drain();
        assert_eq!(messages.len(), 32);
        assert!(messages.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
    }

    #[test]
    fn udp_datagrams_arrive_and_replies_go_back() {
        let channel = InboundChannel::bounded(16);
        let mut listener = UdpListener::bind("127.0.0.1:0", channel.producer()).unwrap();
        let outbound = listener.outbound();
        assert!(matches!(outbound.send(b"early"), Err(ChannelError::NoPeer)));

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        client
            .send_to(b"model.get_position('cue')\n", listener.local_addr())
            .unwrap();

        let messages = wait_for(&channel, 1);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].payload, b"model.get_position('cue')\n");

        outbound.send(b"0,0,0").unwrap();
        let mut buf = [0u8; 64];
        let (len, _) = client.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"0,0,0");

        listener.stop();
        listener.stop();
        assert!(!listener.is_running());
    }
}
