//! Link transports for telemetry and commands.
//!
//! The wireless link is UDP: unsolicited telemetry datagrams arrive on a
//! bound socket, and commands go out fire-and-forget to the robot's address.
//! Both directions sit behind small traits so the core can run against mock
//! links in tests.

use std::collections::VecDeque;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Maximum telemetry datagram size.
const MAX_DATAGRAM_SIZE: usize = 1024;

/// Inbound half of the link: yields one decoded message per datagram.
pub trait TelemetryLink: Send {
    /// Receive the next message, or `None` on a receive timeout.
    ///
    /// A timeout is the normal quiet-link case, not an error; implementations
    /// must block at most their configured timeout so shutdown stays
    /// responsive.
    fn recv_message(&mut self) -> Result<Option<String>>;
}

/// Outbound half of the link: transmits one encoded line.
///
/// Shared by the navigation controller and manual passthrough, so it takes
/// `&self` and must be thread-safe.
pub trait CommandSink: Send + Sync {
    /// Transmit a single command line.
    fn send_line(&self, line: &str) -> Result<()>;
}

/// UDP telemetry receiver bound to a local address.
pub struct UdpLink {
    socket: UdpSocket,
    buffer: Vec<u8>,
}

impl UdpLink {
    /// Bind to `bind_addr` with the given receive timeout.
    pub fn bind(bind_addr: &str, recv_timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_read_timeout(Some(recv_timeout))?;
        log::info!("telemetry link bound to {}", bind_addr);
        Ok(Self {
            socket,
            buffer: vec![0u8; MAX_DATAGRAM_SIZE],
        })
    }
}

impl TelemetryLink for UdpLink {
    fn recv_message(&mut self) -> Result<Option<String>> {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((len, _src)) => {
                let text = String::from_utf8_lossy(&self.buffer[..len]);
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// UDP command sender targeting the robot's address.
pub struct UdpCommandLink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpCommandLink {
    /// Create a sender aimed at `robot_addr`.
    pub fn connect(robot_addr: &str) -> Result<Self> {
        let target = robot_addr
            .to_socket_addrs()
            .map_err(|e| Error::InvalidAddress {
                addr: robot_addr.to_string(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| Error::InvalidAddress {
                addr: robot_addr.to_string(),
                reason: "resolved to no addresses".to_string(),
            })?;
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        log::info!("command link targeting {}", target);
        Ok(Self { socket, target })
    }
}

impl CommandSink for UdpCommandLink {
    fn send_line(&self, line: &str) -> Result<()> {
        self.socket.send_to(line.as_bytes(), self.target)?;
        Ok(())
    }
}

/// Mock telemetry link for unit testing: messages are injected from the test
/// and handed out one per `recv_message` call.
#[derive(Clone, Default)]
pub struct MockLink {
    queue: Arc<Mutex<VecDeque<String>>>,
}

impl MockLink {
    /// Create an empty mock link.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a message to be received.
    pub fn inject(&self, message: &str) {
        self.queue.lock().push_back(message.to_string());
    }
}

impl TelemetryLink for MockLink {
    fn recv_message(&mut self) -> Result<Option<String>> {
        let message = self.queue.lock().pop_front();
        if message.is_none() {
            // Emulate the real link's receive timeout instead of spinning
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(message)
    }
}

/// Mock command sink recording every transmitted line.
#[derive(Clone, Default)]
pub struct MockSink {
    sent: Arc<Mutex<Vec<String>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockSink {
    /// Create an empty mock sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines sent so far, in program order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Clear the sent-line record.
    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    /// Make subsequent sends fail, to exercise fire-and-forget behavior.
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

impl CommandSink for MockSink {
    fn send_line(&self, line: &str) -> Result<()> {
        if *self.fail.lock() {
            return Err(Error::Other("mock link down".to_string()));
        }
        self.sent.lock().push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_link_hands_out_injected_messages() {
        let mut link = MockLink::new();
        link.inject("RB\t1,2");
        link.inject("MF\t1\t2");

        assert_eq!(link.recv_message().unwrap().as_deref(), Some("RB\t1,2"));
        assert_eq!(link.recv_message().unwrap().as_deref(), Some("MF\t1\t2"));
        assert_eq!(link.recv_message().unwrap(), None);
    }

    #[test]
    fn test_mock_sink_records_lines() {
        let sink = MockSink::new();
        sink.send_line("STOP,0,0").unwrap();
        assert_eq!(sink.sent(), vec!["STOP,0,0".to_string()]);
    }

    #[test]
    fn test_mock_sink_failure_mode() {
        let sink = MockSink::new();
        sink.set_failing(true);
        assert!(sink.send_line("STOP,0,0").is_err());
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn test_udp_link_timeout_yields_none() {
        let mut link = UdpLink::bind("127.0.0.1:0", Duration::from_millis(10)).unwrap();
        assert_eq!(link.recv_message().unwrap(), None);
    }

    #[test]
    fn test_udp_round_trip() {
        let mut link = UdpLink::bind("127.0.0.1:0", Duration::from_millis(200)).unwrap();
        let addr = link.socket.local_addr().unwrap();

        let sender = UdpCommandLink::connect(&addr.to_string()).unwrap();
        sender.send_line("RB\t0,100,5\r\n").unwrap();

        let msg = link.recv_message().unwrap();
        assert_eq!(msg.as_deref(), Some("RB\t0,100,5"));
    }
}
