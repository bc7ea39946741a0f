//! Message ports: the two-way pipe a channel runs on.
//!
//! A port is split into a sending half ([`MessagePort`]) and an inbound
//! queue. Platform adapters implement [`MessagePort`] over whatever the
//! embedding environment provides and push received messages into the
//! queue; [`LocalPort::pair`] wires two in-process halves together.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Queue of messages received on a port, in delivery order.
pub type Inbound = mpsc::UnboundedReceiver<Value>;

/// Sending half of a message port.
pub trait MessagePort: Send + Sync {
	/// Posts one message to the peer.
	fn post_message(&self, message: Value) -> Result<()>;

	/// Closes the port. Further posts fail.
	fn close(&self) {}
}

/// Both halves of one end of a port.
pub struct PortParts {
	pub port: Arc<dyn MessagePort>,
	pub inbound: Inbound,
}

impl std::fmt::Debug for PortParts {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PortParts").finish_non_exhaustive()
	}
}

/// In-process port end backed by an unbounded queue.
///
/// Closing one end ends the peer's inbound queue.
pub struct LocalPort {
	peer: Mutex<Option<mpsc::UnboundedSender<Value>>>,
}

impl LocalPort {
	/// Creates two connected port ends.
	pub fn pair() -> (PortParts, PortParts) {
		let (a_tx, a_rx) = mpsc::unbounded_channel();
		let (b_tx, b_rx) = mpsc::unbounded_channel();

		let a = PortParts {
			port: Arc::new(LocalPort {
				peer: Mutex::new(Some(b_tx)),
			}),
			inbound: a_rx,
		};
		let b = PortParts {
			port: Arc::new(LocalPort {
				peer: Mutex::new(Some(a_tx)),
			}),
			inbound: b_rx,
		};
		(a, b)
	}
}

impl MessagePort for LocalPort {
	fn post_message(&self, message: Value) -> Result<()> {
		let peer = self.peer.lock();
		let sender = peer
			.as_ref()
			.ok_or_else(|| Error::Transport("port closed".to_string()))?;
		sender
			.send(message)
			.map_err(|_| Error::Transport("peer port dropped".to_string()))
	}

	fn close(&self) {
		self.peer.lock().take();
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[tokio::test]
	async fn messages_arrive_in_order_on_the_peer() {
		let (a, mut b) = LocalPort::pair();

		for n in 0..3 {
			a.port.post_message(json!({ "n": n })).unwrap();
		}

		for n in 0..3 {
			assert_eq!(b.inbound.recv().await.unwrap(), json!({ "n": n }));
		}
	}

	#[tokio::test]
	async fn closing_ends_the_peer_queue() {
		let (a, mut b) = LocalPort::pair();
		a.port.close();

		assert!(a.port.post_message(json!(1)).is_err());
		assert!(b.inbound.recv().await.is_none());
	}
}
