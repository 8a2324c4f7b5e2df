//! Minimal Chrome DevTools Protocol client over a single browser websocket.
//!
//! Page targets are driven through flattened sessions: every command carries
//! the `sessionId` returned by `Target.attachToTarget`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, MutexGuard};
use serde::Deserialize;
use serde_json::{Value, json};
use swapper::{Error, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;
/// Event routes by session id. Unbounded so no event is ever dropped.
type Listeners = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<CdpEvent>>>>;

/// Unsolicited protocol message.
#[derive(Debug, Clone)]
pub struct CdpEvent {
	pub method: String,
	pub params: Value,
	pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Incoming {
	id: Option<u64>,
	method: Option<String>,
	#[serde(default)]
	params: Value,
	result: Option<Value>,
	error: Option<ProtocolError>,
	session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProtocolError {
	code: i64,
	message: String,
}

pub struct CdpConnection {
	outgoing: mpsc::UnboundedSender<String>,
	pending: Pending,
	next_id: AtomicU64,
	listeners: Listeners,
	tasks: [JoinHandle<()>; 2],
}

impl CdpConnection {
	pub async fn connect(ws_url: &str) -> Result<Self> {
		let (stream, _response) = connect_async(ws_url)
			.await
			.map_err(|e| Error::Driver(format!("cannot connect to {ws_url}: {e}")))?;
		let (mut write, mut read) = stream.split();
		debug!(target: "swapper.driver", endpoint = ws_url, "devtools connection open");

		let pending: Pending = Arc::default();
		let listeners: Listeners = Arc::default();
		let (outgoing, mut queue) = mpsc::unbounded_channel::<String>();

		let writer = tokio::spawn(async move {
			while let Some(text) = queue.recv().await {
				if let Err(err) = write.send(Message::Text(text)).await {
					warn!(target: "swapper.driver", error = %err, "devtools write failed");
					break;
				}
			}
		});

		let reader = {
			let pending = Arc::clone(&pending);
			let listeners = Arc::clone(&listeners);
			tokio::spawn(async move {
				while let Some(message) = read.next().await {
					match message {
						Ok(Message::Text(text)) => dispatch(&text, &pending, &listeners),
						Ok(Message::Close(_)) => break,
						Ok(_) => {}
						Err(err) => {
							debug!(target: "swapper.driver", error = %err, "devtools read failed");
							break;
						}
					}
				}
				fail_pending(&pending);
			})
		};

		Ok(Self {
			outgoing,
			pending,
			next_id: AtomicU64::new(1),
			listeners,
			tasks: [writer, reader],
		})
	}

	/// Sends a command and waits for its result.
	pub async fn call(&self, method: &str, params: Value, session_id: Option<&str>) -> Result<Value> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let mut message = json!({ "id": id, "method": method, "params": params });
		if let Some(session) = session_id {
			message["sessionId"] = Value::String(session.to_string());
		}

		let (tx, rx) = oneshot::channel();
		self.lock_pending().insert(id, tx);
		trace!(target: "swapper.driver", id, method, "devtools command");

		if self.outgoing.send(message.to_string()).is_err() {
			self.lock_pending().remove(&id);
			return Err(Error::Driver("devtools connection closed".into()));
		}

		match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
			Ok(Ok(result)) => result,
			Ok(Err(_)) => Err(Error::Driver(format!("{method}: connection dropped"))),
			Err(_) => {
				self.lock_pending().remove(&id);
				Err(Error::Timeout {
					ms: COMMAND_TIMEOUT.as_millis() as u64,
					condition: format!("devtools response to {method}"),
				})
			}
		}
	}

	/// Routes every event of one page session to the returned receiver.
	///
	/// The route is dropped once the receiver goes away.
	pub fn listen(&self, session_id: &str) -> mpsc::UnboundedReceiver<CdpEvent> {
		let (tx, rx) = mpsc::unbounded_channel();
		self.listeners.lock().insert(session_id.to_string(), tx);
		rx
	}

	fn lock_pending(&self) -> MutexGuard<'_, HashMap<u64, oneshot::Sender<Result<Value>>>> {
		self.pending.lock()
	}
}

impl Drop for CdpConnection {
	fn drop(&mut self) {
		for task in &self.tasks {
			task.abort();
		}
	}
}

fn dispatch(text: &str, pending: &Pending, listeners: &Listeners) {
	let incoming: Incoming = match serde_json::from_str(text) {
		Ok(incoming) => incoming,
		Err(err) => {
			warn!(target: "swapper.driver", error = %err, "unparseable devtools message");
			return;
		}
	};

	if let Some(id) = incoming.id {
		let waiter = pending.lock().remove(&id);
		let Some(waiter) = waiter else {
			return;
		};
		let result = match incoming.error {
			Some(err) => Err(Error::Driver(format!("protocol error {}: {}", err.code, err.message))),
			None => Ok(incoming.result.unwrap_or(Value::Null)),
		};
		let _ = waiter.send(result);
	} else if let Some(method) = incoming.method {
		let Some(session_id) = incoming.session_id else {
			return;
		};
		let mut listeners = listeners.lock();
		let Some(route) = listeners.get(&session_id) else {
			return;
		};
		let event = CdpEvent {
			method,
			params: incoming.params,
			session_id: Some(session_id.clone()),
		};
		if route.send(event).is_err() {
			listeners.remove(&session_id);
		}
	}
}

fn fail_pending(pending: &Pending) {
	let drained: Vec<_> = pending.lock().drain().collect();
	for (_, waiter) in drained {
		let _ = waiter.send(Err(Error::Driver("devtools connection closed".into())));
	}
}
