//! Caller-facing handle for one projector.
//!
//! A [`Projector`] is the client's view of one device on the network: an
//! address, a reference to the shared [`PjlinkPool`], and at most one live
//! connection. Connections are created lazily — the first `send` after an
//! idle close or a failure opens a fresh one, and commands enqueued before
//! the handshake finishes wait inside the connection until it is ready.
//!
//! Responses come back through [`Projector::response_signal`], fired on the
//! pool's I/O worker thread with the completed command. Use
//! [`crate::pump::MessagePump`] to move them onto an application thread.

use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use pjlink_core::protocol::codec;
use pjlink_core::{PjlinkCommand, ProtocolError};

use crate::config::{ProjectorEntry, Settings};
use crate::connection::Connection;
use crate::error::ClientError;
use crate::pool::PjlinkPool;
use crate::signal::Signal;

/// Client handle for one PJLink projector.
///
/// Cloning yields another handle to the same projector state. All methods
/// are callable from any application thread; `start` and `stop` block and
/// must not be called from the pool's worker thread.
#[derive(Clone)]
pub struct Projector {
    inner: Arc<ProjectorInner>,
}

pub(crate) struct ProjectorInner {
    id: String,
    endpoint: SocketAddr,
    connect_on_start: bool,
    settings: Settings,
    pool: PjlinkPool,
    slot: Mutex<ConnectionSlot>,
    response: Signal<PjlinkCommand>,
}

#[derive(Default)]
struct ConnectionSlot {
    current: Option<Connection>,
    next_generation: u64,
}

/// Accepts a bare IP (standard port 4352 assumed) or an explicit `ip:port`.
fn parse_endpoint(host: &str) -> Result<SocketAddr, AddrParseError> {
    host.parse::<SocketAddr>()
        .or_else(|_| host.parse::<IpAddr>().map(|ip| SocketAddr::new(ip, codec::PORT)))
}

impl Projector {
    /// Creates a handle with default [`Settings`] and `connect_on_start`
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidAddress`] when `host` cannot be parsed.
    pub fn new(id: impl Into<String>, host: &str, pool: &PjlinkPool) -> Result<Self, ClientError> {
        Self::with_settings(id, host, false, Settings::default(), pool)
    }

    /// Creates a handle with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidAddress`] when `host` cannot be parsed.
    pub fn with_settings(
        id: impl Into<String>,
        host: &str,
        connect_on_start: bool,
        settings: Settings,
        pool: &PjlinkPool,
    ) -> Result<Self, ClientError> {
        let endpoint = parse_endpoint(host).map_err(|source| ClientError::InvalidAddress {
            address: host.to_string(),
            source,
        })?;
        Ok(Self {
            inner: Arc::new(ProjectorInner {
                id: id.into(),
                endpoint,
                connect_on_start,
                settings,
                pool: pool.clone(),
                slot: Mutex::new(ConnectionSlot::default()),
                response: Signal::new(),
            }),
        })
    }

    /// Creates a handle from a configuration entry.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidAddress`] when the entry's host cannot
    /// be parsed.
    pub fn from_config(
        entry: &ProjectorEntry,
        settings: Settings,
        pool: &PjlinkPool,
    ) -> Result<Self, ClientError> {
        Self::with_settings(
            entry.id.clone(),
            &entry.host,
            entry.connect_on_start,
            settings,
            pool,
        )
    }

    /// The projector's stable identifier.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The resolved TCP endpoint.
    pub fn endpoint(&self) -> SocketAddr {
        self.inner.endpoint
    }

    /// Starts the handle.
    ///
    /// Without `connect_on_start` this only verifies that the pool is
    /// running. With it, a connection is opened and the call blocks until
    /// the handshake finishes or the start timeout fires.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::PoolNotRunning`], [`ClientError::ConnectFailed`]
    /// (socket failure or authentication rejected), or
    /// [`ClientError::StartTimeout`].
    pub fn start(&self) -> Result<(), ClientError> {
        let handle = self.inner.pool.handle().ok_or(ClientError::PoolNotRunning)?;
        if !self.inner.connect_on_start {
            return Ok(());
        }

        let (_, connected) = ProjectorInner::get_or_create(&self.inner, &handle);
        let Some(connected) = connected else {
            // A previous start or send already holds a connection.
            return Ok(());
        };

        let timeout = self.inner.settings.start_timeout;
        match handle.block_on(async { tokio::time::timeout(timeout, connected).await }) {
            Ok(Ok(true)) => Ok(()),
            Ok(_) => Err(ClientError::ConnectFailed {
                id: self.inner.id.clone(),
            }),
            Err(_) => Err(ClientError::StartTimeout {
                id: self.inner.id.clone(),
                timeout,
            }),
        }
    }

    /// Stops the handle: requests disconnect of the current connection, if
    /// any, and blocks until it acknowledges or the stop timeout fires.
    /// Safe to call when never started.
    pub fn stop(&self) {
        let connection = self.inner.slot.lock().current.take();
        let Some(connection) = connection else {
            return;
        };
        let Some(handle) = self.inner.pool.handle() else {
            // Pool already gone; its shutdown tore the connection down.
            return;
        };

        let ack = connection.disconnect();
        let timeout = self.inner.settings.stop_timeout;
        if handle
            .block_on(async { tokio::time::timeout(timeout, ack).await })
            .is_err()
        {
            warn!(id = %self.inner.id, ?timeout, "projector connection did not close within the stop timeout");
        }
    }

    /// Enqueues a command, opening a connection if none is held.
    ///
    /// Delivery is fire-and-forget: the response arrives through
    /// [`Projector::response_signal`], and commands queued on a connection
    /// that fails are dropped.
    pub fn send(&self, cmd: PjlinkCommand) {
        let Some(handle) = self.inner.pool.handle() else {
            warn!(id = %self.inner.id, "dropping command: projector pool is not running");
            return;
        };
        let (connection, _) = ProjectorInner::get_or_create(&self.inner, &handle);
        connection.enqueue(cmd);
    }

    /// Turns the projector on.
    pub fn power_on(&self) {
        self.send(PjlinkCommand::set_power(true));
    }

    /// Turns the projector off.
    pub fn power_off(&self) {
        self.send(PjlinkCommand::set_power(false));
    }

    /// Mutes audio and video.
    pub fn mute_on(&self) {
        self.send(PjlinkCommand::set_av_mute(true));
    }

    /// Unmutes audio and video.
    pub fn mute_off(&self) {
        self.send(PjlinkCommand::set_av_mute(false));
    }

    /// Sends a raw set command.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the frame cannot be built.
    pub fn set(&self, body: &str, value: &str) -> Result<(), ProtocolError> {
        self.send(PjlinkCommand::new(body, value)?);
        Ok(())
    }

    /// Sends a raw query for the given command body.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the frame cannot be built.
    pub fn get(&self, body: &str) -> Result<(), ProtocolError> {
        self.send(PjlinkCommand::query(body)?);
        Ok(())
    }

    /// Signal fired on the I/O worker thread with each completed command.
    pub fn response_signal(&self) -> &Signal<PjlinkCommand> {
        &self.inner.response
    }
}

impl ProjectorInner {
    /// Returns the held connection, or opens a new one. The receiver is
    /// `Some` only when this call created the connection.
    fn get_or_create(
        this: &Arc<Self>,
        handle: &Handle,
    ) -> (Connection, Option<oneshot::Receiver<bool>>) {
        let mut slot = this.slot.lock();
        if let Some(connection) = slot.current.as_ref() {
            return (connection.clone(), None);
        }

        let generation = slot.next_generation;
        slot.next_generation += 1;
        let (connection, connected) = Connection::open(
            Arc::downgrade(this),
            this.endpoint,
            this.settings.idle_timeout,
            generation,
            handle,
        );
        slot.current = Some(connection.clone());
        debug!(id = %this.id, endpoint = %this.endpoint, generation, "opened projector connection");
        (connection, Some(connected))
    }

    /// Called from the session task with each completed command.
    pub(crate) fn deliver_response(&self, cmd: PjlinkCommand) {
        self.response.emit(&cmd);
    }

    /// Called from the session task exactly once when a connection closes.
    ///
    /// A send racing with the close may have already opened a successor;
    /// the generation check keeps a stale notification from clearing it.
    pub(crate) fn connection_closed(&self, generation: u64) {
        let mut slot = self.slot.lock();
        if slot
            .current
            .as_ref()
            .is_some_and(|connection| connection.generation() == generation)
        {
            slot.current = None;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_fails_fast() {
        let pool = PjlinkPool::new();
        let result = Projector::new("p1", "not-an-address", &pool);
        assert!(matches!(result, Err(ClientError::InvalidAddress { .. })));
    }

    #[test]
    fn test_bare_ip_gets_the_standard_port() {
        let pool = PjlinkPool::new();
        let projector = Projector::new("p1", "192.168.0.20", &pool).unwrap();
        assert_eq!(projector.endpoint().port(), codec::PORT);
    }

    #[test]
    fn test_explicit_port_is_kept() {
        let pool = PjlinkPool::new();
        let projector = Projector::new("p1", "192.168.0.20:9000", &pool).unwrap();
        assert_eq!(projector.endpoint().port(), 9000);
    }

    #[test]
    fn test_start_requires_a_running_pool() {
        let pool = PjlinkPool::new();
        let projector = Projector::new("p1", "127.0.0.1", &pool).unwrap();
        assert!(matches!(projector.start(), Err(ClientError::PoolNotRunning)));
    }

    #[test]
    fn test_stop_without_start_does_not_panic() {
        let pool = PjlinkPool::new();
        let projector = Projector::new("p1", "127.0.0.1", &pool).unwrap();
        projector.stop();
    }

    #[test]
    fn test_send_on_stopped_pool_drops_the_command() {
        let pool = PjlinkPool::new();
        let projector = Projector::new("p1", "127.0.0.1", &pool).unwrap();
        // Must not panic or block; the command is logged and dropped.
        projector.power_on();
    }

    #[test]
    fn test_from_config_carries_the_entry_fields() {
        let pool = PjlinkPool::new();
        let entry = ProjectorEntry {
            id: "foyer".to_string(),
            host: "10.0.0.5".to_string(),
            connect_on_start: false,
        };
        let projector = Projector::from_config(&entry, Settings::default(), &pool).unwrap();
        assert_eq!(projector.id(), "foyer");
        assert_eq!(projector.endpoint().to_string(), "10.0.0.5:4352");
    }
}
