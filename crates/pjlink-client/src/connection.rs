//! One TCP session to one projector.
//!
//! PJLink permits a single command in flight per connection: write one frame,
//! read its response, only then write the next. The session task below
//! enforces that by construction. It is the only code that touches the
//! socket, and it writes the head of the pending queue strictly after the
//! previous head's response has been stored and signalled.
//!
//! Lifecycle of a session:
//!
//! ```text
//! connect ─► read banner ─► "PJLINK 0"? ─► ready ─► ... ─► closed
//!    │            │              │ no                │
//!    └─ error ────┴──────────────┴────► closed ◄─────┘
//!                                        (error, peer EOF, idle, disconnect)
//! ```
//!
//! The [`Connection`] handle is usable from any thread; enqueues and
//! disconnect requests travel over a channel and are picked up between
//! socket operations on the pool's worker. Commands still queued when the
//! session closes are dropped — callers notice by the absence of a response
//! signal, and the next send opens a fresh connection.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Weak;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tokio_util::codec::{Decoder, Encoder, Framed};
use tracing::{debug, warn};

use pjlink_core::protocol::codec::{AUTH_DISABLED, AUTH_HEADER, MAX_FRAME, TERMINATOR};
use pjlink_core::PjlinkCommand;

use crate::projector::ProjectorInner;

// ── Frame codec ───────────────────────────────────────────────────────────────

/// Splits the byte stream into CR-terminated frames.
///
/// Decoded frames come back without the terminator; outbound frames are
/// written as-is (commands carry their terminator already).
pub(crate) struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, std::io::Error> {
        match src.iter().position(|&b| b == TERMINATOR as u8) {
            Some(at) => {
                let frame = src.split_to(at + 1);
                let line = std::str::from_utf8(&frame[..at])
                    .map_err(|_| {
                        std::io::Error::new(std::io::ErrorKind::InvalidData, "frame is not valid text")
                    })?
                    .to_string();
                Ok(Some(line))
            }
            None if src.len() >= MAX_FRAME => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("no terminator within {MAX_FRAME} bytes"),
            )),
            None => Ok(None),
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = std::io::Error;

    fn encode(&mut self, frame: Bytes, dst: &mut BytesMut) -> Result<(), std::io::Error> {
        dst.extend_from_slice(&frame);
        Ok(())
    }
}

// ── Session errors ────────────────────────────────────────────────────────────

/// Why a session failed. Logged, never returned to callers.
#[derive(Debug, Error)]
enum SessionError {
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("unexpected banner from projector: {0:?}")]
    UnexpectedBanner(String),

    #[error("projector requires password authentication (banner {0:?}); disable authentication on the device")]
    PasswordRequired(String),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("projector closed the connection")]
    PeerClosed,
}

/// Why a ready session ended.
enum CloseReason {
    /// No response activity within the idle timeout.
    Idle,
    /// `disconnect()` was called; the sender is acknowledged after teardown.
    Requested(oneshot::Sender<()>),
    /// Every handle to this connection was dropped.
    HandleDropped,
    /// Transport failure or peer EOF.
    Failed(SessionError),
}

// ── Connection handle ─────────────────────────────────────────────────────────

enum Op {
    Enqueue(PjlinkCommand),
    Disconnect(oneshot::Sender<()>),
}

/// Handle to one projector session running on the pool's worker.
///
/// Cheap to clone; dropping every clone lets the session close on its own.
#[derive(Clone)]
pub(crate) struct Connection {
    ops: mpsc::UnboundedSender<Op>,
    generation: u64,
}

impl Connection {
    /// Spawns a session task that connects, authenticates, and serves the
    /// pending queue. The returned receiver resolves `true` once the socket
    /// is open and the projector accepted us without a password.
    pub(crate) fn open(
        projector: Weak<ProjectorInner>,
        endpoint: SocketAddr,
        idle_timeout: Duration,
        generation: u64,
        handle: &Handle,
    ) -> (Self, oneshot::Receiver<bool>) {
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let (connected_tx, connected_rx) = oneshot::channel();
        handle.spawn(run_session(
            projector,
            endpoint,
            idle_timeout,
            generation,
            ops_rx,
            connected_tx,
        ));
        (
            Self {
                ops: ops_tx,
                generation,
            },
            connected_rx,
        )
    }

    /// Distinguishes this session from its predecessors on the same
    /// projector, so a late close notification cannot clear a successor.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Appends a command to the pending queue. A command handed to a
    /// session that is already closing is dropped silently.
    pub(crate) fn enqueue(&self, cmd: PjlinkCommand) {
        let _ = self.ops.send(Op::Enqueue(cmd));
    }

    /// Requests teardown. The returned receiver resolves once the socket is
    /// closed; it also resolves (with an error) if the session was already
    /// gone.
    pub(crate) fn disconnect(&self) -> oneshot::Receiver<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let _ = self.ops.send(Op::Disconnect(ack_tx));
        ack_rx
    }
}

// ── Session task ──────────────────────────────────────────────────────────────

async fn run_session(
    projector: Weak<ProjectorInner>,
    endpoint: SocketAddr,
    idle_timeout: Duration,
    generation: u64,
    mut ops: mpsc::UnboundedReceiver<Op>,
    connected: oneshot::Sender<bool>,
) {
    let mut framed = match establish(endpoint).await {
        Ok(framed) => {
            let _ = connected.send(true);
            framed
        }
        Err(e) => {
            warn!(%endpoint, error = %e, "projector connection failed");
            let _ = connected.send(false);
            notify_closed(&projector, generation);
            return;
        }
    };
    debug!(%endpoint, "projector session ready");

    let reason = serve(&mut framed, &projector, idle_timeout, &mut ops).await;
    match &reason {
        CloseReason::Idle => debug!(%endpoint, "closing idle projector connection"),
        CloseReason::Requested(_) => debug!(%endpoint, "closing projector connection on request"),
        CloseReason::HandleDropped => debug!(%endpoint, "projector handle dropped, closing"),
        CloseReason::Failed(e) => warn!(%endpoint, error = %e, "projector session failed"),
    }

    drop(framed);
    notify_closed(&projector, generation);
    if let CloseReason::Requested(ack) = reason {
        let _ = ack.send(());
    }
}

/// Opens the socket and performs the authentication handshake.
///
/// The first line a projector sends must be `PJLINK 0`. A banner announcing
/// password authentication is fatal: this library deliberately does not
/// implement the hash handshake, the operator has to disable authentication
/// on the device instead.
async fn establish(endpoint: SocketAddr) -> Result<Framed<TcpStream, FrameCodec>, SessionError> {
    let stream = TcpStream::connect(endpoint)
        .await
        .map_err(SessionError::Connect)?;
    let mut framed = Framed::new(stream, FrameCodec);

    let banner = match framed.next().await {
        Some(Ok(line)) => line,
        Some(Err(e)) => return Err(SessionError::Transport(e)),
        None => return Err(SessionError::PeerClosed),
    };

    let header_ok = banner
        .get(..AUTH_HEADER.len())
        .is_some_and(|header| header.eq_ignore_ascii_case(AUTH_HEADER));
    if !header_ok {
        return Err(SessionError::UnexpectedBanner(banner));
    }
    if !banner.starts_with(AUTH_DISABLED) {
        return Err(SessionError::PasswordRequired(banner));
    }
    Ok(framed)
}

/// Serves the pending queue until the session ends.
///
/// Invariants kept here: at most one command is in flight; a new write is
/// issued only after the in-flight command's response has been stored; a
/// response is always paired with the command at the head of the queue; the
/// idle deadline is re-armed after the handshake and after every response.
async fn serve(
    framed: &mut Framed<TcpStream, FrameCodec>,
    projector: &Weak<ProjectorInner>,
    idle_timeout: Duration,
    ops: &mut mpsc::UnboundedReceiver<Op>,
) -> CloseReason {
    let mut pending: VecDeque<PjlinkCommand> = VecDeque::new();
    let mut deadline = Instant::now() + idle_timeout;

    let reason = 'session: loop {
        let head = pending.front().map(|cmd| Bytes::copy_from_slice(cmd.wire_bytes()));

        if let Some(frame) = head {
            if let Err(e) = framed.send(frame).await {
                break 'session CloseReason::Failed(SessionError::Transport(e));
            }
            // In flight: wait for the response. Enqueues keep accumulating
            // behind the head; nothing else gets written.
            loop {
                tokio::select! {
                    frame = framed.next() => match frame {
                        Some(Ok(line)) => {
                            if let Some(mut cmd) = pending.pop_front() {
                                cmd.set_response(&line);
                                if let Some(projector) = projector.upgrade() {
                                    projector.deliver_response(cmd);
                                }
                            }
                            deadline = Instant::now() + idle_timeout;
                            continue 'session;
                        }
                        Some(Err(e)) => break 'session CloseReason::Failed(SessionError::Transport(e)),
                        None => break 'session CloseReason::Failed(SessionError::PeerClosed),
                    },
                    op = ops.recv() => match op {
                        Some(Op::Enqueue(cmd)) => pending.push_back(cmd),
                        Some(Op::Disconnect(ack)) => break 'session CloseReason::Requested(ack),
                        None => break 'session CloseReason::HandleDropped,
                    },
                    _ = sleep_until(deadline) => break 'session CloseReason::Idle,
                }
            }
        } else {
            tokio::select! {
                frame = framed.next() => match frame {
                    Some(Ok(line)) => {
                        // Nothing in flight; Class 1 projectors do not push
                        // unsolicited frames.
                        warn!(frame = %line, "dropping unsolicited frame from projector");
                    }
                    Some(Err(e)) => break 'session CloseReason::Failed(SessionError::Transport(e)),
                    None => break 'session CloseReason::Failed(SessionError::PeerClosed),
                },
                op = ops.recv() => match op {
                    Some(Op::Enqueue(cmd)) => pending.push_back(cmd),
                    Some(Op::Disconnect(ack)) => break 'session CloseReason::Requested(ack),
                    None => break 'session CloseReason::HandleDropped,
                },
                _ = sleep_until(deadline) => break 'session CloseReason::Idle,
            }
        }
    };

    if !pending.is_empty() {
        debug!(count = pending.len(), "dropping queued commands on close");
    }
    reason
}

fn notify_closed(projector: &Weak<ProjectorInner>, generation: u64) {
    if let Some(projector) = projector.upgrade() {
        projector.connection_closed(generation);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(codec: &mut FrameCodec, src: &mut BytesMut) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(Some(frame)) = codec.decode(src) {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_frame_codec_splits_on_terminator() {
        let mut codec = FrameCodec;
        let mut src = BytesMut::from(&b"PJLINK 0\r%1POWR=OK\r"[..]);
        assert_eq!(decode_all(&mut codec, &mut src), vec!["PJLINK 0", "%1POWR=OK"]);
        assert!(src.is_empty());
    }

    #[test]
    fn test_frame_codec_waits_for_partial_frames() {
        let mut codec = FrameCodec;
        let mut src = BytesMut::from(&b"%1POWR="[..]);
        assert_eq!(codec.decode(&mut src).unwrap(), None);

        src.extend_from_slice(b"OK\r");
        assert_eq!(codec.decode(&mut src).unwrap(), Some("%1POWR=OK".to_string()));
    }

    #[test]
    fn test_frame_codec_rejects_unterminated_oversized_input() {
        let mut codec = FrameCodec;
        let mut src = BytesMut::from(vec![b'x'; MAX_FRAME].as_slice());
        assert!(codec.decode(&mut src).is_err());
    }

    #[test]
    fn test_frame_codec_encodes_frames_verbatim() {
        let mut codec = FrameCodec;
        let mut dst = BytesMut::new();
        codec
            .encode(Bytes::from_static(b"%1POWR 1\r"), &mut dst)
            .unwrap();
        assert_eq!(&dst[..], b"%1POWR 1\r");
    }
}
