//! The bounded result channel between workers and the supervisor.
//!
//! Every message is one fixed-size record:
//!
//! ```text
//! bytes 0..8            message kind, little-endian i64 (1 = found, 2 = diagnostic)
//! bytes 8..RECORD_LEN   payload, PAYLOAD_LEN bytes, NUL padded
//! ```
//!
//! The last payload byte is always zero. Text longer than `PAYLOAD_LEN - 1`
//! bytes keeps its prefix and loses the rest, so a receiver always finds a
//! terminator inside the buffer.
//!
//! Channels are named. A [`ChannelRegistry`] tracks which names are live so
//! two runs sharing a registry can never collide, and a channel's name is
//! released when the channel is destroyed.

use std::collections::HashSet;
#[cfg(unix)]
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use tracing::debug;

use crate::error::FindError;

/// Size of the payload buffer in every record.
pub const PAYLOAD_LEN: usize = 1024;

/// Size of the kind tag at the front of every record.
pub const TAG_LEN: usize = 8;

/// Size of a whole record on the wire.
pub const RECORD_LEN: usize = TAG_LEN + PAYLOAD_LEN;

/// Default number of records the channel holds before senders block.
pub const DEFAULT_CAPACITY: usize = 10;

/// A raw wire record.
pub type Record = [u8; RECORD_LEN];

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// What a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A matched path.
    Found,

    /// A worker-side diagnostic, printed to the error stream.
    Diagnostic,
}

impl MessageKind {
    pub fn tag(self) -> i64 {
        match self {
            MessageKind::Found      => 1,
            MessageKind::Diagnostic => 2,
        }
    }

    pub fn from_tag(tag: i64) -> Option<Self> {
        match tag {
            1 => Some(MessageKind::Found),
            2 => Some(MessageKind::Diagnostic),
            _ => None,
        }
    }
}

/// One decoded record.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    kind:    MessageKind,
    payload: [u8; PAYLOAD_LEN],
}

impl Message {
    /// Build a message, truncating `text` to `PAYLOAD_LEN - 1` bytes.
    pub fn new(kind: MessageKind, text: &[u8]) -> Self {
        let mut payload = [0u8; PAYLOAD_LEN];
        let len = text.len().min(PAYLOAD_LEN - 1);
        payload[..len].copy_from_slice(&text[..len]);
        Self { kind, payload }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Payload bytes up to the first NUL.
    pub fn bytes(&self) -> &[u8] {
        let end = self
            .payload
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(PAYLOAD_LEN);
        &self.payload[..end]
    }

    /// Payload as text. Truncation may split a UTF-8 sequence; the broken
    /// tail is replaced rather than rejected.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.bytes()).into_owned()
    }

    /// Payload as a path, byte for byte. Non-UTF-8 components survive
    /// intact so the path still names the file that was found.
    #[cfg(unix)]
    pub fn path(&self) -> PathBuf {
        use std::os::unix::ffi::OsStrExt;
        PathBuf::from(OsStr::from_bytes(self.bytes()))
    }

    #[cfg(not(unix))]
    pub fn path(&self) -> PathBuf {
        PathBuf::from(self.text())
    }

    /// Whether `len` bytes of text would be cut short.
    pub fn truncates(len: usize) -> bool {
        len > PAYLOAD_LEN - 1
    }

    pub fn encode(&self) -> Record {
        let mut record = [0u8; RECORD_LEN];
        record[..TAG_LEN].copy_from_slice(&self.kind.tag().to_le_bytes());
        record[TAG_LEN..].copy_from_slice(&self.payload);
        // Terminator at the bound, whatever the payload held.
        record[RECORD_LEN - 1] = 0;
        record
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() != RECORD_LEN {
            return Err(format!("record is {} bytes, expected {RECORD_LEN}", bytes.len()));
        }

        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&bytes[..TAG_LEN]);
        let tag = i64::from_le_bytes(tag);
        let kind = MessageKind::from_tag(tag).ok_or_else(|| format!("unknown message kind {tag}"))?;

        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&bytes[TAG_LEN..]);
        payload[PAYLOAD_LEN - 1] = 0;
        Ok(Self { kind, payload })
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("kind", &self.kind)
            .field("text", &self.text())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ChannelRegistry
// ---------------------------------------------------------------------------

/// The namespace result channels live in.
///
/// Owned by whoever runs searches and handed to each supervisor explicitly.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    live: Mutex<HashSet<String>>,
    next: AtomicU64,
}

impl ChannelRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A name no earlier call on this registry has handed out.
    pub fn unique_name(&self) -> String {
        let seq = self.next.fetch_add(1, Ordering::Relaxed);
        format!("/parfind.{}.{}", std::process::id(), seq)
    }

    /// Whether a channel with this name currently exists.
    pub fn contains(&self, name: &str) -> bool {
        self.live
            .lock()
            .map(|live| live.contains(name))
            .unwrap_or(false)
    }

    /// Create a channel holding at most `capacity` records.
    ///
    /// # Errors
    ///
    /// [`FindError::ChannelCreate`] if the name is already live or the
    /// capacity is zero.
    pub fn create(self: &Arc<Self>, name: &str, capacity: usize) -> Result<ResultChannel, FindError> {
        let create_err = |reason: &str| FindError::ChannelCreate {
            name:   name.to_string(),
            reason: reason.to_string(),
        };

        if capacity == 0 {
            return Err(create_err("capacity must be at least 1"));
        }

        let mut live = self.live.lock().map_err(|_| create_err("registry lock poisoned"))?;
        if !live.insert(name.to_string()) {
            return Err(create_err("a channel with this name already exists"));
        }
        drop(live);

        let (sender, receiver) = bounded(capacity);
        debug!(channel = name, capacity, "result channel created");

        Ok(ResultChannel {
            name: name.to_string(),
            registry: Arc::clone(self),
            sender,
            receiver,
            capacity,
        })
    }

    fn release(&self, name: &str) {
        if let Ok(mut live) = self.live.lock() {
            live.remove(name);
        }
    }
}

// ---------------------------------------------------------------------------
// ResultChannel
// ---------------------------------------------------------------------------

/// A live, named result channel. Dropping it destroys it.
pub struct ResultChannel {
    name:     String,
    registry: Arc<ChannelRegistry>,
    sender:   Sender<Record>,
    receiver: Receiver<Record>,
    capacity: usize,
}

impl ResultChannel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// A sending handle for one worker.
    pub fn sender(&self) -> ResultSender {
        ResultSender {
            name:   self.name.clone(),
            sender: self.sender.clone(),
        }
    }

    /// Take the next record without blocking. `Ok(None)` means the channel
    /// is empty right now.
    pub fn try_recv(&self) -> Result<Option<Message>, FindError> {
        match self.receiver.try_recv() {
            Ok(record) => Message::decode(&record)
                .map(Some)
                .map_err(|reason| FindError::ChannelReceive {
                    name: self.name.clone(),
                    reason,
                }),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(FindError::ChannelReceive {
                name:   self.name.clone(),
                reason: "all senders disconnected".into(),
            }),
        }
    }

    /// Destroy the channel and release its name. Records still queued are
    /// discarded.
    pub fn destroy(self) {
        drop(self);
    }
}

impl Drop for ResultChannel {
    fn drop(&mut self) {
        self.registry.release(&self.name);
        debug!(channel = %self.name, "result channel destroyed");
    }
}

/// A worker's end of a [`ResultChannel`].
#[derive(Clone)]
pub struct ResultSender {
    name:   String,
    sender: Sender<Record>,
}

impl ResultSender {
    /// Send one record, blocking while the channel is full.
    ///
    /// # Errors
    ///
    /// [`FindError::ChannelSend`] once the channel has been destroyed.
    pub fn send(&self, kind: MessageKind, text: &[u8]) -> Result<(), FindError> {
        if Message::truncates(text.len()) {
            debug!(channel = %self.name, len = text.len(), "message truncated to {} bytes", PAYLOAD_LEN - 1);
        }

        let record = Message::new(kind, text).encode();
        self.sender.send(record).map_err(|_| FindError::ChannelSend {
            name: self.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_layout_is_tag_then_payload() {
        let record = Message::new(MessageKind::Found, b"/tmp/x.log").encode();
        assert_eq!(record.len(), RECORD_LEN);
        assert_eq!(&record[..TAG_LEN], &1i64.to_le_bytes());
        assert_eq!(&record[TAG_LEN..TAG_LEN + 10], b"/tmp/x.log");
        assert!(record[TAG_LEN + 10..].iter().all(|&b| b == 0));
    }

    #[test]
    fn long_text_keeps_its_prefix_and_a_terminator() {
        let text = vec![b'a'; PAYLOAD_LEN + 100];
        let msg = Message::new(MessageKind::Found, &text);
        assert_eq!(msg.bytes().len(), PAYLOAD_LEN - 1);
        assert_eq!(msg.bytes(), &text[..PAYLOAD_LEN - 1]);

        let record = msg.encode();
        assert_eq!(record[RECORD_LEN - 1], 0);
        assert_eq!(&record[TAG_LEN..RECORD_LEN - 1], &text[..PAYLOAD_LEN - 1]);
    }

    #[test]
    fn text_exactly_at_the_bound_is_untouched() {
        let text = vec![b'z'; PAYLOAD_LEN - 1];
        assert!(!Message::truncates(text.len()));
        assert_eq!(Message::new(MessageKind::Found, &text).bytes(), &text[..]);
        assert!(Message::truncates(PAYLOAD_LEN));
    }

    #[cfg(unix)]
    #[test]
    fn path_keeps_non_utf8_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let raw = b"/tmp/d\xff/x.log";
        let msg = Message::new(MessageKind::Found, raw);
        assert_eq!(msg.path().as_os_str().as_bytes(), raw);
        assert!(msg.text().contains('\u{fffd}'));
    }

    #[test]
    fn decode_rejects_bad_records() {
        assert!(Message::decode(&[0u8; 12]).is_err());

        let mut record = Message::new(MessageKind::Found, b"x").encode();
        record[..TAG_LEN].copy_from_slice(&7i64.to_le_bytes());
        assert!(Message::decode(&record).unwrap_err().contains("unknown message kind 7"));
    }

    #[test]
    fn decode_forces_the_terminator() {
        let mut record = [0xffu8; RECORD_LEN];
        record[..TAG_LEN].copy_from_slice(&2i64.to_le_bytes());
        let msg = Message::decode(&record).unwrap();
        assert_eq!(msg.kind(), MessageKind::Diagnostic);
        assert_eq!(msg.bytes().len(), PAYLOAD_LEN - 1);
    }

    #[test]
    fn messages_arrive_in_send_order() {
        let registry = ChannelRegistry::new();
        let channel = registry.create("/fifo", 4).unwrap();
        let tx = channel.sender();

        tx.send(MessageKind::Found, b"one").unwrap();
        tx.send(MessageKind::Diagnostic, b"two").unwrap();
        tx.send(MessageKind::Found, b"three").unwrap();

        let got: Vec<(MessageKind, String)> = std::iter::from_fn(|| channel.try_recv().unwrap())
            .map(|m| (m.kind(), m.text()))
            .collect();
        assert_eq!(
            got,
            vec![
                (MessageKind::Found, "one".to_string()),
                (MessageKind::Diagnostic, "two".to_string()),
                (MessageKind::Found, "three".to_string()),
            ]
        );
    }

    #[test]
    fn capacity_is_bounded() {
        let registry = ChannelRegistry::new();
        let channel = registry.create("/bounded", 2).unwrap();
        let tx = channel.sender();
        tx.send(MessageKind::Found, b"a").unwrap();
        tx.send(MessageKind::Found, b"b").unwrap();

        let record = Message::new(MessageKind::Found, b"c").encode();
        assert!(tx.sender.try_send(record).is_err());
    }

    #[test]
    fn names_collide_until_destroyed() {
        let registry = ChannelRegistry::new();
        let channel = registry.create("/busy", 1).unwrap();
        assert!(registry.contains("/busy"));

        match registry.create("/busy", 1) {
            Err(FindError::ChannelCreate { name, .. }) => assert_eq!(name, "/busy"),
            other => panic!("expected a collision, got {:?}", other.map(|c| c.name().to_string())),
        }

        channel.destroy();
        assert!(!registry.contains("/busy"));
        assert!(registry.create("/busy", 1).is_ok());
    }

    #[test]
    fn send_after_destroy_fails() {
        let registry = ChannelRegistry::new();
        let channel = registry.create("/gone", 1).unwrap();
        let tx = channel.sender();
        channel.destroy();
        assert!(matches!(
            tx.send(MessageKind::Found, b"late"),
            Err(FindError::ChannelSend { .. })
        ));
    }

    #[test]
    fn unique_names_do_not_repeat() {
        let registry = ChannelRegistry::new();
        let a = registry.unique_name();
        let b = registry.unique_name();
        assert_ne!(a, b);
        assert!(a.starts_with(&format!("/parfind.{}.", std::process::id())));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let registry = ChannelRegistry::new();
        assert!(registry.create("/empty", 0).is_err());
        assert!(!registry.contains("/empty"));
    }
}
