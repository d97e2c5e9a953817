//! Uploaded files
//!
//! On the wire (JSON bodies) an attachment's content is base64 text.
//! Inside the binder the bytes never take that detour: form binding hands
//! them over through a per-thread side table and validation serializes
//! attachments without their content.

use std::cell::{Cell, RefCell};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A file taken from a multipart part, or sent in a JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAttachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub size: u64,
    #[serde(serialize_with = "encode_content", deserialize_with = "decode_content")]
    pub content: Vec<u8>,
}

impl FileAttachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        let content = content.into();
        Self {
            file_name: file_name.into(),
            content_type,
            size: content.len() as u64,
            content,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.content
    }
}

/// Whether `text` is content this module can decode
pub(crate) fn is_encoded_content(text: &str) -> bool {
    STANDARD.decode(text.as_bytes()).is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentMode {
    Base64,
    /// content serialized as an empty string
    Omitted,
    /// content moved through `HANDOFF`, serialized as its slot index
    Handoff,
}

thread_local! {
    static MODE: Cell<ContentMode> = Cell::new(ContentMode::Base64);
    static HANDOFF: RefCell<Vec<Option<Vec<u8>>>> = RefCell::new(Vec::new());
}

/// Restores the previous mode, and empties the side table when leaving it,
/// even if the scoped closure panics.
struct ModeGuard {
    previous: ContentMode,
}

impl ModeGuard {
    fn enter(mode: ContentMode) -> Self {
        let previous = MODE.with(|m| m.replace(mode));
        Self { previous }
    }
}

impl Drop for ModeGuard {
    fn drop(&mut self) {
        let left = MODE.with(|m| m.replace(self.previous));
        if left == ContentMode::Handoff && self.previous != ContentMode::Handoff {
            HANDOFF.with(|slots| slots.borrow_mut().clear());
        }
    }
}

/// Run `f` with attachments serialized without their content. Constraint
/// checks only look at presence, list length and metadata.
pub(crate) fn without_content<R>(f: impl FnOnce() -> R) -> R {
    let _guard = ModeGuard::enter(ContentMode::Omitted);
    f()
}

/// Run `f` with attachment content passed by slot instead of as base64.
/// Serialization and deserialization must both happen inside `f`, on the
/// calling thread.
pub(crate) fn with_handoff<R>(f: impl FnOnce() -> R) -> R {
    let _guard = ModeGuard::enter(ContentMode::Handoff);
    f()
}

fn encode_content<S: Serializer>(content: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    match MODE.with(Cell::get) {
        ContentMode::Base64 => serializer.serialize_str(&STANDARD.encode(content)),
        ContentMode::Omitted => serializer.serialize_str(""),
        ContentMode::Handoff => {
            let slot = HANDOFF.with(|slots| {
                let mut slots = slots.borrow_mut();
                slots.push(Some(content.to_vec()));
                slots.len() - 1
            });
            serializer.serialize_u64(slot as u64)
        }
    }
}

fn decode_content<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    if MODE.with(Cell::get) == ContentMode::Handoff {
        let slot = usize::deserialize(deserializer)?;
        return HANDOFF
            .with(|slots| slots.borrow_mut().get_mut(slot).and_then(Option::take))
            .ok_or_else(|| serde::de::Error::custom(format!("no attachment content in slot {}", slot)));
    }

    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}
