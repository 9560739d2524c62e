//! Immutable byte buffers and the borrowed OMM buffer view
//!
//! Buffers are written once (by a baker or a file load) and shared by
//! reference afterwards. Nothing in this crate mutates a buffer after it has
//! been wrapped in a [`BufferHandle`].

use std::sync::Arc;

use crate::OmmIndexFormat;

/// Shared handle to an immutable buffer
pub type BufferHandle = Arc<Buffer>;

/// A named, immutable block of bytes
#[derive(Debug)]
pub struct Buffer {
    name: String,
    data: Box<[u8]>,
}

impl Buffer {
    /// Wrap bytes into a shared buffer
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> BufferHandle {
        Arc::new(Self {
            name: name.into(),
            data: data.into_boxed_slice(),
        })
    }

    /// Create a buffer from 32-bit words in little-endian byte order
    pub fn from_words(name: impl Into<String>, words: &[u32]) -> BufferHandle {
        let le: Vec<u32> = words.iter().map(|w| w.to_le()).collect();
        Self::new(name, bytemuck::cast_slice(&le).to_vec())
    }

    /// Create an empty buffer (placeholder for data that lives elsewhere)
    pub fn empty(name: impl Into<String>) -> BufferHandle {
        Self::new(name, Vec::new())
    }

    /// Debug name of this buffer
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The buffer contents
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer holds no bytes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Load a little-endian 32-bit word at an arbitrary byte offset
///
/// Returns `None` if any of the four bytes lies outside `bytes`.
#[inline]
pub fn load_u32(bytes: &[u8], byte_offset: u64) -> Option<u32> {
    let start = usize::try_from(byte_offset).ok()?;
    let end = start.checked_add(4)?;
    let word = bytes.get(start..end)?;
    Some(u32::from_le(bytemuck::pod_read_unaligned(word)))
}

/// Borrowed, read-only view of the three OMM buffers of one geometry
///
/// This is what the query path runs against. Offsets are the byte offsets of
/// the geometry's region inside each buffer.
#[derive(Clone, Copy, Debug)]
pub struct OmmBuffers<'a> {
    /// Width of the index buffer entries
    pub index_format: OmmIndexFormat,
    /// Per-primitive index buffer
    pub index: &'a [u8],
    /// Byte offset of the geometry's first index entry
    pub index_offset: u32,
    /// Descriptor array (8-byte records)
    pub descriptors: &'a [u8],
    /// Byte offset of the geometry's first descriptor
    pub descriptor_offset: u32,
    /// Packed state array
    pub states: &'a [u8],
    /// Byte offset the descriptors' state offsets are relative to
    pub state_offset: u32,
}
