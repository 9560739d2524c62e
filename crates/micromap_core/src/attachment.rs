//! Opacity micromap attachments
//!
//! An [`OmmAttachment`] bundles everything needed to attach one baked micromap
//! array to one geometry of a mesh.

use std::sync::Arc;

use crate::{BufferHandle, MicromapBuildFlags, OmmBuffers, OmmIndexFormat, UsageHistogram};

/// Shared handle to a built micromap array
pub type MicromapHandle = Arc<Micromap>;

/// A built micromap array
///
/// Stands in for the native micromap object. It carries only the metadata the
/// host needs; the states themselves live in the attachment's state buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Micromap {
    /// Debug name
    pub name: String,
    /// Flags the array was built with
    pub flags: MicromapBuildFlags,
    /// Per (format, level) count of micromaps in the array
    pub array_histogram: UsageHistogram,
}

impl Micromap {
    /// Create a new micromap handle
    pub fn new(name: impl Into<String>, flags: MicromapBuildFlags, array_histogram: UsageHistogram) -> MicromapHandle {
        Arc::new(Self {
            name: name.into(),
            flags,
            array_histogram,
        })
    }
}

/// Baked micromap data attached to one geometry
///
/// Immutable once built. Cloning shares the buffers, it never copies bytes.
#[derive(Clone, Debug)]
pub struct OmmAttachment {
    /// The built micromap array
    pub micromap: MicromapHandle,
    /// Width of the index buffer entries
    pub index_format: OmmIndexFormat,
    /// Per-primitive index buffer
    pub index_buffer: BufferHandle,
    /// Byte offset of this geometry's first index entry
    pub index_buffer_offset: u32,
    /// Descriptor array buffer
    pub descriptor_buffer: BufferHandle,
    /// Byte offset of this geometry's first descriptor
    pub descriptor_buffer_offset: u32,
    /// Packed state array buffer
    pub state_buffer: BufferHandle,
    /// Byte offset of this geometry's state data
    pub state_buffer_offset: u32,
    /// Per (format, level) count of primitives referencing a micromap
    pub usage_histogram: UsageHistogram,
}

impl OmmAttachment {
    /// Borrow the three buffers as a query view
    pub fn buffers(&self) -> OmmBuffers<'_> {
        OmmBuffers {
            index_format: self.index_format,
            index: self.index_buffer.bytes(),
            index_offset: self.index_buffer_offset,
            descriptors: self.descriptor_buffer.bytes(),
            descriptor_offset: self.descriptor_buffer_offset,
            states: self.state_buffer.bytes(),
            state_offset: self.state_buffer_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Buffer;

    #[test]
    fn test_buffers_view_borrows_shared_bytes() {
        let index = Buffer::from_words("index", &[0xffff_0000]);
        let attachment = OmmAttachment {
            micromap: Micromap::new("omm", MicromapBuildFlags::FAST_TRACE, UsageHistogram::new()),
            index_format: OmmIndexFormat::Uint16,
            index_buffer: index.clone(),
            index_buffer_offset: 0,
            descriptor_buffer: Buffer::empty("desc"),
            descriptor_buffer_offset: 0,
            state_buffer: Buffer::empty("states"),
            state_buffer_offset: 256,
            usage_histogram: UsageHistogram::new(),
        };

        let view = attachment.buffers();
        assert!(std::ptr::eq(view.index.as_ptr(), index.bytes().as_ptr()));
        assert_eq!(view.state_offset, 256);
        assert_eq!(view.index_format, OmmIndexFormat::Uint16);

        let cloned = attachment.clone();
        assert!(Arc::ptr_eq(&cloned.index_buffer, &index));
    }
}
