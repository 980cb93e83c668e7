/*! Host memory standing in for GPU-visible memory.

There is no device timeline, so "mapping" a buffer simply hands out a
zero-initialized host allocation, and queue writes simply remember the bytes
they were given. Everything is keyed by resource id.

## Semantics

- [`HostMemory::map_buffer`] allocates a fresh region every time and records
  it as the buffer's content. Views returned for that region alias it, so
  writes through a [`MappedRange`] are visible to later reads of the buffer.
- [`HostMemory::write_buffer`] and [`HostMemory::write_texture`] replace
  whatever was recorded before. Destination offsets are not merged into the
  previous content.
!*/

use std::{fmt, ops::Range, sync::Arc};

use parking_lot::{Mutex, RwLock};

use crate::{
    id::{BufferId, TextureId},
    present::Canvas,
    FastHashMap,
};

type SharedBytes = Arc<Mutex<Vec<u8>>>;

/// A view into an emulated buffer mapping.
///
/// Cloning the view is cheap; all clones alias the same storage.
#[derive(Clone)]
pub struct MappedRange {
    data: SharedBytes,
    range: Range<usize>,
}

impl MappedRange {
    fn new(data: SharedBytes, offset: usize) -> Self {
        let len = data.lock().len();
        let start = offset.min(len);
        Self {
            data,
            range: start..len,
        }
    }

    /// Byte offset of this view within the buffer's mapped region.
    pub fn offset(&self) -> usize {
        self.range.start
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.with(<[u8]>::to_vec)
    }

    pub fn with<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let guard = self.data.lock();
        f(&guard[self.range.clone()])
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut guard = self.data.lock();
        f(&mut guard[self.range.clone()])
    }

    /// Copy `bytes` into the view starting at `offset`.
    ///
    /// Bytes that would fall past the end of the view are dropped.
    pub fn write(&self, offset: usize, bytes: &[u8]) {
        self.with_mut(|view| {
            let start = offset.min(view.len());
            let end = (start + bytes.len()).min(view.len());
            view[start..end].copy_from_slice(&bytes[..end - start]);
        })
    }
}

impl fmt::Debug for MappedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedRange")
            .field("range", &self.range)
            .finish()
    }
}

/// A decoded image handed to `copy_external_image_to_texture`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBitmap {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 pixels.
    pub pixels: Vec<u8>,
}

/// Source of an external image copy.
#[derive(Clone, Debug)]
pub enum ExternalImageSource {
    ImageBitmap(Arc<ImageBitmap>),
    Canvas(Arc<Canvas>),
}

impl ExternalImageSource {
    pub fn size(&self) -> (u32, u32) {
        match *self {
            Self::ImageBitmap(ref bitmap) => (bitmap.width, bitmap.height),
            Self::Canvas(ref canvas) => canvas.size(),
        }
    }
}

/// The last content written to a texture.
#[derive(Clone, Debug)]
pub enum TextureContents {
    Data(Arc<[u8]>),
    Image(ExternalImageSource),
}

impl TextureContents {
    pub fn data(&self) -> Option<&[u8]> {
        match *self {
            Self::Data(ref data) => Some(&data[..]),
            Self::Image(_) => None,
        }
    }

    pub fn image(&self) -> Option<&ExternalImageSource> {
        match *self {
            Self::Image(ref image) => Some(image),
            Self::Data(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct HostMemory {
    buffers: RwLock<FastHashMap<BufferId, SharedBytes>>,
    textures: RwLock<FastHashMap<TextureId, TextureContents>>,
}

impl HostMemory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocate a zeroed region of `size` bytes for `buffer` and return a view
    /// of it starting at `offset`.
    pub(crate) fn map_buffer(&self, buffer: BufferId, offset: usize, size: usize) -> MappedRange {
        let data = Arc::new(Mutex::new(vec![0; size]));
        self.buffers.write().insert(buffer, data.clone());
        MappedRange::new(data, offset)
    }

    pub(crate) fn write_buffer(&self, buffer: BufferId, data: &[u8]) {
        self.buffers
            .write()
            .insert(buffer, Arc::new(Mutex::new(data.to_vec())));
    }

    pub(crate) fn buffer_contents(&self, buffer: BufferId) -> Option<Vec<u8>> {
        self.buffers
            .read()
            .get(&buffer)
            .map(|data| data.lock().clone())
    }

    pub(crate) fn write_texture(&self, texture: TextureId, contents: TextureContents) {
        self.textures.write().insert(texture, contents);
    }

    pub(crate) fn texture_contents(&self, texture: TextureId) -> Option<TextureContents> {
        self.textures.read().get(&texture).cloned()
    }

    pub(crate) fn release_buffer(&self, buffer: BufferId) {
        self.buffers.write().remove(&buffer);
    }

    pub(crate) fn release_texture(&self, texture: TextureId) {
        self.textures.write().remove(&texture);
    }
}
