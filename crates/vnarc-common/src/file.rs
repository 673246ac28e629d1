//! In-memory files produced by decoders.

/// A named, owned blob of bytes produced by a decoder.
///
/// Decoders create these one at a time and hand them to a sink, which
/// either writes them out or keeps them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    name: String,
    data: Vec<u8>,
}

impl VirtualFile {
    /// Create a new virtual file.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Get the file name (may contain `/`-separated directories).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the file contents.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the content length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether the file is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Take ownership of the contents.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Check the file extension, ignoring ASCII case.
    pub fn has_extension(&self, extension: &str) -> bool {
        has_extension(&self.name, extension)
    }
}

/// Check whether `name` ends with `.extension`, ignoring ASCII case.
pub fn has_extension(name: &str, extension: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(extension))
}
