//! Format registry and dispatch.

use crate::rpa::RpaDecoder;
use crate::sar::SarDecoder;
use crate::sink::FileSink;
use crate::{ArchiveInput, Error, Result};

/// Table metadata for one archive member, as reported by
/// [`ArchiveDecoder::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Member name as stored in the table.
    pub name: String,
    /// Absolute offset of the stored bytes.
    pub offset: u64,
    /// Number of bytes stored at `offset`.
    pub size: u64,
    /// Number of bytes kept inline in the table and prepended on extraction.
    pub prefix_len: usize,
}

/// An archive format handler.
pub trait ArchiveDecoder {
    /// Registered format name, e.g. `"renpy/rpa"`.
    fn name(&self) -> &'static str;

    /// Cheap recognition check (extension or leading signature).
    fn recognizes(&self, input: &ArchiveInput) -> bool;

    /// Parse the table without extracting anything.
    fn list(&self, input: &ArchiveInput) -> Result<Vec<EntryInfo>>;

    /// Extract every entry into `sink`, in table order.
    fn unpack(&self, input: &ArchiveInput, sink: &mut dyn FileSink) -> Result<()>;
}

/// Ordered set of archive decoders.
///
/// Detection tries decoders in registration order and the first one that
/// recognizes the input wins.
#[derive(Default)]
pub struct Registry {
    decoders: Vec<Box<dyn ArchiveDecoder>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in format.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SarDecoder));
        registry.register(Box::new(RpaDecoder));
        registry
    }

    /// Append a decoder.
    pub fn register(&mut self, decoder: Box<dyn ArchiveDecoder>) {
        self.decoders.push(decoder);
    }

    /// Registered format names, in dispatch order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decoders.iter().map(|d| d.name())
    }

    /// Look up a decoder by its registered name.
    pub fn get(&self, name: &str) -> Result<&dyn ArchiveDecoder> {
        self.decoders
            .iter()
            .find(|d| d.name() == name)
            .map(|d| d.as_ref())
            .ok_or_else(|| Error::UnknownFormat(name.to_string()))
    }

    /// Find the first decoder that recognizes `input`.
    pub fn detect(&self, input: &ArchiveInput) -> Result<&dyn ArchiveDecoder> {
        let decoder = self
            .decoders
            .iter()
            .find(|d| d.recognizes(input))
            .map(|d| d.as_ref())
            .ok_or(Error::UnrecognizedFormat)?;
        tracing::debug!("{} recognized as {}", input.name(), decoder.name());
        Ok(decoder)
    }

    /// Unpack `input` with an already selected decoder.
    pub fn unpack(
        &self,
        decoder: &dyn ArchiveDecoder,
        input: &ArchiveInput,
        sink: &mut dyn FileSink,
    ) -> Result<()> {
        decoder.unpack(input, sink)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::sink::BufferedSink;

    struct Probe {
        name: &'static str,
        matches: bool,
        unpacked: Rc<Cell<bool>>,
    }

    impl ArchiveDecoder for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn recognizes(&self, _input: &ArchiveInput) -> bool {
            self.matches
        }

        fn list(&self, _input: &ArchiveInput) -> Result<Vec<EntryInfo>> {
            Ok(Vec::new())
        }

        fn unpack(&self, _input: &ArchiveInput, _sink: &mut dyn FileSink) -> Result<()> {
            self.unpacked.set(true);
            Ok(())
        }
    }

    fn probe(name: &'static str, matches: bool) -> (Box<Probe>, Rc<Cell<bool>>) {
        let unpacked = Rc::new(Cell::new(false));
        let probe = Probe {
            name,
            matches,
            unpacked: Rc::clone(&unpacked),
        };
        (Box::new(probe), unpacked)
    }

    #[test]
    fn test_unrecognized_input_never_unpacks() {
        let (a, a_used) = probe("test/a", false);
        let (b, b_used) = probe("test/b", false);
        let mut registry = Registry::new();
        registry.register(a);
        registry.register(b);

        let input = ArchiveInput::from_bytes("mystery.bin", vec![0; 16]);
        assert!(matches!(registry.detect(&input), Err(Error::UnrecognizedFormat)));
        assert!(!a_used.get());
        assert!(!b_used.get());
    }

    #[test]
    fn test_first_registered_match_wins() {
        let (a, _) = probe("test/a", false);
        let (b, b_used) = probe("test/b", true);
        let (c, c_used) = probe("test/c", true);
        let mut registry = Registry::new();
        registry.register(a);
        registry.register(b);
        registry.register(c);

        let input = ArchiveInput::from_bytes("x", Vec::new());
        let decoder = registry.detect(&input).unwrap();
        assert_eq!(decoder.name(), "test/b");

        let mut sink = BufferedSink::new();
        registry.unpack(decoder, &input, &mut sink).unwrap();
        assert!(b_used.get());
        assert!(!c_used.get());
    }

    #[test]
    fn test_default_formats() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["nscripter/sar", "renpy/rpa"]);
        assert_eq!(registry.get("renpy/rpa").unwrap().name(), "renpy/rpa");
        assert!(matches!(registry.get("kirikiri/xp3"), Err(Error::UnknownFormat(_))));

        let sar = ArchiveInput::from_bytes("arc.SAR", vec![0; 6]);
        assert_eq!(registry.detect(&sar).unwrap().name(), "nscripter/sar");

        let rpa = ArchiveInput::from_bytes("archive.dat", b"RPA-3.0 0000".to_vec());
        assert_eq!(registry.detect(&rpa).unwrap().name(), "renpy/rpa");
    }
}
