//! Output sinks for unpacked files.
//!
//! Decoders never write files themselves. For every entry they hand a
//! producer closure to a [`FileSink`], which decides whether the produced
//! [`VirtualFile`] ends up on disk ([`PersistedSink`]) or in memory
//! ([`BufferedSink`]). Entries are produced one at a time, so a large
//! archive is never held in memory as a whole.

use std::fs;
use std::path::{Component, Path, PathBuf};

use vnarc_common::VirtualFile;

use crate::{Error, Result};

/// Destination for files produced by a decoder.
pub trait FileSink {
    /// Run `producer` once and take ownership of the file it yields.
    ///
    /// Returns an error only for failures the caller should see; a sink
    /// that isolates per-file failures reports them itself and returns
    /// `Ok(())`.
    fn deposit(&mut self, producer: &mut dyn FnMut() -> Result<VirtualFile>) -> Result<()>;
}

/// Writes every produced file below a root directory.
#[derive(Debug, Default)]
pub struct PersistedSink {
    root: Option<PathBuf>,
    saved: usize,
    failed: usize,
}

impl PersistedSink {
    /// Create a sink writing below `root`, or relative to the working
    /// directory when `root` is `None`.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            saved: 0,
            failed: 0,
        }
    }

    /// Number of files written so far.
    pub fn saved(&self) -> usize {
        self.saved
    }

    /// Number of files that could not be produced or written.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Compute where a file with the given archive name is written.
    pub fn target_path(&self, name: &str) -> PathBuf {
        let relative = sanitize_name(name);
        match &self.root {
            Some(root) => root.join(relative),
            None => relative,
        }
    }

    fn write(&self, file: &VirtualFile) -> Result<PathBuf> {
        let path = self.target_path(file.name());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&path, file.data())?;
        Ok(path)
    }
}

impl FileSink for PersistedSink {
    fn deposit(&mut self, producer: &mut dyn FnMut() -> Result<VirtualFile>) -> Result<()> {
        let file = match producer() {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("error while reading file: {e}");
                self.failed += 1;
                return Ok(());
            }
        };

        match self.write(&file) {
            Ok(path) => {
                tracing::info!("saved {} ({} bytes)", path.display(), file.len());
                self.saved += 1;
            }
            Err(e) => {
                tracing::warn!("failed to write {}: {e}", file.name());
                self.failed += 1;
            }
        }
        Ok(())
    }
}

/// Collects produced files in memory, in deposit order.
#[derive(Debug, Default)]
pub struct BufferedSink {
    files: Vec<VirtualFile>,
}

impl BufferedSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Files collected so far.
    pub fn files(&self) -> &[VirtualFile] {
        &self.files
    }

    /// Take the collected files.
    pub fn into_files(self) -> Vec<VirtualFile> {
        self.files
    }
}

impl FileSink for BufferedSink {
    fn deposit(&mut self, producer: &mut dyn FnMut() -> Result<VirtualFile>) -> Result<()> {
        match producer() {
            Ok(file) => {
                self.files.push(file);
                Ok(())
            }
            Err(e @ Error::UnreadableEntry { .. }) => Err(e),
            Err(e) => Err(Error::UnreadableEntry {
                name: entry_name(&e),
                reason: e.to_string(),
            }),
        }
    }
}

fn entry_name(error: &Error) -> String {
    match error {
        Error::OutOfBoundsEntry { name, .. } => name.clone(),
        _ => String::from("<unnamed>"),
    }
}

/// Deposit the entry `name`, logging and skipping errors that only concern
/// it.
///
/// Producer errors that do not already identify the entry are reported as
/// [`Error::UnreadableEntry`] for `name`.
pub(crate) fn deposit_entry(
    sink: &mut dyn FileSink,
    name: &str,
    producer: &mut dyn FnMut() -> Result<VirtualFile>,
) -> Result<()> {
    let mut named = || {
        producer().map_err(|e| {
            if e.is_entry_local() {
                e
            } else {
                Error::UnreadableEntry {
                    name: name.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    };

    match sink.deposit(&mut named) {
        Err(e) if e.is_entry_local() => {
            tracing::warn!("skipping entry: {e}");
            Ok(())
        }
        other => other,
    }
}

/// Turn an archive member name into a relative path that stays below the
/// output root: backslashes become separators, and root, `.` and `..`
/// components are dropped.
fn sanitize_name(name: &str) -> PathBuf {
    let normalized = name.replace('\\', "/");
    Path::new(&normalized)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(test: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vnarc-sink-{}-{test}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_buffered_preserves_deposit_order() {
        let mut sink = BufferedSink::new();
        for name in ["c.txt", "a.txt", "b.txt"] {
            sink.deposit(&mut || Ok(VirtualFile::new(name, name.as_bytes().to_vec())))
                .unwrap();
        }

        let names: Vec<_> = sink.files().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["c.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_buffered_failure_only_drops_that_deposit() {
        let mut sink = BufferedSink::new();
        sink.deposit(&mut || Ok(VirtualFile::new("first", vec![1]))).unwrap();

        let result = sink.deposit(&mut || -> Result<VirtualFile> {
            Err(Error::OutOfBoundsEntry {
                name: "broken".into(),
                offset: 100,
                size: 10,
                stream_size: 50,
            })
        });
        assert!(matches!(
            result,
            Err(Error::UnreadableEntry { ref name, .. }) if name == "broken"
        ));

        sink.deposit(&mut || Ok(VirtualFile::new("third", vec![3]))).unwrap();
        let files = sink.into_files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].name(), "third");
    }

    /// Records the error of every failed producer.
    #[derive(Default)]
    struct ErrorLog(Vec<String>);

    impl FileSink for ErrorLog {
        fn deposit(&mut self, producer: &mut dyn FnMut() -> Result<VirtualFile>) -> Result<()> {
            if let Err(e) = producer() {
                self.0.push(e.to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn test_deposit_entry_names_failed_entry() {
        let mut log = ErrorLog::default();
        deposit_entry(&mut log, "bgm/title.ogg", &mut || -> Result<VirtualFile> {
            Err(Error::Common(vnarc_common::Error::MissingNullTerminator))
        })
        .unwrap();

        assert_eq!(log.0.len(), 1);
        assert!(log.0[0].contains("bgm/title.ogg"), "{}", log.0[0]);
    }

    #[test]
    fn test_deposit_entry_skips_buffered_failure() {
        let mut sink = BufferedSink::new();
        deposit_entry(&mut sink, "broken.png", &mut || -> Result<VirtualFile> {
            Err(Error::Common(vnarc_common::Error::UnexpectedEof {
                needed: 4,
                available: 0,
            }))
        })
        .unwrap();
        deposit_entry(&mut sink, "ok.png", &mut || Ok(VirtualFile::new("ok.png", vec![1])))
            .unwrap();

        let names: Vec<_> = sink.files().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["ok.png"]);
    }

    #[test]
    fn test_persisted_creates_nested_directories() {
        let root = scratch_dir("nested");
        let mut sink = PersistedSink::new(Some(root.clone()));

        sink.deposit(&mut || Ok(VirtualFile::new("images/bg/sky.prs", b"sky".to_vec())))
            .unwrap();

        let written = root.join("images").join("bg").join("sky.prs");
        assert_eq!(fs::read(&written).unwrap(), b"sky");
        assert_eq!(sink.saved(), 1);
        assert_eq!(sink.failed(), 0);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_persisted_reports_and_continues() {
        let root = scratch_dir("continues");
        let mut sink = PersistedSink::new(Some(root.clone()));

        sink.deposit(&mut || -> Result<VirtualFile> {
            Err(Error::UnreadableEntry {
                name: "bad".into(),
                reason: "test".into(),
            })
        })
        .unwrap();
        sink.deposit(&mut || Ok(VirtualFile::new("good.txt", b"ok".to_vec())))
            .unwrap();

        assert_eq!(sink.failed(), 1);
        assert_eq!(sink.saved(), 1);
        assert_eq!(fs::read(root.join("good.txt")).unwrap(), b"ok");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_target_path_stays_below_root() {
        let sink = PersistedSink::new(Some(PathBuf::from("out")));
        assert_eq!(
            sink.target_path("..\\..\\etc/passwd"),
            Path::new("out").join("etc").join("passwd")
        );
        assert_eq!(sink.target_path("/abs/name"), Path::new("out").join("abs").join("name"));

        let bare = PersistedSink::new(None);
        assert_eq!(bare.target_path("dir\\file.ogg"), Path::new("dir").join("file.ogg"));
    }
}
