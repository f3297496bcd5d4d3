//! In-memory storage stub that records every call, for ordering tests.

use crate::storage::{NodeInfo, NodeKind, Storage, StorageFile};
use std::collections::{HashMap, HashSet};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Stat(PathBuf),
    Open { path: PathBuf, read_back: bool },
    Seek(u64),
    Write(usize),
    Read(usize),
    Flush,
    Sync,
    RemoveFile(PathBuf),
    RemoveDir(PathBuf),
}

enum Node {
    File(Arc<Mutex<Vec<u8>>>),
    Dir,
}

type CallLog = Arc<Mutex<Vec<Call>>>;

#[derive(Default)]
pub struct MemStorage {
    nodes: Mutex<HashMap<PathBuf, Node>>,
    removed: Mutex<HashMap<PathBuf, Vec<u8>>>,
    calls: CallLog,
    deny_open: HashSet<PathBuf>,
    fail_sync_on_pass: Option<u32>,
    fail_write_on_pass: Option<u32>,
    corrupt_reads: bool,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, data: Vec<u8>) -> Self {
        self.nodes
            .lock()
            .unwrap()
            .insert(path.into(), Node::File(Arc::new(Mutex::new(data))));
        self
    }

    pub fn with_dir(self, path: &str) -> Self {
        self.nodes.lock().unwrap().insert(path.into(), Node::Dir);
        self
    }

    pub fn deny_open(mut self, path: &str) -> Self {
        self.deny_open.insert(path.into());
        self
    }

    /// Make the n-th sync on any handle fail.
    pub fn fail_sync_on_pass(mut self, pass: u32) -> Self {
        self.fail_sync_on_pass = Some(pass);
        self
    }

    /// Make the second write of the n-th pass fail, leaving that pass half done.
    pub fn fail_write_on_pass(mut self, pass: u32) -> Self {
        self.fail_write_on_pass = Some(pass);
        self
    }

    /// Flip bits in everything read back.
    pub fn corrupt_reads(mut self) -> Self {
        self.corrupt_reads = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.lock().unwrap().contains_key(Path::new(path))
    }

    /// Bytes a file held at the moment it was unlinked.
    pub fn removed_contents(&self, path: &str) -> Option<Vec<u8>> {
        self.removed.lock().unwrap().get(Path::new(path)).cloned()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn not_found() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "no such file or directory")
}

impl Storage for MemStorage {
    type File = MemFile;

    fn stat(&self, path: &Path) -> io::Result<NodeInfo> {
        self.record(Call::Stat(path.into()));
        match self.nodes.lock().unwrap().get(path) {
            Some(Node::File(data)) => Ok(NodeInfo {
                kind: NodeKind::File,
                len: data.lock().unwrap().len() as u64,
            }),
            Some(Node::Dir) => Ok(NodeInfo {
                kind: NodeKind::Dir,
                len: 0,
            }),
            None => Err(not_found()),
        }
    }

    fn open_for_overwrite(&self, path: &Path, read_back: bool) -> io::Result<MemFile> {
        self.record(Call::Open {
            path: path.into(),
            read_back,
        });
        if self.deny_open.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        match self.nodes.lock().unwrap().get(path) {
            Some(Node::File(data)) => Ok(MemFile {
                data: Arc::clone(data),
                pos: 0,
                syncs: 0,
                writes_in_pass: 0,
                readable: read_back,
                calls: Arc::clone(&self.calls),
                fail_sync_on: self.fail_sync_on_pass,
                fail_write_on: self.fail_write_on_pass,
                corrupt_reads: self.corrupt_reads,
            }),
            Some(Node::Dir) => Err(io::Error::new(io::ErrorKind::Other, "is a directory")),
            None => Err(not_found()),
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.record(Call::RemoveFile(path.into()));
        let mut nodes = self.nodes.lock().unwrap();
        match nodes.remove(path) {
            Some(Node::File(data)) => {
                let contents = data.lock().unwrap().clone();
                self.removed.lock().unwrap().insert(path.into(), contents);
                Ok(())
            }
            Some(dir @ Node::Dir) => {
                nodes.insert(path.into(), dir);
                Err(io::Error::new(io::ErrorKind::Other, "is a directory"))
            }
            None => Err(not_found()),
        }
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.record(Call::RemoveDir(path.into()));
        let mut nodes = self.nodes.lock().unwrap();
        if nodes.keys().any(|p| p != path && p.starts_with(path)) {
            return Err(io::Error::new(io::ErrorKind::Other, "directory not empty"));
        }
        match nodes.remove(path) {
            Some(Node::Dir) => Ok(()),
            Some(file) => {
                nodes.insert(path.into(), file);
                Err(io::Error::new(io::ErrorKind::Other, "not a directory"))
            }
            None => Err(not_found()),
        }
    }
}

pub struct MemFile {
    data: Arc<Mutex<Vec<u8>>>,
    pos: u64,
    syncs: u32,
    writes_in_pass: u32,
    readable: bool,
    calls: CallLog,
    fail_sync_on: Option<u32>,
    fail_write_on: Option<u32>,
    corrupt_reads: bool,
}

impl MemFile {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.record(Call::Write(buf.len()));
        self.writes_in_pass += 1;
        // Passes are counted by completed syncs.
        if self.fail_write_on == Some(self.syncs + 1) && self.writes_in_pass == 2 {
            return Err(io::Error::new(io::ErrorKind::Other, "injected write failure"));
        }
        let mut data = self.data.lock().unwrap();
        let start = self.pos as usize;
        let end = start + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        self.pos = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.record(Call::Flush);
        Ok(())
    }
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.readable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "opened without read access",
            ));
        }
        let data = self.data.lock().unwrap();
        let start = (self.pos as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        if self.corrupt_reads {
            for b in &mut buf[..n] {
                *b ^= 0xFF;
            }
        }
        drop(data);
        self.pos += n as u64;
        self.record(Call::Read(n));
        Ok(n)
    }
}

impl Seek for MemFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let SeekFrom::Start(offset) = pos else {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "only absolute seeks are recorded",
            ));
        };
        self.record(Call::Seek(offset));
        self.pos = offset;
        Ok(offset)
    }
}

impl StorageFile for MemFile {
    fn sync(&mut self) -> io::Result<()> {
        self.syncs += 1;
        self.writes_in_pass = 0;
        self.record(Call::Sync);
        if self.fail_sync_on == Some(self.syncs) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected sync failure"));
        }
        Ok(())
    }
}
