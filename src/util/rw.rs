use std::{cell::RefCell, fmt::Write, io, path::PathBuf, rc::Rc};

use super::basic::SError;

const UTF8_BOM: char = '\u{feff}';

pub type RcRefCell<T> = Rc<RefCell<T>>;

/// An in-memory io::Write target. Report writers and error streams can be
/// pointed at one in tests and the output inspected afterwards.
pub struct StringBuffer {
    s: String,
}

impl StringBuffer {
    pub fn new() -> StringBuffer {
        StringBuffer { s: String::new() }
    }

    pub fn as_str(&self) -> &str {
        self.s.as_str()
    }
}

// String only implements fmt::Write
impl io::Write for StringBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let str_rep =
            std::str::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.s
            .write_str(str_rep)
            .map(|_| buf.len())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A shared stream writer. Console tables go to one and user-facing
/// warnings to another, so either can be captured or silenced.
#[derive(Clone)]
pub struct WriteHandle {
    w: RcRefCell<dyn io::Write>,
}

impl WriteHandle {
    fn wrap<W: io::Write + 'static>(w: W) -> WriteHandle {
        WriteHandle { w: Rc::new(RefCell::new(w)) }
    }

    pub fn stdout_write_handle() -> WriteHandle {
        WriteHandle::wrap(io::stdout())
    }

    pub fn stderr_write_handle() -> WriteHandle {
        WriteHandle::wrap(io::stderr())
    }

    pub fn string_buff_write_handle() -> (WriteHandle, RcRefCell<StringBuffer>) {
        let buffer = Rc::new(RefCell::new(StringBuffer::new()));
        (WriteHandle { w: buffer.clone() }, buffer)
    }

    pub fn empty_write_handle() -> WriteHandle {
        WriteHandle::wrap(io::empty())
    }
}

impl io::Write for WriteHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // The test harness cannot capture direct writes to stdout/stderr,
        // so mirror them to tracing.
        tracing::trace!("WriteHandle::write {}", String::from_utf8_lossy(buf));
        self.w.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.w.borrow_mut().flush()
    }
}

/// A statement or configuration source, along with a name to describe it
/// in messages. Either a path on disk (read lazily), or text already
/// loaded.
pub enum DescribedReader {
    String((String, String)),
    FilePath(PathBuf),
}

impl DescribedReader {
    pub fn from_string(desc: String, data: String) -> DescribedReader {
        DescribedReader::String((desc, data))
    }

    pub fn from_file_path(path: PathBuf) -> DescribedReader {
        DescribedReader::FilePath(path)
    }

    pub fn desc(&self) -> &str {
        match self {
            DescribedReader::String((name, _)) => name,
            DescribedReader::FilePath(path) => path.to_str().unwrap_or("<unknown path>"),
        }
    }

    /// Reads the whole source as UTF-8, dropping a leading byte order mark.
    pub fn read_to_string(&self) -> Result<String, SError> {
        let text = match self {
            DescribedReader::String((_, text)) => text.clone(),
            DescribedReader::FilePath(path) => {
                let bytes = std::fs::read(path)
                    .map_err(|e| format!("Unable to open {}: {}", self.desc(), e))?;
                String::from_utf8(bytes)
                    .map_err(|e| format!("Unable to read {}: {}", self.desc(), e))?
            }
        };
        match text.strip_prefix(UTF8_BOM) {
            Some(stripped) => Ok(stripped.to_string()),
            None => Ok(text),
        }
    }
}
