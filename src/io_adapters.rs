use std::cell::RefCell;
use std::io::{Result as IoResult, Write};
use std::rc::Rc;

/// Memory-backed writer for capturing what the shell prints.
///
/// Clones share the same buffer, so one handle can be given to the shell
/// while another reads the collected bytes.
#[derive(Debug, Clone, Default)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    /// Creates a writer with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemWriter;
    use std::io::Write;

    #[test]
    fn test_clones_share_buffer() {
        let mut writer = MemWriter::new();
        let reader = writer.clone();
        write!(writer, "hello ").unwrap();
        writer.write_all(b"world").unwrap();

        assert_eq!(reader.contents(), "hello world");
        assert_eq!(writer.contents(), reader.contents());
    }
}
