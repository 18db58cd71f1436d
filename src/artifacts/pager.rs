use minus::Pager;
use std::io::{self, Write};

/// Buffers command output and hands it to the `minus` pager
///
/// Output arrives in arbitrary chunks, so bytes are held back until they
/// form complete UTF-8 text; invalid sequences are replaced rather than
/// rejected.
pub struct PagerWriter {
    pager: Pager,
    pending: Vec<u8>,
}

impl PagerWriter {
    pub fn new(pager: Pager) -> Self {
        PagerWriter {
            pager,
            pending: Vec::new(),
        }
    }

    fn push_pending(&mut self, force: bool) -> io::Result<()> {
        let valid_up_to = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(error) if error.error_len().is_none() && !force => error.valid_up_to(),
            Err(_) => self.pending.len(),
        };

        let text = String::from_utf8_lossy(&self.pending[..valid_up_to]).into_owned();
        self.pending.drain(..valid_up_to);
        self.pager.push_str(text).map_err(io::Error::other)
    }
}

impl Write for PagerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.push_pending(false)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.push_pending(true)
    }
}

impl Drop for PagerWriter {
    fn drop(&mut self) {
        let _ = self.push_pending(true);
    }
}
