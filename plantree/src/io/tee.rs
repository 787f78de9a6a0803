//! Reader adapter that echoes every byte it yields.

use std::io::{self, Read, Write};

/// Writes each chunk read from `reader` to `writer` before returning it.
///
/// The writer is flushed after every chunk so partial lines show up
/// immediately.
pub struct TeeReader<R, W> {
    reader: R,
    writer: W,
}

impl<R: Read, W: Write> TeeReader<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: Read, W: Write> Read for TeeReader<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.writer.write_all(&buf[..n])?;
            self.writer.flush()?;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};

    #[test]
    fn echoes_exactly_what_was_read() {
        let input = b"one\ntwo\nthree\n";
        let mut echo = Vec::new();
        let mut reader = BufReader::new(TeeReader::new(&input[..], &mut echo));
        let mut first = String::new();
        reader.read_line(&mut first).expect("read line");
        assert_eq!(first, "one\n");
        drop(reader);
        // the buffered reader pulled ahead; everything it pulled was echoed once
        assert_eq!(echo, input);
    }

    #[test]
    fn unread_tail_is_left_in_source() {
        let mut source: &[u8] = b"abcdef";
        let mut echo = Vec::new();
        {
            let mut tee = TeeReader::new(&mut source, &mut echo);
            let mut buf = [0u8; 2];
            tee.read_exact(&mut buf).expect("read");
        }
        assert_eq!(echo, b"ab");
        assert_eq!(source, b"cdef");
    }
}
