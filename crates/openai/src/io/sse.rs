use std::fmt::{self, Display};

use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ChunksError(err) => Display::fmt(err, f),
            Error::InvalidPayload => write!(f, "invalid event stream payload"),
        }
    }
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field is surfaced. Comments and every other field are
/// skipped. Multiple `data` lines of one event are joined with a line feed.
pub struct Sse {
    // Carriage returns are dropped on the way in, so an event always ends
    // with two line feeds regardless of how the chunks were split.
    buf: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain complete events that are already buffered first.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            else {
                // A trailing event without the blank line is incomplete,
                // it is dropped together with the buffer.
                return Ok(None);
            };
            self.buf
                .extend(bytes.iter().copied().filter(|b| *b != b'\r'));
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        // event         = *( comment / field ) end-of-line
        // comment       = colon *any-char end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        while let Some(eol_idx) = self.buf.windows(2).position(|w| w == b"\n\n")
        {
            let block: Vec<u8> = self.buf.drain(0..eol_idx + 2).collect();
            let Ok(block) = std::str::from_utf8(&block[..eol_idx]) else {
                return Err(Error::InvalidPayload);
            };

            let mut data: Option<String> = None;
            for line in block.split('\n') {
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let (name, value) = match line.split_once(':') {
                    Some((name, value)) => {
                        (name, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                match name {
                    "data" => {
                        let data = data.get_or_insert_default();
                        if !data.is_empty() {
                            data.push('\n');
                        }
                        data.push_str(value);
                    }
                    // `event`, `id`, `retry` and unknown fields.
                    _ => {}
                }
            }

            // Blocks made of comments only are keep-alives.
            if let Some(data) = data {
                return Ok(Some(data));
            }
        }
        Ok(None)
    }
}
