//! In-memory accumulation of captured audio.
//!
//! Chunks are kept in arrival order and only ever appended. Nothing here touches
//! the disk; long recordings are bounded by available memory.

use crate::error::{RecorderError, Result};

#[derive(Debug)]
enum Contents {
    /// Still collecting chunks.
    Live(Vec<Vec<i16>>),
    /// Chunks joined into one contiguous run; no further appends.
    Finalized(Vec<i16>),
    Disposed,
}

/// Ordered buffer of interleaved i16 samples owned by one recording session.
#[derive(Debug)]
pub struct CaptureBuffer {
    contents: Contents,
    sample_count: usize,
    channels: u16,
    open: bool,
}

impl CaptureBuffer {
    /// Creates an empty buffer that accepts frames immediately.
    pub fn new(channels: u16) -> Self {
        Self {
            contents: Contents::Live(Vec::new()),
            sample_count: 0,
            channels: channels.max(1),
            open: true,
        }
    }

    /// Appends a chunk of interleaved samples.
    ///
    /// Returns `Ok(false)` when the chunk was dropped because the buffer is closed
    /// for pause or already finalized.
    pub fn append(&mut self, chunk: Vec<i16>) -> Result<bool> {
        match &mut self.contents {
            Contents::Disposed => Err(RecorderError::BufferDisposed),
            Contents::Finalized(_) => Ok(false),
            Contents::Live(_) if !self.open => Ok(false),
            Contents::Live(chunks) => {
                if chunk.is_empty() {
                    return Ok(true);
                }
                self.sample_count += chunk.len();
                chunks.push(chunk);
                Ok(true)
            }
        }
    }

    /// Stops accepting frames while keeping everything captured so far.
    pub fn close_for_pause(&mut self) -> Result<()> {
        self.ensure_usable()?;
        self.open = false;
        Ok(())
    }

    /// Accepts frames again; new frames follow the earlier ones with no gap.
    pub fn reopen(&mut self) -> Result<()> {
        match self.contents {
            Contents::Disposed => Err(RecorderError::BufferDisposed),
            Contents::Finalized(_) => {
                tracing::debug!("Ignoring reopen of a finalized capture buffer");
                Ok(())
            }
            Contents::Live(_) => {
                self.open = true;
                Ok(())
            }
        }
    }

    /// Closes the buffer for good and returns the full sample sequence.
    ///
    /// Calling this again returns the same samples.
    pub fn finalize(&mut self) -> Result<&[i16]> {
        if let Contents::Live(chunks) = &mut self.contents {
            let mut joined = Vec::with_capacity(self.sample_count);
            for chunk in chunks.drain(..) {
                joined.extend_from_slice(&chunk);
            }
            self.contents = Contents::Finalized(joined);
            self.open = false;
        }

        match &self.contents {
            Contents::Finalized(samples) => Ok(samples),
            _ => Err(RecorderError::BufferDisposed),
        }
    }

    /// Releases the held memory. Every later call except `discard` fails.
    pub fn discard(&mut self) {
        self.contents = Contents::Disposed;
        self.sample_count = 0;
        self.open = false;
    }

    /// Whether new frames are currently accepted.
    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.open && matches!(self.contents, Contents::Live(_))
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.contents, Contents::Disposed)
    }

    /// Total interleaved samples held.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Total frames held (one sample per channel).
    pub fn frame_count(&self) -> usize {
        self.sample_count / self.channels as usize
    }

    /// The most recent `count` samples, for level metering.
    pub fn tail(&self, count: usize) -> Vec<i16> {
        let mut out = Vec::with_capacity(count);
        match &self.contents {
            Contents::Live(chunks) => {
                for chunk in chunks.iter().rev() {
                    if out.len() >= count {
                        break;
                    }
                    let take = (count - out.len()).min(chunk.len());
                    out.splice(0..0, chunk[chunk.len() - take..].iter().copied());
                }
            }
            Contents::Finalized(samples) => {
                let start = samples.len().saturating_sub(count);
                out.extend_from_slice(&samples[start..]);
            }
            Contents::Disposed => {}
        }
        out
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(RecorderError::BufferDisposed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_append_preserves_order() {
        let mut buffer = CaptureBuffer::new(1);
        assert!(buffer.append(vec![1, 2]).unwrap());
        assert!(buffer.append(vec![3]).unwrap());
        assert_eq!(buffer.sample_count(), 3);
        assert_eq!(buffer.finalize().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_closed_buffer_drops_frames() {
        let mut buffer = CaptureBuffer::new(2);
        buffer.append(vec![1, 1]).unwrap();
        buffer.close_for_pause().unwrap();
        assert!(!buffer.append(vec![9, 9]).unwrap());
        buffer.reopen().unwrap();
        buffer.append(vec![2, 2]).unwrap();
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.finalize().unwrap(), &[1, 1, 2, 2]);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut buffer = CaptureBuffer::new(1);
        buffer.append(vec![5, 6]).unwrap();
        let first = buffer.finalize().unwrap().to_vec();
        assert!(!buffer.append(vec![7]).unwrap());
        assert_eq!(buffer.finalize().unwrap(), first.as_slice());
        assert!(!buffer.is_open());
    }

    #[test]
    fn test_discarded_buffer_rejects_use() {
        let mut buffer = CaptureBuffer::new(1);
        buffer.append(vec![1]).unwrap();
        buffer.discard();
        assert_eq!(buffer.sample_count(), 0);
        assert_eq!(
            buffer.append(vec![2]).unwrap_err().kind(),
            ErrorKind::BufferDisposed
        );
        assert_eq!(buffer.finalize().unwrap_err().kind(), ErrorKind::BufferDisposed);
        assert_eq!(
            buffer.close_for_pause().unwrap_err().kind(),
            ErrorKind::BufferDisposed
        );
    }

    #[test]
    fn test_tail_spans_chunks() {
        let mut buffer = CaptureBuffer::new(1);
        buffer.append(vec![1, 2, 3]).unwrap();
        buffer.append(vec![4, 5]).unwrap();
        assert_eq!(buffer.tail(3), vec![3, 4, 5]);
        assert_eq!(buffer.tail(10), vec![1, 2, 3, 4, 5]);
    }
}
