//! Lazy iteration over the scanlines that follow an XWD header.

use std::io::Read;

use super::error::{FormatError, XwdError};
use super::header::XwdHeader;
use super::pixel::{PixelLayout, Rgb};

/// Forward-only iterator over the decoded scanlines of a capture.
///
/// Each item is one scanline of `bytes_per_line` bytes decoded into
/// pixels, padding included. Iteration ends cleanly when the stream is
/// exhausted at a row boundary; a stream ending inside a row yields
/// [`FormatError::TruncatedRow`] and then ends.
pub struct XwdRows<R> {
    reader: R,
    layout: PixelLayout,
    bytes_per_line: u32,
    scanline: Vec<u8>,
    done: bool,
}

impl<R: Read> XwdRows<R> {
    /// Iterate over the rows in `reader`, which must be positioned at the
    /// first byte of pixel data.
    pub fn new(reader: R, header: &XwdHeader) -> Result<XwdRows<R>, XwdError> {
        let layout = super::pixel::check_supported(header)?;
        Ok(Self::with_layout(reader, layout, header.bytes_per_line))
    }

    pub(crate) fn with_layout(reader: R, layout: PixelLayout, bytes_per_line: u32) -> XwdRows<R> {
        XwdRows {
            reader,
            layout,
            bytes_per_line,
            scanline: Vec::new(),
            done: false,
        }
    }

    /// The pixel layout rows are decoded with.
    pub fn layout(&self) -> &PixelLayout {
        &self.layout
    }

    /// Read one full scanline. Returns `Ok(false)` if the stream ended before its first byte.
    fn read_scanline(&mut self) -> Result<bool, XwdError> {
        let expected = self.bytes_per_line as usize;
        self.scanline.clear();
        // The buffer only grows as far as the stream has data, whatever the
        // header claims `bytes_per_line` is
        let read = (&mut self.reader)
            .take(u64::from(self.bytes_per_line))
            .read_to_end(&mut self.scanline)?;
        match read {
            0 => Ok(false),
            n if n == expected => Ok(true),
            n => Err(FormatError::TruncatedRow { expected, read: n }.into()),
        }
    }
}

impl<R: Read> Iterator for XwdRows<R> {
    type Item = Result<Vec<Rgb>, XwdError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_scanline() {
            Ok(true) => Some(Ok(self.layout.decode(&self.scanline))),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for XwdRows<R> {}
