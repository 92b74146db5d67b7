//! Decoding of X Window Dump (.xwd) Images
//!
//! XWD is the format written by the X11 `xwd` utility: a header describing
//! the captured window's visual, the window name, an optional color table,
//! then the raw scanlines of the pixmap.
//!
//! This decoder handles version 7 files with a TrueColor visual at 8, 16,
//! 24 or 32 bits per pixel. It does not support:
//! - Colormapped visuals (StaticGray, GrayScale, StaticColor, PseudoColor,
//!   DirectColor). The color table is skipped, never interpreted.
//! - Bitmap (XYBitmap/XYPixmap) depths below 8 bits per pixel.
//!
//! Values in the header are most significant byte first. Some writers
//! use the host byte order instead; [`EndiannessPolicy::Heuristic`]
//! accepts those files by guessing from the header size.
//!
//! # Related Links
//! * <https://gitlab.freedesktop.org/xorg/proto/xorgproto/-/blob/master/include/X11/XWDFile.h> - `XWDFile.h`
//! * <https://en.wikipedia.org/wiki/Xwd> - xwd on Wikipedia

use std::io::{BufRead, Read};

use image::error::{LimitError, LimitErrorKind};
use image::{ColorType, ExtendedColorType, ImageDecoder, ImageError, ImageResult, LimitSupport, Limits};

mod error;
mod header;
mod pixel;
mod rows;

pub use self::error::{FormatError, NotImplementedError, XwdError};
pub use self::header::{
    parse_header, ByteOrder, EndiannessPolicy, HeaderOptions, VisualClass, XwdHeader,
    DEFAULT_MAX_HEADER_SIZE, FIXED_HEADER_LENGTH, XWD_FILE_VERSION,
};
pub use self::pixel::{check_supported, decode_row, PixelLayout, Rgb};
pub use self::rows::XwdRows;

/// Decoder for XWD images.
pub struct XwdDecoder<R> {
    header: XwdHeader,
    layout: PixelLayout,
    reader: R,
}

impl<R> XwdDecoder<R>
where
    R: BufRead,
{
    /// Create a new `XwdDecoder`, reading big endian headers only.
    pub fn new(r: R) -> Result<XwdDecoder<R>, ImageError> {
        Self::with_options(r, HeaderOptions::default())
    }

    /// Create a new `XwdDecoder` with explicit header parsing options.
    pub fn with_options(mut r: R, options: HeaderOptions) -> Result<XwdDecoder<R>, ImageError> {
        let header = parse_header(&mut r, &options)?;
        let layout = check_supported(&header)?;

        let needed = u64::from(header.pixmap_width) * layout.bytes_per_pixel() as u64;
        if u64::from(header.bytes_per_line) < needed {
            return Err(FormatError::ScanlineTooShort {
                bytes_per_line: header.bytes_per_line,
                needed,
            }
            .into());
        }

        Ok(XwdDecoder {
            header,
            layout,
            reader: r,
        })
    }

    /// The parsed file header.
    pub fn header(&self) -> &XwdHeader {
        &self.header
    }

    /// Stream the decoded rows instead of decoding into a buffer.
    pub fn into_rows(self) -> XwdRows<R> {
        XwdRows::with_layout(self.reader, self.layout, self.header.bytes_per_line)
    }
}

impl<R: BufRead> ImageDecoder for XwdDecoder<R> {
    fn dimensions(&self) -> (u32, u32) {
        (self.header.pixmap_width, self.header.pixmap_height)
    }

    fn color_type(&self) -> ColorType {
        ColorType::Rgb8
    }

    fn original_color_type(&self) -> ExtendedColorType {
        if self.layout.is_rgb8() && self.layout.bytes_per_pixel() >= 3 {
            ExtendedColorType::Rgb8
        } else {
            ExtendedColorType::Unknown(self.header.bits_per_pixel as u8)
        }
    }

    fn read_image(self, buf: &mut [u8]) -> ImageResult<()> {
        assert_eq!(u64::try_from(buf.len()), Ok(self.total_bytes()));

        let width = self.header.pixmap_width as usize;
        if buf.is_empty() {
            return Ok(());
        }
        let layout = self.layout;
        let mut rows = self.into_rows();
        for out_row in buf.chunks_exact_mut(3 * width) {
            let row = match rows.next() {
                Some(row) => row?,
                None => {
                    return Err(ImageError::IoError(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "XWD image ended before all scanlines were read",
                    )))
                }
            };
            // Scanline padding past the pixmap width is dropped
            for (out, &px) in out_row.chunks_exact_mut(3).zip(&row[..width]) {
                out.copy_from_slice(&layout.to_rgb8(px));
            }
        }
        Ok(())
    }

    fn read_image_boxed(self: Box<Self>, buf: &mut [u8]) -> ImageResult<()> {
        (*self).read_image(buf)
    }

    fn set_limits(&mut self, limits: Limits) -> ImageResult<()> {
        limits.check_support(&LimitSupport::default())?;
        let (width, height) = self.dimensions();
        limits.check_dimensions(width, height)?;

        // One scanline plus its decoded pixels are held at a time. This will
        // not overflow, because it is at most (2^32-1) * 13
        let scanline_bytes =
            u64::from(self.header.bytes_per_line) * (1 + std::mem::size_of::<Rgb>() as u64);
        // `total_bytes` saturates at u64::MAX for huge dimensions, so the sum must too
        let max_bytes = self.total_bytes().saturating_add(scanline_bytes);

        let max_alloc = limits.max_alloc.unwrap_or(u64::MAX);
        if max_alloc < max_bytes {
            return Err(ImageError::Limits(LimitError::from_kind(
                LimitErrorKind::InsufficientMemory,
            )));
        }
        Ok(())
    }
}

/// Parse the header of `r` and stream its decoded rows.
///
/// Unlike [`XwdDecoder`] this does not require `BufRead`, and does not
/// check that the scanlines are wide enough for `pixmap_width`.
pub fn open_rows<R: Read>(mut r: R, options: &HeaderOptions) -> Result<(XwdHeader, XwdRows<R>), XwdError> {
    let header = parse_header(&mut r, options)?;
    let rows = XwdRows::new(r, &header)?;
    Ok((header, rows))
}
