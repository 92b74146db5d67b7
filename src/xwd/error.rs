use std::fmt::{self, Display};
use std::io;

use image::error::{DecodingError, ImageFormatHint, UnsupportedError, UnsupportedErrorKind};
use image::ImageError;

/// The stream does not have the shape of an XWD version 7 capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Declared header size is not below the configured limit
    HeaderTooLarge(u32),
    /// Declared header size leaves no room for the NUL terminated window name
    HeaderTooSmall(u32),
    /// Only version 7 files are understood
    UnsupportedVersion(u32),
    /// Both or neither reading of the header size field is plausible
    AmbiguousEndianness { big: u32, little: u32 },
    /// Pixel byte order is neither LSBFirst (0) nor MSBFirst (1)
    InvalidByteOrder(u32),
    /// Visual class is outside the range defined by X11
    InvalidVisualClass(u32),
    /// A scanline does not hold `pixmap_width` pixels
    ScanlineTooShort { bytes_per_line: u32, needed: u64 },
    /// The stream ended partway through a scanline
    TruncatedRow { expected: usize, read: usize },
}

impl Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderTooLarge(size) => {
                f.write_fmt(format_args!("Header size too big: {size}"))
            }
            Self::HeaderTooSmall(size) => {
                f.write_fmt(format_args!("Header size {size} is too small"))
            }
            Self::UnsupportedVersion(version) => f.write_fmt(format_args!(
                "Only version 7 is supported, not version {version}"
            )),
            Self::AmbiguousEndianness { big, little } => f.write_fmt(format_args!(
                "Cannot determine header byte order (big endian size {big}, little endian size {little})"
            )),
            Self::InvalidByteOrder(order) => {
                f.write_fmt(format_args!("Invalid pixel byte order {order}"))
            }
            Self::InvalidVisualClass(class) => {
                f.write_fmt(format_args!("Invalid visual class {class}"))
            }
            Self::ScanlineTooShort {
                bytes_per_line,
                needed,
            } => f.write_fmt(format_args!(
                "Scanline of {bytes_per_line} bytes cannot hold {needed} bytes of pixels"
            )),
            Self::TruncatedRow { expected, read } => f.write_fmt(format_args!(
                "Scanline truncated: read {read} of {expected} bytes"
            )),
        }
    }
}

impl std::error::Error for FormatError {}

/// The stream is a valid capture, but uses a feature this decoder does not handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotImplementedError {
    /// Anything but TrueColor needs a colormap
    UnsupportedVisualClass(u32),
    /// Bits per pixel must be one of 8, 16, 24 or 32
    UnsupportedBitDepth(u32),
    /// A TrueColor channel mask selects no bits
    EmptyChannelMask(&'static str),
}

impl Display for NotImplementedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVisualClass(class) => {
                f.write_fmt(format_args!("Cannot handle visual class {class}"))
            }
            Self::UnsupportedBitDepth(bits) => {
                f.write_fmt(format_args!("Cannot handle bits per pixel of {bits}"))
            }
            Self::EmptyChannelMask(channel) => {
                f.write_fmt(format_args!("The {channel} channel mask is zero"))
            }
        }
    }
}

impl std::error::Error for NotImplementedError {}

/// Any failure while reading an XWD stream.
#[derive(Debug)]
pub enum XwdError {
    Format(FormatError),
    NotImplemented(NotImplementedError),
    Io(io::Error),
}

impl Display for XwdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(e) => e.fmt(f),
            Self::NotImplemented(e) => e.fmt(f),
            Self::Io(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for XwdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Format(e) => Some(e),
            Self::NotImplemented(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<FormatError> for XwdError {
    fn from(e: FormatError) -> XwdError {
        XwdError::Format(e)
    }
}

impl From<NotImplementedError> for XwdError {
    fn from(e: NotImplementedError) -> XwdError {
        XwdError::NotImplemented(e)
    }
}

impl From<io::Error> for XwdError {
    fn from(e: io::Error) -> XwdError {
        XwdError::Io(e)
    }
}

impl From<FormatError> for ImageError {
    fn from(e: FormatError) -> ImageError {
        ImageError::Decoding(DecodingError::new(format_hint(), e))
    }
}

impl From<NotImplementedError> for ImageError {
    fn from(e: NotImplementedError) -> ImageError {
        ImageError::Unsupported(UnsupportedError::from_format_and_kind(
            format_hint(),
            UnsupportedErrorKind::GenericFeature(e.to_string()),
        ))
    }
}

impl From<XwdError> for ImageError {
    fn from(e: XwdError) -> ImageError {
        match e {
            XwdError::Format(inner) => inner.into(),
            XwdError::NotImplemented(inner) => inner.into(),
            XwdError::Io(inner) => ImageError::IoError(inner),
        }
    }
}

pub(crate) fn format_hint() -> ImageFormatHint {
    ImageFormatHint::Name("XWD".to_string())
}
