//! Parsing of the XWD file header.
//!
//! The header is 25 32-bit words (`header_size`, `version`, then 23
//! pixmap, visual and window fields), followed by a NUL terminated window
//! name whose length is implied by `header_size`, followed by `ncolors`
//! 12-byte color table entries. Pixel data starts right after the color
//! table.

use std::io::{self, Read};

use super::error::{FormatError, XwdError};

/// The only file version this decoder accepts.
pub const XWD_FILE_VERSION: u32 = 7;

/// Header sizes at or above this value are not considered plausible.
///
/// There is no magic number in the format, so a small header size is the
/// only sanity check available.
pub const DEFAULT_MAX_HEADER_SIZE: u32 = 65536;

/// Number of 32-bit words in the fixed part of the header.
const HEADER_WORDS: usize = 25;

/// Length of the fixed part of the header, in bytes.
pub const FIXED_HEADER_LENGTH: u32 = 4 * HEADER_WORDS as u32;

/// Length of one color table entry: pixel (u32), red/green/blue (u16), flags and padding (u8).
const COLOR_ENTRY_LENGTH: u64 = 12;

/// Order of bytes in a multi-byte value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    /// Least significant byte first (X11 `LSBFirst`, 0)
    LsbFirst,
    /// Most significant byte first (X11 `MSBFirst`, 1)
    MsbFirst,
}

impl ByteOrder {
    fn from_code(code: u32) -> Result<ByteOrder, FormatError> {
        match code {
            0 => Ok(ByteOrder::LsbFirst),
            1 => Ok(ByteOrder::MsbFirst),
            _ => Err(FormatError::InvalidByteOrder(code)),
        }
    }

    /// The X11 protocol value of this byte order.
    pub fn code(self) -> u32 {
        match self {
            ByteOrder::LsbFirst => 0,
            ByteOrder::MsbFirst => 1,
        }
    }

    pub(crate) fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::LsbFirst => u32::from_le_bytes(bytes),
            ByteOrder::MsbFirst => u32::from_be_bytes(bytes),
        }
    }
}

/// X11 visual classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum VisualClass {
    StaticGray = 0,
    GrayScale = 1,
    StaticColor = 2,
    PseudoColor = 3,
    TrueColor = 4,
    DirectColor = 5,
}

impl VisualClass {
    fn from_code(code: u32) -> Result<VisualClass, FormatError> {
        Ok(match code {
            0 => VisualClass::StaticGray,
            1 => VisualClass::GrayScale,
            2 => VisualClass::StaticColor,
            3 => VisualClass::PseudoColor,
            4 => VisualClass::TrueColor,
            5 => VisualClass::DirectColor,
            _ => return Err(FormatError::InvalidVisualClass(code)),
        })
    }
}

/// How the byte order of the header words is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EndiannessPolicy {
    /// Header words are always big endian, as `XWDFile.h` states.
    #[default]
    FixedBigEndian,
    /// Try both readings of `header_size`; exactly one of them must be
    /// below the size limit, and that byte order is used for the whole header.
    Heuristic,
}

impl EndiannessPolicy {
    /// Pick the header byte order from the raw `header_size` bytes.
    fn resolve(self, size_bytes: [u8; 4], limit: u32) -> Result<(ByteOrder, u32), FormatError> {
        match self {
            EndiannessPolicy::FixedBigEndian => {
                let size = u32::from_be_bytes(size_bytes);
                if size >= limit {
                    return Err(FormatError::HeaderTooLarge(size));
                }
                Ok((ByteOrder::MsbFirst, size))
            }
            EndiannessPolicy::Heuristic => {
                let big = u32::from_be_bytes(size_bytes);
                let little = u32::from_le_bytes(size_bytes);
                match (big < limit, little < limit) {
                    (true, false) => Ok((ByteOrder::MsbFirst, big)),
                    (false, true) => Ok((ByteOrder::LsbFirst, little)),
                    _ => Err(FormatError::AmbiguousEndianness { big, little }),
                }
            }
        }
    }
}

/// Options controlling header parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderOptions {
    pub endianness: EndiannessPolicy,
    /// Exclusive upper bound on a plausible `header_size`
    pub max_header_size: u32,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        HeaderOptions {
            endianness: EndiannessPolicy::default(),
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
        }
    }
}

/// Parsed XWD header. Produced once per stream and never modified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XwdHeader {
    pub header_size: u32,
    pub version: u32,
    /// Byte order the header words were read in
    pub header_byte_order: ByteOrder,
    pub pixmap_format: u32,
    pub pixmap_depth: u32,
    pub pixmap_width: u32,
    pub pixmap_height: u32,
    pub xoffset: u32,
    /// Byte order of the pixel values
    pub byte_order: ByteOrder,
    pub bitmap_unit: u32,
    pub bitmap_bit_order: u32,
    pub bitmap_pad: u32,
    pub bits_per_pixel: u32,
    pub bytes_per_line: u32,
    pub visual_class: VisualClass,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub bits_per_rgb: u32,
    pub colormap_entries: u32,
    pub ncolors: u32,
    pub window_width: u32,
    pub window_height: u32,
    pub window_x: u32,
    pub window_y: u32,
    pub window_bdrwidth: u32,
    /// Window name without its NUL terminator
    pub window_name: Vec<u8>,
}

impl XwdHeader {
    /// All header fields as `(name, value)` pairs, sorted by name.
    ///
    /// Masks are rendered in hexadecimal, the window name as (lossy) UTF-8.
    pub fn info(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("header_size", self.header_size.to_string()),
            ("version", self.version.to_string()),
            ("pixmap_format", self.pixmap_format.to_string()),
            ("pixmap_depth", self.pixmap_depth.to_string()),
            ("pixmap_width", self.pixmap_width.to_string()),
            ("pixmap_height", self.pixmap_height.to_string()),
            ("xoffset", self.xoffset.to_string()),
            ("byte_order", self.byte_order.code().to_string()),
            ("bitmap_unit", self.bitmap_unit.to_string()),
            ("bitmap_bit_order", self.bitmap_bit_order.to_string()),
            ("bitmap_pad", self.bitmap_pad.to_string()),
            ("bits_per_pixel", self.bits_per_pixel.to_string()),
            ("bytes_per_line", self.bytes_per_line.to_string()),
            ("visual_class", (self.visual_class as u32).to_string()),
            ("red_mask", format!("{:#x}", self.red_mask)),
            ("green_mask", format!("{:#x}", self.green_mask)),
            ("blue_mask", format!("{:#x}", self.blue_mask)),
            ("bits_per_rgb", self.bits_per_rgb.to_string()),
            ("colormap_entries", self.colormap_entries.to_string()),
            ("ncolors", self.ncolors.to_string()),
            ("window_width", self.window_width.to_string()),
            ("window_height", self.window_height.to_string()),
            ("window_x", self.window_x.to_string()),
            ("window_y", self.window_y.to_string()),
            ("window_bdrwidth", self.window_bdrwidth.to_string()),
            (
                "window_name",
                String::from_utf8_lossy(&self.window_name).into_owned(),
            ),
        ];
        fields.sort_unstable_by_key(|&(name, _)| name);
        fields
    }
}

/// Read the header, window name and color table from `reader`.
///
/// On success the reader is positioned at the first byte of pixel data.
pub fn parse_header<R: Read>(reader: &mut R, options: &HeaderOptions) -> Result<XwdHeader, XwdError> {
    let mut raw = [0_u8; FIXED_HEADER_LENGTH as usize];
    reader.read_exact(&mut raw[..8])?;

    let (order, header_size) = options
        .endianness
        .resolve(word_bytes(&raw, 0), options.max_header_size)?;

    let version = order.read_u32(word_bytes(&raw, 1));
    if version != XWD_FILE_VERSION {
        return Err(FormatError::UnsupportedVersion(version).into());
    }

    reader.read_exact(&mut raw[8..])?;
    let word = |index: usize| order.read_u32(word_bytes(&raw, index));

    let window_name_len = match header_size.checked_sub(FIXED_HEADER_LENGTH) {
        Some(len) if len > 0 => len,
        _ => return Err(FormatError::HeaderTooSmall(header_size).into()),
    };

    let mut header = XwdHeader {
        header_size,
        version,
        header_byte_order: order,
        pixmap_format: word(2),
        pixmap_depth: word(3),
        pixmap_width: word(4),
        pixmap_height: word(5),
        xoffset: word(6),
        byte_order: ByteOrder::from_code(word(7))?,
        bitmap_unit: word(8),
        bitmap_bit_order: word(9),
        bitmap_pad: word(10),
        bits_per_pixel: word(11),
        bytes_per_line: word(12),
        visual_class: VisualClass::from_code(word(13))?,
        red_mask: word(14),
        green_mask: word(15),
        blue_mask: word(16),
        bits_per_rgb: word(17),
        colormap_entries: word(18),
        ncolors: word(19),
        window_width: word(20),
        window_height: word(21),
        window_x: word(22),
        window_y: word(23),
        window_bdrwidth: word(24),
        window_name: Vec::new(),
    };

    // The terminator is dropped without being checked
    let mut name = vec![0_u8; window_name_len as usize];
    reader.read_exact(&mut name)?;
    name.pop();
    header.window_name = name;

    skip_color_table(reader, header.ncolors)?;

    Ok(header)
}

fn word_bytes(raw: &[u8; FIXED_HEADER_LENGTH as usize], index: usize) -> [u8; 4] {
    [
        raw[4 * index],
        raw[4 * index + 1],
        raw[4 * index + 2],
        raw[4 * index + 3],
    ]
}

/// The color table is only meaningful for colormapped visuals, which are not decoded.
fn skip_color_table<R: Read>(reader: &mut R, ncolors: u32) -> io::Result<()> {
    let len = u64::from(ncolors) * COLOR_ENTRY_LENGTH;
    let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if skipped != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "color table truncated",
        ));
    }
    Ok(())
}
