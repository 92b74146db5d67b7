//! Decoding of TrueColor scanlines into RGB triples.

use super::error::NotImplementedError;
use super::header::{ByteOrder, VisualClass, XwdHeader};

/// One decoded pixel. Channel values are in the range of their mask,
/// e.g. `0..=31` for a 5-bit red mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u32,
    pub g: u32,
    pub b: u32,
}

/// A contiguous channel mask, with the shift that moves its lowest bit to bit 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelMask {
    mask: u32,
    shift: u32,
}

impl ChannelMask {
    fn new(mask: u32, channel: &'static str) -> Result<ChannelMask, NotImplementedError> {
        if mask == 0 {
            return Err(NotImplementedError::EmptyChannelMask(channel));
        }
        Ok(ChannelMask {
            mask,
            shift: mask.trailing_zeros(),
        })
    }

    #[inline]
    fn extract(self, word: u32) -> u32 {
        (word & self.mask) >> self.shift
    }

    /// Largest value the channel can take.
    fn max(self) -> u32 {
        self.mask >> self.shift
    }

    /// Rescale a channel value to `0..=255`.
    fn to_u8(self, value: u32) -> u8 {
        // `value` comes from `extract`, so it is at most `max` and the
        // quotient is at most 255; `max` is non-zero because the mask is
        let max = u64::from(self.max());
        ((u64::from(value) * 255 + max / 2) / max) as u8
    }

    /// Whether the channel is exactly 8 bits wide.
    fn is_8bit(self) -> bool {
        self.max() == 0xFF
    }
}

/// Everything needed to decode the scanlines of one capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelLayout {
    bytes_per_pixel: usize,
    byte_order: ByteOrder,
    red: ChannelMask,
    green: ChannelMask,
    blue: ChannelMask,
}

impl PixelLayout {
    /// Bytes occupied by one pixel in a scanline.
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// Whether every channel decodes to 8 bits without rescaling.
    pub fn is_rgb8(&self) -> bool {
        self.red.is_8bit() && self.green.is_8bit() && self.blue.is_8bit()
    }

    /// Decode one pixel of `bytes.len() <= 4` bytes.
    #[inline]
    fn pixel(&self, bytes: &[u8]) -> Rgb {
        // Zero pad to a full word on the most significant side
        let mut word = [0_u8; 4];
        let word = match self.byte_order {
            ByteOrder::MsbFirst => {
                word[4 - bytes.len()..].copy_from_slice(bytes);
                u32::from_be_bytes(word)
            }
            ByteOrder::LsbFirst => {
                word[..bytes.len()].copy_from_slice(bytes);
                u32::from_le_bytes(word)
            }
        };
        Rgb {
            r: self.red.extract(word),
            g: self.green.extract(word),
            b: self.blue.extract(word),
        }
    }

    /// Decode a scanline. A trailing partial pixel is decoded from the bytes available.
    pub fn decode(&self, row: &[u8]) -> Vec<Rgb> {
        row.chunks(self.bytes_per_pixel)
            .map(|px| self.pixel(px))
            .collect()
    }

    /// Convert a decoded pixel to 8 bits per channel.
    pub fn to_rgb8(&self, px: Rgb) -> [u8; 3] {
        [
            self.red.to_u8(px.r),
            self.green.to_u8(px.g),
            self.blue.to_u8(px.b),
        ]
    }
}

/// Check that the pixels described by `header` can be decoded.
///
/// Only TrueColor visuals with 8, 16, 24 or 32 bits per pixel and non-zero
/// masks are handled.
pub fn check_supported(header: &XwdHeader) -> Result<PixelLayout, NotImplementedError> {
    if header.visual_class != VisualClass::TrueColor {
        return Err(NotImplementedError::UnsupportedVisualClass(
            header.visual_class as u32,
        ));
    }

    let bits = header.bits_per_pixel;
    if bits == 0 || bits % 8 != 0 || bits / 8 > 4 {
        return Err(NotImplementedError::UnsupportedBitDepth(bits));
    }

    Ok(PixelLayout {
        bytes_per_pixel: (bits / 8) as usize,
        byte_order: header.byte_order,
        red: ChannelMask::new(header.red_mask, "red")?,
        green: ChannelMask::new(header.green_mask, "green")?,
        blue: ChannelMask::new(header.blue_mask, "blue")?,
    })
}

/// Decode one scanline of `header.bytes_per_line` bytes.
///
/// The result holds one pixel per `bits_per_pixel / 8` bytes of `row`,
/// which includes any padding pixels past `pixmap_width`; callers that need
/// the exact width must truncate it themselves.
pub fn decode_row(header: &XwdHeader, row: &[u8]) -> Result<Vec<Rgb>, NotImplementedError> {
    Ok(check_supported(header)?.decode(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xwd::header::testing::*;
    use crate::xwd::header::{parse_header, HeaderOptions};
    use std::io::Cursor;

    fn header(builder: CaptureBuilder) -> XwdHeader {
        parse_header(&mut Cursor::new(builder.build(&[])), &HeaderOptions::default()).unwrap()
    }

    #[test]
    fn msb_first_32bit() {
        let h = header(CaptureBuilder::new(1, 1));
        let row = decode_row(&h, &[0x00, 0x10, 0x20, 0x30]).unwrap();
        assert_eq!(
            row,
            [Rgb {
                r: 0x10,
                g: 0x20,
                b: 0x30
            }]
        );
    }

    #[test]
    fn lsb_first_32bit() {
        let h = header(CaptureBuilder::new(1, 1).set(BYTE_ORDER, 0));
        let row = decode_row(&h, &[0x30, 0x20, 0x10, 0x00]).unwrap();
        assert_eq!(
            row,
            [Rgb {
                r: 0x10,
                g: 0x20,
                b: 0x30
            }]
        );
    }

    #[test]
    fn rgb565_lsb_first() {
        let h = header(
            CaptureBuilder::new(2, 1)
                .set(BYTE_ORDER, 0)
                .set(BITS_PER_PIXEL, 16)
                .set(BYTES_PER_LINE, 4)
                .set(RED_MASK, 0xF800)
                .set(GREEN_MASK, 0x07E0)
                .set(BLUE_MASK, 0x001F),
        );
        // 0xF81F: full red and blue; 0x07E0: full green
        let row = decode_row(&h, &[0x1F, 0xF8, 0xE0, 0x07]).unwrap();
        assert_eq!(row[0], Rgb { r: 31, g: 0, b: 31 });
        assert_eq!(row[1], Rgb { r: 0, g: 63, b: 0 });

        let layout = check_supported(&h).unwrap();
        assert!(!layout.is_rgb8());
        assert_eq!(layout.to_rgb8(row[0]), [255, 0, 255]);
        assert_eq!(layout.to_rgb8(Rgb { r: 16, g: 32, b: 1 }), [132, 130, 8]);
    }

    #[test]
    fn packed_24bit_msb_first() {
        let h = header(
            CaptureBuilder::new(2, 1)
                .set(BITS_PER_PIXEL, 24)
                .set(BYTES_PER_LINE, 8),
        );
        // Two pixels plus two padding bytes, which decode as a partial pixel
        let row = decode_row(&h, &[1, 2, 3, 4, 5, 6, 0, 0]).unwrap();
        assert_eq!(
            row,
            [
                Rgb { r: 1, g: 2, b: 3 },
                Rgb { r: 4, g: 5, b: 6 },
                Rgb { r: 0, g: 0, b: 0 },
            ]
        );
    }

    #[test]
    fn partial_pixel_msb_first_pads_on_the_left() {
        let h = header(CaptureBuilder::new(1, 1));
        // Two bytes padded to 0x0000ABCD
        let row = decode_row(&h, &[0xAB, 0xCD]).unwrap();
        assert_eq!(row, [Rgb { r: 0, g: 0xAB, b: 0xCD }]);
    }

    #[test]
    fn partial_pixel_lsb_first_pads_on_the_right() {
        let h = header(CaptureBuilder::new(1, 1).set(BYTE_ORDER, 0));
        // Two bytes padded to 0x0000CDAB
        let row = decode_row(&h, &[0xAB, 0xCD]).unwrap();
        assert_eq!(row, [Rgb { r: 0, g: 0xCD, b: 0xAB }]);
    }

    #[test]
    fn row_padding_is_not_truncated() {
        let h = header(CaptureBuilder::new(1, 1).set(BYTES_PER_LINE, 8));
        let row = decode_row(&h, &[0, 1, 2, 3, 0, 0, 0, 0]).unwrap();
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn only_truecolor_is_supported() {
        for class in [0, 1, 2, 3, 5] {
            let h = header(CaptureBuilder::new(1, 1).set(VISUAL_CLASS, class));
            assert_eq!(
                decode_row(&h, &[0; 4]),
                Err(NotImplementedError::UnsupportedVisualClass(class))
            );
        }
        let h = header(CaptureBuilder::new(1, 1).set(VISUAL_CLASS, 4));
        assert!(decode_row(&h, &[0; 4]).is_ok());
    }

    #[test]
    fn supported_bit_depths() {
        for bits in [8, 16, 24, 32] {
            let h = header(CaptureBuilder::new(1, 1).set(BITS_PER_PIXEL, bits));
            assert!(check_supported(&h).is_ok(), "{bits} bits per pixel");
        }
        for bits in [0, 1, 4, 12, 33, 40, 64] {
            let h = header(CaptureBuilder::new(1, 1).set(BITS_PER_PIXEL, bits));
            assert_eq!(
                check_supported(&h),
                Err(NotImplementedError::UnsupportedBitDepth(bits))
            );
        }
    }

    #[test]
    fn rescaling_stays_in_range() {
        for mask in [0x1, 0x3, 0x1F, 0x3F, 0xFF, 0x3FF, 0xFFFF, 0xFFFF_FFFF] {
            let channel = ChannelMask::new(mask, "red").unwrap();
            assert_eq!(channel.to_u8(channel.extract(u32::MAX)), 255, "mask {mask:#x}");
            assert_eq!(channel.to_u8(channel.extract(0)), 0, "mask {mask:#x}");
        }
    }

    #[test]
    fn zero_mask_is_rejected() {
        let h = header(CaptureBuilder::new(1, 1).set(GREEN_MASK, 0));
        assert_eq!(
            check_supported(&h),
            Err(NotImplementedError::EmptyChannelMask("green"))
        );
    }

    #[test]
    fn synthesized_pixels_decode_exactly() {
        // 10-10-10 masks in 32 bits, as used by deep color visuals
        let (rm, gm, bm) = (0x3FF0_0000, 0x000F_FC00, 0x0000_03FF);
        let h = header(
            CaptureBuilder::new(4, 1)
                .set(RED_MASK, rm)
                .set(GREEN_MASK, gm)
                .set(BLUE_MASK, bm),
        );
        let expected = [
            Rgb { r: 0, g: 0, b: 0 },
            Rgb {
                r: 1023,
                g: 512,
                b: 1,
            },
            Rgb {
                r: 7,
                g: 1000,
                b: 999,
            },
            Rgb {
                r: 1023,
                g: 1023,
                b: 1023,
            },
        ];
        let bytes: Vec<u8> = expected
            .iter()
            .flat_map(|px| (px.r << 20 | px.g << 10 | px.b).to_be_bytes())
            .collect();
        assert_eq!(decode_row(&h, &bytes).unwrap(), expected);
    }
}
