#![no_main]
#[macro_use]
extern crate libfuzzer_sys;

use image::ImageDecoder;
use image_xwd::xwd::{EndiannessPolicy, HeaderOptions, XwdDecoder};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Exercise both header byte order policies, picked by the first input byte
    let Some((&policy, data)) = data.split_first() else {
        return;
    };
    let options = HeaderOptions {
        endianness: if policy & 1 == 0 {
            EndiannessPolicy::FixedBigEndian
        } else {
            EndiannessPolicy::Heuristic
        },
        ..HeaderOptions::default()
    };
    let reader = Cursor::new(data);
    let Ok(mut decoder) = XwdDecoder::with_options(reader, options) else {
        return;
    };
    let mut limits = image::Limits::default();
    limits.max_alloc = Some(1024 * 1024); // 1 MiB
    if limits.reserve(decoder.total_bytes()).is_err() {
        return;
    }
    if decoder.set_limits(limits).is_err() {
        return;
    }
    let _ = std::hint::black_box(image::DynamicImage::from_decoder(decoder));
});
