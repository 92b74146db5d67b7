//! This crate provides the X Window Dump (XWD) format for the image crate.
//!
//! The decoder is enabled by the `xwd` Cargo feature (on by default):
//! ```toml
//! [dependencies]
//! image_xwd = { version = "0.1", features = ["xwd"] }
//! ```
//!
//! And you must also call the `register` function at program startup:
//!
//!  ```rust,no_run
//! image_xwd::register();
//!
//! // Now you can use the image crate as normal
//! let img = image::open("path/to/screen.xwd").unwrap();
//! ```
//!
//! The lower level pieces (header parsing, per-row pixel decoding and row
//! iteration) are available from the [`xwd`] module for callers that want
//! to stream rows themselves.

#![forbid(unsafe_code)]

#[cfg(feature = "xwd")]
pub mod xwd;

#[allow(unused_imports)]
use image::hooks::register_decoding_hook;

static REGISTER: std::sync::Once = std::sync::Once::new();

/// Register all enabled formats with the image crate.
pub fn register() {
    REGISTER.call_once(|| {
        // XWD files carry no magic number, so only the extension is hooked
        #[cfg(feature = "xwd")]
        register_decoding_hook(
            "xwd".into(),
            Box::new(|r| Ok(Box::new(xwd::XwdDecoder::new(r)?))),
        );
    });
}
