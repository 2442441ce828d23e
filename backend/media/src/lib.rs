//! Image acquisition: turns a picked or dropped file into an encoded image.

pub mod acquire;
pub mod mime_detect;

pub use acquire::{ImageAcquirer, SelectedFile, encode_image};
pub use mime_detect::{detect_mime_type, is_image, sniff_image_type};
