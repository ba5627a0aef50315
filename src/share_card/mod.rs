//! Share card rendering: layout against a [`TextMeasure`], then
//! rasterization into a PNG.

pub mod layout;
mod raster;

pub use layout::{layout_card, share_card_file_name, wrap_text, CardLayout, Line, TextMeasure};
pub use raster::{CardFonts, ShareCardRenderer, FOOTER_TEXT};
