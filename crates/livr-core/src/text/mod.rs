//! Text and number canonicalization shared by every matching stage.

pub mod normalize;
pub mod numeric;

pub use normalize::{clean_line, header_tokens, normalize_full, normalize_light, split_lines};
pub use numeric::{to_float, to_integer, to_number};
