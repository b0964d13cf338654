//! Item extraction: block isolation, line and grid strategies, numeric
//! post-processing and the end-to-end pipeline.

pub mod block;
pub mod layout;
pub mod metadata;
pub mod postprocess;
pub mod rows;
pub mod strategies;

mod parser;

pub use block::isolate_block;
pub use layout::{select_layout, FlavorGrids};
pub use parser::DeliveryParser;
pub use strategies::StrategyOutput;
