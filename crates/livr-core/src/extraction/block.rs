//! Item table isolation.

use tracing::debug;

use crate::profile::BlockRules;
use crate::text::clean_line;

/// Isolate the item block of a line stream.
///
/// The block starts on the line after the first `start` match and ends before
/// the first following `stop` match. Without a start match the block is
/// empty.
pub fn isolate_block(lines: &[String], rules: &BlockRules) -> Vec<String> {
    let cleaned: Vec<String> = lines.iter().map(|l| clean_line(l)).collect();

    let Some(start) = cleaned.iter().position(|l| rules.start.is_match(l)) else {
        debug!("Block start marker not found");
        return Vec::new();
    };

    let body = &cleaned[start + 1..];
    let Some(stop) = &rules.stop else {
        return body.to_vec();
    };

    let end = body
        .iter()
        .position(|l| stop.is_match(l))
        .unwrap_or(body.len());

    let block = body[..end].to_vec();

    debug!("Isolated block of {} lines (start at line {})", block.len(), start + 1);
    block
}
