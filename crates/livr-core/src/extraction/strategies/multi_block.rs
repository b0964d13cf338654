//! Header-keyed groups of one-line items.

use regex::Regex;
use tracing::{debug, trace};

use super::{header_fields, named_fields, StrategyOutput};
use crate::models::delivery::{Item, OrderGroup};
use crate::text::clean_line;

/// Scan the full line stream for header lines and the items under them.
///
/// A header line is never tested against the item regex. Items seen before
/// the first header are ignored and groups without items are dropped.
pub fn extract(lines: &[String], header: &Regex, item: &Regex) -> StrategyOutput {
    let mut groups = Vec::new();
    let mut current: Option<OrderGroup> = None;

    for line in lines {
        let line = clean_line(line);

        if let Some(caps) = header.captures(&line) {
            trace!("Header line: {}", line);
            flush(&mut groups, current.take());
            current = Some(OrderGroup {
                header: header_fields(header, &caps),
                items: Vec::new(),
            });
            continue;
        }

        let Some(group) = current.as_mut() else {
            continue;
        };
        if let Some(caps) = item.captures(&line) {
            trace!("Item line: {}", line);
            group.items.push(Item {
                fields: named_fields(item, &caps),
                order_ref: None,
            });
        }
    }
    flush(&mut groups, current);

    let items = groups.iter().flat_map(|g| g.items.iter().cloned()).collect::<Vec<_>>();
    debug!("Multi-block strategy: {} groups, {} items", groups.len(), items.len());

    StrategyOutput {
        items,
        orders: Some(groups),
    }
}

fn flush(groups: &mut Vec<OrderGroup>, group: Option<OrderGroup>) {
    let Some(mut group) = group else {
        return;
    };
    if group.items.is_empty() {
        trace!("Dropping header group without items");
        return;
    }

    let reference = group.reference().map(str::to_string);
    for item in &mut group.items {
        item.order_ref = reference.clone();
    }
    groups.push(group);
}
