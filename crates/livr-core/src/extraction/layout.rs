//! Layout flavor selection for grid-mode profiles.
//!
//! Each flavor is a different heuristic for cutting page content into
//! tables. A flavor is accepted when one of its tables carries the profile's
//! expected header in its first rows.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::models::delivery::{FlavorDiagnostics, LayoutSelection, Table};
use crate::profile::GridRules;
use crate::text::{header_tokens, normalize_full};

/// Tables read per flavor; failures are kept as text.
pub type FlavorGrids = IndexMap<String, Result<Vec<Table>, String>>;

/// Ordered flavors to try for a profile.
///
/// A fixed flavor wins, then the profile's preferred list, then the
/// configured default list, then the provider's own defaults.
pub fn candidate_flavors(rules: &GridRules, configured: &[String], provider: &[String]) -> Vec<String> {
    if let Some(fixed) = &rules.fixed_flavor {
        return vec![fixed.clone()];
    }
    [&rules.preferred_flavors[..], configured, provider]
        .into_iter()
        .find(|list| !list.is_empty())
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

/// Whether every header token occurs in the first `header_rows` rows.
pub fn header_matches(table: &Table, tokens: &[String], header_rows: usize) -> bool {
    if tokens.is_empty() {
        return false;
    }
    let head = table
        .rows
        .iter()
        .take(header_rows)
        .map(|row| row.join(" "))
        .collect::<Vec<_>>()
        .join(" ");
    let head = normalize_full(&head);

    tokens.iter().all(|t| head.contains(t.as_str()))
}

fn diagnose(grid: Option<&Result<Vec<Table>, String>>, tokens: &[String], header_rows: usize) -> FlavorDiagnostics {
    match grid {
        Some(Ok(tables)) => {
            let matched_tables: Vec<usize> = tables
                .iter()
                .enumerate()
                .filter(|(_, t)| header_matches(t, tokens, header_rows))
                .map(|(i, _)| i)
                .collect();
            FlavorDiagnostics {
                tables_found: tables.len(),
                header_match: !matched_tables.is_empty(),
                matched_tables,
                error: None,
            }
        }
        Some(Err(e)) => FlavorDiagnostics {
            error: Some(e.clone()),
            ..Default::default()
        },
        None => FlavorDiagnostics {
            error: Some("flavor was not read".to_string()),
            ..Default::default()
        },
    }
}

/// Diagnose the candidate flavors and choose one.
///
/// A fixed flavor is always chosen. When none of its tables holds the header
/// the raw page text is searched for the header tokens instead. Otherwise the
/// first candidate with a matching table is chosen; every candidate is
/// diagnosed either way.
pub fn select_layout(
    grids: &FlavorGrids,
    page_text: &str,
    rules: &GridRules,
    candidates: &[String],
    header_rows: usize,
) -> LayoutSelection {
    let tokens = header_tokens(&rules.header);
    let mut selection = LayoutSelection::default();

    if let Some(fixed) = &rules.fixed_flavor {
        let mut diagnostics = diagnose(grids.get(fixed), &tokens, header_rows);
        if !diagnostics.header_match && !tokens.is_empty() {
            let text = normalize_full(page_text);
            if tokens.iter().all(|t| text.contains(t.as_str())) {
                debug!("Header of forced flavor '{}' found in page text only", fixed);
                diagnostics.header_match = true;
            }
        }

        selection.chosen_flavor = Some(fixed.clone());
        selection.forced = true;
        selection.flavor_results.insert(fixed.clone(), diagnostics);
        return selection;
    }

    for flavor in candidates {
        let diagnostics = diagnose(grids.get(flavor), &tokens, header_rows);
        debug!(
            "Flavor '{}': {} tables, header match: {}",
            flavor, diagnostics.tables_found, diagnostics.header_match
        );
        if diagnostics.header_match && selection.chosen_flavor.is_none() {
            selection.chosen_flavor = Some(flavor.clone());
        }
        selection.flavor_results.insert(flavor.clone(), diagnostics);
    }

    selection
}

/// Tables to extract items from, plus a warning when falling back.
///
/// Header-matching tables of the chosen flavor are used. Without any, every
/// table of the chosen flavor (or of the first readable candidate) is used.
pub fn tables_for<'a>(selection: &LayoutSelection, grids: &'a FlavorGrids) -> (Vec<&'a Table>, Option<String>) {
    let flavor = selection.chosen_flavor.clone().or_else(|| {
        selection
            .flavor_results
            .keys()
            .find(|f| matches!(grids.get(*f), Some(Ok(_))))
            .cloned()
    });

    let Some(flavor) = flavor else {
        let message = "no layout flavor could be read".to_string();
        warn!("{}", message);
        return (Vec::new(), Some(message));
    };
    let Some(Ok(tables)) = grids.get(&flavor) else {
        let message = format!("tables of flavor '{flavor}' are unavailable");
        warn!("{}", message);
        return (Vec::new(), Some(message));
    };

    let matched = selection
        .flavor_results
        .get(&flavor)
        .map(|d| d.matched_tables.as_slice())
        .unwrap_or_default();
    if !matched.is_empty() {
        return (matched.iter().filter_map(|&i| tables.get(i)).collect(), None);
    }

    let message = format!(
        "no table matched the expected header with flavor '{}', using all {} tables",
        flavor,
        tables.len()
    );
    warn!("{}", message);
    (tables.iter().collect(), Some(message))
}
