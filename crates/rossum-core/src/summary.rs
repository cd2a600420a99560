//! Human-readable summary of an extraction.

use std::collections::BTreeMap;

use crate::models::extraction::{ExtractionResult, Field};

/// Grouped field whose items are kept, with their content de-duplicated.
const TAX_DETAILS: &str = "tax_details";

/// Name fragment of multi-value address line fields.
const ADDRESS_LINE: &str = "_addrline";

/// Drop lower-score duplicates of the same field.
///
/// Fields are grouped by name (output ordered by name). Address lines keep
/// the best field per distinct value, tax details keep every item and
/// de-duplicate their content, every other name keeps its best field. On
/// equal scores the later field wins.
pub fn deduplicate_fields(fields: &[Field]) -> Vec<Field> {
    let mut groups: BTreeMap<&str, Vec<&Field>> = BTreeMap::new();
    for field in fields {
        groups.entry(field.name.as_str()).or_default().push(field);
    }

    let mut deduplicated = Vec::with_capacity(groups.len());
    for (name, group) in groups {
        if name == TAX_DETAILS {
            deduplicated.extend(group.into_iter().map(deduplicate_content));
        } else if name.contains(ADDRESS_LINE) {
            let mut by_value: BTreeMap<String, Vec<&Field>> = BTreeMap::new();
            for field in group {
                by_value
                    .entry(field.value_text().unwrap_or_default())
                    .or_default()
                    .push(field);
            }
            deduplicated.extend(by_value.values().filter_map(|fields| best(fields)).cloned());
        } else if let Some(field) = best(&group) {
            deduplicated.push(field.clone());
        }
    }

    deduplicated
}

fn deduplicate_content(item: &Field) -> Field {
    let mut item = item.clone();
    if let Some(content) = item.content.take() {
        item.content = Some(deduplicate_fields(&content));
    }
    item
}

fn best<'a>(fields: &[&'a Field]) -> Option<&'a Field> {
    fields
        .iter()
        .copied()
        .max_by(|a, b| a.score_or_zero().total_cmp(&b.score_or_zero()))
}

/// Format one field as `Title: "value" (97.00 %)`.
pub fn format_field(field: &Field) -> String {
    format!(
        "{}: \"{}\" ({:.2} %)",
        field.title,
        field.value_text().unwrap_or_default(),
        100.0 * field.score_or_zero()
    )
}

/// Summary lines: language, currency, then fields sorted by title.
pub fn summary_lines(result: &ExtractionResult, deduplicate: bool) -> Vec<String> {
    let mut fields = if deduplicate {
        deduplicate_fields(&result.fields)
    } else {
        result.fields.clone()
    };
    fields.sort_by(|a, b| a.title.cmp(&b.title));

    let mut lines = vec![
        format!("Language: {}", result.language.as_deref().unwrap_or("-")),
        format!("Currency: {}", result.currency.as_deref().unwrap_or("-")),
    ];

    for field in &fields {
        if field.value_text().is_some() {
            lines.push(format_field(field));
        } else {
            lines.push(format!("{}:", field.title));
            for inner in field.content.iter().flatten() {
                lines.push(format!("- {}", format_field(inner)));
            }
        }
    }

    lines
}
