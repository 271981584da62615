//! Renders a [`QuerySpec`] page request into Solr `select` parameters.

use index_cursor::{CursorMark, Filter, FilterParameter, QuerySpec, Sorter};
use tracing::debug;

/// Keys owned by cursor pagination; extra parameters may not override them.
const RESERVED: &[&str] = &["q", "sort", "rows", "start", "cursorMark", "fl", "wt"];

pub fn to_params(
    query: &QuerySpec,
    page_size: usize,
    cursor: &CursorMark,
    unique_key: &str,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("q".to_string(), render_filter(&query.filter)),
        ("sort".to_string(), render_sort(&query.sorter, unique_key)),
        ("rows".to_string(), page_size.to_string()),
        ("cursorMark".to_string(), cursor.as_str().to_string()),
    ];
    if !query.fields.is_empty() {
        params.push(("fl".to_string(), render_fields(&query.fields, unique_key)));
    }
    params.push(("wt".to_string(), "json".to_string()));

    for (k, v) in &query.extra {
        if RESERVED.contains(&k.as_str()) {
            debug!(param = %k, "ignoring extra parameter reserved for cursor paging");
            continue;
        }
        params.push((k.clone(), v.clone()));
    }
    params
}

/// Projection list; the unique key always comes back, rows are keyed by it.
pub fn render_fields(fields: &[String], unique_key: &str) -> String {
    let mut fl: Vec<&str> = fields.iter().map(String::as_str).collect();
    if !fl.contains(&unique_key) {
        fl.insert(0, unique_key);
    }
    fl.join(",")
}

pub fn render_filter(filter: &Filter) -> String {
    if filter.is_all() {
        return "*:*".to_string();
    }
    filter
        .parameters
        .iter()
        .map(render_parameter)
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn render_parameter(p: &FilterParameter) -> String {
    match p {
        FilterParameter::Basic { field, value } => {
            let terms: Vec<String> = value.split_whitespace().map(escape_query_chars).collect();
            if terms.is_empty() {
                format!("{field}:*")
            } else {
                format!("{field}:({})", terms.join(" AND "))
            }
        }
        FilterParameter::Simple { field, value } => format!("{field}:{}", escape_query_chars(value)),
        FilterParameter::LongRange { field, from, to } => {
            let bound = |b: &Option<i64>| b.map_or_else(|| "*".to_string(), |n| n.to_string());
            format!("{field}:[{} TO {}]", bound(from), bound(to))
        }
        FilterParameter::OneOf { field, values } => {
            if values.is_empty() {
                // nothing can match an empty set
                return "(*:* -*:*)".to_string();
            }
            let values: Vec<String> = values.iter().map(|v| escape_query_chars(v)).collect();
            format!("{field}:({})", values.join(" OR "))
        }
    }
}

/// Sort clause with `unique_key asc` appended unless already present;
/// Solr refuses cursor requests whose sort does not end in a unique field.
pub fn render_sort(sorter: &Sorter, unique_key: &str) -> String {
    let mut clauses: Vec<String> = sorter
        .parameters
        .iter()
        .map(|p| format!("{} {}", p.field, if p.descending { "desc" } else { "asc" }))
        .collect();
    if !sorter.sorts_on(unique_key) {
        clauses.push(format!("{unique_key} asc"));
    }
    clauses.join(",")
}

/// Backslash-escapes Lucene query syntax and whitespace.
pub fn escape_query_chars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if "\\+-!():^[]\"{}~*?|&;/".contains(c) || c.is_whitespace() {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
