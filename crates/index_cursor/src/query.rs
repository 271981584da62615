//! What to iterate: collection, filter, ordering and projection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row field holding the id of the table a row belongs to.
pub const TABLE_ID_FIELD: &str = "tableId";

/// One condition of a [`Filter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterParameter {
    /// Free-text match inside a field.
    Basic { field: String, value: String },
    /// Exact term.
    Simple { field: String, value: String },
    /// Inclusive numeric range; a missing bound is open.
    LongRange {
        field: String,
        from: Option<i64>,
        to: Option<i64>,
    },
    /// Exact term, any of the given values.
    OneOf { field: String, values: Vec<String> },
}

impl FilterParameter {
    pub fn field(&self) -> &str {
        match self {
            Self::Basic { field, .. }
            | Self::Simple { field, .. }
            | Self::LongRange { field, .. }
            | Self::OneOf { field, .. } => field,
        }
    }
}

/// Conjunction of parameters; empty matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub parameters: Vec<FilterParameter>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with(mut self, p: FilterParameter) -> Self {
        self.parameters.push(p);
        self
    }

    pub fn is_all(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Restricts the filter to rows of `table_id`. Exact-term conditions on
    /// other tables are dropped, since a row belongs to one table only; the
    /// table condition ends up present exactly once.
    pub fn by_table(mut self, table_id: &str) -> Self {
        let mut present = false;
        self.parameters.retain(|p| match p {
            FilterParameter::Simple { field, value } if field == TABLE_ID_FIELD => {
                let keep = value == table_id && !present;
                present |= value == table_id;
                keep
            }
            _ => true,
        });
        if !present {
            self.parameters.push(FilterParameter::Simple {
                field: TABLE_ID_FIELD.to_string(),
                value: table_id.to_string(),
            });
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortParameter {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

impl SortParameter {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), descending: false }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), descending: true }
    }
}

/// Ordered sort keys; empty leaves ordering to the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sorter {
    pub parameters: Vec<SortParameter>,
}

impl Sorter {
    pub fn by(p: SortParameter) -> Self {
        Self { parameters: vec![p] }
    }

    pub fn then(mut self, p: SortParameter) -> Self {
        self.parameters.push(p);
        self
    }

    pub fn sorts_on(&self, field: &str) -> bool {
        self.parameters.iter().any(|p| p.field == field)
    }
}

/// Everything that stays fixed for the lifetime of one iterator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Index collection holding the rows (one per preserved database).
    pub collection: String,
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub sorter: Sorter,
    /// Stored fields to return; empty returns all of them.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Passed through to the index untouched.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl QuerySpec {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: Filter::default(),
            sorter: Sorter::default(),
            fields: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn sorter(mut self, sorter: Sorter) -> Self {
        self.sorter = sorter;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_everything() {
        let q = QuerySpec::new("dbv-42")
            .filter(Filter::all().with(FilterParameter::Simple {
                field: "tableId".into(),
                value: "public.customers".into(),
            }))
            .sorter(Sorter::by(SortParameter::desc("col_2")).then(SortParameter::asc("col_0")))
            .fields(["uuid", "col_0"])
            .param("defType", "edismax");

        assert_eq!(q.collection, "dbv-42");
        assert_eq!(q.filter.parameters[0].field(), "tableId");
        assert!(q.sorter.sorts_on("col_0"));
        assert!(!q.sorter.sorts_on("uuid"));
        assert_eq!(q.fields, vec!["uuid".to_string(), "col_0".to_string()]);
        assert_eq!(q.extra.get("defType").map(String::as_str), Some("edismax"));
    }

    fn table(value: &str) -> FilterParameter {
        FilterParameter::Simple { field: TABLE_ID_FIELD.into(), value: value.into() }
    }

    #[test]
    fn by_table_adds_condition_once() {
        let text = FilterParameter::Basic { field: "col_0".into(), value: "porto".into() };
        let f = Filter::all().with(text.clone()).by_table("public.orders");
        assert_eq!(f.parameters, vec![text.clone(), table("public.orders")]);

        let f = f.with(table("public.orders")).by_table("public.orders");
        assert_eq!(f.parameters, vec![text, table("public.orders")]);
    }

    #[test]
    fn by_table_drops_other_tables() {
        let f = Filter::all()
            .with(table("public.customers"))
            .with(FilterParameter::LongRange { field: "col_2".into(), from: Some(1), to: None })
            .with(table("public.invoices"))
            .by_table("public.orders");

        assert_eq!(
            f.parameters,
            vec![
                FilterParameter::LongRange { field: "col_2".into(), from: Some(1), to: None },
                table("public.orders"),
            ]
        );
    }

    #[test]
    fn filter_parameters_are_tagged() {
        let raw = r#"{"type":"long_range","field":"col_3","from":10,"to":null}"#;
        let p: FilterParameter = serde_json::from_str(raw).unwrap();
        assert_eq!(
            p,
            FilterParameter::LongRange { field: "col_3".into(), from: Some(10), to: None }
        );
    }
}
