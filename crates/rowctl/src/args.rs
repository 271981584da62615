use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use index_cursor::{Filter, FilterParameter, QuerySpec, RetryBudget, SortParameter, Sorter};
use solr_index::SolrConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(version, about = "rowctl: stream rows of a preserved database out of its Solr index")]
pub struct Cli {
    /// Solr base URL (overrides RC_SOLR_URL)
    #[arg(long, global = true)]
    pub solr_url: Option<String>,
    /// uniqueKey field of the collection (overrides RC_UNIQUE_KEY)
    #[arg(long, global = true)]
    pub unique_key: Option<String>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Write every matching row as one JSON object per line
    Export {
        #[command(flatten)]
        query: QueryArgs,
        #[command(flatten)]
        budget: BudgetArgs,
        /// Output file; stdout when absent
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the number of matching rows
    Count {
        #[command(flatten)]
        query: QueryArgs,
        #[command(flatten)]
        budget: BudgetArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Solr collection of the database
    #[arg(long)]
    pub collection: String,
    /// Only rows of this table, e.g. `public.orders`
    #[arg(long)]
    pub table: Option<String>,
    /// Free-text match, `field=text` (repeatable)
    #[arg(long = "filter")]
    pub filters: Vec<String>,
    /// Exact term match, `field=value` (repeatable)
    #[arg(long = "term")]
    pub terms: Vec<String>,
    /// Sort key, `field` or `field:desc` (repeatable, in order)
    #[arg(long = "sort")]
    pub sort: Vec<String>,
    /// Comma separated fields to return
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,
    /// Extra Solr parameter, `key=value` (repeatable)
    #[arg(long = "param")]
    pub params: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BudgetArgs {
    #[arg(long)]
    pub page_size: Option<usize>,
    #[arg(long)]
    pub max_retries: Option<u32>,
    #[arg(long)]
    pub retry_sleep_ms: Option<u64>,
}

impl Cli {
    pub fn solr_config(&self) -> SolrConfig {
        let mut cfg = SolrConfig::from_env();
        if let Some(url) = &self.solr_url {
            cfg.base_url = url.clone();
        }
        if let Some(key) = &self.unique_key {
            cfg.unique_key = key.clone();
        }
        cfg
    }
}

impl BudgetArgs {
    /// Flags win over `RC_*` env values.
    pub fn resolve(&self, base: RetryBudget) -> RetryBudget {
        let mut b = base;
        if let Some(n) = self.page_size {
            b = b.with_page_size(n);
        }
        if let Some(n) = self.max_retries {
            b = b.with_max_retries(n);
        }
        if let Some(ms) = self.retry_sleep_ms {
            b = b.with_sleep_between_retries(Duration::from_millis(ms));
        }
        b
    }
}

impl QueryArgs {
    pub fn to_query(&self) -> Result<QuerySpec> {
        let mut filter = Filter::all();
        for f in &self.filters {
            let (field, value) = parse_kv(f)?;
            filter = filter.with(FilterParameter::Basic { field, value });
        }
        for t in &self.terms {
            let (field, value) = parse_kv(t)?;
            filter = filter.with(FilterParameter::Simple { field, value });
        }

        if let Some(table) = &self.table {
            filter = filter.by_table(table);
        }

        let mut sorter = Sorter::default();
        for s in &self.sort {
            sorter = sorter.then(parse_sort(s)?);
        }

        let mut q = QuerySpec::new(self.collection.clone())
            .filter(filter)
            .sorter(sorter)
            .fields(self.fields.iter().filter(|f| !f.is_empty()).cloned());
        for p in &self.params {
            let (k, v) = parse_kv(p)?;
            q = q.param(k, v);
        }
        Ok(q)
    }
}

pub fn parse_kv(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => bail!("expected key=value, got {s:?}"),
    }
}

pub fn parse_sort(s: &str) -> Result<SortParameter> {
    let (field, dir) = s.split_once(':').unwrap_or((s, "asc"));
    if field.is_empty() {
        bail!("empty sort field in {s:?}");
    }
    match dir {
        "asc" => Ok(SortParameter::asc(field)),
        "desc" => Ok(SortParameter::desc(field)),
        other => bail!("unknown sort direction {other:?} (use asc or desc)"),
    }
}
