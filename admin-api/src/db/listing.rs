//! Generic Postgres data source for paginated list endpoints

use std::marker::PhantomData;

use async_trait::async_trait;
use pagination::DataSource;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

/// Filter that narrows a listing by appending `AND ...` conditions.
///
/// The builder already ends in `WHERE 1=1`. Every user supplied value must go
/// through `push_bind`.
pub trait ListFilter: Send + Sync {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>);
}

/// Count and page queries over one table, both built from the same filter.
pub struct PgListing<R, F> {
    pool: PgPool,
    table: &'static str,
    columns: &'static str,
    order_by: &'static str,
    _marker: PhantomData<fn() -> (R, F)>,
}

impl<R, F> PgListing<R, F> {
    /// `order_by` must end in a unique column so pages never overlap.
    pub fn new(pool: PgPool, table: &'static str, columns: &'static str, order_by: &'static str) -> Self {
        Self {
            pool,
            table,
            columns,
            order_by,
            _marker: PhantomData,
        }
    }

    pub fn count_query(&self, filter: &F) -> QueryBuilder<'static, Postgres>
    where
        F: ListFilter,
    {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} WHERE 1=1", self.table));
        filter.push_conditions(&mut qb);
        qb
    }

    pub fn page_query(&self, filter: &F, offset: u64, limit: u64) -> QueryBuilder<'static, Postgres>
    where
        F: ListFilter,
    {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE 1=1",
            self.columns, self.table
        ));
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY ");
        qb.push(self.order_by);
        qb.push(" LIMIT ");
        qb.push_bind(clamp_i64(limit));
        qb.push(" OFFSET ");
        qb.push_bind(clamp_i64(offset));
        qb
    }
}

#[async_trait]
impl<R, F> DataSource for PgListing<R, F>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    F: ListFilter,
{
    type Row = R;
    type Filter = F;
    type Error = sqlx::Error;

    async fn count(&self, filter: &F) -> Result<u64, sqlx::Error> {
        let mut qb = self.count_query(filter);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }

    async fn fetch(&self, filter: &F, offset: u64, limit: u64) -> Result<Vec<R>, sqlx::Error> {
        let mut qb = self.page_query(filter, offset, limit);
        qb.build_query_as::<R>().fetch_all(&self.pool).await
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%term%` pattern for a trimmed, non-empty search term
pub(crate) fn contains_pattern(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        None
    } else {
        Some(format!("%{}%", escape_like(term)))
    }
}
