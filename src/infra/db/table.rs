//! Table-parameterized read operations shared by every entity.
//!
//! Each entity describes itself with a static [`EntityTable`]; the same
//! [`TableRepository`] then serves lookups and filtered listings for
//! stories and topics alike.

use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, postgres::PgRow};

use crate::application::pagination::{FilterSpec, OffsetPage, PagingSpec, SortField};
use crate::application::repos::RepoError;

use super::listing::ListingSql;

/// Static description of an entity table.
#[derive(Debug)]
pub(crate) struct EntityTable {
    pub name: &'static str,
    pub alias: &'static str,
    pub columns: &'static [&'static str],
    /// Sort fields this table accepts; anything else is rejected before SQL is built.
    pub sortable: &'static [SortField],
    pub status_column: Option<&'static str>,
    pub association: Option<&'static Association>,
}

/// A many-to-many link from an entity (the parent) to a child table.
#[derive(Debug)]
pub(crate) struct Association {
    pub junction: &'static str,
    pub parent_column: &'static str,
    pub child_column: &'static str,
    pub child_table: &'static str,
    pub child_columns: &'static [&'static str],
}

impl EntityTable {
    pub(crate) fn push_columns(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        push_qualified(qb, self.alias, self.columns);
    }

    pub(crate) fn sort_column(&self, field: SortField) -> Option<&'static str> {
        if !self.sortable.contains(&field) {
            return None;
        }
        Some(match field {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        })
    }
}

pub(crate) fn push_qualified(
    qb: &mut QueryBuilder<'_, Postgres>,
    alias: &str,
    columns: &[&str],
) {
    let mut separated = qb.separated(", ");
    for column in columns {
        separated.push(format!("{alias}.{column}"));
    }
}

pub(crate) struct TableRepository<'a> {
    pool: &'a PgPool,
    table: &'static EntityTable,
}

impl<'a> TableRepository<'a> {
    pub(crate) fn new(pool: &'a PgPool, table: &'static EntityTable) -> Self {
        Self { pool, table }
    }

    pub(crate) async fn find_by_id<R>(&self, id: i64) -> Result<Option<R>, RepoError>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut qb = self.select_one();
        qb.push(format!("{}.id = ", self.table.alias));
        qb.push_bind(id);

        qb.build_query_as::<R>()
            .fetch_optional(self.pool)
            .await
            .map_err(RepoError::from_persistence)
    }

    pub(crate) async fn find_by_slug<R>(&self, slug: &str) -> Result<Option<R>, RepoError>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut qb = self.select_one();
        qb.push(format!("{}.slug = ", self.table.alias));
        qb.push_bind(slug.to_string());

        qb.build_query_as::<R>()
            .fetch_optional(self.pool)
            .await
            .map_err(RepoError::from_persistence)
    }

    /// Page of rows plus the total matching `filter`, from two separate statements.
    pub(crate) async fn find_by_filter<R>(
        &self,
        filter: &FilterSpec,
        paging: &PagingSpec,
    ) -> Result<OffsetPage<R>, RepoError>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let listing = ListingSql::new(self.table, *filter, *paging)?;

        let mut page_query = listing.page_query()?;
        let rows = page_query
            .build_query_as::<R>()
            .fetch_all(self.pool)
            .await
            .map_err(RepoError::from_persistence)?;

        let mut count_query = listing.count_query();
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await
            .map_err(RepoError::from_persistence)?;

        Ok(OffsetPage::new(rows, convert_count(total)?))
    }

    fn select_one(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT ");
        self.table.push_columns(&mut qb);
        qb.push(format!(
            " FROM {} {} WHERE ",
            self.table.name, self.table.alias
        ));
        qb
    }
}

pub(crate) fn convert_count(value: i64) -> Result<u64, RepoError> {
    value
        .try_into()
        .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
}
