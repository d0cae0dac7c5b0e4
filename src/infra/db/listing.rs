//! SQL composition for filtered, sorted, offset-paginated listings.

use sqlx::{Postgres, QueryBuilder};

use crate::application::pagination::{FilterSpec, PaginationError, PagingSpec};
use crate::application::repos::RepoError;

use super::table::{Association, EntityTable};

const LINK_ALIAS: &str = "link";

/// Page and count statements for one listing request.
///
/// Construction fails for sort fields outside the table's allow-list and for
/// filters the table cannot express, so no statement is ever built for them.
#[derive(Debug)]
pub(crate) struct ListingSql {
    table: &'static EntityTable,
    filter: FilterSpec,
    paging: PagingSpec,
    sort_column: &'static str,
}

impl ListingSql {
    pub(crate) fn new(
        table: &'static EntityTable,
        filter: FilterSpec,
        paging: PagingSpec,
    ) -> Result<Self, RepoError> {
        let sort_column = table
            .sort_column(paging.sort())
            .ok_or(PaginationError::UnsupportedSortField(paging.sort()))?;

        if filter.status.is_some() && table.status_column.is_none() {
            return Err(RepoError::InvalidInput {
                message: format!("{} cannot be filtered by status", table.name),
            });
        }
        if filter.topic.is_some() && table.association.is_none() {
            return Err(RepoError::InvalidInput {
                message: format!("{} cannot be filtered by topic", table.name),
            });
        }

        Ok(Self {
            table,
            filter,
            paging,
            sort_column,
        })
    }

    fn joins_association(&self) -> Option<&'static Association> {
        self.filter.topic.and(self.table.association)
    }

    pub(crate) fn page_query(&self) -> Result<QueryBuilder<'static, Postgres>, RepoError> {
        let offset = i64::try_from(self.paging.offset())
            .map_err(|_| RepoError::Pagination(PaginationError::OffsetOverflow))?;
        let alias = self.table.alias;

        let mut qb = QueryBuilder::new("SELECT ");
        if self.joins_association().is_some() {
            qb.push("DISTINCT ");
        }
        self.table.push_columns(&mut qb);
        self.push_from_and_filters(&mut qb);

        let direction = self.paging.order().as_sql();
        qb.push(format!(
            " ORDER BY {alias}.{column} {direction}, {alias}.id {direction}",
            column = self.sort_column,
        ));
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(self.paging.limit()));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        Ok(qb)
    }

    pub(crate) fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(");
        if self.joins_association().is_some() {
            qb.push(format!("DISTINCT {}.id", self.table.alias));
        } else {
            qb.push("*");
        }
        qb.push(")");
        self.push_from_and_filters(&mut qb);
        qb
    }

    fn push_from_and_filters(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        let alias = self.table.alias;
        qb.push(format!(" FROM {} {alias}", self.table.name));

        if let Some(association) = self.joins_association() {
            qb.push(format!(
                " INNER JOIN {junction} {LINK_ALIAS} ON {LINK_ALIAS}.{parent} = {alias}.id",
                junction = association.junction,
                parent = association.parent_column,
            ));
        }

        qb.push(" WHERE 1=1");

        if let (Some(status), Some(column)) = (self.filter.status, self.table.status_column) {
            qb.push(format!(" AND {alias}.{column} = "));
            qb.push_bind(status);
        }

        if let (Some(topic), Some(association)) = (self.filter.topic, self.joins_association()) {
            qb.push(format!(" AND {LINK_ALIAS}.{} = ", association.child_column));
            qb.push_bind(topic);
        }
    }
}
