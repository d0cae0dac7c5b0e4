//! Batch loading of many-to-many children for a page of parents.
//!
//! One statement fetches every child of every parent on the page through the
//! junction table; rows are then grouped in memory and attached back in page
//! order. An empty page issues no query.

use std::collections::HashMap;

use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};

use crate::application::repos::RepoError;

use super::table::{Association, push_qualified};

const CHILD_ALIAS: &str = "c";
const PARENT_KEY: &str = "parent_id";

/// A child row that can be told apart from its siblings.
pub(crate) trait ChildRow {
    fn child_id(&self) -> i64;
}

/// A parent that receives its children after the page has been fetched.
pub(crate) trait HasChildren {
    type Child: ChildRow + Clone;

    fn parent_id(&self) -> i64;

    fn attach(&mut self, children: Vec<Self::Child>);
}

/// Loads and attaches the children of every parent in `parents`.
///
/// Parents without links receive an empty list. Duplicate junction rows do
/// not produce duplicate children.
pub(crate) async fn attach_children<P, R>(
    pool: &PgPool,
    association: &Association,
    parents: &mut [P],
) -> Result<(), RepoError>
where
    P: HasChildren,
    R: for<'r> FromRow<'r, PgRow> + Into<P::Child> + Send + Unpin,
{
    if parents.is_empty() {
        return Ok(());
    }

    let ids: Vec<i64> = parents.iter().map(HasChildren::parent_id).collect();
    let mut qb = children_query(association, ids);

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .map_err(RepoError::from_persistence)?;

    let mut pairs = Vec::with_capacity(rows.len());
    for row in rows {
        let parent_id: i64 = row
            .try_get(PARENT_KEY)
            .map_err(RepoError::from_persistence)?;
        let child = R::from_row(&row).map_err(RepoError::from_persistence)?;
        pairs.push((parent_id, child.into()));
    }

    attach_groups(parents, group_by_parent(pairs));
    Ok(())
}

fn children_query(association: &Association, parent_ids: Vec<i64>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT link.{parent} AS {PARENT_KEY}, ",
        parent = association.parent_column,
    ));
    push_qualified(&mut qb, CHILD_ALIAS, association.child_columns);
    qb.push(format!(
        " FROM {junction} link INNER JOIN {child} {CHILD_ALIAS} ON {CHILD_ALIAS}.id = link.{child_column} \
         WHERE link.{parent} = ANY(",
        junction = association.junction,
        child = association.child_table,
        child_column = association.child_column,
        parent = association.parent_column,
    ));
    qb.push_bind(parent_ids);
    qb.push(format!(") ORDER BY link.{}, {CHILD_ALIAS}.id", association.parent_column));
    qb
}

pub(crate) fn group_by_parent<C: ChildRow>(pairs: Vec<(i64, C)>) -> HashMap<i64, Vec<C>> {
    let mut groups: HashMap<i64, Vec<C>> = HashMap::new();
    for (parent_id, child) in pairs {
        let siblings = groups.entry(parent_id).or_default();
        if siblings
            .iter()
            .any(|existing| existing.child_id() == child.child_id())
        {
            continue;
        }
        siblings.push(child);
    }
    groups
}

pub(crate) fn attach_groups<P: HasChildren>(
    parents: &mut [P],
    groups: HashMap<i64, Vec<P::Child>>,
) {
    for parent in parents.iter_mut() {
        let children = groups.get(&parent.parent_id()).cloned().unwrap_or_default();
        parent.attach(children);
    }
}
