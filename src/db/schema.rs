//! Table creation from the entity definitions.
//!
//! Used on startup when `sync_schema` is enabled, and by the test suites to
//! prepare a fresh database.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};
use sea_orm::sea_query::Index;
use tracing::debug;

use crate::db::entities::{evaluation_tag, prelude::*};

async fn create_table_for<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let table = entity.table_name().to_string();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(db.get_database_backend().build(&statement)).await?;
    debug!(table = %table, "Ensured table exists.");
    Ok(())
}

/// Creates the `evaluations` and `evaluation_tags` tables if they are missing.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    // Parent table first, tags carry a foreign key to it.
    create_table_for(db, &schema, Evaluation).await?;
    create_table_for(db, &schema, EvaluationTag).await?;

    let index = Index::create()
        .if_not_exists()
        .name("idx_evaluation_tags_evaluation_id")
        .table(EvaluationTag)
        .col(evaluation_tag::Column::EvaluationId)
        .to_owned();
    db.execute(db.get_database_backend().build(&index)).await?;

    Ok(())
}
