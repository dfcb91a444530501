//! SeaORM Entity Crate
//!
//! Defines the SeaORM entities that map to database tables.

pub mod evaluation;
pub mod evaluation_tag;

// Prelude module for easy importing of all entities and their related types
pub mod prelude {
    pub use super::evaluation::Entity as Evaluation;
    pub use super::evaluation::Model as EvaluationModel;
    pub use super::evaluation::ActiveModel as EvaluationActiveModel;
    pub use super::evaluation::Column as EvaluationColumn;

    pub use super::evaluation_tag::Entity as EvaluationTag;
    pub use super::evaluation_tag::Model as EvaluationTagModel;
    pub use super::evaluation_tag::ActiveModel as EvaluationTagActiveModel;
    pub use super::evaluation_tag::Column as EvaluationTagColumn;
}
