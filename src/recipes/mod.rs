pub mod categories;
pub mod form;
pub mod ordering;
pub mod repository;

pub use form::{FormFields, SubListEdit};
pub use ordering::{apply_edit, ChildList, EditOutcome};
pub use repository::{NewRecipe, PublishedFilter, RecipeUpdate};
