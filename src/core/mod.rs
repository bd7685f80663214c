pub mod destination_guard;
pub mod name_validator;
pub mod path_remapper;
pub mod scaffold;
pub mod token_rewriter;

pub use crate::domain::model::{ProjectRequest, ScaffoldReport, TemplateKind, TemplateLayout};
pub use crate::domain::ports::TemplateFetcher;
pub use crate::utils::error::Result;
