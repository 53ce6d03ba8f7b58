pub mod generator;
pub mod models;
pub mod prompt;

pub use generator::TextGenerator;
pub use models::create_model;
pub use prompt::PromptTemplate;

pub mod prelude {
    pub use super::generator::TextGenerator;
    pub use super::models::create_model;
    pub use super::prompt::PromptTemplate;
    pub use cf_core::{Generation, InferenceModel, Result, Error};
}
