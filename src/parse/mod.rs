pub mod detect;
pub mod tokenize;
pub mod types;

pub use detect::{LineShape, classify, is_pipeline, redirection_target};
pub use tokenize::tokenize;
pub use types::{ArgVector, Operator};
