pub mod error;
pub mod types;

pub use error::{CollectionError, ExecutableErrorContext};
pub use types::*;
