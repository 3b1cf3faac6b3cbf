pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, Format, load_train, train_from_str};
