pub mod binding;
pub mod sources;
pub mod store;

pub use sources::PropertySource;
pub use store::{ConfigStore, PropertyValue};
