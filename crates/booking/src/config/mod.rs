pub mod loader;
pub mod schema;

pub use loader::{default_config_path, load_config, load_config_from_str};
pub use schema::{
    AdminConfig, BookingConfig, BucketConfig, FormConfig, HostedStoreConfig, LocalStoreConfig,
    LogFormat, LoggingConfig, PhoneDigits, StoreConfig,
};
