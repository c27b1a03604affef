pub mod error;
pub use error::Result;
pub use error::Error;

pub mod config;
pub use config::SdkUpdateOptions;

pub mod task;
pub use task::TaskMonitor;

pub mod catalog;
pub use catalog::Package;

pub mod events;
pub mod relationship_resolver;
pub mod installer;
pub mod package_loader;
pub mod pkg_item;

pub mod updater;
pub use updater::SdkUpdater;
