extern crate self as blelink_shell;

mod cache;
pub mod http;

pub use cache::{Asset, CACHE_NAME, DEFAULT_ASSETS, FetchError, InstallError, ShellCache, Source};
