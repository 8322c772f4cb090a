#![forbid(unsafe_code)]

pub mod cli;
pub mod crawl;
pub mod extract;
pub mod fetch;
pub mod formats;
pub mod logging;
pub mod serve;
pub mod site;
pub mod store;
pub mod translate;
