pub mod cache;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod output;
pub mod pipeline;
pub mod reading;
pub mod schema;
pub mod series;
pub mod source;
pub mod summary;
pub mod timestamp;
pub mod units;
