pub mod constants;
pub mod string_utils;
pub mod url_identity;

pub use constants::*;
pub use string_utils::flatten_whitespace;
pub use url_identity::{
    dedup_key, is_crawlable_document, is_crawlable_link, relative_path, request_relative_url,
    sanitize,
};
