pub mod extract;
pub mod search;

pub use extract::{HttpPageExtractor, PageExtractor};
pub use search::{GoogleSearchConnector, SearchConnector};
