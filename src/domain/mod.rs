pub mod creator;
pub mod ledger;
pub mod post;

pub use creator::{service_from_link, CreatorInfo};
pub use ledger::{FileRecord, Ledger};
pub use post::{ListingPage, PostContent, PostReference};
