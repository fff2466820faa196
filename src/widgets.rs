mod button;
mod search;

pub use button::Button;
pub use search::{matches_filter, SearchField};
