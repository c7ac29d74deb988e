pub mod listing_filters;
pub mod listing_viewmodel;
pub mod session_resolver;

pub use listing_filters::{filter_by_category, search};
pub use listing_viewmodel::ListingViewModel;
pub use session_resolver::SessionResolver;
