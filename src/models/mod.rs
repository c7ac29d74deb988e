pub mod auth;
pub mod error;
pub mod listing;
pub mod role;

pub use auth::{AuthResponse, Credentials, Session, SignupRequest};
pub use error::MarketError;
pub use listing::{
    ingest, CategoryFilter, Listing, ListingDraft, ListingOwner, ListingPatch, ListingScope,
    NewListing, RawListing,
};
pub use role::Role;
