//! Field extractors.
//!
//! Each extractor is a pure function of a text block (plus entity annotations
//! where it needs them) and degrades to an empty value instead of failing.

pub mod contact;
pub mod dates;
pub mod name;
pub mod party;
pub mod places;
pub mod vehicle;

pub use contact::{extract_email, extract_phone};
pub use dates::{DateRange, extract_dates, parse_date};
pub use name::{PersonName, extract_name};
pub use party::extract_party_size;
pub use places::{Places, extract_places};
pub use vehicle::{extract_trip_type, extract_vehicle};
