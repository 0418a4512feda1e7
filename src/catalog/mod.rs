//! Package catalog - registry listing and its in-memory cache
//!
//! # Architecture
//!
//! ```text
//! Thunderstore (package-listing-index)
//!     │  ThunderstoreSource::fetch_all
//!     ▼
//! RecordCache ── every 30 min / {{reloadcache}}
//!     │  current() -> Arc<Snapshot>
//!     ▼
//! Resolver / SummaryBuilder
//! ```

mod cache;
mod record;
mod source;

pub use cache::{RecordCache, Snapshot};
pub use record::{PackageRecord, VersionRecord, OWNER_SEPARATOR};
pub use source::{
    decode_body, fetch_with_timeout, parse_index, parse_packages, PackageSource,
    ThunderstoreSource,
};
