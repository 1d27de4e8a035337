//! Client-side table engines for the fleet dashboard.
//!
//! Each engine is a pure function over borrowed rows:
//!
//! ```text
//! collection ─► filter ─► sort ─► group ─► paginate ─► page
//! ```
//!
//! Selection is orthogonal view state and lives in [`SelectionSet`].

pub mod filter;
pub mod group;
pub mod paginate;
pub mod pipeline;
pub mod selection;
pub mod sort;

pub use filter::{ALL, DerivedFilter, FilterCriteria, UNGROUPED, filter};
pub use group::{
    ALL_LABEL, Bucket, GroupDimension, UNGROUPED_LABEL, UNKNOWN_LABEL, bucket_key, bucket_label, group,
};
pub use paginate::{DEFAULT_PAGE_SIZE, Page, PageBucket, Pagination, paginate};
pub use pipeline::{TableQuery, cell_text};
pub use selection::{SelectAllState, SelectionSet};
pub use sort::{
    KeyOrdering, MissingSide, SortDirection, SortKey, SortState, compare_items, sort, sort_key,
};
