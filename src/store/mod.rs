mod memory;
mod pg;

pub use memory::MemoryListingStore;
pub use pg::PgListingStore;

use crate::error::ApiError;
use crate::inquiry::{InquiryFilter, InquiryForm};
use crate::models::{InquiryStatus, Property, PropertyInquiry};
use crate::search::SearchQuery;

/// Persistence seam for the listing catalog and its engagement records.
pub trait ListingStore: Send + Sync {
    /// Available listings matching `query`, in the query's order.
    fn search(&self, query: &SearchQuery) -> Result<Vec<Property>, ApiError>;

    /// Fails with `NotFound` when no listing has this id.
    fn get_property(&self, property_id: i32) -> Result<Property, ApiError>;

    /// Records a view at most once per (listing, ip). Re-recording an
    /// existing pair is success, not an error, and never overwrites the
    /// originally captured user agent. The insert-if-absent must be atomic.
    fn record_view(
        &self,
        property_id: i32,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<(), ApiError>;

    /// Persists an already validated inquiry with status `submitted` and
    /// returns the created record.
    fn create_inquiry(
        &self,
        property_id: i32,
        form: &InquiryForm,
    ) -> Result<PropertyInquiry, ApiError>;

    /// Inquiries matching `filter`, newest first.
    fn list_inquiries(&self, filter: &InquiryFilter) -> Result<Vec<PropertyInquiry>, ApiError>;

    /// Advances the review lifecycle; transitions that do not move strictly
    /// forward are rejected as validation errors.
    fn update_inquiry_status(
        &self,
        inquiry_id: i32,
        next: InquiryStatus,
    ) -> Result<PropertyInquiry, ApiError>;
}
