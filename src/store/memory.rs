use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::ListingStore;
use crate::error::{ApiError, ValidationErrors};
use crate::inquiry::{InquiryFilter, InquiryForm};
use crate::models::{InquiryStatus, Property, PropertyInquiry, PropertyView};
use crate::search::SearchQuery;

/// In-memory store used by the test suites and for running the API without a
/// database. Every operation holds the mutex for its full duration, so the
/// insert-if-absent in `record_view` is atomic just like the unique index in
/// the Postgres store.
#[derive(Default)]
pub struct MemoryListingStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    properties: BTreeMap<i32, Property>,
    views: BTreeMap<(i32, String), PropertyView>,
    inquiries: BTreeMap<i32, PropertyInquiry>,
    next_view_id: i32,
    next_inquiry_id: i32,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_property(&self, property: Property) {
        let mut inner = self.lock();
        inner.properties.insert(property.id, property);
    }

    pub fn views_for(&self, property_id: i32) -> Vec<PropertyView> {
        self.lock()
            .views
            .values()
            .filter(|v| v.property_id == property_id)
            .cloned()
            .collect()
    }

    pub fn inquiry_count(&self) -> usize {
        self.lock().inquiries.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ListingStore for MemoryListingStore {
    fn search(&self, query: &SearchQuery) -> Result<Vec<Property>, ApiError> {
        let inner = self.lock();
        let mut results: Vec<Property> = inner
            .properties
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        query.sort(&mut results);
        Ok(results)
    }

    fn get_property(&self, property_id: i32) -> Result<Property, ApiError> {
        self.lock()
            .properties
            .get(&property_id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    fn record_view(
        &self,
        property_id: i32,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<(), ApiError> {
        let mut inner = self.lock();
        if !inner.properties.contains_key(&property_id) {
            return Err(ApiError::NotFound);
        }

        let key = (property_id, ip_address.to_string());
        // First observation wins; a repeat view is a silent no-op.
        if !inner.views.contains_key(&key) {
            inner.next_view_id += 1;
            let view = PropertyView {
                id: inner.next_view_id,
                property_id,
                ip_address: ip_address.to_string(),
                user_agent: user_agent.to_string(),
                created_at: Utc::now().naive_utc(),
            };
            inner.views.insert(key, view);
        }
        Ok(())
    }

    fn create_inquiry(
        &self,
        property_id: i32,
        form: &InquiryForm,
    ) -> Result<PropertyInquiry, ApiError> {
        let mut inner = self.lock();
        if !inner.properties.contains_key(&property_id) {
            return Err(ApiError::NotFound);
        }

        inner.next_inquiry_id += 1;
        let inquiry = PropertyInquiry {
            id: inner.next_inquiry_id,
            property_id,
            name: form.name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            message: form.message.clone(),
            status: InquiryStatus::Submitted,
            created_at: Utc::now().naive_utc(),
        };
        inner.inquiries.insert(inquiry.id, inquiry.clone());
        Ok(inquiry)
    }

    fn list_inquiries(&self, filter: &InquiryFilter) -> Result<Vec<PropertyInquiry>, ApiError> {
        let inner = self.lock();
        let mut results: Vec<PropertyInquiry> = inner
            .inquiries
            .values()
            .filter(|i| filter.property.map_or(true, |p| i.property_id == p))
            .filter(|i| filter.status.map_or(true, |s| i.status == s))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(results)
    }

    fn update_inquiry_status(
        &self,
        inquiry_id: i32,
        next: InquiryStatus,
    ) -> Result<PropertyInquiry, ApiError> {
        let mut inner = self.lock();
        let inquiry = inner
            .inquiries
            .get_mut(&inquiry_id)
            .ok_or(ApiError::NotFound)?;
        if !inquiry.status.can_advance_to(next) {
            return Err(ValidationErrors::single(
                "status",
                format!("Cannot move from \"{}\" to \"{}\".", inquiry.status, next),
            )
            .into());
        }
        inquiry.status = next;
        Ok(inquiry.clone())
    }
}
