use chrono::Utc;
use diesel::dsl::exists;
use diesel::prelude::*;
use log::info;

use super::ListingStore;
use crate::db;
use crate::error::{ApiError, ValidationErrors};
use crate::inquiry::{InquiryFilter, InquiryForm};
use crate::models::{
    InquiryStatus, NewPropertyInquiry, NewPropertyView, Property, PropertyInquiry,
};
use crate::search::{Direction, Predicate, SearchQuery, SortKey};

/// Postgres-backed store. A connection is established per call; every
/// operation is a single short-lived statement or two.
pub struct PgListingStore {
    database_url: String,
}

impl PgListingStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    fn conn(&self) -> Result<PgConnection, ApiError> {
        Ok(db::establish_connection(&self.database_url)?)
    }

    fn property_exists(&self, conn: &mut PgConnection, wanted: i32) -> Result<bool, ApiError> {
        use crate::schema::properties::dsl::properties;

        Ok(diesel::select(exists(properties.find(wanted))).get_result(conn)?)
    }
}

/// Escapes LIKE metacharacters so a search term is matched literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl ListingStore for PgListingStore {
    fn search(&self, query: &SearchQuery) -> Result<Vec<Property>, ApiError> {
        use crate::schema::properties::dsl::*;

        let mut conn = self.conn()?;

        // The availability gate is the base of the statement; user predicates
        // only ever narrow it further.
        let mut stmt = properties.filter(is_available.eq(true)).into_boxed();
        for predicate in &query.predicates {
            stmt = match predicate {
                Predicate::Category(value) => stmt.filter(category.eq(*value)),
                Predicate::PriceType(value) => stmt.filter(price_type.eq(*value)),
                Predicate::Bedrooms(value) => stmt.filter(bedrooms.eq(*value)),
                Predicate::Bathrooms(value) => stmt.filter(bathrooms.eq(*value)),
                Predicate::Agent(value) => stmt.filter(agent_id.eq(*value)),
                Predicate::Featured(value) => stmt.filter(is_featured.eq(*value)),
                Predicate::Verified(value) => stmt.filter(is_verified.eq(*value)),
                Predicate::MinPrice(bound) => stmt.filter(price.ge(*bound)),
                Predicate::MaxPrice(bound) => stmt.filter(price.le(*bound)),
                Predicate::MinArea(bound) => stmt.filter(area.ge(*bound)),
                Predicate::MaxArea(bound) => stmt.filter(area.le(*bound)),
                Predicate::Text(term) => {
                    let pattern = format!("%{}%", escape_like(term));
                    stmt.filter(
                        title
                            .ilike(pattern.clone())
                            .or(description.ilike(pattern.clone()))
                            .or(location.ilike(pattern)),
                    )
                }
            };
        }
        stmt = match (query.ordering.key, query.ordering.direction) {
            (SortKey::Price, Direction::Asc) => stmt.order(price.asc()),
            (SortKey::Price, Direction::Desc) => stmt.order(price.desc()),
            (SortKey::CreatedAt, Direction::Asc) => stmt.order(created_at.asc()),
            (SortKey::CreatedAt, Direction::Desc) => stmt.order(created_at.desc()),
            (SortKey::Rating, Direction::Asc) => stmt.order(rating.asc()),
            (SortKey::Rating, Direction::Desc) => stmt.order(rating.desc()),
            (SortKey::Area, Direction::Asc) => stmt.order(area.asc()),
            (SortKey::Area, Direction::Desc) => stmt.order(area.desc()),
        };

        Ok(stmt.load::<Property>(&mut conn)?)
    }

    fn get_property(&self, property_id: i32) -> Result<Property, ApiError> {
        use crate::schema::properties::dsl::properties;

        let mut conn = self.conn()?;
        properties
            .find(property_id)
            .first::<Property>(&mut conn)
            .optional()?
            .ok_or(ApiError::NotFound)
    }

    fn record_view(
        &self,
        property_id: i32,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<(), ApiError> {
        use crate::schema::property_views::dsl as views;

        let mut conn = self.conn()?;
        if !self.property_exists(&mut conn, property_id)? {
            return Err(ApiError::NotFound);
        }

        // The unique index on (property_id, ip_address) is the correctness
        // mechanism: a concurrent duplicate insert lands on the conflict path
        // and is treated as success.
        let inserted = diesel::insert_into(views::property_views)
            .values(&NewPropertyView {
                property_id,
                ip_address,
                user_agent,
                created_at: Utc::now().naive_utc(),
            })
            .on_conflict((views::property_id, views::ip_address))
            .do_nothing()
            .execute(&mut conn)?;
        if inserted > 0 {
            info!(
                "Recorded first view of property {} from {}",
                property_id, ip_address
            );
        }
        Ok(())
    }

    fn create_inquiry(
        &self,
        property_id: i32,
        form: &InquiryForm,
    ) -> Result<PropertyInquiry, ApiError> {
        use crate::schema::property_inquiries::dsl::property_inquiries;

        let mut conn = self.conn()?;
        if !self.property_exists(&mut conn, property_id)? {
            return Err(ApiError::NotFound);
        }

        let inquiry: PropertyInquiry = diesel::insert_into(property_inquiries)
            .values(&NewPropertyInquiry {
                property_id,
                name: &form.name,
                email: &form.email,
                phone: &form.phone,
                message: &form.message,
                status: InquiryStatus::Submitted,
                created_at: Utc::now().naive_utc(),
            })
            .get_result(&mut conn)?;
        info!(
            "Created inquiry {} for property {}",
            inquiry.id, property_id
        );
        Ok(inquiry)
    }

    fn list_inquiries(&self, filter: &InquiryFilter) -> Result<Vec<PropertyInquiry>, ApiError> {
        use crate::schema::property_inquiries::dsl::*;

        let mut conn = self.conn()?;
        let mut stmt = property_inquiries.into_boxed();
        if let Some(wanted) = filter.property {
            stmt = stmt.filter(property_id.eq(wanted));
        }
        if let Some(wanted) = filter.status {
            stmt = stmt.filter(status.eq(wanted));
        }
        Ok(stmt.order(created_at.desc()).load(&mut conn)?)
    }

    fn update_inquiry_status(
        &self,
        inquiry_id: i32,
        next: InquiryStatus,
    ) -> Result<PropertyInquiry, ApiError> {
        use crate::schema::property_inquiries::dsl::*;

        let mut conn = self.conn()?;
        let current: PropertyInquiry = property_inquiries
            .find(inquiry_id)
            .first(&mut conn)
            .optional()?
            .ok_or(ApiError::NotFound)?;
        if !current.status.can_advance_to(next) {
            return Err(ValidationErrors::single(
                "status",
                format!("Cannot move from \"{}\" to \"{}\".", current.status, next),
            )
            .into());
        }

        let updated = diesel::update(property_inquiries.find(inquiry_id))
            .set(status.eq(next))
            .get_result(&mut conn)?;
        info!("Inquiry {} moved to {}", inquiry_id, next);
        Ok(updated)
    }
}
