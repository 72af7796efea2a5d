use std::str::FromStr;

use serde::Deserialize;

use crate::error::ValidationErrors;
use crate::models::{Category, PriceType, Property};

/// Raw search parameters as they arrive on the query string. Everything is
/// kept as text so malformed values surface as field-keyed validation errors
/// instead of an opaque deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub price_type: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub agent: Option<String>,
    pub is_featured: Option<String>,
    pub is_verified: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_area: Option<String>,
    pub max_area: Option<String>,
    pub ordering: Option<String>,
}

/// One supplied filter criterion. Each variant fixes a field, an operator and
/// the value type, so an invalid combination cannot be constructed. A query
/// is the conjunction of all its predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Category(Category),
    PriceType(PriceType),
    Bedrooms(i16),
    Bathrooms(i16),
    Agent(i32),
    Featured(bool),
    Verified(bool),
    MinPrice(i64),
    MaxPrice(i64),
    MinArea(i32),
    MaxArea(i32),
    /// Case-insensitive substring match against title, description or
    /// location.
    Text(String),
}

impl Predicate {
    pub fn matches(&self, property: &Property) -> bool {
        match self {
            Predicate::Category(value) => property.category == *value,
            Predicate::PriceType(value) => property.price_type == *value,
            Predicate::Bedrooms(value) => property.bedrooms == *value,
            Predicate::Bathrooms(value) => property.bathrooms == *value,
            Predicate::Agent(value) => property.agent_id == *value,
            Predicate::Featured(value) => property.is_featured == *value,
            Predicate::Verified(value) => property.is_verified == *value,
            Predicate::MinPrice(bound) => property.price >= *bound,
            Predicate::MaxPrice(bound) => property.price <= *bound,
            Predicate::MinArea(bound) => property.area >= *bound,
            Predicate::MaxArea(bound) => property.area <= *bound,
            Predicate::Text(term) => {
                let needle = term.to_lowercase();
                property.title.to_lowercase().contains(&needle)
                    || property.description.to_lowercase().contains(&needle)
                    || property.location.to_lowercase().contains(&needle)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Price,
    CreatedAt,
    Rating,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub key: SortKey,
    pub direction: Direction,
}

impl Default for Ordering {
    /// Newest listings first.
    fn default() -> Self {
        Ordering {
            key: SortKey::CreatedAt,
            direction: Direction::Desc,
        }
    }
}

/// A validated search: the supplied predicates plus an ordering. The
/// availability gate is not a predicate — it is applied unconditionally by
/// every evaluator so unavailable listings can never leak into results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub predicates: Vec<Predicate>,
    pub ordering: Ordering,
}

impl SearchQuery {
    pub fn from_params(params: &SearchParams) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut predicates = Vec::new();

        if let Some(raw) = &params.category {
            match raw.parse::<Category>() {
                Ok(value) => predicates.push(Predicate::Category(value)),
                Err(()) => errors.add("category", format!("\"{}\" is not a valid choice.", raw)),
            }
        }
        if let Some(raw) = &params.price_type {
            match raw.parse::<PriceType>() {
                Ok(value) => predicates.push(Predicate::PriceType(value)),
                Err(()) => errors.add("price_type", format!("\"{}\" is not a valid choice.", raw)),
            }
        }
        if let Some(raw) = &params.bedrooms {
            if let Some(value) = parse_non_negative::<i16>(&mut errors, "bedrooms", raw) {
                predicates.push(Predicate::Bedrooms(value));
            }
        }
        if let Some(raw) = &params.bathrooms {
            if let Some(value) = parse_non_negative::<i16>(&mut errors, "bathrooms", raw) {
                predicates.push(Predicate::Bathrooms(value));
            }
        }
        if let Some(raw) = &params.agent {
            match raw.parse::<i32>() {
                Ok(value) => predicates.push(Predicate::Agent(value)),
                Err(_) => errors.add("agent", "A valid integer is required."),
            }
        }
        if let Some(raw) = &params.is_featured {
            if let Some(value) = parse_flag(&mut errors, "is_featured", raw) {
                predicates.push(Predicate::Featured(value));
            }
        }
        if let Some(raw) = &params.is_verified {
            if let Some(value) = parse_flag(&mut errors, "is_verified", raw) {
                predicates.push(Predicate::Verified(value));
            }
        }
        if let Some(raw) = &params.min_price {
            if let Some(bound) = parse_non_negative::<i64>(&mut errors, "min_price", raw) {
                predicates.push(Predicate::MinPrice(bound));
            }
        }
        if let Some(raw) = &params.max_price {
            if let Some(bound) = parse_non_negative::<i64>(&mut errors, "max_price", raw) {
                predicates.push(Predicate::MaxPrice(bound));
            }
        }
        if let Some(raw) = &params.min_area {
            if let Some(bound) = parse_non_negative::<i32>(&mut errors, "min_area", raw) {
                predicates.push(Predicate::MinArea(bound));
            }
        }
        if let Some(raw) = &params.max_area {
            if let Some(bound) = parse_non_negative::<i32>(&mut errors, "max_area", raw) {
                predicates.push(Predicate::MaxArea(bound));
            }
        }
        if let Some(term) = params.search.as_deref().map(str::trim) {
            if !term.is_empty() {
                predicates.push(Predicate::Text(term.to_string()));
            }
        }

        let ordering = match &params.ordering {
            Some(raw) => parse_ordering(&mut errors, raw),
            None => Ordering::default(),
        };

        errors.into_result()?;
        Ok(SearchQuery {
            predicates,
            ordering,
        })
    }

    /// In-memory evaluation. The availability gate comes first, before any
    /// user-supplied predicate.
    pub fn matches(&self, property: &Property) -> bool {
        property.is_available && self.predicates.iter().all(|p| p.matches(property))
    }

    pub fn sort(&self, results: &mut [Property]) {
        let Ordering { key, direction } = self.ordering;
        results.sort_by(|a, b| {
            let ord = match key {
                SortKey::Price => a.price.cmp(&b.price),
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                SortKey::Rating => a.rating.total_cmp(&b.rating),
                SortKey::Area => a.area.cmp(&b.area),
            };
            match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });
    }
}

fn parse_ordering(errors: &mut ValidationErrors, raw: &str) -> Ordering {
    let (key_str, direction) = match raw.strip_prefix('-') {
        Some(rest) => (rest, Direction::Desc),
        None => (raw, Direction::Asc),
    };
    let key = match key_str {
        "price" => Some(SortKey::Price),
        "created_at" => Some(SortKey::CreatedAt),
        "rating" => Some(SortKey::Rating),
        "area" => Some(SortKey::Area),
        _ => {
            errors.add(
                "ordering",
                format!("\"{}\" is not a valid ordering field.", raw),
            );
            None
        }
    };
    match key {
        Some(key) => Ordering { key, direction },
        None => Ordering::default(),
    }
}

fn parse_non_negative<T>(errors: &mut ValidationErrors, field: &str, raw: &str) -> Option<T>
where
    T: FromStr + PartialOrd + From<u8>,
{
    match raw.parse::<T>() {
        Ok(value) if value >= T::from(0u8) => Some(value),
        Ok(_) => {
            errors.add(field, "Ensure this value is greater than or equal to 0.");
            None
        }
        Err(_) => {
            errors.add(field, "A valid integer is required.");
            None
        }
    }
}

fn parse_flag(errors: &mut ValidationErrors, field: &str, raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => {
            errors.add(field, "Must be a valid boolean.");
            None
        }
    }
}
