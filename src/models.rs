use std::fmt;
use std::io::Write;
use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};

use crate::schema::{property_inquiries, property_views};

/// Listing category. Stored as text, validated at the boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    House,
    Apartment,
    Villa,
    Office,
    Land,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::House => "house",
            Category::Apartment => "apartment",
            Category::Villa => "villa",
            Category::Office => "office",
            Category::Land => "land",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "house" => Ok(Category::House),
            "apartment" => Ok(Category::Apartment),
            "villa" => Ok(Category::Villa),
            "office" => Ok(Category::Office),
            "land" => Ok(Category::Land),
            _ => Err(()),
        }
    }
}

impl ToSql<Text, Pg> for Category {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for Category {
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        let s = std::str::from_utf8(value.as_bytes())?;
        s.parse()
            .map_err(|_| format!("unrecognized property category: {}", s).into())
    }
}

/// Whether the listed price is a sale price or a rental price.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Sale,
    Rent,
}

impl PriceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::Sale => "sale",
            PriceType::Rent => "rent",
        }
    }
}

impl FromStr for PriceType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(PriceType::Sale),
            "rent" => Ok(PriceType::Rent),
            _ => Err(()),
        }
    }
}

impl ToSql<Text, Pg> for PriceType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for PriceType {
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        let s = std::str::from_utf8(value.as_bytes())?;
        s.parse()
            .map_err(|_| format!("unrecognized price type: {}", s).into())
    }
}

/// Review lifecycle of an inquiry. Transitions only move forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    Submitted,
    Contacted,
    Closed,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::Submitted => "submitted",
            InquiryStatus::Contacted => "contacted",
            InquiryStatus::Closed => "closed",
        }
    }

    fn rank(self) -> u8 {
        match self {
            InquiryStatus::Submitted => 0,
            InquiryStatus::Contacted => 1,
            InquiryStatus::Closed => 2,
        }
    }

    /// A transition is legal only when it moves strictly forward in the
    /// lifecycle; reopening a closed inquiry is an administrative action
    /// outside this API.
    pub fn can_advance_to(self, next: InquiryStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InquiryStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(InquiryStatus::Submitted),
            "contacted" => Ok(InquiryStatus::Contacted),
            "closed" => Ok(InquiryStatus::Closed),
            _ => Err(()),
        }
    }
}

impl ToSql<Text, Pg> for InquiryStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for InquiryStatus {
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        let s = std::str::from_utf8(value.as_bytes())?;
        s.parse()
            .map_err(|_| format!("unrecognized inquiry status: {}", s).into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable)]
pub struct Property {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: Category,
    pub price_type: PriceType,
    pub price: i64,
    pub area: i32,
    pub bedrooms: i16,
    pub bathrooms: i16,
    pub agent_id: i32,
    pub is_available: bool,
    pub is_featured: bool,
    pub is_verified: bool,
    pub rating: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable)]
pub struct PropertyView {
    pub id: i32,
    pub property_id: i32,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = property_views)]
pub struct NewPropertyView<'a> {
    pub property_id: i32,
    pub ip_address: &'a str,
    pub user_agent: &'a str,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable)]
pub struct PropertyInquiry {
    pub id: i32,
    pub property_id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub status: InquiryStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = property_inquiries)]
pub struct NewPropertyInquiry<'a> {
    pub property_id: i32,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub message: &'a str,
    pub status: InquiryStatus,
    pub created_at: NaiveDateTime,
}
