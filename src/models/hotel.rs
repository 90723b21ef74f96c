// src/models/hotel.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::facility::{Facility, FacilityInput};
use crate::sanitize::field::sanitized_field;
use crate::sanitize::{
    FieldDescriptor, FieldKind, Node, PayloadNode, Property, Sanitizable, Schema,
};

/// A hotel as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: Uuid,

    /// Display name. Editors may use inline formatting.
    pub name: String,

    /// Rich text, may contain HTML.
    pub description: Option<String>,

    pub address: String,
    pub city: String,

    /// Star rating between 0 and 5.
    pub rating: Option<f32>,
    pub has_wifi: bool,

    pub facilities: Vec<Facility>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub static HOTEL_SCHEMA: Schema = Schema {
    type_name: "Hotel",
    fields: &[
        FieldDescriptor::scalar("id"),
        FieldDescriptor::html("name"),
        FieldDescriptor::html("description"),
        FieldDescriptor::text("address"),
        FieldDescriptor::text("city"),
        FieldDescriptor::new("rating", FieldKind::Number),
        FieldDescriptor::new("has_wifi", FieldKind::Boolean),
        FieldDescriptor::collection("facilities"),
        FieldDescriptor::scalar("created_at"),
        FieldDescriptor::scalar("updated_at"),
    ],
};

impl Sanitizable for Hotel {
    fn schema(&self) -> &'static Schema {
        &HOTEL_SCHEMA
    }

    fn property(&mut self, name: &str) -> Option<Property<'_>> {
        match name {
            "id" => Some(Property::Node(&mut self.id)),
            "name" => Some(Property::Text(&mut self.name)),
            "description" => Some(Property::OptionalText(&mut self.description)),
            "address" => Some(Property::Text(&mut self.address)),
            "city" => Some(Property::Text(&mut self.city)),
            "rating" => Some(Property::Node(&mut self.rating)),
            "has_wifi" => Some(Property::Node(&mut self.has_wifi)),
            "facilities" => Some(Property::Node(&mut self.facilities)),
            "created_at" => Some(Property::Node(&mut self.created_at)),
            "updated_at" => Some(Property::Node(&mut self.updated_at)),
            _ => None,
        }
    }
}

impl PayloadNode for Hotel {
    fn node(&mut self) -> Node<'_> {
        Node::Object(self)
    }
}

impl Hotel {
    pub fn from_input(id: Uuid, input: HotelInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            address: input.address,
            city: input.city,
            rating: input.rating,
            has_wifi: input.has_wifi,
            facilities: input.facilities.into_iter().map(Facility::from_input).collect(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// DTO for creating or replacing a hotel.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HotelInput {
    #[validate(length(min = 1, max = 200, message = "Name length must be between 1 and 200 chars"))]
    pub name: String,

    #[validate(length(max = 20000, message = "Description must be at most 20000 chars"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 300))]
    pub address: String,

    #[validate(length(min = 1, max = 100))]
    pub city: String,

    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f32>,

    #[serde(default)]
    pub has_wifi: bool,

    #[serde(default)]
    #[validate(nested)]
    pub facilities: Vec<FacilityInput>,
}

pub static HOTEL_INPUT_SCHEMA: Schema = Schema {
    type_name: "HotelInput",
    fields: &[
        FieldDescriptor::html("name"),
        FieldDescriptor::html("description"),
        FieldDescriptor::text("address"),
        FieldDescriptor::text("city"),
        FieldDescriptor::new("rating", FieldKind::Number),
        FieldDescriptor::new("has_wifi", FieldKind::Boolean),
        FieldDescriptor::collection("facilities"),
    ],
};

impl Sanitizable for HotelInput {
    fn schema(&self) -> &'static Schema {
        &HOTEL_INPUT_SCHEMA
    }

    fn property(&mut self, name: &str) -> Option<Property<'_>> {
        match name {
            "name" => Some(Property::Text(&mut self.name)),
            "description" => Some(Property::OptionalText(&mut self.description)),
            "address" => Some(Property::Text(&mut self.address)),
            "city" => Some(Property::Text(&mut self.city)),
            "rating" => Some(Property::Node(&mut self.rating)),
            "has_wifi" => Some(Property::Node(&mut self.has_wifi)),
            "facilities" => Some(Property::Node(&mut self.facilities)),
            _ => None,
        }
    }
}

impl PayloadNode for HotelInput {
    fn node(&mut self) -> Node<'_> {
        Node::Object(self)
    }
}

sanitized_field!(pub summary_name, "HotelSummary", "name");

/// Compact list entry. Sanitized field by field during serialization
/// instead of by a payload walk.
#[derive(Debug, Clone, Serialize)]
pub struct HotelSummary {
    pub id: Uuid,

    #[serde(with = "summary_name")]
    pub name: String,

    pub city: String,

    pub rating: Option<f32>,
}

impl From<&Hotel> for HotelSummary {
    fn from(hotel: &Hotel) -> Self {
        Self {
            id: hotel.id,
            name: hotel.name.clone(),
            city: hotel.city.clone(),
            rating: hotel.rating,
        }
    }
}
