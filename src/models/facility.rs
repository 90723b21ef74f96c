// src/models/facility.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::sanitize::{FieldDescriptor, Node, PayloadNode, Property, Sanitizable, Schema};

/// Kind of amenity a hotel offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacilityKind {
    Restaurant,
    Pool,
    Gym,
    Spa,
    Parking,
    Other,
}

impl PayloadNode for FacilityKind {
    fn node(&mut self) -> Node<'_> {
        Node::Terminal
    }
}

/// A facility as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: Uuid,

    #[serde(rename = "type")]
    pub kind: FacilityKind,

    /// Rich text, may contain HTML.
    pub short_description: Option<String>,
}

pub static FACILITY_SCHEMA: Schema = Schema {
    type_name: "Facility",
    fields: &[
        FieldDescriptor::scalar("id"),
        FieldDescriptor::scalar("type"),
        FieldDescriptor::html("short_description"),
    ],
};

impl Sanitizable for Facility {
    fn schema(&self) -> &'static Schema {
        &FACILITY_SCHEMA
    }

    fn property(&mut self, name: &str) -> Option<Property<'_>> {
        match name {
            "id" => Some(Property::Node(&mut self.id)),
            "type" => Some(Property::Node(&mut self.kind)),
            "short_description" => Some(Property::OptionalText(&mut self.short_description)),
            _ => None,
        }
    }
}

impl PayloadNode for Facility {
    fn node(&mut self) -> Node<'_> {
        Node::Object(self)
    }
}

/// DTO for a facility inside a hotel create/update request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FacilityInput {
    #[serde(rename = "type")]
    pub kind: FacilityKind,

    #[validate(length(max = 1000, message = "Short description must be at most 1000 chars"))]
    pub short_description: Option<String>,
}

pub static FACILITY_INPUT_SCHEMA: Schema = Schema {
    type_name: "FacilityInput",
    fields: &[
        FieldDescriptor::scalar("type"),
        FieldDescriptor::html("short_description"),
    ],
};

impl Sanitizable for FacilityInput {
    fn schema(&self) -> &'static Schema {
        &FACILITY_INPUT_SCHEMA
    }

    fn property(&mut self, name: &str) -> Option<Property<'_>> {
        match name {
            "type" => Some(Property::Node(&mut self.kind)),
            "short_description" => Some(Property::OptionalText(&mut self.short_description)),
            _ => None,
        }
    }
}

impl PayloadNode for FacilityInput {
    fn node(&mut self) -> Node<'_> {
        Node::Object(self)
    }
}

impl Facility {
    pub fn from_input(input: FacilityInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: input.kind,
            short_description: input.short_description,
        }
    }
}
