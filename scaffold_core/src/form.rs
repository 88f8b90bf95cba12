//! # Form Model
//!
//! The input side of the calculator: two discriminant selections and six
//! numeric text fields. Which fields matter is decided by
//! [`required_fields`], a pure function of the two discriminants; the rest
//! of the crate (validation, request building, rendering) asks it instead
//! of re-deriving the rules.
//!
//! ```text
//! location = outside               -> length, height
//! location = inside, type = ceiling -> roomWidth, roomLength
//! location = inside, type = walls   -> scaffoldWidth, wallsLength
//! ```
//!
//! ## Example
//!
//! ```rust
//! use scaffold_core::form::{FieldName, FormState, Location};
//!
//! let mut form = FormState::default();
//! form.select_location(Location::Outside);
//! form.set_field(FieldName::Length, "10");
//! form.set_field(FieldName::Height, "4.25");
//!
//! let request = form.to_request().unwrap();
//! assert_eq!(request.fields["height"], 4.25);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::CalculationRequest;
use crate::errors::{CalcError, CalcResult};

/// Where the scaffolding is erected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Outside,
    Inside,
}

impl Location {
    pub const ALL: [Location; 2] = [Location::Outside, Location::Inside];

    /// Wire value sent to the calculation endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Outside => "outside",
            Location::Inside => "inside",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Location::Outside => "Снаружи здания (наружные)",
            Location::Inside => "Внутри здания (внутренние)",
        }
    }

    /// Short form used in exported documents
    pub fn summary(&self) -> &'static str {
        match self {
            Location::Outside => "Снаружи здания",
            Location::Inside => "Внутри здания",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Kind of interior work, only meaningful for [`Location::Inside`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsideType {
    Ceiling,
    Walls,
}

impl InsideType {
    pub const ALL: [InsideType; 2] = [InsideType::Ceiling, InsideType::Walls];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsideType::Ceiling => "ceiling",
            InsideType::Walls => "walls",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            InsideType::Ceiling => "Для отделки потолка",
            InsideType::Walls => "Для отделки стен",
        }
    }
}

impl fmt::Display for InsideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One of the numeric inputs of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    Height,
    Length,
    RoomWidth,
    RoomLength,
    ScaffoldWidth,
    WallsLength,
}

impl FieldName {
    pub const ALL: [FieldName; 6] = [
        FieldName::Height,
        FieldName::Length,
        FieldName::RoomWidth,
        FieldName::RoomLength,
        FieldName::ScaffoldWidth,
        FieldName::WallsLength,
    ];

    /// JSON key used on the wire
    pub fn key(&self) -> &'static str {
        match self {
            FieldName::Height => "height",
            FieldName::Length => "length",
            FieldName::RoomWidth => "roomWidth",
            FieldName::RoomLength => "roomLength",
            FieldName::ScaffoldWidth => "scaffoldWidth",
            FieldName::WallsLength => "wallsLength",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        FieldName::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Input label, unit included
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::Height => "Высота (H), м",
            FieldName::Length => "Длина (L), м",
            FieldName::RoomWidth => "Ширина помещения (A), м",
            FieldName::RoomLength => "Длина помещения (B), м",
            FieldName::ScaffoldWidth => "Ширина лесов (W), м",
            FieldName::WallsLength => "Длина стен (P), м",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Fields the user has to fill for a discriminant combination.
///
/// Returns an empty slice while the combination is incomplete (no location,
/// or inside without a sub-type). Order is display order.
pub fn required_fields(location: Option<Location>, inside_type: Option<InsideType>) -> &'static [FieldName] {
    match (location, inside_type) {
        (Some(Location::Outside), _) => &[FieldName::Length, FieldName::Height],
        (Some(Location::Inside), Some(InsideType::Ceiling)) => &[FieldName::RoomWidth, FieldName::RoomLength],
        (Some(Location::Inside), Some(InsideType::Walls)) => &[FieldName::ScaffoldWidth, FieldName::WallsLength],
        _ => &[],
    }
}

/// Controlled form values. Text is kept exactly as typed.
///
/// Values of inactive fields survive location switches but are never
/// validated or sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub location: Option<Location>,
    pub inside_type: Option<InsideType>,
    pub height: String,
    pub length: String,
    pub room_width: String,
    pub room_length: String,
    pub scaffold_width: String,
    pub walls_length: String,
}

impl FormState {
    /// Choose a location. Going outside drops any interior sub-type.
    pub fn select_location(&mut self, location: Location) {
        self.location = Some(location);
        if location == Location::Outside {
            self.inside_type = None;
        }
    }

    pub fn select_inside_type(&mut self, inside_type: InsideType) {
        self.inside_type = Some(inside_type);
    }

    pub fn field(&self, name: FieldName) -> &str {
        match name {
            FieldName::Height => &self.height,
            FieldName::Length => &self.length,
            FieldName::RoomWidth => &self.room_width,
            FieldName::RoomLength => &self.room_length,
            FieldName::ScaffoldWidth => &self.scaffold_width,
            FieldName::WallsLength => &self.walls_length,
        }
    }

    /// Overwrite a single field, leaving all others untouched.
    pub fn set_field(&mut self, name: FieldName, value: impl Into<String>) {
        let slot = match name {
            FieldName::Height => &mut self.height,
            FieldName::Length => &mut self.length,
            FieldName::RoomWidth => &mut self.room_width,
            FieldName::RoomLength => &mut self.room_length,
            FieldName::ScaffoldWidth => &mut self.scaffold_width,
            FieldName::WallsLength => &mut self.walls_length,
        };
        *slot = value.into();
    }

    /// Fields visible and required for the current selection
    pub fn active_fields(&self) -> &'static [FieldName] {
        required_fields(self.location, self.inside_type)
    }

    pub fn has_complete_selection(&self) -> bool {
        !self.active_fields().is_empty()
    }

    /// Validate the active fields and build the request body.
    pub fn to_request(&self) -> CalcResult<CalculationRequest> {
        let location = match self.location {
            Some(location) if self.has_complete_selection() => location,
            _ => return Err(CalcError::MissingSelection),
        };

        let mut fields = BTreeMap::new();
        for &name in self.active_fields() {
            fields.insert(name.key().to_string(), parse_dimension(name, self.field(name))?);
        }

        Ok(CalculationRequest {
            location,
            inside_type: match location {
                Location::Inside => self.inside_type,
                Location::Outside => None,
            },
            fields,
        })
    }
}

/// Parse a dimension in metres. Accepts a decimal comma.
fn parse_dimension(name: FieldName, raw: &str) -> CalcResult<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CalcError::missing_field(name.key()));
    }

    let value: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| CalcError::invalid_input(name.key(), trimmed, "ожидается число"))?;

    if !value.is_finite() {
        return Err(CalcError::invalid_input(name.key(), trimmed, "ожидается конечное число"));
    }
    if value <= 0.0 {
        return Err(CalcError::invalid_input(name.key(), trimmed, "значение должно быть больше нуля"));
    }

    Ok(value)
}
