//! Fixture entity types.
//!
//! Each type exercises one group of mapping features so tests can pick the
//! smallest fixture that covers what they check.

use entimap_core::{
    child_ancestors, record, AnyRecord, Discriminator, Entity, MapperResult, RecordType, Schema,
    TimestampMillisCodec,
};
use entimap_value::{Ancestor, KeyKind, Timestamp};
use std::collections::{BTreeMap, BTreeSet, HashSet};

record! {
    /// A postal address, stored nested inside its owner.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Address {
        /// Street and number.
        pub street: String,
        /// City.
        pub city: String,
        /// Postal code.
        pub zip: Option<String>,
    }
}

impl Entity for Address {}

record! {
    /// A person with a numeric key and a spread of field shapes.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Person {
        /// Key; zero lets the store assign one.
        pub id: i64,
        /// Display name.
        pub name: String,
        /// Age in years.
        pub age: i32,
        /// Stored as `mail`.
        pub email: Option<String>,
        /// Free-form tags, excluded from indexes.
        pub tags: Vec<String>,
        /// Named scores.
        pub scores: BTreeMap<String, i64>,
        /// Home address, if known.
        pub address: Option<Address>,
        /// Never stored.
        pub session: Option<String>,
    }
}

impl Entity for Person {
    fn schema() -> MapperResult<Schema> {
        Schema::builder::<Self>()
            .key("id", KeyKind::Long)
            .rename("email", "mail")
            .exclude_from_index("tags")
            .skip("session")
            .build()
    }
}

/// A populated [`Person`] with a zero key.
pub fn sample_person() -> Person {
    Person {
        id: 0,
        name: "Ada".into(),
        age: 36,
        email: Some("ada@example.com".into()),
        tags: vec!["math".into(), "engines".into()],
        scores: BTreeMap::from([("chess".to_string(), 1800), ("go".to_string(), 12)]),
        address: Some(Address {
            street: "12 St James's Square".into(),
            city: "London".into(),
            zip: None,
        }),
        session: None,
    }
}

record! {
    /// A node with two ancestors declared out of order and a string key.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Branch {
        /// Key; empty generates a UUID.
        pub id: String,
        /// Ancestor `A`, second on the path.
        pub a: String,
        /// Ancestor `B`, first on the path.
        pub b: String,
    }
}

impl Entity for Branch {
    fn schema() -> MapperResult<Schema> {
        Schema::builder::<Self>()
            .key("id", KeyKind::String)
            .ancestor("a", "A", KeyKind::String, 2)
            .ancestor("b", "B", KeyKind::String, 1)
            .build()
    }
}

record! {
    /// A circle; `kind` carries its discriminator.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Circle {
        /// Discriminator value.
        pub kind: String,
        /// Radius.
        pub radius: f64,
    }
}

impl Entity for Circle {
    fn schema() -> MapperResult<Schema> {
        Schema::builder::<Self>().kind("Shape").build()
    }
}

record! {
    /// A square; `kind` carries its discriminator.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Square {
        /// Discriminator value.
        pub kind: String,
        /// Side length.
        pub side: f64,
    }
}

impl Entity for Square {
    fn schema() -> MapperResult<Schema> {
        Schema::builder::<Self>().kind("Shape").build()
    }
}

fn shape_discriminator() -> Discriminator {
    Discriminator::internal("kind")
        .subtype::<Circle>("circle")
        .subtype_names::<Square>("square", &["box"])
}

/// Marker for the abstract shape type without a fallback.
pub struct AnyShape;

fn describe_any_shape() -> MapperResult<Schema> {
    Schema::abstract_type(shape_type())
        .kind("Shape")
        .discriminator(shape_discriminator())
        .build()
}

/// Abstract shape: `circle`, `square` or `box`; anything else is an error.
pub fn shape_type() -> RecordType {
    RecordType::polymorphic::<AnyShape>("AnyShape", describe_any_shape)
}

/// Marker for the abstract shape type that falls back to [`Circle`].
pub struct LenientShape;

fn describe_lenient_shape() -> MapperResult<Schema> {
    Schema::abstract_type(lenient_shape_type())
        .kind("Shape")
        .discriminator(shape_discriminator().default_impl::<Circle>())
        .build()
}

/// Abstract shape that reads unknown discriminators as [`Circle`].
pub fn lenient_shape_type() -> RecordType {
    RecordType::polymorphic::<LenientShape>("LenientShape", describe_lenient_shape)
}

record! {
    /// A drawing holding shapes resolved through field-level discriminators.
    #[derive(Debug, Clone, Default)]
    pub struct Drawing {
        /// Key.
        pub id: String,
        /// Main shape; its discriminator is inside the nested entity.
        pub main: Option<AnyRecord>,
        /// Discriminator for `overlay`.
        pub overlay_kind: String,
        /// Overlay shape; its discriminator is `overlay_kind`.
        pub overlay: Option<AnyRecord>,
    }
}

impl Entity for Drawing {
    fn schema() -> MapperResult<Schema> {
        Schema::builder::<Self>()
            .key("id", KeyKind::String)
            .subtypes("main", shape_discriminator())
            .subtypes(
                "overlay",
                Discriminator::external("overlay_kind")
                    .subtype::<Circle>("round")
                    .subtype::<Square>("flat")
                    .default_impl::<Square>(),
            )
            .build()
    }
}

record! {
    /// Width and height, flattened into [`Poster`].
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Dimensions {
        /// Width.
        pub width: i64,
        /// Height.
        pub height: i64,
    }
}

impl Entity for Dimensions {}

record! {
    /// A poster whose dimensions are stored as top-level properties.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Poster {
        /// Key.
        pub id: String,
        /// Title.
        pub title: String,
        /// Flattened size.
        pub size: Dimensions,
    }
}

impl Entity for Poster {
    fn schema() -> MapperResult<Schema> {
        Schema::builder::<Self>()
            .key("id", KeyKind::String)
            .flatten("size")
            .build()
    }
}

record! {
    /// An event with a custom-coded millisecond field.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Event {
        /// Key.
        pub id: String,
        /// Epoch millis, stored as a timestamp.
        pub at: i64,
        /// Timestamp stored natively.
        pub logged: Timestamp,
        /// Epoch millis, read from a stored timestamp.
        pub seen: i64,
    }
}

impl Entity for Event {
    fn schema() -> MapperResult<Schema> {
        Schema::builder::<Self>()
            .key("id", KeyKind::String)
            .codec("at", TimestampMillisCodec)
            .build()
    }
}

record! {
    /// A sensor with boolean, single-precision and set-valued fields.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Sensor {
        /// Key.
        pub id: String,
        /// Whether the sensor reports.
        pub active: bool,
        /// Last reading.
        pub reading: f32,
        /// Free-form labels.
        pub labels: BTreeSet<String>,
        /// Radio channels in use.
        pub channels: HashSet<i32>,
    }
}

impl Entity for Sensor {
    fn schema() -> MapperResult<Schema> {
        Schema::builder::<Self>().key("id", KeyKind::String).build()
    }
}

/// A populated [`Sensor`].
pub fn sample_sensor() -> Sensor {
    Sensor {
        id: "s-1".into(),
        active: true,
        reading: 21.5,
        labels: BTreeSet::from(["roof".to_string(), "north".to_string()]),
        channels: HashSet::from([11, 15, 26]),
    }
}

record! {
    /// An employee stored under its company.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Employee {
        /// Key.
        pub id: i64,
        /// Company ancestor.
        pub company: i64,
        /// Name.
        pub name: String,
    }
}

impl Entity for Employee {
    fn schema() -> MapperResult<Schema> {
        Schema::builder::<Self>()
            .key("id", KeyKind::Long)
            .ancestor("company", "Company", KeyKind::Long, 1)
            .build()
    }
}

record! {
    /// A company whose employees are separate documents.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Company {
        /// Key.
        pub id: i64,
        /// Name.
        pub name: String,
        /// Loaded from the employee repository.
        pub employees: Vec<Employee>,
    }
}

impl Entity for Company {
    fn schema() -> MapperResult<Schema> {
        Schema::builder::<Self>()
            .key("id", KeyKind::Long)
            .external(
                "employees",
                child_ancestors(|company: &Company| vec![Ancestor::id("Company", company.id)]),
            )
            .build()
    }
}
