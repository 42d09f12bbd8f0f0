//! Integration tests for subtype resolution.

use entimap_core::{AnyRecord, EntityMapper, MapperConfig, MapperError};
use entimap_testkit::prelude::*;
use entimap_value::{Document, Namespace, Value};

fn ns() -> Namespace {
    Namespace::new("shapes")
}

fn shape_document(kind: Option<&str>) -> Document {
    let document = Document::new()
        .property("radius", Value::double(2.0))
        .property("side", Value::double(3.0));
    match kind {
        Some(kind) => document.property("kind", Value::string(kind)),
        None => document,
    }
}

#[test]
fn discriminator_selects_registered_subtype() {
    let mapper = EntityMapper::new();

    let circle = mapper
        .deserialize_any(&ns(), &shape_document(Some("circle")), shape_type())
        .unwrap();
    assert_eq!(
        circle.downcast_ref::<Circle>(),
        Some(&Circle {
            kind: "circle".into(),
            radius: 2.0,
        })
    );

    let square = mapper
        .deserialize_any(&ns(), &shape_document(Some("square")), shape_type())
        .unwrap();
    assert_eq!(square.downcast_ref::<Square>().map(|s| s.side), Some(3.0));
}

#[test]
fn alias_selects_the_same_subtype() {
    let mapper = EntityMapper::new();
    let shape = mapper
        .deserialize_any(&ns(), &shape_document(Some("box")), shape_type())
        .unwrap();
    assert!(shape.downcast_ref::<Square>().is_some());
}

#[test]
fn unregistered_discriminator_uses_default() {
    let mapper = EntityMapper::new();
    let shape = mapper
        .deserialize_any(&ns(), &shape_document(Some("hexagon")), lenient_shape_type())
        .unwrap();
    assert!(shape.downcast_ref::<Circle>().is_some());

    let shape = mapper
        .deserialize_any(&ns(), &shape_document(None), lenient_shape_type())
        .unwrap();
    assert!(shape.downcast_ref::<Circle>().is_some());
}

#[test]
fn unregistered_discriminator_without_default_fails() {
    let mapper = EntityMapper::new();
    let err = mapper
        .deserialize_any(&ns(), &shape_document(Some("hexagon")), shape_type())
        .unwrap_err();
    assert!(matches!(err, MapperError::UnknownSubtype { ref value, .. } if value == "hexagon"));

    let err = mapper
        .deserialize_any(&ns(), &shape_document(None), shape_type())
        .unwrap_err();
    assert!(matches!(err, MapperError::MissingDiscriminator { .. }));
}

#[test]
fn serialized_subtype_reads_back_through_abstract_type() {
    let mapper = EntityMapper::new();
    let square = Square {
        kind: "square".into(),
        side: 1.5,
    };
    let document = mapper.serialize(&ns(), &square, &[], false).unwrap();
    assert_eq!(document.key.as_ref().map(|k| k.kind.as_str()), Some("Shape"));

    let back = mapper.deserialize_any(&ns(), &document, shape_type()).unwrap();
    assert_eq!(back.downcast::<Square>().ok(), Some(square));
}

#[test]
fn strict_mapper_reads_through_abstract_type() {
    let mapper = EntityMapper::builder()
        .config(MapperConfig::new().ignore_unknown_properties(false))
        .build();
    let square = Square {
        kind: "square".into(),
        side: 2.5,
    };
    let document = mapper.serialize(&ns(), &square, &[], false).unwrap();
    let back = mapper.deserialize_any(&ns(), &document, shape_type()).unwrap();
    assert_eq!(back.downcast::<Square>().ok(), Some(square));

    let err = mapper
        .deserialize_any(&ns(), &shape_document(Some("circle")), shape_type())
        .unwrap_err();
    assert!(matches!(err.root_cause(), MapperError::UnmappedProperty { property, .. } if property == "side"));
}

#[test]
fn field_subtypes_round_trip() {
    let mapper = EntityMapper::new();
    let drawing = Drawing {
        id: "d1".into(),
        main: Some(AnyRecord::new(Square {
            kind: "square".into(),
            side: 4.0,
        })),
        overlay_kind: "round".into(),
        overlay: Some(AnyRecord::new(Circle {
            kind: String::new(),
            radius: 1.0,
        })),
    };

    let document = mapper.serialize(&ns(), &drawing, &[], false).unwrap();
    let back: Drawing = mapper.deserialize(&ns(), &document).unwrap();

    let main = back.main.as_ref().and_then(AnyRecord::downcast_ref::<Square>).unwrap();
    assert_eq!(main.side, 4.0);
    let overlay = back.overlay.as_ref().and_then(AnyRecord::downcast_ref::<Circle>).unwrap();
    assert_eq!(overlay.radius, 1.0);
}

#[test]
fn internal_field_discriminator_is_written_when_missing() {
    let mapper = EntityMapper::new();
    let drawing = Drawing {
        id: "d2".into(),
        main: Some(AnyRecord::new(Circle {
            kind: String::new(),
            radius: 9.0,
        })),
        ..Drawing::default()
    };
    let mut document = mapper.serialize(&ns(), &drawing, &[], false).unwrap();
    let main = document.get("main").and_then(Value::as_entity).unwrap();
    assert_eq!(main.get("kind").and_then(Value::as_str), Some("circle"));

    let nested = Document::new().property("radius", Value::double(9.0));
    document.set("main", Value::entity(nested));
    let err = mapper.deserialize::<Drawing>(&ns(), &document).unwrap_err();
    assert!(matches!(err.root_cause(), MapperError::MissingDiscriminator { .. }));
}

#[test]
fn external_field_discriminator_falls_back_to_default() {
    let mapper = EntityMapper::new();
    let document = Document::new()
        .property("overlay_kind", Value::string("unknown"))
        .property(
            "overlay",
            Value::entity(Document::new().property("side", Value::double(2.5))),
        );

    let drawing: Drawing = mapper.deserialize(&ns(), &document).unwrap();
    let overlay = drawing
        .overlay
        .as_ref()
        .and_then(AnyRecord::downcast_ref::<Square>)
        .unwrap();
    assert_eq!(overlay.side, 2.5);
    assert!(drawing.main.is_none());
}
