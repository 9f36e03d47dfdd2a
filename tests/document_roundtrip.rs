//! End-to-end tests: Turtle in, records, Turtle out, submodel templates

use std::io::Write;

use oxrdf::{Graph, NamedNode, Term};
use rstest::rstest;
use samm_bridge::codec::{decode_reference_or_collection, encode_collection, encode_optional_reference, NoInline};
use samm_bridge::descriptor::fields;
use samm_bridge::{
    export_document, import_document, import_file, transform_to_submodel, Cardinality,
    ElementKind, ExportOptions, IdSet, ImportOptions, ImportedDocument, LangString, LookupStore,
    NamespaceMap, OptionalReference, SammError, SammVersion, ScalarValue, SubmodelElementKind,
    TransformOptions, ValueType,
};

const NS: &str = "urn:samm:com.example.movement:1.0.0#";

const MOVEMENT: &str = r#"# Copyright (c) 2026 Example Corp
# SPDX-License-Identifier: MPL-2.0

@prefix samm: <urn:samm:org.eclipse.esmf.samm:meta-model:2.1.0#> .
@prefix samm-c: <urn:samm:org.eclipse.esmf.samm:characteristic:2.1.0#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix : <urn:samm:com.example.movement:1.0.0#> .

:Movement a samm:Aspect ;
   samm:preferredName "movement"@en ;
   samm:description "Aspect for movement information"@en ;
   samm:properties ( :isMoving [ samm:property :speedLimitWarning ; samm:optional true ] :position ) ;
   samm:operations ( ) ;
   samm:events ( ) .

:isMoving a samm:Property ;
   samm:preferredName "is moving"@en ;
   samm:characteristic samm-c:Boolean .

:speedLimitWarning a samm:Property ;
   samm:characteristic :TrafficLight ;
   samm:exampleValue "green" .

:TrafficLight a samm-c:Enumeration ;
   samm:dataType xsd:string ;
   samm-c:values ( "green" "yellow" "red" ) .

:position a samm:Property ;
   samm:characteristic :SpatialPositionCharacteristic .

:SpatialPositionCharacteristic a samm-c:SingleEntity ;
   samm:dataType :SpatialPosition .

:SpatialPosition a samm:Entity ;
   samm:properties ( :latitude :longitude ) .

:latitude a samm:Property ;
   samm:characteristic :Coordinate .

:longitude a samm:Property ;
   samm:characteristic :Coordinate .

:Coordinate a samm-c:Trait ;
   samm-c:baseCharacteristic :CoordinateMeasurement ;
   samm-c:constraint [ a samm-c:RangeConstraint ;
      samm-c:minValue "-180" ;
      samm-c:maxValue "180" ;
      samm-c:lowerBoundDefinition samm-c:AT_LEAST ;
      samm-c:upperBoundDefinition samm-c:AT_MOST ] .

:CoordinateMeasurement a samm:Characteristic ;
   samm:dataType xsd:decimal .
"#;

fn id(local: &str) -> String {
    format!("{NS}{local}")
}

fn import_movement() -> ImportedDocument {
    import_document(MOVEMENT, &ImportOptions::default()).unwrap()
}

#[test]
fn test_import_movement_document() {
    let document = import_movement();

    assert_eq!(document.id_set.version, SammVersion::Samm2_1_0);
    assert_eq!(document.aspect_id.as_deref(), Some(id("Movement").as_str()));
    // 11 named subjects plus the inline range constraint
    assert_eq!(document.records.len(), 12);
    assert_eq!(document.environment.len(), 12);

    let aspect = document.aspect().unwrap();
    assert_eq!(
        aspect.element.references(fields::PROPERTIES),
        vec![
            OptionalReference::required(id("isMoving")),
            OptionalReference::new(id("speedLimitWarning"), true),
            OptionalReference::required(id("position")),
        ]
    );

    let traffic_light = document.record(&id("TrafficLight")).unwrap();
    let values: Vec<String> = traffic_light
        .element
        .references(fields::VALUES)
        .into_iter()
        .map(|r| r.value)
        .collect();
    assert_eq!(values, vec!["green", "yellow", "red"]);

    let coordinate = document.record(&id("Coordinate")).unwrap();
    let constraint_id = coordinate.element.reference(fields::CONSTRAINT).unwrap();
    let constraint = document.record(&constraint_id).unwrap();
    assert_eq!(constraint.kind(), ElementKind::RangeConstraint);
    assert_eq!(constraint.element.scalar(fields::LOWER_BOUND), Some("AT_LEAST"));
    assert_eq!(constraint.element.scalar(fields::MAX_VALUE), Some("180"));
}

#[test]
fn test_import_keeps_header_comments() {
    let document = import_movement();
    assert_eq!(
        document.comments,
        vec![
            "# Copyright (c) 2026 Example Corp".to_string(),
            "# SPDX-License-Identifier: MPL-2.0".to_string(),
        ]
    );

    let without = import_document(
        MOVEMENT,
        &ImportOptions {
            keep_comments: false,
            ..ImportOptions::default()
        },
    )
    .unwrap();
    assert!(without.comments.is_empty());
}

/// Import `content`, export its Aspect, import the result again and compare
/// every record of both imports field by field
fn assert_round_trip(content: &str) -> (ImportedDocument, ImportedDocument) {
    let first = import_document(content, &ImportOptions::default()).unwrap();
    let aspect_id = first.aspect_id.clone().unwrap();

    let turtle = export_document(&first.environment, &aspect_id, &ExportOptions::default()).unwrap();
    let second = import_document(&turtle, &ImportOptions::default()).unwrap();
    assert_eq!(second.id_set.version, first.id_set.version);
    assert_eq!(second.aspect_id, first.aspect_id);
    assert_eq!(second.records.len(), first.records.len(), "{turtle}");

    for record in &first.records {
        let again = second
            .record(&record.id)
            .unwrap_or_else(|| panic!("{} missing after round trip", record.id));
        assert_eq!(again.kind(), record.kind(), "{}", record.id);
        assert_eq!(again.id_short, record.id_short, "{}", record.id);
        assert_eq!(again.description, record.description, "{}", record.id);
        assert_eq!(again.element, record.element, "{}\n{turtle}", record.id);
    }

    let declared: Vec<(&str, &str)> = first.namespaces.iter().collect();
    let reread: Vec<(&str, &str)> = second.namespaces.iter().collect();
    assert_eq!(reread, declared);
    (first, second)
}

#[test]
fn test_export_then_import_preserves_fields() {
    let (first, _) = assert_round_trip(MOVEMENT);
    let turtle = export_document(&first.environment, &id("Movement"), &ExportOptions::default()).unwrap();
    assert!(turtle.starts_with("# Copyright (c) 2026 Example Corp"));
}

const TANK: &str = r#"# Tank monitoring
@prefix : <urn:samm:com.example.tank:1.0.0#> .
@prefix samm: <urn:samm:org.eclipse.esmf.samm:meta-model:2.2.0#> .
@prefix samm-c: <urn:samm:org.eclipse.esmf.samm:characteristic:2.2.0#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

:Tank a samm:Aspect ;
   samm:preferredName "tank"@en ;
   samm:description "Fill level of a tank"@en ;
   samm:see <https://example.org/tank> ;
   samm:properties ( :name :level [ samm:property :light ; samm:optional true ] ) ;
   samm:operations ( :refill ) ;
   samm:events ( :emptied ) .

:name a samm:Property ;
   samm:preferredName "tank name" ;
   samm:characteristic :NameTrait .

:NameTrait a samm-c:Trait ;
   samm-c:baseCharacteristic samm-c:Text ;
   samm-c:constraint ( :NameLength :NameEncoding ) .

:NameLength a samm-c:LengthConstraint ;
   samm-c:minValue "1"^^xsd:nonNegativeInteger ;
   samm-c:maxValue "32"^^xsd:nonNegativeInteger .

:NameEncoding a samm-c:EncodingConstraint ;
   samm:value samm:UTF-8 .

:level a samm:Property ;
   samm:characteristic :LevelTrait ;
   samm:exampleValue "42"^^xsd:int .

:LevelTrait a samm-c:Trait ;
   samm-c:baseCharacteristic :LevelValue ;
   samm-c:constraint ( :LevelRange :LevelPrecision ) .

:LevelValue a samm:Characteristic ;
   samm:dataType xsd:int .

:LevelRange a samm-c:RangeConstraint ;
   samm-c:minValue "0"^^xsd:int ;
   samm-c:maxValue "100"^^xsd:int ;
   samm-c:lowerBoundDefinition samm-c:AT_LEAST ;
   samm-c:upperBoundDefinition samm-c:LESS_THAN .

:LevelPrecision a samm-c:FixedPointConstraint ;
   samm-c:scale "2"^^xsd:nonNegativeInteger ;
   samm-c:integer "3"^^xsd:nonNegativeInteger .

:light a samm:Property ;
   samm:characteristic :LightState ;
   samm:exampleValue :Red .

:LightState a samm-c:State ;
   samm:dataType xsd:string ;
   samm-c:values ( :Green :Yellow :Red ) ;
   samm-c:defaultValue :Green .

:refill a samm:Operation ;
   samm:input ( :level ) ;
   samm:output [ samm:property :refilled ; samm:optional true ] .

:refilled a samm:Property ;
   samm:characteristic samm-c:Boolean .

:emptied a samm:Event ;
   samm:parameters ( :level ) .
"#;

fn tank(local: &str) -> String {
    format!("urn:samm:com.example.tank:1.0.0#{local}")
}

#[test]
fn test_fully_populated_document_round_trips() {
    let (first, second) = assert_round_trip(TANK);
    assert_eq!(first.records.len(), 15);

    let aspect = first.aspect().unwrap();
    assert_eq!(aspect.element.string_list(fields::SEE), &["https://example.org/tank".to_string()]);
    assert_eq!(aspect.element.references(fields::OPERATIONS)[0].value, tank("refill"));
    let prefixes: Vec<&str> = aspect.element.namespaces().unwrap().iter().map(|(p, _)| p).collect();
    assert_eq!(prefixes, vec!["", "samm", "samm-c", "xsd"]);
    assert_eq!(second.aspect().unwrap().element, aspect.element);

    let name = first.record(&tank("name")).unwrap();
    assert_eq!(name.element.lang_strings(fields::PREFERRED_NAME), &[LangString::new("", "tank name")]);

    let length = first.record(&tank("NameLength")).unwrap();
    assert_eq!(length.element.scalar(fields::MAX_VALUE), Some("32"));
    let encoding = first.record(&tank("NameEncoding")).unwrap();
    assert_eq!(encoding.element.scalar(fields::VALUE), Some("UTF-8"));
    let precision = first.record(&tank("LevelPrecision")).unwrap();
    assert_eq!(precision.element.scalar(fields::SCALE), Some("2"));

    let range = first.record(&tank("LevelRange")).unwrap();
    assert_eq!(range.element.scalar(fields::UPPER_BOUND), Some("LESS_THAN"));
    assert_eq!(
        range.element.scalar_value(fields::MAX_VALUE),
        Some(&ScalarValue::typed("100", "http://www.w3.org/2001/XMLSchema#int"))
    );

    let level = first.record(&tank("level")).unwrap();
    assert_eq!(
        level.element.scalar_value(fields::EXAMPLE_VALUE),
        Some(&ScalarValue::typed("42", "http://www.w3.org/2001/XMLSchema#int"))
    );
    let state = first.record(&tank("LightState")).unwrap();
    assert_eq!(
        state.element.scalar_value(fields::DEFAULT_VALUE),
        Some(&ScalarValue::iri(tank("Green")))
    );

    let refill = first.record(&tank("refill")).unwrap();
    assert_eq!(
        refill.element.references(fields::OUTPUT),
        vec![OptionalReference::new(tank("refilled"), true)]
    );
}

#[test]
fn test_export_writes_iris_and_typed_literals() {
    let document = import_document(TANK, &ImportOptions::default()).unwrap();
    let turtle = export_document(&document.environment, &tank("Tank"), &ExportOptions::default()).unwrap();

    assert!(turtle.starts_with("# Tank monitoring\n\n@prefix : <urn:samm:com.example.tank:1.0.0#> .\n@prefix samm: "));
    assert_eq!(turtle.matches("@prefix").count(), 4);
    assert!(!turtle.contains("\"urn:samm:com.example.tank:1.0.0#Green\""));
    assert!(!turtle.contains("\"urn:samm:com.example.tank:1.0.0#Red\""));
    assert!(!turtle.contains("\"42\" ") && !turtle.contains("\"42\" ;") && !turtle.contains("\"42\" ."));
}

#[test]
fn test_export_without_comments() {
    let document = import_movement();
    let options = ExportOptions {
        emit_comments: false,
        ..ExportOptions::default()
    };
    let turtle = export_document(&document.environment, &id("Movement"), &options).unwrap();
    assert!(!turtle.contains("# Copyright"));
}

#[test]
fn test_export_rejects_non_aspect_and_missing_ids() {
    let document = import_movement();
    let options = ExportOptions::default();

    let err = export_document(&document.environment, &id("isMoving"), &options).unwrap_err();
    assert!(matches!(err, SammError::NotAnAspect(_)));

    let err = export_document(&document.environment, &id("Nope"), &options).unwrap_err();
    assert!(matches!(err, SammError::UnknownContainer(_)));
}

#[test]
fn test_import_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MOVEMENT.as_bytes()).unwrap();

    let document = import_file(file.path(), &ImportOptions::default()).unwrap();
    assert_eq!(document.records.len(), 12);
}

#[test]
fn test_import_file_missing_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = import_file(&dir.path().join("absent.ttl"), &ImportOptions::default()).unwrap_err();
    assert!(matches!(err, SammError::Io(_)));
}

#[test]
fn test_syntax_error_is_reported() {
    let err = import_document("@prefix : <urn:x#> .\n:a :b", &ImportOptions::default()).unwrap_err();
    assert!(matches!(err, SammError::Syntax { .. }));
}

#[test]
fn test_transform_movement() {
    let document = import_movement();
    let store = LookupStore::build(&document.environment);
    let template = transform_to_submodel(&store, &id("Movement"), &TransformOptions::default()).unwrap();

    assert_eq!(template.id_short, "Movement");
    assert_eq!(template.elements.len(), 3);

    let moving = &template.elements[0];
    assert_eq!(moving.id_short, "isMoving");
    assert_eq!(
        moving.kind,
        SubmodelElementKind::Property {
            value_type: ValueType::Boolean
        }
    );
    assert_eq!(moving.cardinality(), None);

    let warning = &template.elements[1];
    assert_eq!(warning.cardinality(), Some(Cardinality::ZeroToOne));

    let position = &template.elements[2];
    assert_eq!(position.kind, SubmodelElementKind::SubmodelElementCollection);
    let children: Vec<&str> = position.children.iter().map(|c| c.id_short.as_str()).collect();
    assert_eq!(children, vec!["latitude", "longitude"]);
    assert_eq!(
        position.children[0].kind,
        SubmodelElementKind::Property {
            value_type: ValueType::Decimal
        }
    );
}

#[test]
fn test_transform_required_and_optional_property() {
    let content = r#"
@prefix samm: <urn:samm:org.eclipse.esmf.samm:meta-model:2.1.0#> .
@prefix samm-c: <urn:samm:org.eclipse.esmf.samm:characteristic:2.1.0#> .
@prefix : <urn:samm:com.example:1.0.0#> .

:A a samm:Aspect ;
   samm:properties ( :required [ samm:property :maybe ; samm:optional true ] ) .
:required a samm:Property ; samm:characteristic samm-c:Text .
:maybe a samm:Property ; samm:characteristic samm-c:Text .
"#;
    let document = import_document(content, &ImportOptions::default()).unwrap();
    let store = LookupStore::build(&document.environment);
    let template =
        transform_to_submodel(&store, "urn:samm:com.example:1.0.0#A", &TransformOptions::default()).unwrap();

    let cardinalities: Vec<Option<Cardinality>> =
        template.elements.iter().map(|e| e.cardinality()).collect();
    assert_eq!(cardinalities, vec![None, Some(Cardinality::ZeroToOne)]);
}

#[test]
fn test_lookup_misses() {
    let document = import_movement();
    let store = LookupStore::build(&document.environment);
    assert!(store.lookup(&id("unknown")).is_none());
    assert!(store.lookup_typed(&id("isMoving"), ElementKind::Entity).is_none());
    assert!(store.lookup_typed(&id("isMoving"), ElementKind::Property).is_some());
}

#[rstest]
#[case::empty(vec![])]
#[case::single(vec![("a", false)])]
#[case::mixed(vec![("a", false), ("b", true), ("c", false)])]
#[case::all_optional(vec![("a", true), ("b", true)])]
fn test_reference_list_survives_graph_encoding(#[case] entries: Vec<(&str, bool)>) {
    let ids = IdSet::for_version(SammVersion::Samm2_1_0);
    let namespaces = NamespaceMap::default();
    let content_predicate: NamedNode = ids.node("samm:property");
    let references: Vec<OptionalReference> = entries
        .iter()
        .map(|(local, optional)| OptionalReference::new(format!("urn:samm:com.example:1.0.0#{local}"), *optional))
        .collect();

    let mut graph = Graph::default();
    let head: Term = encode_collection(&mut graph, &ids, &references, |g, r| {
        encode_optional_reference(g, &ids, &namespaces, r, &content_predicate)
    });

    let decoded =
        decode_reference_or_collection(&graph, &ids, &head, Some(&content_predicate), &mut NoInline);
    assert_eq!(decoded, references);
}

#[rstest]
#[case::bamm(SammVersion::Bamm1_0_0, "urn:bamm:io.openmanufacturing:meta-model:1.0.0#")]
#[case::samm_2_0(SammVersion::Samm2_0_0, "urn:samm:org.eclipse.esmf.samm:meta-model:2.0.0#")]
#[case::samm_2_3(SammVersion::Samm2_3_0, "urn:samm:org.eclipse.esmf.samm:meta-model:2.3.0#")]
fn test_version_detected_from_prefix(#[case] version: SammVersion, #[case] meta_model: &str) {
    let content = format!(
        "@prefix samm: <{meta_model}> .\n@prefix : <urn:x:com.example:1.0.0#> .\n:p a samm:Property .\n"
    );
    let document = import_document(&content, &ImportOptions::default()).unwrap();
    assert_eq!(document.id_set.version, version);
    assert_eq!(
        document.record("urn:x:com.example:1.0.0#p").map(|r| r.kind()),
        Some(ElementKind::Property)
    );
}
