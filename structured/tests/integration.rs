use rig_guard_structured::{extract, SchemaDescriptor, Shape, StructuredSchema};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
struct CityFacts {
    city: String,
    state: String,
    year_founded: i32,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Fact {
    fact: String,
    source: String,
}

#[test]
fn test_derived_object_schema() {
    let schema = SchemaDescriptor::for_type::<CityFacts>().unwrap();

    assert_eq!(schema.kind(), Shape::Object);
    assert!(schema.to_string().contains(r#""type":"object""#));

    let portable = schema.to_portable_schema();
    assert!(portable["properties"].get("city").is_some());
}

#[test]
fn test_derived_array_schema() {
    let schema = SchemaDescriptor::for_type::<Vec<Fact>>().unwrap();
    assert_eq!(schema.kind(), Shape::Array);
}

#[test]
fn test_extract_then_validate() {
    let schema = SchemaDescriptor::for_type::<CityFacts>().unwrap();
    let answer = r#"Here is the data you asked for:
{"city": "Indianapolis", "state": "Indiana", "year_founded": 1821}
Hope this helps!"#;

    let value = extract(answer, schema.kind()).unwrap();
    assert!(schema.validate(&value).valid);

    let typed: CityFacts = serde_json::from_value(value).unwrap();
    assert_eq!(typed.city, "Indianapolis");
    assert_eq!(typed.year_founded, 1821);
}

#[test]
fn test_extract_parseable_but_non_conforming() {
    let schema = SchemaDescriptor::for_type::<CityFacts>().unwrap();
    let answer = r#"{"city": "Indianapolis"}"#;

    let value = extract(answer, schema.kind()).unwrap();
    let outcome = schema.validate(&value);

    assert!(!outcome.valid);
    let errors = outcome.errors.unwrap();
    assert!(errors.contains("state"));
    assert!(errors.contains("year_founded"));
}

#[test]
fn test_extract_array_for_array_schema() {
    let schema = SchemaDescriptor::for_type::<Vec<Fact>>().unwrap();
    let answer = r#"Facts: [{"fact": "Hosts the Indy 500", "source": "wiki"}] - end"#;

    let value = extract(answer, schema.kind()).unwrap();
    assert_eq!(value, json!([{"fact": "Hosts the Indy 500", "source": "wiki"}]));
    assert!(schema.validate(&value).valid);
}
