//! Flattening `allOf` compositions of loaded documents
//!
//! A merged schema must accept and reject the same values as the composition
//! it was built from.

use oasis_schema::merge::{merge, MergeError};
use oasis_schema::validation::{Engine, ValidationSettings};
use oasis_schema::{Document, Loader};
use serde_json::{json, Value};

const PETS: &str = r##"
openapi: 3.1.0
info: {title: Pets, version: "1.0"}
paths: {}
components:
  schemas:
    NewPet:
      type: object
      required: [name]
      properties:
        name: {type: string, maxLength: 10}
        tag: {type: [string, "null"]}
    Pet:
      description: A stored pet
      allOf:
        - $ref: "#/components/schemas/NewPet"
        - required: [id]
          properties:
            id: {type: integer, minimum: 1}
            name: {minLength: 1}
    Dog:
      allOf:
        - $ref: "#/components/schemas/Pet"
        - type: object
          properties:
            barks: {type: boolean}
          additionalProperties: false
    Broken:
      allOf:
        - {type: string}
        - {type: integer}
"##;

fn load() -> Document {
    Loader::new().load_from_data(PETS.as_bytes()).expect("document should load")
}

fn outcomes(document: &Document, name: &str, values: &[Value]) -> (Vec<bool>, Vec<bool>) {
    let composed = document.schema(name).unwrap();
    let merged = merge(composed).unwrap();
    let settings = ValidationSettings::new().with_engine(Engine::BuiltIn);
    let before = values.iter().map(|v| composed.validate_value(v, &settings).is_ok()).collect();
    let after = values.iter().map(|v| merged.validate_value(v, &settings).is_ok()).collect();
    (before, after)
}

#[cfg(test)]
mod flattening {
    use super::*;

    #[test]
    fn test_merged_pet_has_every_constraint() {
        let document = load();
        let pet = merge(document.schema("Pet").unwrap()).unwrap();

        assert!(pet.all_of.is_empty());
        assert_eq!(pet.description.as_deref(), Some("A stored pet"));
        assert_eq!(pet.required, vec!["name", "id"]);
        assert_eq!(pet.properties.keys().collect::<Vec<_>>(), ["id", "name", "tag"]);

        let name = pet.properties["name"].value().unwrap();
        assert_eq!(name.min_length, 1);
        assert_eq!(name.max_length, Some(10));
    }

    #[test]
    fn test_merged_pet_accepts_the_same_values() {
        let document = load();
        let values = [
            json!({"id": 1, "name": "Rex"}),
            json!({"id": 1, "name": "Rex", "tag": null}),
            json!({"id": 0, "name": "Rex"}),
            json!({"id": 1, "name": ""}),
            json!({"id": 1, "name": "Maximilian the third"}),
            json!({"name": "Rex"}),
            json!("Rex"),
        ];
        let (before, after) = outcomes(&document, "Pet", &values);
        assert_eq!(before, [true, true, false, false, false, false, false]);
        assert_eq!(before, after);
    }

    #[test]
    fn test_closed_part_prunes_properties() {
        let document = load();
        let dog = merge(document.schema("Dog").unwrap()).unwrap();
        assert_eq!(dog.properties.keys().collect::<Vec<_>>(), ["barks"]);
        assert!(dog.disallows_additional_properties());

        // Required properties the closed part does not declare make the merge unsatisfiable
        let settings = ValidationSettings::default();
        assert!(dog.validate_value(&json!({"barks": true}), &settings).is_err());
        assert!(document
            .schema("Dog")
            .unwrap()
            .validate_value(&json!({"id": 1, "name": "Rex", "barks": true}), &settings)
            .is_err());
    }

    #[test]
    fn test_conflicting_types() {
        let document = load();
        let err = merge(document.schema("Broken").unwrap()).unwrap_err();
        assert!(matches!(err, MergeError::Conflict { keyword: "type", .. }), "{}", err);
    }
}
