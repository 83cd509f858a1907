use super::*;
use serde_json::json;
use std::sync::Mutex;

const SDL: &str = r#"
interface Named { name: String! }
type Pet implements Named { name: String!, legs: Int }
type Person implements Named { name: String!, nickname: String, pets: [Pet!]!, best: Pet! }
union Thing = Pet | Person
type Query {
  people: [Person!]!
  person(name: String!, loud: Boolean = false): Person
  things: [Thing]
  count: Int
  strict: String!
}
type Mutation { bump(by: Int = 1): Int! }
"#;

/// Serves a fixed people list and records mutation order.
struct Fixture {
    calls: Mutex<Vec<String>>,
}

impl Fixture {
    fn new() -> Self {
        Self { calls: Mutex::new(Vec::new()) }
    }
}

fn people() -> Value {
    json!([
        { "name": "Ada", "nickname": null, "pets": [{ "name": "Rex", "legs": 4 }], "best": { "name": "Rex", "legs": 4 } },
        { "name": "Grace", "nickname": "Amazing", "pets": [], "best": null }
    ])
}

impl Resolver for Fixture {
    fn resolve(
        &self,
        info: &ResolveInfo<'_>,
        _parent: &Value,
        args: &Map<String, Value>,
    ) -> Result<Option<Value>, String> {
        match (info.parent_type, info.field_name) {
            ("Query", "people") => Ok(Some(people())),
            ("Query", "person") => {
                let name = args.get("name").and_then(Value::as_str).unwrap_or_default();
                let loud = args.get("loud").and_then(Value::as_bool).unwrap_or_default();
                let found = people()
                    .as_array()
                    .unwrap()
                    .iter()
                    .find(|p| p["name"] == name)
                    .cloned();
                match found {
                    Some(mut p) if loud => {
                        p["name"] = json!(name.to_uppercase());
                        Ok(Some(p))
                    }
                    Some(p) => Ok(Some(p)),
                    None => Err(format!("No person named {name}")),
                }
            }
            ("Query", "things") => Ok(Some(json!([
                { "__typename": "Pet", "name": "Rex", "legs": 4 },
                { "__typename": "Person", "name": "Ada", "pets": [], "best": { "name": "Rex" } },
                null
            ]))),
            ("Query", "count") => Ok(Some(json!(3.0))),
            ("Query", "strict") => Ok(Some(Value::Null)),
            ("Mutation", "bump") => {
                let by = args.get("by").and_then(Value::as_i64).unwrap_or_default();
                let mut calls = self.calls.lock().unwrap();
                calls.push(format!("bump:{by}"));
                Ok(Some(json!(calls.len() as i64 * by)))
            }
            _ => Ok(None),
        }
    }
}

fn run_with(resolver: &dyn Resolver, query: &str) -> Response {
    let schema = nlgql_schema::parse_sdl(SDL, "engine.graphql").unwrap();
    let doc = nlgql_schema::validated_document(&schema, query)
        .unwrap_or_else(|outcome| panic!("invalid test query: {:?}", outcome.errors));
    execute(&schema, &doc, resolver)
}

fn run(query: &str) -> Response {
    run_with(&Fixture::new(), query)
}

#[test]
fn simple_fields_and_property_fallback() {
    let res = run("{ people { name nickname pets { name legs } } }");
    assert!(res.errors.is_empty(), "{:?}", res.errors);
    assert_eq!(
        res.data.unwrap(),
        json!({ "people": [
            { "name": "Ada", "nickname": null, "pets": [{ "name": "Rex", "legs": 4 }] },
            { "name": "Grace", "nickname": "Amazing", "pets": [] }
        ]})
    );
}

#[test]
fn aliases_and_typename() {
    let res = run(r#"{ first: person(name: "Ada") { __typename who: name } count }"#);
    assert_eq!(
        res.data.unwrap(),
        json!({ "first": { "__typename": "Person", "who": "Ada" }, "count": 3 })
    );
}

#[test]
fn response_keys_keep_selection_order() {
    let res = run(r#"{ count people { name } first: person(name: "Ada") { name } }"#);
    let data = res.data.unwrap();
    let keys: Vec<&String> = data.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["count", "people", "first"]);
}

#[test]
fn default_argument_values_apply() {
    let res = run(r#"{ a: person(name: "Ada") { name } b: person(name: "Ada", loud: true) { name } }"#);
    assert_eq!(
        res.data.unwrap(),
        json!({ "a": { "name": "Ada" }, "b": { "name": "ADA" } })
    );
}

#[test]
fn resolver_error_nulls_nullable_field() {
    let res = run(r#"{ person(name: "Nobody") { name } count }"#);
    assert_eq!(res.data.unwrap(), json!({ "person": null, "count": 3 }));
    assert_eq!(res.errors.len(), 1);
    assert_eq!(res.errors[0].message, "No person named Nobody");
    assert_eq!(res.errors[0].path, vec![json!("person")]);
}

#[test]
fn null_in_non_null_position_propagates() {
    // Grace.best is null but declared Pet!, so the Person item fails,
    // and the list items are non-null, so `people` fails, and it is non-null too.
    let res = run("{ people { best { name } } }");
    assert_eq!(res.data, Some(Value::Null));
    assert_eq!(res.errors.len(), 1);
    assert_eq!(
        res.errors[0].message,
        "Cannot return null for non-nullable field Person.best."
    );
    assert_eq!(res.errors[0].path, vec![json!("people"), json!(1), json!("best")]);
}

#[test]
fn non_null_root_field_nulls_data() {
    let res = run("{ strict }");
    assert_eq!(res.data, Some(Value::Null));
    assert_eq!(
        res.errors[0].message,
        "Cannot return null for non-nullable field Query.strict."
    );
}

#[test]
fn fragments_and_abstract_types() {
    let res = run(
        "{ things { __typename ...PetBits ... on Person { name } ... on Named { shout: name } } }
         fragment PetBits on Pet { legs }",
    );
    assert!(res.errors.is_empty(), "{:?}", res.errors);
    assert_eq!(
        res.data.unwrap(),
        json!({ "things": [
            { "__typename": "Pet", "legs": 4, "shout": "Rex" },
            { "__typename": "Person", "name": "Ada", "shout": "Ada" },
            null
        ]})
    );
}

#[test]
fn skip_and_include_literals() {
    let res = run(
        r#"{ count @skip(if: true) people @include(if: false) { name } p: person(name: "Ada") @include(if: true) { name } }"#,
    );
    assert_eq!(res.data.unwrap(), json!({ "p": { "name": "Ada" } }));
}

#[test]
fn mutations_run_in_order() {
    let fixture = Fixture::new();
    let res = run_with(&fixture, "mutation { a: bump b: bump(by: 10) c: bump }");
    assert_eq!(res.data.unwrap(), json!({ "a": 1, "b": 20, "c": 3 }));
    assert_eq!(
        *fixture.calls.lock().unwrap(),
        vec!["bump:1", "bump:10", "bump:1"]
    );
}

#[test]
fn variables_are_rejected() {
    let res = run("query Q($n: String!) { person(name: $n) { name } }");
    assert!(res.data.is_none());
    assert_eq!(
        res.errors[0].message,
        "Variables are not supported by the local executor."
    );
}

#[test]
fn introspection_fields_are_rejected() {
    let res = run("{ __schema { queryType { name } } count }");
    assert_eq!(res.errors.len(), 1);
    assert!(res.errors[0].message.contains("__schema"));
    assert_eq!(res.data.unwrap()["count"], json!(3));
}

#[test]
fn property_resolver_reads_nothing_at_the_root() {
    let res = run_with(&PropertyResolver, "{ count things { __typename } }");
    assert_eq!(res.data.unwrap(), json!({ "count": null, "things": null }));
    assert!(res.errors.is_empty());
}

#[test]
fn literal_conversion() {
    let doc = nlgql_schema::apollo_compiler::ast::Document::parse(
        r#"{ f(a: 1, b: 2.5, c: "s", d: ENUM, e: [1, null], g: { h: true }) }"#,
        "lit.graphql",
    )
    .unwrap();
    let nlgql_schema::apollo_compiler::ast::Definition::OperationDefinition(op) = &doc.definitions[0] else {
        panic!("expected an operation");
    };
    let nlgql_schema::apollo_compiler::ast::Selection::Field(field) = &op.selection_set[0] else {
        panic!("expected a field");
    };
    let values: Vec<Value> = field.arguments.iter().map(|a| literal_to_json(&a.value)).collect();
    assert_eq!(
        values,
        vec![
            json!(1),
            json!(2.5),
            json!("s"),
            json!("ENUM"),
            json!([1, null]),
            json!({ "h": true })
        ]
    );
}
