use mdjschema::ast::{Cardinality, TableId};
use mdjschema::config::{OneToOne, Options};
use mdjschema::diagnostics::Diagnostic;
use mdjschema::resolve::{FirstEnd, Side};
use mdjschema::{Resolution, mdj_to_schema, reconcile, resolve_str, resolve_value};
use serde_json::{Value, json};

fn entity(id: &str, name: &str, columns: Value, relationships: Value) -> Value {
    json!({
        "_type": "ERDEntity",
        "_id": id,
        "name": name,
        "columns": columns,
        "ownedElements": relationships,
    })
}

fn relationship(id: &str, name: &str, end1: (&str, Option<&str>), end2: (&str, Option<&str>)) -> Value {
    let end = |(reference, cardinality): (&str, Option<&str>)| {
        let mut end = json!({ "_type": "ERDRelationshipEnd", "reference": { "$ref": reference } });
        if let Some(c) = cardinality {
            end["cardinality"] = json!(c);
        }
        end
    };
    json!({
        "_type": "ERDRelationship",
        "_id": id,
        "name": name,
        "end1": end(end1),
        "end2": end(end2),
    })
}

fn project(entities: Vec<Value>) -> Value {
    json!({
        "_type": "Project",
        "_id": "project",
        "name": "Untitled",
        "ownedElements": [{
            "_type": "ERDDataModel",
            "_id": "model",
            "name": "Data Model1",
            "ownedElements": entities,
        }]
    })
}

fn resolve(root: &Value) -> Resolution {
    let options = Options::default();
    let mut policy = options.one_to_one.policy();
    resolve_value(root, &options, policy.as_mut()).unwrap()
}

#[test]
fn test_invoice_belongs_to_customer() {
    let root = project(vec![
        entity(
            "inv",
            "billing.Invoice",
            json!([{ "name": "amount", "type": "DECIMAL" }]),
            json!([relationship("r", "customer", ("inv", Some("0..*")), ("cus", Some("1")))]),
        ),
        entity("cus", "billing.Customer", json!([]), json!([])),
    ]);

    let resolution = resolve(&root);
    assert!(resolution.diagnostics.is_empty());

    let billing = resolution.schema.namespace("billing").unwrap();
    let invoice = billing.table("Invoice").unwrap();
    let customer = invoice.relationship("customer").unwrap();
    assert_eq!(customer.target, TableId::new("billing", "Customer"));
    assert_eq!(customer.cardinality, Cardinality::Many);
    assert!(invoice.column("amount").is_some());
    assert!(billing.table("Customer").unwrap().relationships.is_empty());
    assert_eq!(billing.order, vec!["Customer", "Invoice"]);
}

#[test]
fn test_employee_owns_badge_and_loses_column() {
    let root = project(vec![
        entity(
            "emp",
            "hr.Employee",
            json!([
                { "name": "name", "type": "VARCHAR", "length": 80 },
                { "name": "badge", "type": "INTEGER" }
            ]),
            json!([]),
        ),
        entity(
            "bdg",
            "hr.Badge",
            json!([{ "name": "code", "type": "CHAR", "length": 8 }]),
            json!([relationship("r", "badge", ("bdg", Some("1")), ("emp", Some("1")))]),
        ),
    ]);

    let resolution = resolve(&root);
    assert!(resolution.diagnostics.is_empty());

    let hr = resolution.schema.namespace("hr").unwrap();
    let employee = hr.table("Employee").unwrap();
    let badge = employee.relationship("badge").unwrap();
    assert_eq!(badge.target, TableId::new("hr", "Badge"));
    assert!(employee.column("badge").is_none());
    assert!(employee.column("name").is_some());
    assert!(hr.table("Badge").unwrap().relationships.is_empty());
    assert_eq!(hr.order, vec!["Badge", "Employee"]);
}

#[test]
fn test_many_to_many_is_left_out() {
    let root = project(vec![
        entity(
            "s",
            "school.Student",
            json!([]),
            json!([relationship("r", "courses", ("s", Some("0..*")), ("c", Some("0..*")))]),
        ),
        entity("c", "school.Course", json!([]), json!([])),
    ]);

    let resolution = resolve(&root);
    assert!(resolution.schema.tables().all(|t| t.relationships.is_empty()));
    assert!(matches!(
        &resolution.diagnostics[..],
        [Diagnostic::ManyToMany { relationship, .. }] if relationship == "courses"
    ));
}

#[test]
fn test_staruml_sample_with_default_namespace() {
    // Shape of a real StarUML export: plain entity names, the foreign key
    // listed as a column on the many side, diagram views alongside.
    let source = r#"{"_type":"Project","_id":"P","name":"Untitled","ownedElements":[{"_type":"ERDDataModel","_id":"M","_parent":{"$ref":"P"},"name":"Data Model1","ownedElements":[{"_type":"ERDDiagram","_id":"D","_parent":{"$ref":"M"},"name":"ERDDiagram1","ownedViews":[]},{"_type":"ERDEntity","_id":"E1","_parent":{"$ref":"M"},"name":"Entity1","ownedElements":[{"_type":"ERDRelationship","_id":"R","_parent":{"$ref":"E1"},"name":"Entity1_id","end1":{"_type":"ERDRelationshipEnd","_id":"R1","_parent":{"$ref":"R"},"reference":{"$ref":"E1"}},"end2":{"_type":"ERDRelationshipEnd","_id":"R2","_parent":{"$ref":"R"},"reference":{"$ref":"E2"},"cardinality":"0..*"}}],"columns":[{"_type":"ERDColumn","_id":"C1","_parent":{"$ref":"E1"},"name":"Entity1_id","type":"INTEGER","length":0,"primaryKey":true},{"_type":"ERDColumn","_id":"C2","_parent":{"$ref":"E1"},"name":"Column1","type":"TEXT"}]},{"_type":"ERDEntity","_id":"E2","_parent":{"$ref":"M"},"name":"Entity2","columns":[{"_type":"ERDColumn","_id":"C3","_parent":{"$ref":"E2"},"name":"Entity2_id","type":"INTEGER","length":0,"primaryKey":true},{"_type":"ERDColumn","_id":"C4","_parent":{"$ref":"E2"},"name":"Column1","type":"TEXT"},{"_type":"ERDColumn","_id":"C5","_parent":{"$ref":"E2"},"name":"Entity1_id","type":"INTEGER","length":0,"foreignKey":true}]}]}]}"#;

    let options = Options {
        default_namespace: Some("app".to_string()),
        ..Options::default()
    };
    let resolution = resolve_str(source, &options).unwrap();
    assert!(resolution.diagnostics.is_empty());

    let app = resolution.schema.namespace("app").unwrap();
    let entity1 = app.table("Entity1").unwrap();
    let entity2 = app.table("Entity2").unwrap();

    // Entity1 keeps its own primary key column of the same name.
    assert!(entity1.column("Entity1_id").unwrap().is_primary_key);
    assert!(entity1.relationships.is_empty());

    let placed = entity2.relationship("Entity1_id").unwrap();
    assert_eq!(placed.target, TableId::new("app", "Entity1"));
    assert_eq!(placed.cardinality, Cardinality::Many);
    assert!(entity2.column("Entity1_id").is_none());
    assert_eq!(entity2.column("Column1").unwrap().length, Some(255));
    assert_eq!(app.order, vec!["Entity1", "Entity2"]);

    // Without a default namespace both entities are skipped, leaving the
    // relationship dangling.
    let strict = resolve_str(source, &Options::default()).unwrap();
    assert!(strict.schema.namespaces.is_empty());
    assert_eq!(strict.diagnostics.len(), 3);
}

#[test]
fn test_cross_namespace_references_and_ordering() {
    let root = project(vec![
        entity(
            "item",
            "orders.order_item",
            json!([{ "name": "quantity", "type": "INTEGER" }]),
            json!([
                relationship("r1", "order_id", ("item", Some("0..*")), ("order", None)),
                relationship("r2", "part_id", ("item", Some("0..*")), ("part", None))
            ]),
        ),
        entity("order", "orders.order", json!([]), json!([])),
        entity("part", "inventory.part", json!([]), json!([])),
    ]);

    let resolution = resolve(&root);
    assert!(resolution.diagnostics.is_empty());

    let orders = resolution.schema.namespace("orders").unwrap();
    assert_eq!(orders.order, vec!["order", "order_item"]);
    assert_eq!(
        orders.table("order_item").unwrap().references,
        vec![TableId::new("inventory", "part")]
    );
}

#[test]
fn test_cycle_is_diagnosed_not_fatal() {
    let root = project(vec![
        entity(
            "a",
            "x.A",
            json!([]),
            json!([relationship("r1", "b", ("a", Some("0..*")), ("b", None))]),
        ),
        entity(
            "b",
            "x.B",
            json!([]),
            json!([relationship("r2", "a", ("b", Some("0..*")), ("a", None))]),
        ),
        entity("c", "x.C", json!([]), json!([relationship("r3", "a", ("c", Some("0..*")), ("a", None))])),
    ]);

    let resolution = resolve(&root);
    let x = resolution.schema.namespace("x").unwrap();
    assert_eq!(x.order, vec!["A", "B", "C"]);
    assert!(matches!(
        &resolution.diagnostics[..],
        [Diagnostic::DependencyCycle { tables, .. }] if tables.len() == 2
    ));
}

#[test]
fn test_injected_policy_decides_one_to_one() {
    let root = project(vec![
        entity(
            "u",
            "auth.User",
            json!([]),
            json!([relationship("r", "profile", ("u", None), ("p", Some("0..1")))]),
        ),
        entity("p", "auth.Profile", json!([]), json!([])),
    ]);
    let options = Options::default();

    let mut first = FirstEnd;
    let resolution = resolve_value(&root, &options, &mut first).unwrap();
    let auth = resolution.schema.namespace("auth").unwrap();
    assert!(auth.table("User").unwrap().relationship("profile").is_some());
    assert!(matches!(
        &resolution.diagnostics[..],
        [Diagnostic::AmbiguousOneToOne { .. }]
    ));

    let mut second = |_: &TableId, _: &TableId, _: &str| Some(Side::Second);
    let resolution = resolve_value(&root, &options, &mut second).unwrap();
    let profile = resolution.schema.namespace("auth").unwrap().table("Profile").unwrap();
    assert_eq!(profile.relationship("profile").unwrap().cardinality, Cardinality::ZeroOrOne);

    let reject = Options {
        one_to_one: OneToOne::Reject,
        ..Options::default()
    };
    let resolution = resolve_str(&root.to_string(), &reject).unwrap();
    assert!(resolution.schema.tables().all(|t| t.relationships.is_empty()));
}

#[test]
fn test_every_relationship_owned_once_and_reconcile_idempotent() {
    let root = project(vec![
        entity(
            "a",
            "x.A",
            json!([{ "name": "b", "type": "INTEGER" }, { "name": "c", "type": "INTEGER" }]),
            json!([
                relationship("r1", "b", ("a", None), ("b", None)),
                relationship("r2", "c", ("a", Some("1..*")), ("c", None))
            ]),
        ),
        entity("b", "x.B", json!([{ "name": "b", "type": "INTEGER" }]), json!([])),
        entity("c", "x.C", json!([]), json!([])),
    ]);

    let resolution = resolve(&root);
    for name in ["b", "c"] {
        let owners = resolution
            .schema
            .tables()
            .filter(|t| t.relationship(name).is_some())
            .count();
        assert_eq!(owners, 1, "{name}");
    }

    let tables = resolution.schema.tables().cloned().collect();
    let once = reconcile::reconcile(mdjschema::ir::ResolvedSchema { tables });
    let twice = reconcile::reconcile(once.clone());
    assert_eq!(once, twice);
}

#[test]
fn test_fatal_inputs() {
    assert!(matches!(
        resolve_str("not json", &Options::default()),
        Err(mdjschema::Error::Json(_))
    ));
    assert!(matches!(
        resolve_str("[]", &Options::default()),
        Err(mdjschema::Error::Extract(_))
    ));
    let bad = Options {
        separator: String::new(),
        ..Options::default()
    };
    assert!(matches!(resolve_str("{}", &bad), Err(mdjschema::Error::Config(_))));
}

#[test]
fn test_wasm_entry_point_returns_export_json() {
    let root = project(vec![
        entity(
            "inv",
            "billing.Invoice",
            json!([{ "name": "amount", "type": "DECIMAL" }]),
            json!([relationship("r", "customer", ("inv", Some("0..*")), ("cus", None))]),
        ),
        entity("cus", "billing.Customer", json!([]), json!([])),
    ]);

    let output = mdj_to_schema(&root.to_string(), None).unwrap();
    let value: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(
        value["schema"]["billing"]["Invoice"]["relationships"],
        json!([{ "customer": ["billing", "Customer", "0..*"] }])
    );
    assert_eq!(value["order"]["billing"], json!(["Customer", "Invoice"]));

    let err = mdj_to_schema("{}", Some(r#"{ "separator": "" }"#.to_string())).unwrap_err();
    assert!(err.contains("separator"));
}
