//! End-to-end compilation of the fixture documents under `tests/fixtures/`.

use std::path::Path;

use zdl_core::{compile, compile_zdl, compile_zfl, BuildOptions, Error, Language, Model, Value};

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

fn compile_fixture(name: &str) -> Model {
    let language = Language::from_path(Path::new(name)).unwrap();
    compile(language, &fixture(name), name, &BuildOptions::default())
        .unwrap_or_else(|e| panic!("{name}: {e}"))
}

fn at<'a>(model: &'a Model, path: &str) -> &'a Value {
    model
        .document
        .lookup(path)
        .unwrap_or_else(|| panic!("missing {path}"))
}

fn strings(model: &Model, path: &str) -> Vec<String> {
    at(model, path).string_items()
}

fn text<'a>(model: &'a Model, path: &str) -> &'a str {
    at(model, path)
        .as_str()
        .unwrap_or_else(|| panic!("{path} is not a string"))
}

// ──────────────────────────────────────────────
// Flow language
// ──────────────────────────────────────────────

#[test]
fn subscriptions_imports() {
    let model = compile_fixture("subscriptions.zfl");
    assert!(model.diagnostics.is_empty(), "{:?}", model.diagnostics);
    assert_eq!(at(&model, "imports").len(), 2);
    assert_eq!(text(&model, "imports.0.key"), "subscriptions");
    assert_eq!(
        text(&model, "imports.0.value"),
        "http://localhost:8080/subscription/model.zdl"
    );
    assert_eq!(text(&model, "imports.1.key"), "payments");
    assert_eq!(text(&model, "imports.1.value"), "com.example.domain:payments:RELEASE");
}

#[test]
fn subscriptions_flow_and_systems() {
    let model = compile_fixture("subscriptions.zfl");
    assert_eq!(at(&model, "flows").len(), 1);
    assert_eq!(text(&model, "flows.PaymentsFlow.name"), "PaymentsFlow");
    assert_eq!(text(&model, "flows.PaymentsFlow.className"), "PaymentsFlow");
    assert_eq!(
        text(&model, "flows.PaymentsFlow.javadoc"),
        "Subscription renewal and payment collection."
    );

    assert_eq!(at(&model, "flows.PaymentsFlow.systems").len(), 3);
    let subscription = "flows.PaymentsFlow.systems.Subscription";
    assert_eq!(text(&model, &format!("{subscription}.zdl")), "subscription/model.zdl");
    assert_eq!(at(&model, &format!("{subscription}.services")).len(), 1);
    assert_eq!(
        strings(&model, &format!("{subscription}.services.SubscriptionService.commands")),
        vec!["renewSubscription", "suspendSubscription", "cancelRenewal"]
    );
    assert_eq!(
        strings(&model, &format!("{subscription}.events")),
        vec!["SubscriptionRenewed", "SubscriptionSuspended", "RenewalCancelled"]
    );

    assert_eq!(text(&model, "flows.PaymentsFlow.systems.Payments.name"), "Payments");
    assert!(model
        .document
        .lookup("flows.PaymentsFlow.systems.Payments.zdl")
        .is_none());
    assert_eq!(
        strings(
            &model,
            "flows.PaymentsFlow.systems.Billing.services.DefaultService.commands"
        ),
        vec!["recordPayment"]
    );
}

#[test]
fn subscriptions_starts() {
    let model = compile_fixture("subscriptions.zfl");
    assert_eq!(at(&model, "flows.PaymentsFlow.starts").len(), 3);

    let renewal = "flows.PaymentsFlow.starts.CustomerRequestsSubscriptionRenewal";
    assert_eq!(text(&model, &format!("{renewal}.options.actor")), "Customer");
    assert_eq!(at(&model, &format!("{renewal}.fields")).len(), 3);
    for field in ["subscriptionId", "customerId", "paymentMethodId"] {
        assert_eq!(text(&model, &format!("{renewal}.fields.{field}.type")), "String");
    }

    assert_eq!(
        text(&model, "flows.PaymentsFlow.starts.BillingCycleEnded.options.time"),
        "end of month"
    );
    assert_eq!(at(&model, "flows.PaymentsFlow.starts.BillingCycleEnded.fields").len(), 1);
    assert_eq!(
        text(&model, "flows.PaymentsFlow.starts.PaymentTimeout.options.time"),
        "5 minutes after SubscriptionRenewed and not PaymentSucceeded or PaymentFailed"
    );
    assert!(at(&model, "flows.PaymentsFlow.starts.PaymentTimeout.fields").is_empty());
}

#[test]
fn subscriptions_whens() {
    let model = compile_fixture("subscriptions.zfl");
    assert_eq!(at(&model, "flows.PaymentsFlow.whens").len(), 5);
    let when = |i: usize, key: &str| strings(&model, &format!("flows.PaymentsFlow.whens.{i}.{key}"));

    assert_eq!(when(0, "triggers"), vec!["CustomerRequestsSubscriptionRenewal"]);
    assert_eq!(when(0, "commands"), vec!["renewSubscription"]);
    assert_eq!(when(0, "events"), vec!["SubscriptionRenewed"]);

    assert_eq!(when(1, "triggers"), vec!["SubscriptionRenewed"]);
    assert_eq!(when(1, "commands"), vec!["chargePayment"]);
    assert_eq!(when(1, "events"), vec!["PaymentSucceeded", "PaymentFailed"]);

    assert_eq!(when(2, "triggers"), vec!["PaymentFailed"]);
    assert!(when(2, "commands").is_empty());
    assert_eq!(at(&model, "flows.PaymentsFlow.whens.2.ifs").len(), 1);
    let branch = "flows.PaymentsFlow.whens.2.ifs.0";
    assert_eq!(text(&model, &format!("{branch}.condition")), "less than 3 attempts");
    assert_eq!(strings(&model, &format!("{branch}.commands")), vec!["retryPayment"]);
    assert_eq!(strings(&model, &format!("{branch}.events")), vec!["PaymentRetryScheduled"]);
    assert_eq!(
        strings(&model, &format!("{branch}.else.policies")),
        vec!["Suspend after 3 failed attempts"]
    );
    assert_eq!(strings(&model, &format!("{branch}.else.commands")), vec!["suspendSubscription"]);
    assert_eq!(strings(&model, &format!("{branch}.else.events")), vec!["SubscriptionSuspended"]);

    assert_eq!(when(3, "triggers"), vec!["PaymentSucceeded", "BillingCycleEnded"]);
    assert_eq!(when(3, "commands"), vec!["recordPayment"]);
    assert_eq!(when(3, "events"), vec!["PaymentRecorded"]);

    assert_eq!(when(4, "triggers"), vec!["PaymentTimeout"]);
    assert_eq!(when(4, "commands"), vec!["cancelRenewal"]);
    assert_eq!(when(4, "events"), vec!["RenewalCancelled"]);
}

#[test]
fn subscriptions_end_outcomes() {
    let model = compile_fixture("subscriptions.zfl");
    let outcomes = at(&model, "flows.PaymentsFlow.end.outcomes");
    assert_eq!(outcomes.len(), 3);
    assert_eq!(strings(&model, "flows.PaymentsFlow.end.outcomes.completed"), vec!["PaymentRecorded"]);
    assert_eq!(
        strings(&model, "flows.PaymentsFlow.end.outcomes.suspended"),
        vec!["SubscriptionSuspended"]
    );
    assert_eq!(strings(&model, "flows.PaymentsFlow.end.outcomes.cancelled"), vec!["RenewalCancelled"]);
}

#[test]
fn subscriptions_locations() {
    let model = compile_fixture("subscriptions.zfl");
    let flow = model.locations["flows.PaymentsFlow"];
    let name = model.locations["flows.PaymentsFlow.name"];
    assert_eq!(name.line, 7);
    assert!(flow.start <= name.start && name.end <= flow.end);
    assert!(model.locations.contains_key("flows.PaymentsFlow.systems.Billing"));
    assert!(model
        .locations
        .contains_key("flows.PaymentsFlow.starts.PaymentTimeout"));
}

// ──────────────────────────────────────────────
// Entity language
// ──────────────────────────────────────────────

#[test]
fn nested_fields_register_embedded_entities() {
    let model = compile_fixture("nested-fields.zdl");
    assert!(model.diagnostics.is_empty(), "{:?}", model.diagnostics);

    let names: Vec<_> = at(&model, "entities")
        .as_mapping()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(names, vec!["Customer", "Address", "GeoPoint", "Order"]);

    assert_eq!(at(&model, "entities.Address.options.embedded"), &Value::Boolean(true));
    assert_eq!(at(&model, "entities.GeoPoint.options.embedded"), &Value::Boolean(true));
    assert_eq!(text(&model, "entities.GeoPoint.tableName"), "geo_points");
    assert!(model.document.lookup("entities.Customer.options.embedded").is_none());

    // The owning field stays on the parent; the embedded entity's fields do not.
    assert_eq!(text(&model, "entities.Customer.fields.addresses.type"), "Address");
    assert_eq!(at(&model, "entities.Customer.fields.addresses.isArray"), &Value::Boolean(true));
    assert_eq!(at(&model, "entities.Customer.fields").len(), 4);
    assert_eq!(at(&model, "entities.Address.fields").len(), 3);
    assert_eq!(at(&model, "entities.GeoPoint.fields").len(), 2);

    // An embedded entity declared inside an event lands with the events.
    assert!(model.document.lookup("events.Address.fields.city").is_some());
    assert_eq!(at(&model, "events.Address.options.embedded"), &Value::Boolean(true));
}

#[test]
fn nested_fields_entity_metadata() {
    let model = compile_fixture("nested-fields.zdl");
    assert_eq!(text(&model, "javadoc"), "Customer domain model.");
    assert_eq!(at(&model, "constants.MAX_ADDRESSES"), &Value::from(3i64));

    let customer = "entities.Customer";
    assert_eq!(text(&model, &format!("{customer}.className")), "Customer");
    assert_eq!(text(&model, &format!("{customer}.instanceNamePlural")), "customers");
    assert_eq!(text(&model, &format!("{customer}.kebabCasePlural")), "customers");
    assert_eq!(text(&model, &format!("{customer}.tableName")), "customers");
    assert_eq!(text(&model, &format!("{customer}.javadoc")), "A registered customer.");
    assert_eq!(at(&model, &format!("{customer}.options.aggregate")), &Value::Boolean(true));
    assert_eq!(text(&model, &format!("{customer}.fields.name.javadoc")), "display name");
    assert_eq!(
        text(&model, &format!("{customer}.fields.name.validations.maxlength.value")),
        "254"
    );
    assert_eq!(
        text(&model, &format!("{customer}.fields.email.validations.pattern.value")),
        "\"[a-z]+@.+\""
    );

    assert_eq!(text(&model, "enums.CustomerStatus.values.ACTIVE.javadoc"), "can place orders");
    assert_eq!(at(&model, "enums.CustomerStatus.values.SUSPENDED.value"), &Value::from(2i64));
}

#[test]
fn nested_fields_relationships_and_services() {
    let model = compile_fixture("nested-fields.zdl");
    let rel = at(
        &model,
        "relationships.OneToMany",
    )
    .lookup("OneToMany_Customer{ordersrequired}_Order{customer}")
    .unwrap();
    assert_eq!(rel.get("from").and_then(Value::as_str), Some("Customer"));
    assert_eq!(rel.get("to").and_then(Value::as_str), Some("Order"));
    assert_eq!(rel.get("commentInFrom").and_then(Value::as_str), Some("orders placed"));
    assert_eq!(rel.get("isInjectedFieldInFromRequired"), Some(&Value::Boolean(true)));
    assert_eq!(rel.get("isInjectedFieldInToRequired"), Some(&Value::Boolean(false)));
    assert_eq!(
        rel.lookup("options.destination.eager"),
        Some(&Value::Boolean(true))
    );

    let methods = "services.CustomerService.methods";
    assert_eq!(at(&model, methods).len(), 3);
    assert_eq!(
        strings(&model, &format!("{methods}.registerCustomer.withEvents")),
        vec!["CustomerRegistered"]
    );
    assert_eq!(text(&model, &format!("{methods}.findCustomer.paramId")), "id");
    assert_eq!(
        at(&model, &format!("{methods}.findCustomer.returnTypeIsOptional")),
        &Value::Boolean(true)
    );
    assert_eq!(
        at(&model, &format!("{methods}.searchCustomers.paginated")),
        &Value::Boolean(true)
    );

    // No explicit methods: CRUD is synthesized for the aggregate.
    let crud: Vec<_> = at(&model, "services.OrderService.methods")
        .as_mapping()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(
        crud,
        vec!["getOrder", "listOrders", "createOrder", "updateOrder", "deleteOrder"]
    );
    assert_eq!(
        text(&model, "services.OrderService.methods.getOrder.options.get"),
        "/orders/{orderId}"
    );
    assert_eq!(
        at(&model, "services.OrderService.methods.listOrders.paginated"),
        &Value::Boolean(true)
    );
    assert_eq!(text(&model, "events.CustomerRegistered.channel"), "customers");
    assert_eq!(at(&model, "inputs.CustomerCriteria.fields").len(), 1);
}

#[test]
fn unrecognized_tokens_yield_partial_document() {
    let model = compile_fixture("unrecognized-tokens.zdl");
    assert_eq!(model.diagnostics.len(), 2, "{:?}", model.diagnostics);
    assert_eq!(model.diagnostics[0].line, 3);
    assert_eq!(model.diagnostics[1].line, 7);
    assert!(model.diagnostics[0].skipped.contains("notafield"));

    let fields: Vec<_> = at(&model, "entities.Customer.fields")
        .as_mapping()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(fields, vec!["name", "email"]);
    assert!(model.document.lookup("entities.Order.fields.number").is_some());
}

#[test]
fn strict_mode_rejects_unrecognized_tokens() {
    let options = BuildOptions {
        strict: true,
        ..BuildOptions::default()
    };
    let err = compile_zdl(&fixture("unrecognized-tokens.zdl"), "unrecognized-tokens.zdl", &options)
        .unwrap_err();
    let Error::Strict { diagnostics } = err else {
        panic!("expected a strict-mode error");
    };
    assert_eq!(diagnostics.len(), 2);

    assert!(compile_zfl(&fixture("subscriptions.zfl"), "subscriptions.zfl", &options).is_ok());
}

#[test]
fn compilation_is_idempotent() {
    for name in ["subscriptions.zfl", "nested-fields.zdl", "unrecognized-tokens.zdl"] {
        let first = compile_fixture(name);
        let second = compile_fixture(name);
        assert_eq!(first, second, "{name}");
        // Mapping equality ignores order; the serialized text does not
        let first_text = serde_json::to_string(&first.document).unwrap();
        let second_text = serde_json::to_string(&second.document).unwrap();
        assert_eq!(first_text, second_text, "{name}");
    }
}

#[test]
fn document_keys_follow_declaration_order() {
    let model = compile_fixture("nested-fields.zdl");
    let fields: Vec<_> = at(&model, "entities.Customer.fields")
        .as_mapping()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(&fields[..4], ["name", "email", "tags", "addresses"]);

    let text = serde_json::to_string(&model.document).unwrap();
    let name = text.find("\"name\":{").unwrap();
    let email = text.find("\"email\":{").unwrap();
    assert!(name < email);
}

#[test]
fn document_serializes_with_stable_keys() {
    let model = compile_fixture("nested-fields.zdl");
    let json = serde_json::to_value(&model).unwrap();
    let keys: Vec<_> = json["document"]
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    // serde_json without preserve_order sorts keys; presence is what matters here
    for key in ["constants", "entities", "enums", "events", "inputs", "javadoc", "relationships", "services"] {
        assert!(keys.iter().any(|k| k == key), "missing {key}");
    }
    assert_eq!(json["document"]["entities"]["Order"]["fields"]["number"]["type"], "Long");
    assert!(json["locations"]["entities.Customer"]["line"].is_number());
}
