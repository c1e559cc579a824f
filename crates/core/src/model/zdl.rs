use indexmap::IndexMap;

use super::{options_list, Entity};
use crate::inflector::upper_camel_case;
use crate::value::{Map, MapExt, Value};

/// The entity-language document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZdlModel {
    pub javadoc: Option<String>,
    pub constants: Map,
    pub entities: IndexMap<String, Entity>,
    pub enums: IndexMap<String, Enum>,
    /// Partitioned by relationship kind, then keyed by synthesized name.
    pub relationships: IndexMap<String, IndexMap<String, Relationship>>,
    pub services: IndexMap<String, Service>,
    pub events: IndexMap<String, Entity>,
    pub inputs: IndexMap<String, Entity>,
}

impl From<ZdlModel> for Value {
    fn from(model: ZdlModel) -> Self {
        let mut m = Map::new();
        m.put_opt("javadoc", model.javadoc);
        m.put("constants", model.constants);
        m.put("entities", model.entities);
        m.put("enums", model.enums);
        m.put("relationships", model.relationships);
        m.put("services", model.services);
        m.put("events", model.events);
        m.put("inputs", model.inputs);
        Value::Mapping(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enum {
    pub name: String,
    pub class_name: String,
    pub javadoc: Option<String>,
    pub options: Map,
    pub values: IndexMap<String, EnumValue>,
}

impl Enum {
    pub fn new(name: &str) -> Self {
        Enum {
            name: name.to_owned(),
            class_name: upper_camel_case(name),
            ..Enum::default()
        }
    }
}

impl From<Enum> for Value {
    fn from(e: Enum) -> Self {
        let mut m = Map::new();
        m.put("name", e.name);
        m.put("className", e.class_name);
        m.put_opt("javadoc", e.javadoc);
        m.put("options", e.options);
        m.put("values", e.values);
        Value::Mapping(m)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub javadoc: Option<String>,
    pub value: Option<Value>,
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        let mut m = Map::new();
        m.put("name", v.name);
        m.put_opt("javadoc", v.javadoc);
        m.put_opt("value", v.value);
        Value::Mapping(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationship {
    pub kind: String,
    pub from: String,
    pub to: String,
    pub comment_in_from: Option<String>,
    pub comment_in_to: Option<String>,
    pub source_options: Map,
    pub destination_options: Map,
    pub injected_field_in_from: Option<String>,
    pub injected_field_in_to: Option<String>,
    pub is_injected_field_in_from_required: bool,
    pub is_injected_field_in_to_required: bool,
}

impl From<Relationship> for Value {
    fn from(r: Relationship) -> Self {
        let mut options = Map::new();
        options.put("source", r.source_options);
        options.put("destination", r.destination_options);

        let mut m = Map::new();
        m.put("type", r.kind);
        m.put("from", r.from);
        m.put("to", r.to);
        m.put_opt("commentInFrom", r.comment_in_from);
        m.put_opt("commentInTo", r.comment_in_to);
        m.put("options", options);
        m.put_opt("injectedFieldInFrom", r.injected_field_in_from);
        m.put_opt("injectedFieldInTo", r.injected_field_in_to);
        m.put("isInjectedFieldInFromRequired", r.is_injected_field_in_from_required);
        m.put("isInjectedFieldInToRequired", r.is_injected_field_in_to_required);
        Value::Mapping(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub class_name: String,
    pub javadoc: Option<String>,
    pub options: Map,
    pub aggregates: Vec<String>,
    pub methods: IndexMap<String, Method>,
}

impl Service {
    pub fn new(name: &str) -> Self {
        Service {
            name: name.to_owned(),
            class_name: upper_camel_case(name),
            ..Service::default()
        }
    }
}

impl From<Service> for Value {
    fn from(s: Service) -> Self {
        let mut m = Map::new();
        m.put("name", s.name);
        m.put("className", s.class_name);
        m.put_opt("javadoc", s.javadoc);
        m.put("options", s.options);
        m.put("aggregates", s.aggregates);
        m.put("methods", s.methods);
        Value::Mapping(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    /// Set on methods synthesized for a named service.
    pub service_name: Option<String>,
    pub javadoc: Option<String>,
    pub param_id: Option<String>,
    pub parameter: Option<String>,
    pub return_type: Option<String>,
    pub return_type_is_array: bool,
    pub return_type_is_optional: bool,
    pub paginated: bool,
    pub with_events: Vec<String>,
    pub options: Map,
    pub options_list: Vec<(String, Value)>,
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        Method {
            name: name.into(),
            ..Method::default()
        }
    }

    /// Record an option in both the keyed mapping and the ordered list.
    pub fn add_option(&mut self, name: &str, value: Value) {
        if name == "paginated" {
            self.paginated = value.as_bool().unwrap_or(true);
        }
        self.options.insert(name.to_owned(), value.clone());
        self.options_list.push((name.to_owned(), value));
    }
}

impl From<Method> for Value {
    fn from(method: Method) -> Self {
        let mut m = Map::new();
        m.put("name", method.name);
        m.put_opt("serviceName", method.service_name);
        m.put_opt("javadoc", method.javadoc);
        m.put_opt("paramId", method.param_id);
        m.put_opt("parameter", method.parameter);
        m.put_opt("returnType", method.return_type);
        m.put("returnTypeIsArray", method.return_type_is_array);
        m.put("returnTypeIsOptional", method.return_type_is_optional);
        m.put("paginated", method.paginated);
        m.put("withEvents", method.with_events);
        m.put("options", method.options);
        m.put("optionsList", options_list(method.options_list));
        Value::Mapping(m)
    }
}
