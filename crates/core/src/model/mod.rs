//! Typed records of the semantic model.
//!
//! Builders fill these records; each converts into the generic [`Value`]
//! document at the boundary, with the exact key names generators rely on.

use indexmap::IndexMap;

use crate::inflector::{kebab_case, lower_camel_case, pluralize, upper_camel_case};
use crate::value::{Map, MapExt, Value};

pub mod zdl;
pub mod zfl;

pub use zdl::{Enum, EnumValue, Method, Relationship, Service, ZdlModel};
pub use zfl::{Actions, ElseIf, End, Flow, If, ServiceStub, Start, System, When, ZflModel};

/// `optionsList` layout: `[{name, value}]` in declaration order.
pub(crate) fn options_list(list: Vec<(String, Value)>) -> Value {
    let entries: Vec<Value> = list
        .into_iter()
        .map(|(name, value)| {
            let mut entry = Map::new();
            entry.put("name", name);
            entry.put("value", value);
            Value::Mapping(entry)
        })
        .collect();
    Value::Sequence(entries)
}

/// Entity-shaped record, shared by entities, embedded entities, events and
/// inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    pub class_name: String,
    pub instance_name: String,
    pub class_name_plural: String,
    pub instance_name_plural: String,
    pub kebab_case: String,
    pub kebab_case_plural: String,
    pub table_name: Option<String>,
    pub javadoc: Option<String>,
    /// Events only.
    pub channel: Option<String>,
    pub options: Map,
    pub fields: IndexMap<String, Field>,
}

impl Entity {
    /// A record with every derived name computed from `name`.
    pub fn new(name: &str) -> Self {
        let class_name = upper_camel_case(name);
        let instance_name = lower_camel_case(&class_name);
        let kebab = kebab_case(name);
        Entity {
            name: name.to_owned(),
            class_name_plural: pluralize(&class_name),
            instance_name_plural: pluralize(&instance_name),
            kebab_case_plural: pluralize(&kebab),
            kebab_case: kebab,
            class_name,
            instance_name,
            ..Entity::default()
        }
    }
}

impl From<Entity> for Value {
    fn from(e: Entity) -> Self {
        let mut m = Map::new();
        m.put("name", e.name);
        m.put("className", e.class_name);
        m.put("instanceName", e.instance_name);
        m.put("classNamePlural", e.class_name_plural);
        m.put("instanceNamePlural", e.instance_name_plural);
        m.put("kebabCase", e.kebab_case);
        m.put("kebabCasePlural", e.kebab_case_plural);
        m.put_opt("tableName", e.table_name);
        m.put_opt("javadoc", e.javadoc);
        m.put_opt("channel", e.channel);
        m.put("options", e.options);
        m.put("fields", e.fields);
        Value::Mapping(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    pub javadoc: Option<String>,
    pub is_array: bool,
    pub options: Map,
    pub validations: IndexMap<String, Validation>,
}

impl From<Field> for Value {
    fn from(f: Field) -> Self {
        let mut m = Map::new();
        m.put("name", f.name);
        m.put("type", f.type_name);
        m.put_opt("javadoc", f.javadoc);
        m.put("isArray", f.is_array);
        m.put("options", f.options);
        m.put("validations", f.validations);
        Value::Mapping(m)
    }
}

/// A validation constraint; `value` is the raw argument text, empty when
/// the constraint takes none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub name: String,
    pub value: String,
}

impl From<Validation> for Value {
    fn from(v: Validation) -> Self {
        let mut m = Map::new();
        m.put("name", v.name);
        m.put("value", v.value);
        Value::Mapping(m)
    }
}
