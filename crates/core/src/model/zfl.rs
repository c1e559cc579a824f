use indexmap::IndexMap;

use super::{options_list, Field};
use crate::inflector::upper_camel_case;
use crate::value::{Map, MapExt, Value};

/// The flow-language document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZflModel {
    pub javadoc: Option<String>,
    /// `(key, value)` in declaration order.
    pub imports: Vec<(String, String)>,
    pub config: Map,
    pub flows: IndexMap<String, Flow>,
}

impl From<ZflModel> for Value {
    fn from(model: ZflModel) -> Self {
        let imports: Vec<Value> = model
            .imports
            .into_iter()
            .map(|(key, value)| {
                let mut m = Map::new();
                m.put("key", key);
                m.put("value", value);
                Value::Mapping(m)
            })
            .collect();

        let mut m = Map::new();
        m.put_opt("javadoc", model.javadoc);
        m.put("imports", imports);
        m.put("config", model.config);
        m.put("flows", model.flows);
        Value::Mapping(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flow {
    pub name: String,
    pub class_name: String,
    pub javadoc: Option<String>,
    pub options: Map,
    pub options_list: Vec<(String, Value)>,
    pub systems: IndexMap<String, System>,
    pub starts: IndexMap<String, Start>,
    pub whens: Vec<When>,
    /// `None` until an `end` block is declared.
    pub end: Option<End>,
}

impl Flow {
    pub fn new(name: &str) -> Self {
        Flow {
            name: name.to_owned(),
            class_name: upper_camel_case(name),
            ..Flow::default()
        }
    }
}

impl From<Flow> for Value {
    fn from(flow: Flow) -> Self {
        let mut m = Map::new();
        m.put("name", flow.name);
        m.put("className", flow.class_name);
        m.put_opt("javadoc", flow.javadoc);
        m.put("options", flow.options);
        m.put("optionsList", options_list(flow.options_list));
        m.put("systems", flow.systems);
        m.put("starts", flow.starts);
        m.put("whens", flow.whens);
        let end = flow.end.map(Value::from);
        m.put("end", end.unwrap_or_else(|| Value::Mapping(Map::new())));
        Value::Mapping(m)
    }
}

/// A participating system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct System {
    pub name: String,
    pub javadoc: Option<String>,
    pub options: Map,
    pub options_list: Vec<(String, Value)>,
    /// Path or URL of the system's entity-language document.
    pub zdl: Option<String>,
    pub services: IndexMap<String, ServiceStub>,
    pub events: Vec<String>,
}

impl From<System> for Value {
    fn from(system: System) -> Self {
        let mut m = Map::new();
        m.put("name", system.name);
        m.put_opt("javadoc", system.javadoc);
        m.put("options", system.options);
        m.put("optionsList", options_list(system.options_list));
        m.put_opt("zdl", system.zdl);
        m.put("services", system.services);
        m.put("events", system.events);
        Value::Mapping(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceStub {
    pub name: String,
    pub options: Map,
    pub options_list: Vec<(String, Value)>,
    pub commands: Vec<String>,
}

impl ServiceStub {
    pub const DEFAULT_NAME: &'static str = "DefaultService";
}

impl From<ServiceStub> for Value {
    fn from(stub: ServiceStub) -> Self {
        let mut m = Map::new();
        m.put("name", stub.name);
        m.put("options", stub.options);
        m.put("optionsList", options_list(stub.options_list));
        m.put("commands", stub.commands);
        Value::Mapping(m)
    }
}

/// A start (trigger) declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Start {
    pub name: String,
    pub class_name: String,
    pub javadoc: Option<String>,
    pub options: Map,
    pub options_list: Vec<(String, Value)>,
    pub fields: IndexMap<String, Field>,
}

impl Start {
    pub fn new(name: &str) -> Self {
        Start {
            name: name.to_owned(),
            class_name: upper_camel_case(name),
            ..Start::default()
        }
    }
}

impl From<Start> for Value {
    fn from(start: Start) -> Self {
        let mut m = Map::new();
        m.put("name", start.name);
        m.put("className", start.class_name);
        m.put_opt("javadoc", start.javadoc);
        m.put("options", start.options);
        m.put("optionsList", options_list(start.options_list));
        m.put("fields", start.fields);
        Value::Mapping(m)
    }
}

/// Command, event and policy names collected by a rule or branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actions {
    pub commands: Vec<String>,
    pub events: Vec<String>,
    pub policies: Vec<String>,
}

impl Actions {
    fn put_into(self, m: &mut Map) {
        m.put("commands", self.commands);
        m.put("events", self.events);
        m.put("policies", self.policies);
    }
}

impl From<Actions> for Value {
    fn from(actions: Actions) -> Self {
        let mut m = Map::new();
        actions.put_into(&mut m);
        Value::Mapping(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct When {
    /// Trigger names in source order; `and`/`or` are not evaluated.
    pub triggers: Vec<String>,
    pub actions: Actions,
    pub ifs: Vec<If>,
}

impl From<When> for Value {
    fn from(when: When) -> Self {
        let mut m = Map::new();
        m.put("triggers", when.triggers);
        m.put("commands", when.actions.commands);
        m.put("events", when.actions.events);
        m.put("ifs", when.ifs);
        m.put("policies", when.actions.policies);
        Value::Mapping(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct If {
    pub condition: String,
    pub actions: Actions,
    pub else_ifs: Vec<ElseIf>,
    pub else_branch: Option<Actions>,
}

impl From<If> for Value {
    fn from(branch: If) -> Self {
        let mut m = Map::new();
        m.put("condition", branch.condition);
        branch.actions.put_into(&mut m);
        m.put("elseIfs", branch.else_ifs);
        m.put_opt("else", branch.else_branch);
        Value::Mapping(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElseIf {
    pub condition: String,
    pub actions: Actions,
}

impl From<ElseIf> for Value {
    fn from(branch: ElseIf) -> Self {
        let mut m = Map::new();
        m.put("condition", branch.condition);
        branch.actions.put_into(&mut m);
        Value::Mapping(m)
    }
}

/// Terminal outcomes. Kinds not declared in source stay `None` and are
/// omitted from the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct End {
    pub completed: Option<Vec<String>>,
    pub suspended: Option<Vec<String>>,
    pub cancelled: Option<Vec<String>>,
}

impl From<End> for Value {
    fn from(end: End) -> Self {
        let mut outcomes = Map::new();
        outcomes.put_opt("completed", end.completed);
        outcomes.put_opt("suspended", end.suspended);
        outcomes.put_opt("cancelled", end.cancelled);
        let mut m = Map::new();
        m.put("outcomes", outcomes);
        Value::Mapping(m)
    }
}
