use indexmap::IndexMap;

use super::{field_record, javadoc_of, options_of, skip, Diagnostic, Location, Model};
use crate::crud::{crud_methods, crud_methods_for_service};
use crate::model::{Entity, Enum, EnumValue, Field, Method, Relationship, Service, ZdlModel};
use crate::resolve::{javadoc, resolve, resolve_or_true};
use crate::scope::ScopeStack;
use crate::syntax::{SyntaxKind, SyntaxNode};
use crate::value::{Map, Value};

/// Build the entity-language document from a `Zdl` tree.
pub fn build_zdl(tree: &SyntaxNode) -> Model {
    let mut builder = ZdlBuilder::default();
    builder.document(tree);
    builder.finish()
}

/// Top-level collection an entity-shaped record lives in. Embedded
/// entities land in the section of the declaration enclosing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Entities,
    Events,
    Inputs,
}

impl Section {
    fn key(self) -> &'static str {
        match self {
            Section::Entities => "entities",
            Section::Events => "events",
            Section::Inputs => "inputs",
        }
    }
}

#[derive(Debug)]
enum Frame {
    /// `slot` is the index reserved in the section on entry. A `shadowed`
    /// entity had an embedded entity of the same name claim its slot.
    Entity {
        section: Section,
        slot: usize,
        entity: Entity,
        shadowed: bool,
    },
    Enum(Enum),
    Service(Service),
    Method(Method),
}

impl Frame {
    fn fields_mut(&mut self) -> Option<&mut IndexMap<String, Field>> {
        match self {
            Frame::Entity { entity, .. } => Some(&mut entity.fields),
            _ => None,
        }
    }

    fn methods_mut(&mut self) -> Option<&mut IndexMap<String, Method>> {
        match self {
            Frame::Service(service) => Some(&mut service.methods),
            _ => None,
        }
    }

    fn section(&self) -> Option<Section> {
        match self {
            Frame::Entity { section, .. } => Some(*section),
            _ => None,
        }
    }

    fn add_option(&mut self, name: String, value: Value) {
        match self {
            Frame::Entity { entity, .. } => {
                entity.options.insert(name, value);
            }
            Frame::Enum(e) => {
                e.options.insert(name, value);
            }
            Frame::Service(s) => {
                s.options.insert(name, value);
            }
            Frame::Method(m) => m.add_option(&name, value),
        }
    }
}

#[derive(Default)]
struct ZdlBuilder {
    model: ZdlModel,
    scope: ScopeStack<Frame>,
    locations: IndexMap<String, Location>,
    diagnostics: Vec<Diagnostic>,
}

impl ZdlBuilder {
    fn document(&mut self, tree: &SyntaxNode) {
        for node in &tree.children {
            match node.kind {
                SyntaxKind::GlobalJavadoc => self.model.javadoc = Some(javadoc(&node.text)),
                SyntaxKind::LegacyConstant => self.constant(node),
                SyntaxKind::Entity => self.entity(node, Section::Entities, SyntaxKind::EntityName),
                SyntaxKind::Event => self.entity(node, Section::Events, SyntaxKind::EventName),
                SyntaxKind::Input => self.entity(node, Section::Inputs, SyntaxKind::InputName),
                SyntaxKind::Enum => self.enum_decl(node),
                SyntaxKind::Relationships => self.relationships(node),
                SyntaxKind::Service | SyntaxKind::ServiceLegacy => self.service(node),
                _ => skip(&mut self.diagnostics, node, "document"),
            }
        }
    }

    fn finish(self) -> Model {
        debug_assert!(self.scope.is_empty(), "unbalanced scope after walk");
        Model {
            document: Value::from(self.model),
            locations: self.locations,
            diagnostics: self.diagnostics,
        }
    }

    fn locate(&mut self, path: String, node: &SyntaxNode, name: Option<&SyntaxNode>) {
        if let Some(name) = name {
            self.locations.insert(format!("{path}.name"), name.span);
        }
        self.locations.insert(path, node.span);
    }

    fn section_mut(&mut self, section: Section) -> &mut IndexMap<String, Entity> {
        match section {
            Section::Entities => &mut self.model.entities,
            Section::Events => &mut self.model.events,
            Section::Inputs => &mut self.model.inputs,
        }
    }

    fn current_section(&self) -> Section {
        (0..self.scope.depth())
            .find_map(|depth| self.scope.peek(depth).and_then(Frame::section))
            .unwrap_or(Section::Entities)
    }

    fn apply_options(&mut self, node: &SyntaxNode) {
        for (name, value) in options_of(node) {
            if let Some(frame) = self.scope.top_mut() {
                frame.add_option(name, value);
            }
        }
    }

    /// Reserve the record's position in its section, then push it.
    fn enter_entity(&mut self, section: Section, entity: Entity) {
        let (slot, _) = self
            .section_mut(section)
            .insert_full(entity.name.clone(), Entity::default());
        let owner = self.scope.nearest_mut(|frame| match frame {
            Frame::Entity {
                section: s,
                slot: i,
                shadowed,
                ..
            } if *s == section && *i == slot => Some(shadowed),
            _ => None,
        });
        if let Some(shadowed) = owner {
            *shadowed = true;
        }
        self.scope.enter(Frame::Entity {
            section,
            slot,
            entity,
            shadowed: false,
        });
    }

    fn exit(&mut self) {
        match self.scope.exit() {
            Some(Frame::Entity {
                section,
                slot,
                entity,
                shadowed,
            }) => {
                if shadowed {
                    tracing::debug!(name = %entity.name, "embedded entity keeps the shared slot");
                } else if let Some((_, reserved)) = self.section_mut(section).get_index_mut(slot) {
                    *reserved = entity;
                }
            }
            Some(Frame::Enum(e)) => {
                self.model.enums.insert(e.name.clone(), e);
            }
            Some(Frame::Service(s)) => {
                self.model.services.insert(s.name.clone(), s);
            }
            Some(Frame::Method(m)) => self.register_method(m),
            None => {}
        }
    }

    fn constant(&mut self, node: &SyntaxNode) {
        let Some(name) = node.children.first() else {
            return;
        };
        let value = resolve_or_true(node.children.get(1));
        self.model.constants.insert(name.text.clone(), value);
    }

    fn entity(&mut self, node: &SyntaxNode, section: Section, name_kind: SyntaxKind) {
        let Some(name) = node.child(name_kind) else {
            skip(&mut self.diagnostics, node, section.key());
            return;
        };
        tracing::debug!(name = %name.text, section = section.key(), "entering");

        let mut entity = Entity::new(&name.text);
        entity.table_name = node.child_text(SyntaxKind::TableName).map(str::to_owned);
        entity.javadoc = javadoc_of(node);
        entity.channel = node.child_text(SyntaxKind::EventChannel).map(str::to_owned);
        self.locate(format!("{}.{}", section.key(), name.text), node, Some(name));

        self.enter_entity(section, entity);
        self.apply_options(node);
        self.fields(node);
        self.exit();
    }

    fn fields(&mut self, node: &SyntaxNode) {
        for child in &node.children {
            match child.kind {
                SyntaxKind::Field => self.field(child),
                SyntaxKind::Error => skip(&mut self.diagnostics, child, "field list"),
                _ => {}
            }
        }
    }

    fn field(&mut self, node: &SyntaxNode) {
        let field = field_record(node);
        let type_name = field.type_name.clone();
        let doc = field.javadoc.clone();
        if let Some(fields) = self.scope.nearest_mut(Frame::fields_mut) {
            fields.insert(field.name.clone(), field);
        }
        if let Some(nested) = node.child(SyntaxKind::NestedField) {
            self.embedded(nested, &type_name, doc);
        }
    }

    /// A nested field body becomes an entity of its own, flattened into the
    /// enclosing section.
    fn embedded(&mut self, nested: &SyntaxNode, name: &str, doc: Option<String>) {
        let section = self.current_section();
        tracing::debug!(name, section = section.key(), "entering embedded entity");

        let mut entity = Entity::new(name);
        entity.javadoc = doc;
        entity.table_name = nested.child_text(SyntaxKind::TableName).map(str::to_owned);
        entity.options.insert("embedded".to_owned(), Value::Boolean(true));
        self.locate(format!("{}.{}", section.key(), name), nested, None);

        self.enter_entity(section, entity);
        self.fields(nested);
        self.exit();
    }

    fn enum_decl(&mut self, node: &SyntaxNode) {
        let Some(name) = node.child(SyntaxKind::EnumName) else {
            skip(&mut self.diagnostics, node, "enums");
            return;
        };
        let mut record = Enum::new(&name.text);
        record.javadoc = javadoc_of(node);
        self.locate(format!("enums.{}", name.text), node, Some(name));

        self.scope.enter(Frame::Enum(record));
        self.apply_options(node);
        for child in &node.children {
            match child.kind {
                SyntaxKind::EnumValue => self.enum_value(child),
                SyntaxKind::Error => skip(&mut self.diagnostics, child, "enum"),
                _ => {}
            }
        }
        self.exit();
    }

    fn enum_value(&mut self, node: &SyntaxNode) {
        let Some(name) = node.child_text(SyntaxKind::EnumValueName) else {
            return;
        };
        let value = EnumValue {
            name: name.to_owned(),
            javadoc: javadoc_of(node),
            value: node.child(SyntaxKind::EnumValueValue).map(resolve),
        };
        if let Some(Frame::Enum(e)) = self.scope.top_mut() {
            e.values.insert(name.to_owned(), value);
        }
    }

    fn relationships(&mut self, node: &SyntaxNode) {
        let kind = node.child_text(SyntaxKind::RelationshipType).unwrap_or_default();
        for child in &node.children {
            match child.kind {
                SyntaxKind::Relationship => self.relationship(kind, child),
                SyntaxKind::Error => skip(&mut self.diagnostics, child, "relationships"),
                _ => {}
            }
        }
    }

    /// Relationships are built atomically; they never enter the scope.
    fn relationship(&mut self, kind: &str, node: &SyntaxNode) {
        let (Some(from), Some(to)) = (
            node.child(SyntaxKind::RelationshipFrom).map(Endpoint::of),
            node.child(SyntaxKind::RelationshipTo).map(Endpoint::of),
        ) else {
            skip(&mut self.diagnostics, node, "relationships");
            return;
        };

        let key = format!("{}_{}_{}", kind, from.text, to.text);
        let record = Relationship {
            kind: kind.to_owned(),
            from: from.entity,
            to: to.entity,
            comment_in_from: from.comment,
            comment_in_to: to.comment,
            source_options: from.options,
            destination_options: to.options,
            injected_field_in_from: from.field,
            injected_field_in_to: to.field,
            is_injected_field_in_from_required: from.required,
            is_injected_field_in_to_required: to.required,
        };
        let partition = self.model.relationships.entry(kind.to_owned()).or_default();
        if partition.insert(key.clone(), record).is_some() {
            tracing::debug!(%key, "relationship redeclared, keeping the last one");
        }
        self.locations
            .insert(format!("relationships.{kind}.{key}"), node.span);
    }

    fn service(&mut self, node: &SyntaxNode) {
        let Some(name) = node.child(SyntaxKind::ServiceName) else {
            skip(&mut self.diagnostics, node, "services");
            return;
        };
        tracing::debug!(name = %name.text, "entering service");
        let aggregates: Vec<String> = node
            .child(SyntaxKind::ServiceAggregates)
            .map(|a| a.children.iter().map(|c| c.text.clone()).collect())
            .unwrap_or_default();

        let mut service = Service::new(&name.text);
        service.javadoc = javadoc_of(node);
        service.aggregates = aggregates.clone();
        self.locate(format!("services.{}", name.text), node, Some(name));

        self.scope.enter(Frame::Service(service));
        self.apply_options(node);
        let methods: Vec<&SyntaxNode> = node.children_of(SyntaxKind::ServiceMethod).collect();
        if methods.is_empty() {
            for aggregate in &aggregates {
                let synthesized = match node.kind {
                    SyntaxKind::ServiceLegacy => crud_methods(aggregate),
                    _ => crud_methods_for_service(aggregate, &name.text),
                };
                for method in synthesized {
                    self.register_method(method);
                }
            }
        } else {
            for method in methods {
                self.method(&name.text, method);
            }
        }
        for error in node.children_of(SyntaxKind::Error) {
            skip(&mut self.diagnostics, error, "service");
        }
        self.exit();
    }

    fn method(&mut self, service: &str, node: &SyntaxNode) {
        let Some(name) = node.child(SyntaxKind::ServiceMethodName) else {
            return;
        };
        let mut method = Method::new(name.text.clone());
        method.javadoc = javadoc_of(node);
        method.param_id = node
            .has_child(SyntaxKind::ServiceMethodParameterId)
            .then(|| "id".to_owned());
        method.parameter = node
            .child_text(SyntaxKind::ServiceMethodParameter)
            .map(str::to_owned);
        if let Some(ret) = node.child(SyntaxKind::ServiceMethodReturn) {
            method.return_type = ret.child_text(SyntaxKind::Id).map(str::to_owned);
            method.return_type_is_array = ret.has_child(SyntaxKind::ArrayMarker);
            method.return_type_is_optional = ret.has_child(SyntaxKind::OptionalMarker);
        }
        method.with_events = node
            .child(SyntaxKind::ServiceMethodEvents)
            .map(|events| events.children.iter().map(|e| e.text.clone()).collect())
            .unwrap_or_default();
        self.locate(
            format!("services.{}.methods.{}", service, name.text),
            node,
            Some(name),
        );

        self.scope.enter(Frame::Method(method));
        self.apply_options(node);
        for error in node.children_of(SyntaxKind::Error) {
            skip(&mut self.diagnostics, error, "method");
        }
        self.exit();
    }

    fn register_method(&mut self, method: Method) {
        if let Some(methods) = self.scope.nearest_mut(Frame::methods_mut) {
            methods.insert(method.name.clone(), method);
        }
    }
}

/// One side of a relationship.
struct Endpoint {
    /// Definition text, `Entity{field}`.
    text: String,
    entity: String,
    field: Option<String>,
    required: bool,
    comment: Option<String>,
    options: Map,
}

impl Endpoint {
    fn of(node: &SyntaxNode) -> Endpoint {
        let definition = node.child(SyntaxKind::RelationshipDefinition);
        let part = |kind| definition.and_then(|d| d.child_text(kind)).map(str::to_owned);
        Endpoint {
            text: definition.map(|d| d.text.clone()).unwrap_or_default(),
            entity: part(SyntaxKind::RelationshipEntityName).unwrap_or_default(),
            field: part(SyntaxKind::RelationshipFieldName),
            required: definition.map_or(false, |d| d.has_child(SyntaxKind::RelationshipRequired)),
            comment: javadoc_of(node),
            options: options_of(node).into_iter().collect(),
        }
    }
}
