use indexmap::IndexMap;

use super::{field_record, javadoc_of, options_of, skip, Diagnostic, Location, Model};
use crate::model::{Actions, ElseIf, End, Field, Flow, If, ServiceStub, Start, System, When, ZflModel};
use crate::resolve::{javadoc, resolve_or_true, resolve_text};
use crate::scope::ScopeStack;
use crate::syntax::{SyntaxKind, SyntaxNode};
use crate::value::{Map, Value};

/// Build the flow-language document from a `Zfl` tree.
pub fn build_zfl(tree: &SyntaxNode) -> Model {
    let mut builder = ZflBuilder::default();
    builder.document(tree);
    builder.finish()
}

#[derive(Debug)]
enum Frame {
    Flow(Flow),
    System(System),
    ServiceStub(ServiceStub),
    Start(Start),
    When(When),
    If(If),
    ElseIf(ElseIf),
    Else(Actions),
    End(End),
}

impl Frame {
    /// The keyed options and the ordered `optionsList` of the record.
    fn options_mut(&mut self) -> Option<(&mut Map, &mut Vec<(String, Value)>)> {
        match self {
            Frame::Flow(f) => Some((&mut f.options, &mut f.options_list)),
            Frame::System(s) => Some((&mut s.options, &mut s.options_list)),
            Frame::ServiceStub(s) => Some((&mut s.options, &mut s.options_list)),
            Frame::Start(s) => Some((&mut s.options, &mut s.options_list)),
            _ => None,
        }
    }

    fn actions_mut(&mut self) -> Option<&mut Actions> {
        match self {
            Frame::When(w) => Some(&mut w.actions),
            Frame::If(i) => Some(&mut i.actions),
            Frame::ElseIf(e) => Some(&mut e.actions),
            Frame::Else(actions) => Some(actions),
            _ => None,
        }
    }

    fn fields_mut(&mut self) -> Option<&mut IndexMap<String, Field>> {
        match self {
            Frame::Start(s) => Some(&mut s.fields),
            _ => None,
        }
    }

    fn flow_mut(&mut self) -> Option<&mut Flow> {
        match self {
            Frame::Flow(f) => Some(f),
            _ => None,
        }
    }

    fn system_mut(&mut self) -> Option<&mut System> {
        match self {
            Frame::System(s) => Some(s),
            _ => None,
        }
    }

    /// Conditional blocks belong to the enclosing rule, even when nested
    /// inside another branch.
    fn ifs_mut(&mut self) -> Option<&mut Vec<If>> {
        match self {
            Frame::When(w) => Some(&mut w.ifs),
            _ => None,
        }
    }

    fn if_mut(&mut self) -> Option<&mut If> {
        match self {
            Frame::If(i) => Some(i),
            _ => None,
        }
    }

    fn end_mut(&mut self) -> Option<&mut End> {
        match self {
            Frame::End(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Default)]
struct ZflBuilder {
    model: ZflModel,
    scope: ScopeStack<Frame>,
    locations: IndexMap<String, Location>,
    diagnostics: Vec<Diagnostic>,
}

impl ZflBuilder {
    fn document(&mut self, tree: &SyntaxNode) {
        for node in &tree.children {
            match node.kind {
                SyntaxKind::GlobalJavadoc => self.model.javadoc = Some(javadoc(&node.text)),
                SyntaxKind::Import => self.import(node),
                SyntaxKind::Config => self.config(node),
                SyntaxKind::Flow => self.flow(node),
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

    fn apply_options(&mut self, node: &SyntaxNode) {
        let options = options_of(node);
        if options.is_empty() {
            return;
        }
        match self.scope.top_mut().and_then(Frame::options_mut) {
            Some((keyed, list)) => {
                keyed.extend(options.iter().cloned());
                list.extend(options);
            }
            None => tracing::debug!(line = node.span.line, "options ignored on {:?}", node.kind),
        }
    }

    /// Dotted path of the innermost flow.
    fn flow_path(&self) -> String {
        (0..self.scope.depth())
            .find_map(|depth| match self.scope.peek(depth) {
                Some(Frame::Flow(f)) => Some(format!("flows.{}", f.name)),
                _ => None,
            })
            .unwrap_or_else(|| "flows".to_owned())
    }

    fn exit(&mut self) {
        let Some(frame) = self.scope.exit() else {
            return;
        };
        match frame {
            Frame::Flow(flow) => {
                self.model.flows.insert(flow.name.clone(), flow);
            }
            Frame::System(system) => {
                if let Some(flow) = self.scope.nearest_mut(Frame::flow_mut) {
                    flow.systems.insert(system.name.clone(), system);
                }
            }
            Frame::ServiceStub(stub) => {
                if let Some(system) = self.scope.nearest_mut(Frame::system_mut) {
                    system.services.insert(stub.name.clone(), stub);
                }
            }
            Frame::Start(start) => {
                if let Some(flow) = self.scope.nearest_mut(Frame::flow_mut) {
                    flow.starts.insert(start.name.clone(), start);
                }
            }
            Frame::When(when) => {
                if let Some(flow) = self.scope.nearest_mut(Frame::flow_mut) {
                    flow.whens.push(when);
                }
            }
            Frame::If(branch) => {
                if let Some(ifs) = self.scope.nearest_mut(Frame::ifs_mut) {
                    ifs.push(branch);
                }
            }
            Frame::ElseIf(branch) => {
                if let Some(owner) = self.scope.nearest_mut(Frame::if_mut) {
                    owner.else_ifs.push(branch);
                }
            }
            Frame::Else(actions) => {
                if let Some(owner) = self.scope.nearest_mut(Frame::if_mut) {
                    owner.else_branch = Some(actions);
                }
            }
            Frame::End(end) => {
                if let Some(flow) = self.scope.nearest_mut(Frame::flow_mut) {
                    flow.end = Some(end);
                }
            }
        }
    }

    fn import(&mut self, node: &SyntaxNode) {
        let key = node.child_text(SyntaxKind::ImportKey).unwrap_or_default();
        let value = node
            .child(SyntaxKind::ImportValue)
            .map(resolve_text)
            .unwrap_or_default();
        self.model.imports.push((key.to_owned(), value));
    }

    fn config(&mut self, node: &SyntaxNode) {
        for option in &node.children {
            match option.kind {
                SyntaxKind::ConfigOption => {
                    let Some(name) = option.children.first() else {
                        continue;
                    };
                    let value = resolve_or_true(option.children.get(1));
                    self.model.config.insert(name.text.clone(), value);
                }
                _ => skip(&mut self.diagnostics, option, "config"),
            }
        }
    }

    fn flow(&mut self, node: &SyntaxNode) {
        let Some(name) = node.child(SyntaxKind::FlowName) else {
            skip(&mut self.diagnostics, node, "flows");
            return;
        };
        tracing::debug!(name = %name.text, "entering flow");
        let mut flow = Flow::new(&name.text);
        flow.javadoc = javadoc_of(node);
        let path = format!("flows.{}", name.text);
        self.locations.insert(format!("{path}.name"), name.span);
        self.locations.insert(path, node.span);

        self.scope.enter(Frame::Flow(flow));
        self.apply_options(node);
        for child in &node.children {
            match child.kind {
                SyntaxKind::FlowSystems => {
                    for system in &child.children {
                        match system.kind {
                            SyntaxKind::FlowSystem => self.system(system),
                            SyntaxKind::Error => skip(&mut self.diagnostics, system, "systems"),
                            _ => {}
                        }
                    }
                }
                SyntaxKind::FlowStart => self.start(child),
                SyntaxKind::FlowWhen => self.when(child),
                SyntaxKind::FlowEnd => self.end(child),
                SyntaxKind::Error => skip(&mut self.diagnostics, child, "flow"),
                _ => {}
            }
        }
        self.exit();
    }

    fn system(&mut self, node: &SyntaxNode) {
        let Some(name) = node.child(SyntaxKind::FlowSystemName) else {
            return;
        };
        let system = System {
            name: name.text.clone(),
            javadoc: javadoc_of(node),
            ..System::default()
        };
        let path = format!("{}.systems.{}", self.flow_path(), name.text);
        self.locations.insert(path, node.span);

        self.scope.enter(Frame::System(system));
        self.apply_options(node);
        for child in &node.children {
            match child.kind {
                SyntaxKind::FlowSystemZdl => {
                    let zdl = child.child(SyntaxKind::Value).map(resolve_text);
                    if let Some(Frame::System(system)) = self.scope.top_mut() {
                        system.zdl = zdl;
                    }
                }
                SyntaxKind::FlowSystemService => self.service_stub(child),
                SyntaxKind::FlowSystemEvents => {
                    let events = names(child, SyntaxKind::Id);
                    if let Some(Frame::System(system)) = self.scope.top_mut() {
                        system.events.extend(events);
                    }
                }
                SyntaxKind::Error => skip(&mut self.diagnostics, child, "system"),
                _ => {}
            }
        }
        self.exit();
    }

    fn service_stub(&mut self, node: &SyntaxNode) {
        let name = node
            .child_text(SyntaxKind::FlowSystemServiceName)
            .unwrap_or(ServiceStub::DEFAULT_NAME);
        let stub = ServiceStub {
            name: name.to_owned(),
            ..ServiceStub::default()
        };
        self.scope.enter(Frame::ServiceStub(stub));
        self.apply_options(node);
        for child in &node.children {
            match child.kind {
                SyntaxKind::FlowSystemServiceCommands => {
                    let commands = names(child, SyntaxKind::Id);
                    if let Some(Frame::ServiceStub(stub)) = self.scope.top_mut() {
                        stub.commands.extend(commands);
                    }
                }
                SyntaxKind::Error => skip(&mut self.diagnostics, child, "service"),
                _ => {}
            }
        }
        self.exit();
    }

    fn start(&mut self, node: &SyntaxNode) {
        let Some(name) = node.child(SyntaxKind::FlowStartName) else {
            return;
        };
        let mut start = Start::new(&name.text);
        start.javadoc = javadoc_of(node);
        let path = format!("{}.starts.{}", self.flow_path(), name.text);
        self.locations.insert(path, node.span);

        self.scope.enter(Frame::Start(start));
        self.apply_options(node);
        for child in &node.children {
            match child.kind {
                SyntaxKind::Field => {
                    let field = field_record(child);
                    if let Some(fields) = self.scope.nearest_mut(Frame::fields_mut) {
                        fields.insert(field.name.clone(), field);
                    }
                }
                SyntaxKind::Error => skip(&mut self.diagnostics, child, "start"),
                _ => {}
            }
        }
        self.exit();
    }

    fn when(&mut self, node: &SyntaxNode) {
        let triggers = node
            .child(SyntaxKind::FlowWhenTrigger)
            .map(|t| names(t, SyntaxKind::FlowWhenEventTrigger))
            .unwrap_or_default();
        tracing::debug!(?triggers, "entering when");
        self.scope.enter(Frame::When(When {
            triggers,
            ..When::default()
        }));
        self.apply_options(node);
        self.when_items(node);
        self.exit();
    }

    /// Direct children of a rule or branch: commands, events and policies go
    /// to the frame on top; conditional blocks push their own frames.
    fn when_items(&mut self, node: &SyntaxNode) {
        for child in &node.children {
            match child.kind {
                SyntaxKind::FlowWhenCommand => {
                    let command = child.child_text(SyntaxKind::Id).unwrap_or_default().to_owned();
                    self.with_actions(|a| a.commands.push(command));
                }
                SyntaxKind::FlowWhenEvent => {
                    let event = child.child_text(SyntaxKind::Id).unwrap_or_default().to_owned();
                    self.with_actions(|a| a.events.push(event));
                }
                SyntaxKind::FlowWhenPolicy => {
                    let policy = child
                        .child(SyntaxKind::Value)
                        .map(resolve_text)
                        .unwrap_or_default();
                    self.with_actions(|a| a.policies.push(policy));
                }
                SyntaxKind::FlowWhenIf => self.if_block(child),
                SyntaxKind::FlowWhenElseIf => {
                    self.scope.enter(Frame::ElseIf(ElseIf {
                        condition: condition(child),
                        ..ElseIf::default()
                    }));
                    self.when_items(child);
                    self.exit();
                }
                SyntaxKind::FlowWhenElse => {
                    self.scope.enter(Frame::Else(Actions::default()));
                    self.when_items(child);
                    self.exit();
                }
                SyntaxKind::Error => skip(&mut self.diagnostics, child, "when"),
                _ => {}
            }
        }
    }

    fn if_block(&mut self, node: &SyntaxNode) {
        self.scope.enter(Frame::If(If {
            condition: condition(node),
            ..If::default()
        }));
        self.when_items(node);
        self.exit();
    }

    fn with_actions(&mut self, f: impl FnOnce(&mut Actions)) {
        if let Some(actions) = self.scope.nearest_mut(Frame::actions_mut) {
            f(actions);
        }
    }

    fn end(&mut self, node: &SyntaxNode) {
        self.scope.enter(Frame::End(End::default()));
        self.apply_options(node);
        for child in &node.children {
            let events = names(child, SyntaxKind::Id);
            let Some(end) = self.scope.top_mut().and_then(Frame::end_mut) else {
                break;
            };
            let slot = match child.kind {
                SyntaxKind::FlowEndCompleted => &mut end.completed,
                SyntaxKind::FlowEndSuspended => &mut end.suspended,
                SyntaxKind::FlowEndCancelled => &mut end.cancelled,
                SyntaxKind::Error => {
                    skip(&mut self.diagnostics, child, "end");
                    continue;
                }
                _ => continue,
            };
            slot.get_or_insert_with(Vec::new).extend(events);
        }
        self.exit();
    }
}

fn names(node: &SyntaxNode, kind: SyntaxKind) -> Vec<String> {
    node.children_of(kind).map(|n| n.text.clone()).collect()
}

fn condition(node: &SyntaxNode) -> String {
    node.child(SyntaxKind::Value)
        .map(resolve_text)
        .unwrap_or_default()
}
