use crate::error::{ValidationError, ValidationErrors};
use crate::model::{IdlModel, Position, Struct, Type};
use crate::utils::{base_name, is_valid_identifier};
use log::{debug, trace};
use std::collections::{HashMap, HashSet};

/// A registered top-level declaration.
#[derive(Debug, Clone)]
struct Symbol {
    kind: &'static str,
    pos: Position,
}

/// Checks a fully merged model.
///
/// Every problem is collected: the whole model is walked even after the first
/// error, and the result is `Ok` only when nothing was found.
pub fn validate(model: &IdlModel) -> Result<(), ValidationErrors> {
    let mut validator = Validator::new(model);
    validator.check_namespace();
    validator.register_types();
    validator.check_members();
    validator.resolve_types();
    validator.detect_cycles();

    let errors = validator.errors;
    debug!(
        "validated {}: {} interfaces, {} structs, {} enums, {} errors",
        model.file,
        model.interfaces.len(),
        model.structs.len(),
        model.enums.len(),
        errors.len()
    );
    if errors.has_errors() {
        Err(errors)
    } else {
        Ok(())
    }
}

struct Validator<'a> {
    model: &'a IdlModel,
    symbols: HashMap<&'a str, Symbol>,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    fn new(model: &'a IdlModel) -> Self {
        Self {
            model,
            symbols: HashMap::new(),
            errors: ValidationErrors::default(),
        }
    }

    fn check_namespace(&mut self) {
        if !self.model.is_empty() && self.model.root_namespace.is_empty() {
            self.errors.add(ValidationError::MissingNamespace {
                pos: Position::start_of(self.model.file.as_str()),
            });
        }
    }

    // === Registration ===

    fn register_types(&mut self) {
        let model = self.model;
        for iface in &model.interfaces {
            self.register(&iface.name, "interface", &iface.pos);
        }
        for s in &model.structs {
            self.register(&s.name, "struct", &s.pos);
        }
        for e in &model.enums {
            self.register(&e.name, "enum", &e.pos);
        }
    }

    fn register(&mut self, name: &'a str, kind: &'static str, pos: &Position) {
        if !self.check_identifier(base_name(name), pos) {
            return;
        }
        if let Some(previous) = self.symbols.get(name) {
            self.errors.add(ValidationError::DuplicateTypeName {
                name: name.to_string(),
                previous_kind: previous.kind,
                previous: previous.pos.clone(),
                pos: pos.clone(),
            });
            return;
        }
        trace!("registered {kind} {name}");
        self.symbols.insert(
            name,
            Symbol {
                kind,
                pos: pos.clone(),
            },
        );
    }

    fn check_identifier(&mut self, name: &str, pos: &Position) -> bool {
        if is_valid_identifier(name) {
            return true;
        }
        self.errors.add(ValidationError::InvalidIdentifier {
            name: name.to_string(),
            pos: pos.clone(),
        });
        false
    }

    fn check_members(&mut self) {
        let model = self.model;
        for iface in &model.interfaces {
            for method in &iface.methods {
                self.check_identifier(&method.name, &method.pos);
                for param in &method.parameters {
                    self.check_identifier(&param.name, &param.pos);
                }
            }
        }
        for s in &model.structs {
            for field in &s.fields {
                self.check_identifier(&field.name, &field.pos);
            }
        }
        for e in &model.enums {
            for value in &e.values {
                self.check_identifier(&value.name, &value.pos);
            }
        }
    }

    // === Type resolution ===

    fn resolve_types(&mut self) {
        let model = self.model;
        for iface in &model.interfaces {
            for method in &iface.methods {
                if let Some(ty) = &method.return_type {
                    self.resolve_type(ty);
                }
                for param in &method.parameters {
                    self.resolve_type(&param.ty);
                }
            }
        }
        for s in &model.structs {
            if !s.extends.is_empty() && !self.symbols.contains_key(s.extends.as_str()) {
                self.errors.add(ValidationError::ExtendsUnknownType {
                    name: s.name.clone(),
                    extends: s.extends.clone(),
                    pos: s.pos.clone(),
                });
            }
            for field in &s.fields {
                self.resolve_type(&field.ty);
            }
        }
    }

    fn resolve_type(&mut self, ty: &Type) {
        match ty {
            Type::BuiltIn(_) => {}
            Type::Array(element) => self.resolve_type(element),
            Type::Map(value) => self.resolve_type(value),
            Type::UserDefined(type_ref) => {
                if !self.symbols.contains_key(type_ref.name.as_str()) {
                    self.errors.add(ValidationError::UnknownType {
                        name: type_ref.name.clone(),
                        pos: type_ref.pos.clone(),
                    });
                }
            }
        }
    }

    // === Cycle detection ===

    fn detect_cycles(&mut self) {
        let model = self.model;
        let mut graph = StructGraph::new(model);
        for s in &model.structs {
            graph.visit(&s.name, &mut Vec::new(), &mut self.errors);
        }
    }
}

/// The struct reference graph: `extends` edges and edges through required
/// fields. Only structs are nodes; references to enums and interfaces end a path.
struct StructGraph<'a> {
    structs: HashMap<&'a str, &'a Struct>,
    visited: HashSet<&'a str>,
    on_stack: HashSet<&'a str>,
}

impl<'a> StructGraph<'a> {
    fn new(model: &'a IdlModel) -> Self {
        let mut structs = HashMap::new();
        for s in &model.structs {
            // First definition wins, as in registration.
            structs.entry(s.name.as_str()).or_insert(s);
        }
        Self {
            structs,
            visited: HashSet::new(),
            on_stack: HashSet::new(),
        }
    }

    fn edges(s: &'a Struct) -> Vec<&'a str> {
        let mut edges = Vec::new();
        if !s.extends.is_empty() {
            edges.push(s.extends.as_str());
        }
        for field in s.fields.iter().filter(|f| !f.optional) {
            edges.extend(field.ty.user_defined_names());
        }
        edges
    }

    fn visit(&mut self, name: &'a str, path: &mut Vec<&'a str>, errors: &mut ValidationErrors) {
        let Some(&node) = self.structs.get(name) else {
            return;
        };
        if self.on_stack.contains(name) {
            let start = path.iter().position(|n| *n == name).unwrap_or(0);
            let mut cycle: Vec<&str> = path[start..].to_vec();
            cycle.push(name);
            let cycle = cycle.join(" -> ");
            trace!("back edge to {name}: {cycle}");
            errors.add(ValidationError::CircularReference {
                cycle,
                pos: node.pos.clone(),
            });
            return;
        }
        if self.visited.contains(name) {
            return;
        }

        self.on_stack.insert(name);
        path.push(name);
        for next in Self::edges(node) {
            self.visit(next, path, errors);
        }
        path.pop();
        self.on_stack.remove(name);
        self.visited.insert(name);
    }
}
