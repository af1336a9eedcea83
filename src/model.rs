use crate::utils::namespace_prefix;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Location of a syntax node in its source file. Attached when the node is
/// built and carried unchanged through resolution and merging.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Position {
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
    /// Byte offset from the start of the file.
    pub offset: usize,
}

impl Position {
    pub fn new(file: impl Into<String>, line: usize, column: usize, offset: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            offset,
        }
    }

    /// The first character of `file`.
    pub fn start_of(file: impl Into<String>) -> Self {
        Self::new(file, 1, 1, 0)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// The four primitive types of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltIn {
    String,
    Int,
    Float,
    Bool,
}

impl BuiltIn {
    pub const ALL: [BuiltIn; 4] = [BuiltIn::String, BuiltIn::Int, BuiltIn::Float, BuiltIn::Bool];

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltIn::String => "string",
            BuiltIn::Int => "int",
            BuiltIn::Float => "float",
            BuiltIn::Bool => "bool",
        }
    }

    pub fn from_name(name: &str) -> Option<BuiltIn> {
        BuiltIn::ALL.into_iter().find(|b| b.as_str() == name)
    }
}

impl Display for BuiltIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to a user-defined struct, enum or interface by its
/// (possibly namespace-qualified) name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub pos: Position,
}

/// A type expression. Arrays and maps nest to any depth; map keys are always `string`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    BuiltIn(BuiltIn),
    Array(Box<Type>),
    Map(Box<Type>),
    UserDefined(TypeRef),
}

impl Type {
    pub fn user_defined(name: impl Into<String>, pos: Position) -> Self {
        Type::UserDefined(TypeRef {
            name: name.into(),
            pos,
        })
    }

    pub fn is_built_in(&self) -> bool {
        matches!(self, Type::BuiltIn(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Type::Map(_))
    }

    pub fn is_user_defined(&self) -> bool {
        matches!(self, Type::UserDefined(_))
    }

    /// The user-defined type this expression refers to once every array and
    /// map layer is unwrapped, if any.
    pub fn referenced_type(&self) -> Option<&TypeRef> {
        match self {
            Type::BuiltIn(_) => None,
            Type::Array(element) => element.referenced_type(),
            Type::Map(value) => value.referenced_type(),
            Type::UserDefined(type_ref) => Some(type_ref),
        }
    }

    pub fn user_defined_names(&self) -> Vec<&str> {
        self.referenced_type()
            .map(|type_ref| vec![type_ref.name.as_str()])
            .unwrap_or_default()
    }

    /// Applies `f` to every user-defined reference inside this type.
    pub fn for_each_ref_mut(&mut self, f: &mut impl FnMut(&mut TypeRef)) {
        match self {
            Type::BuiltIn(_) => {}
            Type::Array(element) => element.for_each_ref_mut(f),
            Type::Map(value) => value.for_each_ref_mut(f),
            Type::UserDefined(type_ref) => f(type_ref),
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::BuiltIn(b) => write!(f, "{b}"),
            Type::Array(element) => write!(f, "[]{element}"),
            Type::Map(value) => write!(f, "map[string]{value}"),
            Type::UserDefined(type_ref) => f.write_str(&type_ref.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    pub optional: bool,
    pub comment: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Struct {
    pub name: String,
    pub namespace: String,
    /// Qualified name of the parent struct, empty when the struct extends nothing.
    pub extends: String,
    pub fields: Vec<Field>,
    pub comment: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// `None` means the method returns nothing.
    pub return_type: Option<Type>,
    pub return_optional: bool,
    pub comment: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    pub name: String,
    pub namespace: String,
    pub methods: Vec<Method>,
    pub comment: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    pub comment: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enum {
    pub name: String,
    pub namespace: String,
    pub values: Vec<EnumValue>,
    pub comment: String,
    pub pos: Position,
}

/// The fully merged type model of one top-level file and everything it imports.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdlModel {
    /// Path of the file this model was built from.
    #[serde(skip)]
    pub file: String,
    pub root_namespace: String,
    pub interfaces: Vec<Interface>,
    pub structs: Vec<Struct>,
    pub enums: Vec<Enum>,
}

/// The declarations of one namespace, as grouped by [`IdlModel::namespaces`].
#[derive(Debug, Default, PartialEq)]
pub struct NamespaceTypes<'a> {
    pub structs: Vec<&'a Struct>,
    pub enums: Vec<&'a Enum>,
    pub interfaces: Vec<&'a Interface>,
}

impl IdlModel {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.structs.is_empty() && self.enums.is_empty()
    }

    pub fn find_struct(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn find_enum(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn find_interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    /// Groups every declaration by namespace. A declaration without a
    /// namespace field falls back to the prefix of its qualified name.
    pub fn namespaces(&self) -> BTreeMap<String, NamespaceTypes<'_>> {
        let mut groups: BTreeMap<String, NamespaceTypes<'_>> = BTreeMap::new();
        for s in &self.structs {
            let ns = namespace_of(&s.name, &s.namespace);
            groups.entry(ns).or_default().structs.push(s);
        }
        for e in &self.enums {
            let ns = namespace_of(&e.name, &e.namespace);
            groups.entry(ns).or_default().enums.push(e);
        }
        for i in &self.interfaces {
            let ns = namespace_of(&i.name, &i.namespace);
            groups.entry(ns).or_default().interfaces.push(i);
        }
        groups
    }
}

fn namespace_of(name: &str, namespace: &str) -> String {
    if namespace.is_empty() {
        namespace_prefix(name).to_string()
    } else {
        namespace.to_string()
    }
}
