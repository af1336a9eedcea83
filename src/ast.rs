use crate::comments::CommentExtractor;
use crate::error::ImportError;
use crate::model::{
    Enum, EnumValue, Field, IdlModel, Interface, Method, Parameter, Position, Struct, Type,
};
use miette::NamedSource;

/// A name as written in the source, with the position of its first character.
#[derive(Debug, PartialEq, Clone)]
pub struct Ident {
    pub name: String,
    pub pos: Position,
}

impl Ident {
    /// Source span of the name, for diagnostics.
    pub fn span(&self) -> (usize, usize) {
        (self.pos.offset, self.name.len())
    }
}

/// An `import "<path>"` directive lifted out of the token stream before parsing.
#[derive(Debug, PartialEq, Clone)]
pub struct ImportDirective {
    pub path: String,
    pub pos: Position,
    pub pos_start: usize,
    pub pos_end: usize,
}

/// The syntax tree of one file.
#[derive(Debug, PartialEq, Clone)]
pub struct SourceFile {
    pub file: String,
    pub imports: Vec<ImportDirective>,
    pub elements: Vec<Element>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Element {
    Namespace(NamespaceDecl),
    Interface(InterfaceDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
}

#[derive(Debug, PartialEq, Clone)]
pub struct NamespaceDecl {
    pub name: Ident,
    pub pos: Position,
}

#[derive(Debug, PartialEq, Clone)]
pub struct InterfaceDecl {
    pub name: Ident,
    pub methods: Vec<MethodDecl>,
    pub pos: Position,
    /// Line of the opening brace.
    pub body_line: usize,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodDecl {
    pub name: Ident,
    pub params: Vec<ParamDecl>,
    pub return_type: Type,
    pub return_optional: bool,
    pub pos: Position,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ParamDecl {
    pub name: Ident,
    pub ty: Type,
    pub pos: Position,
}

#[derive(Debug, PartialEq, Clone)]
pub struct StructDecl {
    pub name: Ident,
    /// The qualified parent name, joined with `.`.
    pub extends: Option<Ident>,
    pub fields: Vec<FieldDecl>,
    pub pos: Position,
    pub body_line: usize,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FieldDecl {
    pub name: Ident,
    pub ty: Type,
    pub optional: bool,
    pub pos: Position,
}

#[derive(Debug, PartialEq, Clone)]
pub struct EnumDecl {
    pub name: Ident,
    pub values: Vec<Ident>,
    pub pos: Position,
    pub body_line: usize,
}

impl SourceFile {
    /// The file's namespace declaration, rejecting a second one.
    pub fn namespace(&self, source_text: &str) -> Result<Option<&NamespaceDecl>, ImportError> {
        let mut found: Option<&NamespaceDecl> = None;
        for element in &self.elements {
            if let Element::Namespace(decl) = element {
                if found.is_some() {
                    return Err(ImportError::MultipleNamespaces {
                        file: self.file.clone(),
                        src: NamedSource::new(self.file.clone(), source_text.to_string()),
                        span: decl.name.span().into(),
                        pos: decl.pos.clone(),
                    });
                }
                found = Some(decl);
            }
        }
        Ok(found)
    }

    /// Lowers this file's own declarations into a model, attaching doc
    /// comments from `source_text`. Imports are not followed here.
    pub fn into_model(self, source_text: &str) -> Result<IdlModel, ImportError> {
        let namespace = self
            .namespace(source_text)?
            .map(|decl| decl.name.name.clone())
            .unwrap_or_default();
        let comments = CommentExtractor::new(source_text);

        let mut model = IdlModel::new(self.file);
        model.root_namespace = namespace.clone();

        for element in self.elements {
            match element {
                Element::Namespace(_) => {}
                Element::Interface(decl) => {
                    let body_line = decl.body_line;
                    model.interfaces.push(Interface {
                        name: decl.name.name,
                        namespace: namespace.clone(),
                        methods: decl
                            .methods
                            .into_iter()
                            .map(|m| Method {
                                comment: comments.preceding_within(m.pos.line, body_line),
                                name: m.name.name,
                                parameters: m
                                    .params
                                    .into_iter()
                                    .map(|p| Parameter {
                                        name: p.name.name,
                                        ty: p.ty,
                                        pos: p.pos,
                                    })
                                    .collect(),
                                return_type: Some(m.return_type),
                                return_optional: m.return_optional,
                                pos: m.pos,
                            })
                            .collect(),
                        comment: comments.preceding(decl.pos.line),
                        pos: decl.pos,
                    });
                }
                Element::Struct(decl) => {
                    let body_line = decl.body_line;
                    model.structs.push(Struct {
                        name: decl.name.name,
                        namespace: namespace.clone(),
                        extends: decl.extends.map(|e| e.name).unwrap_or_default(),
                        fields: decl
                            .fields
                            .into_iter()
                            .map(|f| Field {
                                comment: comments.preceding_within(f.pos.line, body_line),
                                name: f.name.name,
                                ty: f.ty,
                                optional: f.optional,
                                pos: f.pos,
                            })
                            .collect(),
                        comment: comments.preceding(decl.pos.line),
                        pos: decl.pos,
                    });
                }
                Element::Enum(decl) => {
                    let body_line = decl.body_line;
                    model.enums.push(Enum {
                        name: decl.name.name,
                        namespace: namespace.clone(),
                        values: decl
                            .values
                            .into_iter()
                            .map(|v| EnumValue {
                                comment: comments.preceding_within(v.pos.line, body_line),
                                name: v.name,
                                pos: v.pos,
                            })
                            .collect(),
                        comment: comments.preceding(decl.pos.line),
                        pos: decl.pos,
                    });
                }
            }
        }

        Ok(model)
    }
}
