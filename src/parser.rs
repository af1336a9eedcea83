use crate::ast::*;
use crate::error::SyntaxError;
use crate::lexer::{Lexer, Token, TokenType};
use crate::model::{BuiltIn, Position, Type, TypeRef};
use crate::resolver::extract_imports;
use miette::NamedSource;

/// A recursive descent parser for the IDL grammar.
///
/// Construction lexes the whole file, rejects unrecognized characters, drops
/// whitespace and comments and lifts `import` directives out of the stream, so
/// the grammar below never sees them.
#[derive(Debug)]
pub struct Parser {
    source: NamedSource<String>,
    file: String,
    tokens: Vec<Token>,
    imports: Vec<ImportDirective>,
    position: usize,
}

impl Parser {
    pub fn new(source_text: &str) -> Result<Self, SyntaxError> {
        Self::new_with_name(source_text, "source.pulse".to_string())
    }

    pub fn new_with_name(source_text: &str, name: String) -> Result<Self, SyntaxError> {
        let source = NamedSource::new(name.clone(), source_text.to_string());
        let mut lexer = Lexer::new(source_text);
        let tokens = lexer.lex();

        if let Some(bad) = tokens.iter().find(|t| t.ttype == TokenType::Unknown) {
            return Err(SyntaxError::InvalidToken {
                src: source,
                span: (bad.pos_start, bad.len()).into(),
                text: source_text[bad.pos_start..bad.pos_end].to_string(),
                pos: bad.position(&name),
            });
        }

        let tokens: Vec<Token> = tokens.into_iter().filter(|t| !t.ttype.is_trivia()).collect();
        let (imports, tokens) = extract_imports(tokens, &name);

        Ok(Self {
            source,
            file: name,
            tokens,
            imports,
            position: 0,
        })
    }

    // === Main Parsing Methods ===

    /// File ::= { Element }
    pub fn parse_source_file(&mut self) -> Result<SourceFile, SyntaxError> {
        let mut elements = Vec::new();
        while !self.check(TokenType::Eof) {
            elements.push(self.parse_element()?);
        }
        Ok(SourceFile {
            file: self.file.clone(),
            imports: std::mem::take(&mut self.imports),
            elements,
        })
    }

    /// Element ::= NamespaceDecl | InterfaceDecl | StructDecl | EnumDecl
    fn parse_element(&mut self) -> Result<Element, SyntaxError> {
        match self.current_token().ttype {
            TokenType::Namespace => self.parse_namespace().map(Element::Namespace),
            TokenType::Interface => self.parse_interface().map(Element::Interface),
            TokenType::Struct => self.parse_struct().map(Element::Struct),
            TokenType::Enum => self.parse_enum().map(Element::Enum),
            _ => self.err_unexpected("'namespace', 'interface', 'struct' or 'enum'"),
        }
    }

    /// NamespaceDecl ::= "namespace" Ident
    fn parse_namespace(&mut self) -> Result<NamespaceDecl, SyntaxError> {
        let pos = self.current_position();
        self.expect(TokenType::Namespace)?;
        let name = self.parse_ident("a namespace name")?;
        Ok(NamespaceDecl { name, pos })
    }

    /// InterfaceDecl ::= "interface" Ident "{" { Method } "}"
    fn parse_interface(&mut self) -> Result<InterfaceDecl, SyntaxError> {
        let pos = self.current_position();
        self.expect(TokenType::Interface)?;
        let name = self.parse_ident("an interface name")?;
        let body_line = self.current_token().line;
        self.expect(TokenType::LBrace)?;
        let mut methods = Vec::new();
        while !self.check(TokenType::RBrace) {
            methods.push(self.parse_method()?);
        }
        self.expect(TokenType::RBrace)?;
        Ok(InterfaceDecl {
            name,
            methods,
            pos,
            body_line,
        })
    }

    /// Method ::= Ident "(" [ Param { "," Param } ] ")" Type [ "[optional]" ]
    fn parse_method(&mut self) -> Result<MethodDecl, SyntaxError> {
        let pos = self.current_position();
        let name = self.parse_ident("a method name or '}'")?;
        self.expect(TokenType::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenType::RParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::RParen)?;
        let return_type = self.parse_type()?;
        let return_optional = self.match_token(TokenType::Optional);
        Ok(MethodDecl {
            name,
            params,
            return_type,
            return_optional,
            pos,
        })
    }

    /// Param ::= Ident Type
    fn parse_param(&mut self) -> Result<ParamDecl, SyntaxError> {
        let pos = self.current_position();
        let name = self.parse_ident("a parameter name")?;
        let ty = self.parse_type()?;
        Ok(ParamDecl { name, ty, pos })
    }

    /// StructDecl ::= "struct" Ident [ "extends" QualifiedName ] "{" { Field } "}"
    fn parse_struct(&mut self) -> Result<StructDecl, SyntaxError> {
        let pos = self.current_position();
        self.expect(TokenType::Struct)?;
        let name = self.parse_ident("a struct name")?;
        let extends = if self.match_token(TokenType::Extends) {
            Some(self.parse_qualified_name("a parent struct name")?)
        } else {
            None
        };
        let body_line = self.current_token().line;
        self.expect(TokenType::LBrace)?;
        let mut fields = Vec::new();
        while !self.check(TokenType::RBrace) {
            fields.push(self.parse_field()?);
        }
        self.expect(TokenType::RBrace)?;
        Ok(StructDecl {
            name,
            extends,
            fields,
            pos,
            body_line,
        })
    }

    /// Field ::= Ident Type [ "[optional]" ]
    fn parse_field(&mut self) -> Result<FieldDecl, SyntaxError> {
        let pos = self.current_position();
        let name = self.parse_ident("a field name or '}'")?;
        let ty = self.parse_type()?;
        let optional = self.match_token(TokenType::Optional);
        Ok(FieldDecl {
            name,
            ty,
            optional,
            pos,
        })
    }

    /// EnumDecl ::= "enum" Ident "{" { Ident } "}"
    fn parse_enum(&mut self) -> Result<EnumDecl, SyntaxError> {
        let pos = self.current_position();
        self.expect(TokenType::Enum)?;
        let name = self.parse_ident("an enum name")?;
        let body_line = self.current_token().line;
        self.expect(TokenType::LBrace)?;
        let mut values = Vec::new();
        while !self.check(TokenType::RBrace) {
            values.push(self.parse_ident("an enum value or '}'")?);
        }
        self.expect(TokenType::RBrace)?;
        Ok(EnumDecl {
            name,
            values,
            pos,
            body_line,
        })
    }

    // === EBNF Sub-Rules ===

    /// Type ::= BuiltIn | "[" "]" Type | "map" "[" "string" "]" Type | QualifiedName
    fn parse_type(&mut self) -> Result<Type, SyntaxError> {
        match self.current_token().ttype.clone() {
            TokenType::BuiltIn(builtin) => {
                self.advance();
                Ok(Type::BuiltIn(builtin))
            }
            TokenType::LBracket => {
                self.advance();
                self.expect(TokenType::RBracket)?;
                let element = self.parse_type()?;
                Ok(Type::Array(Box::new(element)))
            }
            TokenType::Map => {
                self.advance();
                self.expect(TokenType::LBracket)?;
                if self.current_token().ttype != TokenType::BuiltIn(BuiltIn::String) {
                    return self.err_unexpected("'string' (map keys are always string)");
                }
                self.advance();
                self.expect(TokenType::RBracket)?;
                let value = self.parse_type()?;
                Ok(Type::Map(Box::new(value)))
            }
            TokenType::Identifier(_) => {
                let name = self.parse_qualified_name("a type")?;
                Ok(Type::UserDefined(TypeRef {
                    name: name.name,
                    pos: name.pos,
                }))
            }
            _ => self.err_unexpected("a type"),
        }
    }

    /// QualifiedName ::= Ident { "." Ident }
    fn parse_qualified_name(&mut self, expected: &str) -> Result<Ident, SyntaxError> {
        let first = self.parse_ident(expected)?;
        let mut name = first.name;
        while self.match_token(TokenType::Dot) {
            let part = self.parse_ident("an identifier after '.'")?;
            name.push('.');
            name.push_str(&part.name);
        }
        Ok(Ident {
            name,
            pos: first.pos,
        })
    }

    fn parse_ident(&mut self, expected: &str) -> Result<Ident, SyntaxError> {
        let token = self.current_token();
        if let TokenType::Identifier(name) = &token.ttype {
            let ident = Ident {
                name: name.clone(),
                pos: token.position(&self.file),
            };
            self.advance();
            Ok(ident)
        } else {
            self.err_unexpected(expected)
        }
    }

    // === Tokenizer Helper Methods ===

    fn current_token(&self) -> &Token {
        // The stream always ends with `Eof` and `advance` never steps past it.
        &self.tokens[self.position]
    }

    fn current_position(&self) -> Position {
        self.current_token().position(&self.file)
    }

    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: TokenType) -> Result<(), SyntaxError> {
        if self.check(expected.clone()) {
            self.advance();
            Ok(())
        } else {
            self.err_unexpected(&expected.to_string())
        }
    }

    fn match_token(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, ttype: TokenType) -> bool {
        std::mem::discriminant(&self.current_token().ttype) == std::mem::discriminant(&ttype)
    }

    fn err_unexpected<T>(&self, expected: &str) -> Result<T, SyntaxError> {
        let token = self.current_token();
        let pos = token.position(&self.file);
        if token.ttype == TokenType::Eof {
            return Err(SyntaxError::UnexpectedEof {
                src: self.source.clone(),
                span: (token.pos_start, 0).into(),
                expected: expected.to_string(),
                pos,
            });
        }
        Err(SyntaxError::UnexpectedToken {
            src: self.source.clone(),
            span: (token.pos_start, token.len()).into(),
            found: token.ttype.to_string(),
            expected: expected.to_string(),
            pos,
        })
    }
}
