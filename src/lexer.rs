use crate::model::{BuiltIn, Position};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::{self, Display};

/// Represents the different kinds of tokens that the lexer can produce.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // == Special Tokens ==
    /// Represents the end of the input file.
    Eof,
    /// One or more whitespace characters (spaces, tabs, newlines).
    Whitespace,
    /// A comment, starting with `//` and continuing to the end of the line.
    /// The associated `String` holds the trimmed comment text.
    Comment(String),
    /// A character that starts no token. Always a syntax error.
    Unknown,

    // == Literals ==
    /// An identifier: `[a-zA-Z][a-zA-Z0-9_]*` that is not a reserved word.
    Identifier(String),
    /// A double-quoted string literal. Only used for import paths.
    StringLiteral(String),

    // == Keywords ==
    Namespace,
    Interface,
    Struct,
    Enum,
    Extends,
    Map,
    /// One of `string`, `int`, `float`, `bool`.
    BuiltIn(BuiltIn),

    /// The `[optional]` marker, lexed as a single token.
    Optional,

    // == Punctuation ==
    /// Left Brace: `{`
    LBrace,
    /// Right Brace: `}`
    RBrace,
    /// Left Bracket: `[`
    LBracket,
    /// Right Bracket: `]`
    RBracket,
    /// Left Parenthesis: `(`
    LParen,
    /// Right Parenthesis: `)`
    RParen,
    /// Semicolon: `;`
    Semicolon,
    /// Comma: `,`
    Comma,
    /// Dot: `.` (qualified-name separator)
    Dot,
}

impl TokenType {
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenType::Whitespace | TokenType::Comment(_))
    }
}

impl Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Eof => f.write_str("end of file"),
            TokenType::Whitespace => f.write_str("whitespace"),
            TokenType::Comment(_) => f.write_str("comment"),
            TokenType::Unknown => f.write_str("unrecognized character"),
            TokenType::Identifier(name) => write!(f, "identifier `{name}`"),
            TokenType::StringLiteral(value) => write!(f, "string \"{value}\""),
            TokenType::Namespace => f.write_str("'namespace'"),
            TokenType::Interface => f.write_str("'interface'"),
            TokenType::Struct => f.write_str("'struct'"),
            TokenType::Enum => f.write_str("'enum'"),
            TokenType::Extends => f.write_str("'extends'"),
            TokenType::Map => f.write_str("'map'"),
            TokenType::BuiltIn(b) => write!(f, "'{b}'"),
            TokenType::Optional => f.write_str("'[optional]'"),
            TokenType::LBrace => f.write_str("'{'"),
            TokenType::RBrace => f.write_str("'}'"),
            TokenType::LBracket => f.write_str("'['"),
            TokenType::RBracket => f.write_str("']'"),
            TokenType::LParen => f.write_str("'('"),
            TokenType::RParen => f.write_str("')'"),
            TokenType::Semicolon => f.write_str("';'"),
            TokenType::Comma => f.write_str("','"),
            TokenType::Dot => f.write_str("'.'"),
        }
    }
}

/// Reserved words, built once and shared by every lexer in the process.
static KEYWORDS: Lazy<HashMap<&'static str, TokenType>> = Lazy::new(|| {
    let mut keywords = HashMap::new();
    keywords.insert("namespace", TokenType::Namespace);
    keywords.insert("interface", TokenType::Interface);
    keywords.insert("struct", TokenType::Struct);
    keywords.insert("enum", TokenType::Enum);
    keywords.insert("extends", TokenType::Extends);
    keywords.insert("map", TokenType::Map);
    for builtin in BuiltIn::ALL {
        keywords.insert(builtin.as_str(), TokenType::BuiltIn(builtin));
    }
    keywords
});

const OPTIONAL_MARKER_TAIL: &str = "optional]";

/// A token with its type and position
#[derive(Debug, Clone)]
pub struct Token {
    pub ttype: TokenType,
    pub pos_start: usize,
    pub pos_end: usize,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column of the first character.
    pub column: usize,
}

impl Token {
    pub fn new(ttype: TokenType, pos_start: usize, pos_end: usize, line: usize, column: usize) -> Token {
        Token {
            ttype,
            pos_start,
            pos_end,
            line,
            column,
        }
    }

    pub fn position(&self, file: &str) -> Position {
        Position::new(file, self.line, self.column, self.pos_start)
    }

    pub fn len(&self) -> usize {
        self.pos_end - self.pos_start
    }

    pub fn is_empty(&self) -> bool {
        self.pos_end == self.pos_start
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenizes the whole input, trivia included. The last token is always `Eof`.
    pub fn lex(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if token.ttype == TokenType::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    pub fn next_token(&mut self) -> Token {
        let start_pos = self.position;
        let (line, column) = (self.line, self.column);

        let ttype = if let Some(char) = self.advance() {
            match char {
                '{' => TokenType::LBrace,
                '}' => TokenType::RBrace,
                ']' => TokenType::RBracket,
                '(' => TokenType::LParen,
                ')' => TokenType::RParen,
                ';' => TokenType::Semicolon,
                ',' => TokenType::Comma,
                '.' => TokenType::Dot,
                '[' => {
                    if self.input[self.position..].starts_with(OPTIONAL_MARKER_TAIL) {
                        for _ in 0..OPTIONAL_MARKER_TAIL.len() {
                            self.advance();
                        }
                        TokenType::Optional
                    } else {
                        TokenType::LBracket
                    }
                }
                '/' => {
                    if self.peek() == Some(&'/') {
                        self.read_comment()
                    } else {
                        TokenType::Unknown
                    }
                }
                '"' => self.read_string(),
                c if is_idl_whitespace(c) => self.read_whitespace(),
                c if c.is_ascii_alphabetic() => self.read_identifier(c),
                _ => TokenType::Unknown,
            }
        } else {
            TokenType::Eof
        };

        Token::new(ttype, start_pos, self.position, line, column)
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            self.position += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        char
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn read_whitespace(&mut self) -> TokenType {
        while let Some(&c) = self.peek() {
            if is_idl_whitespace(c) {
                self.advance();
            } else {
                break;
            }
        }
        TokenType::Whitespace
    }

    fn read_comment(&mut self) -> TokenType {
        self.advance(); // Consume the second '/'
        let mut comment_text = String::new();
        while let Some(&c) = self.peek() {
            if c == '\n' {
                break;
            }
            comment_text.push(c);
            self.advance();
        }
        TokenType::Comment(comment_text.trim().to_string())
    }

    fn read_string(&mut self) -> TokenType {
        let mut value = String::new();
        while let Some(&c) = self.peek() {
            self.advance();
            if c == '"' {
                return TokenType::StringLiteral(value);
            }
            value.push(c);
        }
        TokenType::Unknown // Unclosed string
    }

    fn read_identifier(&mut self, first_char: char) -> TokenType {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(&c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match KEYWORDS.get(ident.as_str()) {
            Some(keyword) => keyword.clone(),
            None => TokenType::Identifier(ident),
        }
    }
}

/// Spaces, tabs and line breaks. Other Unicode spaces are not separators.
fn is_idl_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tokens(input: &str, expected: Vec<TokenType>) {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.lex();
        let filtered_tokens: Vec<TokenType> = tokens
            .into_iter()
            .map(|t| t.ttype)
            .filter(|t| !t.is_trivia())
            .collect();

        assert_eq!(filtered_tokens, expected);
    }

    fn ident(name: &str) -> TokenType {
        TokenType::Identifier(name.to_string())
    }

    #[test]
    fn test_eof() {
        assert_tokens("", vec![TokenType::Eof]);
    }

    #[test]
    fn test_single_char_tokens() {
        let input = "{}[]();,.";
        let expected = vec![
            TokenType::LBrace,
            TokenType::RBrace,
            TokenType::LBracket,
            TokenType::RBracket,
            TokenType::LParen,
            TokenType::RParen,
            TokenType::Semicolon,
            TokenType::Comma,
            TokenType::Dot,
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_keywords() {
        let input = "namespace interface struct enum extends map string int float bool";
        let expected = vec![
            TokenType::Namespace,
            TokenType::Interface,
            TokenType::Struct,
            TokenType::Enum,
            TokenType::Extends,
            TokenType::Map,
            TokenType::BuiltIn(BuiltIn::String),
            TokenType::BuiltIn(BuiltIn::Int),
            TokenType::BuiltIn(BuiltIn::Float),
            TokenType::BuiltIn(BuiltIn::Bool),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_keyword_prefixes_are_identifiers() {
        let input = "internal strings mapping interfaces";
        let expected = vec![
            ident("internal"),
            ident("strings"),
            ident("mapping"),
            ident("interfaces"),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_optional_marker() {
        let input = "next Node [optional] tags []string";
        let expected = vec![
            ident("next"),
            ident("Node"),
            TokenType::Optional,
            ident("tags"),
            TokenType::LBracket,
            TokenType::RBracket,
            TokenType::BuiltIn(BuiltIn::String),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_spaced_optional_is_not_a_marker() {
        let input = "[ optional ]";
        let expected = vec![
            TokenType::LBracket,
            ident("optional"),
            TokenType::RBracket,
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_string_literal() {
        let input = r#"import "./common/types.pulse""#;
        let expected = vec![
            ident("import"),
            TokenType::StringLiteral("./common/types.pulse".to_string()),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_unclosed_string_is_unknown() {
        assert_tokens(r#""abc"#, vec![TokenType::Unknown, TokenType::Eof]);
    }

    #[test]
    fn test_invalid_identifier_starts() {
        assert_tokens(
            "_x 1a @",
            vec![
                TokenType::Unknown,
                ident("x"),
                TokenType::Unknown,
                ident("a"),
                TokenType::Unknown,
                TokenType::Eof,
            ],
        );
    }

    #[test]
    fn test_unicode_spaces_are_unknown() {
        assert_tokens(
            "a\u{2003}b\u{a0}",
            vec![
                ident("a"),
                TokenType::Unknown,
                ident("b"),
                TokenType::Unknown,
                TokenType::Eof,
            ],
        );
    }

    #[test]
    fn test_comments_and_whitespace() {
        let input = " // this is a comment\n name string // another one";
        let mut lexer = Lexer::new(input);
        let token_types: Vec<TokenType> = lexer.lex().into_iter().map(|t| t.ttype).collect();

        let expected = vec![
            TokenType::Whitespace,
            TokenType::Comment("this is a comment".to_string()),
            TokenType::Whitespace,
            ident("name"),
            TokenType::Whitespace,
            TokenType::BuiltIn(BuiltIn::String),
            TokenType::Whitespace,
            TokenType::Comment("another one".to_string()),
            TokenType::Eof,
        ];

        assert_eq!(token_types, expected);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let input = "struct User {\n  id string\n}";
        let tokens: Vec<Token> = Lexer::new(input)
            .lex()
            .into_iter()
            .filter(|t| !t.ttype.is_trivia())
            .collect();

        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 8));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
        assert_eq!((tokens[4].line, tokens[4].column), (2, 6));
        assert_eq!((tokens[5].line, tokens[5].column), (3, 1));
        assert_eq!(tokens[3].pos_start, 16);
    }

    #[test]
    fn test_complex_idl_structure() {
        let input = r#"
namespace inc

// A user
struct User extends base.Entity {
    tags map[string][]string [optional]
}

interface UserService {
    get(id string, opts Options) User [optional]
}
"#;
        let expected = vec![
            TokenType::Namespace,
            ident("inc"),
            TokenType::Struct,
            ident("User"),
            TokenType::Extends,
            ident("base"),
            TokenType::Dot,
            ident("Entity"),
            TokenType::LBrace,
            ident("tags"),
            TokenType::Map,
            TokenType::LBracket,
            TokenType::BuiltIn(BuiltIn::String),
            TokenType::RBracket,
            TokenType::LBracket,
            TokenType::RBracket,
            TokenType::BuiltIn(BuiltIn::String),
            TokenType::Optional,
            TokenType::RBrace,
            TokenType::Interface,
            ident("UserService"),
            TokenType::LBrace,
            ident("get"),
            TokenType::LParen,
            ident("id"),
            TokenType::BuiltIn(BuiltIn::String),
            TokenType::Comma,
            ident("opts"),
            ident("Options"),
            TokenType::RParen,
            ident("User"),
            TokenType::Optional,
            TokenType::RBrace,
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }
}
