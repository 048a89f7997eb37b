//! C# source front end: turns `.cs` files into [`HostFile`](crate::host::HostFile) metadata.

mod lexer;
mod parser;
mod syntax;

pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse_file, parse_type_syntax, ParseError, ParseResult};
pub use syntax::TypeSyntax;
