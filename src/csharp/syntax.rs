//! Type syntax as written in C# member declarations.

use std::fmt;

/// A parsed type reference such as `List<Foo>`, `int?` or `Bar[][]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSyntax {
    /// Possibly qualified name with generic arguments: `System.Collections.Generic.List<int>`.
    Named { name: String, args: Vec<TypeSyntax> },
    /// `T[]`, `T[,]`.
    Array(Box<TypeSyntax>),
    /// `T?`.
    Nullable(Box<TypeSyntax>),
    /// `(int, string)`.
    Tuple(Vec<TypeSyntax>),
}

impl TypeSyntax {
    pub fn named(name: impl Into<String>) -> Self {
        TypeSyntax::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeSyntax>) -> Self {
        TypeSyntax::Named {
            name: name.into(),
            args,
        }
    }

    /// Last segment of a named type: `Generic.List` -> `List`.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TypeSyntax::Named { name, .. } => name.rsplit('.').next(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSyntax::Named { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeSyntax::Array(element) => write!(f, "{element}[]"),
            TypeSyntax::Nullable(inner) => write!(f, "{inner}?"),
            TypeSyntax::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}
