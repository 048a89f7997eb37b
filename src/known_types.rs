//! Host primitive and collection types with a direct declaration-language form.

use crate::csharp::TypeSyntax;

/// How a host type maps onto the declaration language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownType<'a> {
    /// Final rendered name: `number`, `string`, `boolean`, `Date`, `any`.
    Primitive(&'static str),
    /// One level of array or collection around an element type.
    Collection(&'a TypeSyntax),
    /// Key/value map, rendered as an index signature.
    Dictionary {
        key: &'a TypeSyntax,
        value: &'a TypeSyntax,
    },
    /// `T?` or `Nullable<T>`.
    Nullable(&'a TypeSyntax),
    /// Anything else: a class, enum or type we know nothing about.
    Unknown,
}

const COLLECTIONS: &[&str] = &[
    "List",
    "IList",
    "IEnumerable",
    "ICollection",
    "IReadOnlyList",
    "IReadOnlyCollection",
    "HashSet",
    "ISet",
    "IReadOnlySet",
    "SortedSet",
    "Collection",
    "ReadOnlyCollection",
    "ObservableCollection",
    "LinkedList",
    "Queue",
    "Stack",
    "ConcurrentBag",
    "ImmutableArray",
    "ImmutableList",
    "ImmutableHashSet",
    "IImmutableList",
    "IQueryable",
    "IAsyncEnumerable",
];

const DICTIONARIES: &[&str] = &[
    "Dictionary",
    "IDictionary",
    "IReadOnlyDictionary",
    "SortedDictionary",
    "SortedList",
    "ConcurrentDictionary",
    "ImmutableDictionary",
    "IImmutableDictionary",
];

/// Classify a parsed host type. Pure; no project knowledge involved.
pub fn classify(ty: &TypeSyntax) -> KnownType<'_> {
    match ty {
        TypeSyntax::Nullable(inner) => KnownType::Nullable(inner),
        TypeSyntax::Array(element) => KnownType::Collection(element),
        TypeSyntax::Tuple(_) => KnownType::Primitive("any"),
        TypeSyntax::Named { name, args } => {
            let simple = strip_namespace(name);
            match args.as_slice() {
                [] => match primitive(simple) {
                    Some(rendered) => KnownType::Primitive(rendered),
                    None if matches!(simple, "IEnumerable" | "ArrayList" | "ICollection" | "IList") => {
                        KnownType::Primitive("any[]")
                    }
                    None => KnownType::Unknown,
                },
                [inner] if simple == "Nullable" => KnownType::Nullable(inner),
                [inner] if COLLECTIONS.contains(&simple) => KnownType::Collection(inner),
                [key, value] if DICTIONARIES.contains(&simple) => KnownType::Dictionary { key, value },
                [inner] if simple == "Task" || simple == "ValueTask" => classify(inner),
                _ => KnownType::Unknown,
            }
        }
    }
}

/// Render name for a primitive host type, accepting keyword aliases and
/// `System.` CLR names alike.
pub fn primitive(name: &str) -> Option<&'static str> {
    let rendered = match strip_namespace(name) {
        "byte" | "sbyte" | "short" | "ushort" | "int" | "uint" | "long" | "ulong" | "float"
        | "double" | "decimal" | "nint" | "nuint" | "Byte" | "SByte" | "Int16" | "UInt16"
        | "Int32" | "UInt32" | "Int64" | "UInt64" | "Single" | "Double" | "Decimal"
        | "BigInteger" | "Half" => "number",
        "string" | "char" | "String" | "Char" | "Guid" | "Uri" | "TimeSpan" | "TimeOnly" => {
            "string"
        }
        "bool" | "Boolean" => "boolean",
        "DateTime" | "DateTimeOffset" | "DateOnly" => "Date",
        "object" | "dynamic" | "Object" | "JToken" | "JObject" | "JsonElement" => "any",
        _ => return None,
    };
    Some(rendered)
}

/// Whether a dictionary key renders as a `number` index signature.
pub fn is_numeric_key(key: &TypeSyntax) -> bool {
    match key {
        TypeSyntax::Named { name, args } if args.is_empty() => primitive(name) == Some("number"),
        _ => false,
    }
}

fn strip_namespace(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
