//! Renders type model objects as `.d.ts` text.
//!
//! Output is a pure function of the objects, the reference list and the
//! options, so regenerating unchanged input reproduces the file byte for byte.

use std::fmt::Write;

use indexmap::IndexMap;

use crate::config::Options;
use crate::model::{Member, TypeModelObject};
use crate::naming;
use crate::references::directive;

/// Which objects a render includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Full,
    EnumsOnly,
    WithoutEnums,
}

impl RenderMode {
    fn includes(self, obj: &TypeModelObject) -> bool {
        match self {
            RenderMode::Full => true,
            RenderMode::EnumsOnly => obj.is_enum,
            RenderMode::WithoutEnums => !obj.is_enum,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub text: String,
    /// No object survived the mode's filter; callers skip writing.
    pub is_empty: bool,
}

/// Render `objects` grouped by namespace, in first-seen order, preceded by
/// the reference directives.
pub fn render(
    objects: &[TypeModelObject],
    references: &[String],
    options: &Options,
    mode: RenderMode,
) -> RenderOutput {
    let mut groups: IndexMap<&str, Vec<&TypeModelObject>> = IndexMap::new();
    for obj in objects.iter().filter(|obj| mode.includes(obj)) {
        groups.entry(obj.namespace.as_str()).or_default().push(obj);
    }
    if groups.is_empty() {
        return RenderOutput {
            text: String::new(),
            is_empty: true,
        };
    }

    let mut writer = Writer {
        out: String::new(),
        options,
    };
    if !references.is_empty() {
        for path in references {
            writer.line(&directive(path));
        }
        writer.out.push('\n');
    }
    for (namespace, objects) in groups {
        writer.namespace(namespace, &objects);
    }
    RenderOutput {
        text: writer.out,
        is_empty: false,
    }
}

/// Clean an enum initializer for the target runtime. Numeric literals lose
/// integer suffixes (`u`, `l`) and leading zeros, so the value is not read as
/// octal; hex and binary literals keep their digits. Anything else, such as a
/// reference to another member or a `|` expression, is kept as written.
pub fn clean_enum_init_value(value: &str) -> String {
    let value = value.trim();
    let (sign, digits) = match value.strip_prefix('-') {
        Some(rest) => ("-", rest.trim_start()),
        None => ("", value),
    };
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return value.to_string();
    }
    let literal = digits.trim_end_matches(['u', 'U', 'l', 'L']);
    if !literal.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return value.to_string();
    }
    let lower = literal.to_ascii_lowercase();
    if lower.starts_with("0x") || lower.starts_with("0b") {
        return format!("{sign}{literal}");
    }
    match literal.trim_start_matches('0') {
        "" => "0".to_string(),
        trimmed => format!("{sign}{trimmed}"),
    }
}

/// Collapse doc text onto one line.
fn doc_text(summary: &str) -> String {
    summary
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace("*/", "*\\/")
}

struct Writer<'a> {
    out: String,
    options: &'a Options,
}

impl Writer<'_> {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn doc(&mut self, indent: &str, summary: Option<&str>) {
        if let Some(summary) = summary {
            let text = doc_text(summary);
            if !text.is_empty() {
                writeln!(self.out, "{indent}/** {text} */").unwrap();
            }
        }
    }

    fn namespace(&mut self, namespace: &str, objects: &[&TypeModelObject]) {
        let global = self.options.global_scope;
        let indent = if global { "" } else { "\t" };
        if !global {
            writeln!(self.out, "declare module {namespace} {{").unwrap();
        }
        for obj in objects {
            self.doc(indent, obj.summary.as_deref());
            if obj.is_enum {
                self.enumeration(indent, obj);
            } else {
                self.class(indent, obj);
            }
        }
        if !global {
            self.line("}");
        }
    }

    fn enumeration(&mut self, indent: &str, obj: &TypeModelObject) {
        // Top-level declarations in a .d.ts need `declare`.
        let declare = if self.options.global_scope { "declare " } else { "" };
        let name = naming::type_name(&obj.name, self.options);
        writeln!(self.out, "{indent}{declare}const enum {name} {{").unwrap();
        let member_indent = format!("{indent}\t");
        for member in &obj.properties {
            self.doc(&member_indent, member.summary.as_deref());
            let name = naming::enum_value_name(&member.name, self.options);
            match &member.init_expression {
                Some(init) => {
                    let value = clean_enum_init_value(init);
                    writeln!(self.out, "{member_indent}{name} = {value},").unwrap();
                }
                None => {
                    writeln!(self.out, "{member_indent}{name},").unwrap();
                }
            }
        }
        writeln!(self.out, "{indent}}}").unwrap();
    }

    fn class(&mut self, indent: &str, obj: &TypeModelObject) {
        let keyword = match (self.options.class_instead_of_interface, self.options.global_scope) {
            (true, true) => "declare class",
            (true, false) => "class",
            (false, _) => "interface",
        };
        let name = naming::type_name(&obj.name, self.options);
        write!(self.out, "{indent}{keyword} {name} ").unwrap();
        if obj.has_base() {
            self.out.push_str("extends ");
            if !obj.base_namespace.is_empty()
                && obj.base_namespace != obj.namespace
                && !self.options.global_scope
            {
                write!(self.out, "{}.", obj.base_namespace).unwrap();
            }
            write!(self.out, "{} ", naming::type_name(&obj.base_name, self.options)).unwrap();
        }
        self.shape(indent, &obj.properties);
        self.out.push('\n');
    }

    /// `{ ...members... }` with the closing brace at `indent`, no newline.
    fn shape(&mut self, indent: &str, members: &[Member]) {
        self.out.push_str("{\n");
        let member_indent = format!("{indent}\t");
        for member in members {
            self.doc(&member_indent, member.summary.as_deref());
            let name = naming::member_name(member, self.options);
            write!(self.out, "{member_indent}{name}: ").unwrap();
            match &member.ty.shape {
                _ if member.ty.is_known_type => self.out.push_str(&member.ty.rendered_name),
                Some(members) => self.shape(&member_indent, members),
                None => self.out.push_str("any"),
            }
            if member.ty.is_array {
                self.out.push_str("[]");
            }
            self.out.push_str(";\n");
        }
        self.out.push_str(indent);
        self.out.push('}');
    }
}
