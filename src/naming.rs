//! Casing transforms and generated file naming.

use std::path::{Path, PathBuf};

use crate::config::Options;
use crate::definition_map::DefinitionMapData;
use crate::model::Member;

/// Lowercase the first character: `FirstName` -> `firstName`.
pub fn camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn cased(name: &str, enabled: bool) -> String {
    if enabled {
        camel_case(name)
    } else {
        name.to_string()
    }
}

pub fn type_name(name: &str, options: &Options) -> String {
    cased(name, options.camel_case_type_names)
}

pub fn property_name(name: &str, options: &Options) -> String {
    cased(name, options.camel_case_property_names)
}

pub fn enum_value_name(name: &str, options: &Options) -> String {
    cased(name, options.camel_case_enumeration_values)
}

/// Declared name of a member, optional marker included. Attribute-fixed
/// names skip casing and are quoted when they are not identifiers
/// (`"user-id"?: string`).
pub fn member_name(member: &Member, options: &Options) -> String {
    if !member.explicit_name {
        return property_name(&member.name_with_option, options);
    }
    let optional = if member.is_optional() { "?" } else { "" };
    if is_identifier(&member.name) {
        format!("{}{optional}", member.name)
    } else {
        let quoted = serde_json::Value::String(member.name.clone());
        format!("{quoted}{optional}")
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Where generated files go, derived from the source file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    include_original_extension: bool,
    extension: String,
}

impl OutputNaming {
    pub fn new(include_original_extension: bool, extension: impl Into<String>) -> Self {
        Self {
            include_original_extension,
            extension: extension.into(),
        }
    }

    pub fn from_options(options: &Options) -> Self {
        Self::new(
            options.include_original_extension,
            options.generated_file_extension.as_str(),
        )
    }

    /// `Person.cs` -> `Person.cs.d.ts`, or `Person.d.ts` without the
    /// original extension.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        if self.include_original_extension {
            let mut path = source.as_os_str().to_owned();
            path.push(&self.extension);
            PathBuf::from(path)
        } else {
            source.with_extension(self.extension.trim_start_matches('.'))
        }
    }

    /// File name of the generated output for `source`.
    pub fn output_file_name(&self, source: &Path) -> String {
        self.output_path(source)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Sidecar metadata path for a generated output.
    pub fn map_path(output: &Path) -> PathBuf {
        let mut path = output.as_os_str().to_owned();
        path.push(".map");
        PathBuf::from(path)
    }

    /// Name used for copies and for references to this output: the custom
    /// name when one is set, else the source file name, run through the
    /// same extension rule.
    pub fn copy_file_name(&self, source: &Path, map: &DefinitionMapData) -> String {
        match map.custom_name() {
            Some(custom) => self.output_file_name(Path::new(custom)),
            None => self.output_file_name(Path::new(source.file_name().unwrap_or_default())),
        }
    }
}
