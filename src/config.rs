//! Generation options: global settings (tsdefgen.toml) and per-project
//! overrides (tsdefgen.json).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::GenerateError;
use crate::project::Project;

/// Name of the global settings file looked up in the home directory.
pub const GLOBAL_CONFIG_FILE: &str = "tsdefgen.toml";

/// Name of the per-project override file (matched case-insensitively).
pub const OVERRIDE_FILE: &str = "tsdefgen.json";

/// The recognised option set. Override files use PascalCase keys; camelCase
/// and snake_case are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Options {
    #[serde(alias = "camelCaseEnumerationValues", alias = "camel_case_enumeration_values")]
    pub camel_case_enumeration_values: bool,
    #[serde(alias = "camelCasePropertyNames", alias = "camel_case_property_names")]
    pub camel_case_property_names: bool,
    #[serde(alias = "camelCaseTypeNames", alias = "camel_case_type_names")]
    pub camel_case_type_names: bool,
    /// Module used for types declared outside any namespace.
    #[serde(alias = "defaultModuleName", alias = "default_module_name")]
    pub default_module_name: String,
    #[serde(alias = "classInsteadOfInterface", alias = "class_instead_of_interface")]
    pub class_instead_of_interface: bool,
    /// Emit declarations without a `declare module` wrapper.
    #[serde(alias = "globalScope", alias = "global_scope")]
    pub global_scope: bool,
    /// Render types outside the current file by name, without resolving them.
    #[serde(alias = "assumeExternalType", alias = "assume_external_type")]
    pub assume_external_type: bool,
    /// Reuse the reference directives already present in the output.
    #[serde(alias = "keepReferencesUnchanged", alias = "keep_references_unchanged")]
    pub keep_references_unchanged: bool,
    /// `Person.cs` -> `Person.cs.d.ts` instead of `Person.d.ts`.
    #[serde(alias = "includeOriginalExtension", alias = "include_original_extension")]
    pub include_original_extension: bool,
    #[serde(alias = "generatedFileExtension", alias = "generated_file_extension")]
    pub generated_file_extension: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            camel_case_enumeration_values: false,
            camel_case_property_names: true,
            camel_case_type_names: false,
            default_module_name: "Server.Dtos".to_string(),
            class_instead_of_interface: false,
            global_scope: false,
            assume_external_type: false,
            keep_references_unchanged: false,
            include_original_extension: true,
            generated_file_extension: ".d.ts".to_string(),
        }
    }
}

impl Options {
    /// Parse global settings from TOML.
    pub fn parse_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Parse a project override document.
    pub fn parse_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Load global settings from `path`, or from `~/tsdefgen.toml` when no
    /// path is given. A missing home file means defaults; an explicit path
    /// that cannot be read is an error. Malformed settings are reported and
    /// replaced by defaults.
    pub fn load_global(path: Option<&Path>) -> Result<Self, GenerateError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match simple_home_dir::home_dir() {
                Some(home) => (home.join(GLOBAL_CONFIG_FILE), false),
                None => return Ok(Self::default()),
            },
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|err| GenerateError::io(&path, err))?;
        match Self::parse_toml(&content) {
            Ok(options) => Ok(options),
            Err(err) => {
                warn!("ignoring malformed settings in {}: {err}", path.display());
                Ok(Self::default())
            }
        }
    }
}

/// Two-tier option lookup for one generation run. The override replaces the
/// base wholesale; fields are never merged.
#[derive(Debug, Clone)]
pub struct OptionsResolver {
    base: Options,
    override_options: Option<Options>,
    override_path: Option<PathBuf>,
}

impl OptionsResolver {
    pub fn new(base: Options) -> Self {
        Self {
            base,
            override_options: None,
            override_path: None,
        }
    }

    pub fn with_override(mut self, path: impl Into<PathBuf>, options: Options) -> Self {
        self.override_path = Some(path.into());
        self.override_options = Some(options);
        self
    }

    /// Resolve options for a project, reading its override file if present.
    pub fn for_project(base: Options, project: &Project) -> Result<Self, GenerateError> {
        let Some(path) = project.find_override() else {
            info!("Using Global Settings");
            return Ok(Self::new(base));
        };
        let content = fs::read_to_string(&path).map_err(|err| GenerateError::io(&path, err))?;
        let options = Options::parse_json(&content).map_err(|source| GenerateError::OverrideLoad {
            path: path.clone(),
            source,
        })?;
        info!("Override file processed: {}", path.display());
        Ok(Self::new(base).with_override(path, options))
    }

    pub fn effective(&self) -> &Options {
        self.override_options.as_ref().unwrap_or(&self.base)
    }

    pub fn override_path(&self) -> Option<&Path> {
        self.override_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(!options.camel_case_enumeration_values);
        assert!(options.camel_case_property_names);
        assert_eq!(options.default_module_name, "Server.Dtos");
        assert!(options.include_original_extension);
        assert_eq!(options.generated_file_extension, ".d.ts");
    }

    #[test]
    fn test_parse_override_pascal_case() {
        let options = Options::parse_json(
            r#"{ "GlobalScope": true, "DefaultModuleName": "Api", "CamelCasePropertyNames": false }"#,
        )
        .unwrap();
        assert!(options.global_scope);
        assert_eq!(options.default_module_name, "Api");
        assert!(!options.camel_case_property_names);
        // Missing keys take built-in defaults.
        assert_eq!(options.generated_file_extension, ".d.ts");
    }

    #[test]
    fn test_parse_override_camel_case() {
        let options =
            Options::parse_json(r#"{ "classInsteadOfInterface": true, "includeOriginalExtension": false }"#)
                .unwrap();
        assert!(options.class_instead_of_interface);
        assert!(!options.include_original_extension);
    }

    #[test]
    fn test_parse_global_toml() {
        let options = Options::parse_toml(
            r#"
camel_case_type_names = true
generated_file_extension = ".ts"
"#,
        )
        .unwrap();
        assert!(options.camel_case_type_names);
        assert_eq!(options.generated_file_extension, ".ts");
        assert!(options.camel_case_property_names);
    }

    #[test]
    fn test_malformed_override_is_an_error() {
        assert!(Options::parse_json("{ \"GlobalScope\": ").is_err());
        assert!(Options::parse_json(r#"{ "GlobalScope": "yes" }"#).is_err());
    }

    #[test]
    fn test_override_replaces_base_wholesale() {
        let base = Options {
            global_scope: true,
            default_module_name: "Base".to_string(),
            ..Options::default()
        };
        let resolver = OptionsResolver::new(base.clone());
        assert_eq!(resolver.effective(), &base);

        let over = Options::parse_json(r#"{ "CamelCaseTypeNames": true }"#).unwrap();
        let resolver = OptionsResolver::new(base).with_override("/p/tsdefgen.json", over);
        assert!(!resolver.effective().global_scope);
        assert_eq!(resolver.effective().default_module_name, "Server.Dtos");
        assert!(resolver.effective().camel_case_type_names);
        assert_eq!(resolver.override_path(), Some(Path::new("/p/tsdefgen.json")));
    }

    #[test]
    fn test_load_global_explicit_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Options::load_global(Some(&missing)).is_err());

        let malformed = dir.path().join("bad.toml");
        fs::write(&malformed, "global_scope = [").unwrap();
        assert_eq!(Options::load_global(Some(&malformed)).unwrap(), Options::default());
    }
}
