use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tsdefgen::{
    DefinitionMapData, GenerateError, Generator, Options, OptionsResolver, Project, RenderMode,
};

const PERSON: &str = r#"using System;
using System.Collections.Generic;
using Shop.Core;

namespace Shop.Models
{
    /// <summary>
    /// A customer.
    /// </summary>
    public class Person : Entity
    {
        public string Name { get; set; }
        public int? Age { get; set; }
        public List<Address> Addresses { get; set; }
        public Status Status { get; set; }
        public void Touch() { }
    }

    public enum Status
    {
        Active = 1,
        Inactive = 0x02
    }
}
"#;

const ADDRESS: &str = r#"namespace Shop.Models
{
    public class Address
    {
        public string Street { get; set; }
    }
}
"#;

const ENTITY: &str = r#"using System;

namespace Shop.Core
{
    public abstract class Entity
    {
        public Guid Id { get; set; }
    }
}
"#;

const PERSON_DTS: &str = "/// <reference path=\"../Core/Entity.cs.d.ts\" />
/// <reference path=\"Address.cs.d.ts\" />

declare module Shop.Models {
\t/** A customer. */
\tinterface Person extends Shop.Core.Entity {
\t\tname: string;
\t\tage?: number;
\t\taddresses: Address[];
\t\tstatus: Status;
\t}
\tconst enum Status {
\t\tActive = 1,
\t\tInactive = 0x02,
\t}
}
";

struct Shop {
    _dir: TempDir,
    root: PathBuf,
}

impl Shop {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let shop = Shop { _dir: dir, root };
        shop.write("Shop.csproj", "<Project />");
        shop.write("Models/Person.cs", PERSON);
        shop.write("Models/Address.cs", ADDRESS);
        shop.write("Core/Entity.cs", ENTITY);
        shop
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    fn generator(&self, options: Options) -> Generator {
        Generator::new(Project::at(&self.root), options)
    }

    fn map(&self, relative_output: &str) -> DefinitionMapData {
        DefinitionMapData::from_json(&self.read(&format!("{relative_output}.map"))).unwrap()
    }
}

#[test]
fn test_generates_person_declarations() {
    let shop = Shop::new();
    let outcome = shop
        .generator(Options::default())
        .generate(&shop.path("Models/Person.cs"))
        .unwrap();
    assert!(outcome.written);
    assert_eq!(outcome.output, shop.path("Models/Person.cs.d.ts"));
    assert_eq!(shop.read("Models/Person.cs.d.ts"), PERSON_DTS);
}

#[test]
fn test_map_records_referenced_types() {
    let shop = Shop::new();
    shop.generator(Options::default())
        .generate(&shop.path("Models/Person.cs"))
        .unwrap();

    let raw = shop.read("Models/Person.cs.d.ts.map");
    assert!(raw.contains("\"ReferenceMetadata\""));
    assert!(raw.contains("\"CustomName\": null"));

    let map = shop.map("Models/Person.cs.d.ts");
    let entries: Vec<_> = map
        .reference_metadata
        .iter()
        .map(|meta| {
            (
                meta.type_name.as_str(),
                meta.project_name.as_str(),
                meta.project_item_name.as_str(),
            )
        })
        .collect();
    assert_eq!(
        entries,
        vec![
            ("Shop.Core.Entity", "Shop", "Core/Entity.cs"),
            ("Shop.Models.Address", "Shop", "Models/Address.cs"),
        ]
    );
}

#[test]
fn test_regeneration_is_byte_identical() {
    let shop = Shop::new();
    let generator = shop.generator(Options::default());
    generator.generate(&shop.path("Models/Person.cs")).unwrap();
    let first = shop.read("Models/Person.cs.d.ts");
    let first_map = shop.read("Models/Person.cs.d.ts.map");

    generator.generate(&shop.path("Models/Person.cs")).unwrap();
    assert_eq!(shop.read("Models/Person.cs.d.ts"), first);
    assert_eq!(shop.read("Models/Person.cs.d.ts.map"), first_map);
}

#[test]
fn test_override_file_replaces_global_options() {
    let shop = Shop::new();
    shop.write(
        "tsdefgen.json",
        r#"{ "CamelCasePropertyNames": false, "GlobalScope": true }"#,
    );
    let project = Project::at(&shop.root);
    let resolver = OptionsResolver::for_project(Options::default(), &project).unwrap();
    assert_eq!(resolver.override_path(), Some(shop.path("tsdefgen.json").as_path()));

    let generator = Generator::new(project, resolver.effective().clone());
    generator.generate(&shop.path("Models/Person.cs")).unwrap();
    let text = shop.read("Models/Person.cs.d.ts");
    assert!(text.contains("\ninterface Person extends Entity {\n\tName: string;\n"));
    assert!(text.contains("\ndeclare const enum Status {\n\tActive = 1,\n"));
    assert!(!text.contains("declare module"));
}

#[test]
fn test_malformed_override_fails_the_run() {
    let shop = Shop::new();
    shop.write("TsDefGen.json", "{ not json");
    let err = OptionsResolver::for_project(Options::default(), &Project::at(&shop.root)).unwrap_err();
    assert!(matches!(err, GenerateError::OverrideLoad { .. }));
    assert!(!shop.path("Models/Person.cs.d.ts").exists());
}

#[test]
fn test_parse_failure_leaves_previous_output() {
    let shop = Shop::new();
    let generator = shop.generator(Options::default());
    generator.generate(&shop.path("Models/Address.cs")).unwrap();
    let before = shop.read("Models/Address.cs.d.ts");

    shop.write("Models/Address.cs", "namespace Shop.Models { public class {");
    let err = generator.generate(&shop.path("Models/Address.cs")).unwrap_err();
    assert!(matches!(err, GenerateError::Parse { offset: Some(_), .. }));
    assert_eq!(shop.read("Models/Address.cs.d.ts"), before);
}

#[test]
fn test_copy_paths_report_failures_without_failing() {
    let shop = Shop::new();
    fs::create_dir_all(shop.path("dist")).unwrap();
    let map = DefinitionMapData {
        copy_paths: vec!["../dist".to_string(), "missing/dir".to_string(), " ".to_string()],
        ..DefinitionMapData::default()
    };
    shop.write("Models/Address.cs.d.ts.map", &map.to_json().unwrap());

    let outcome = shop
        .generator(Options::default())
        .generate(&shop.path("Models/Address.cs"))
        .unwrap();
    assert!(outcome.written);
    assert_eq!(outcome.copies.len(), 1);
    assert_eq!(
        fs::read_to_string(&outcome.copies[0]).unwrap(),
        shop.read("Models/Address.cs.d.ts")
    );
    assert_eq!(outcome.copy_failures.len(), 1);
    assert!(outcome.copy_failures[0]
        .path
        .ends_with("missing/dir/Address.cs.d.ts"));
    assert!(outcome.copy_failures[0]
        .to_string()
        .starts_with("Could not write file to \""));

    // Copy settings survive the map rewrite.
    assert_eq!(shop.map("Models/Address.cs.d.ts").copy_paths.len(), 3);
}

#[test]
fn test_custom_name_renames_references_and_copies() {
    let shop = Shop::new();
    fs::create_dir_all(shop.path("dist")).unwrap();
    let map = DefinitionMapData {
        custom_name: Some("address".to_string()),
        copy_paths: vec!["../dist".to_string()],
        ..DefinitionMapData::default()
    };
    shop.write("Models/Address.cs.d.ts.map", &map.to_json().unwrap());

    let generator = shop.generator(Options::default());
    let outcome = generator.generate(&shop.path("Models/Address.cs")).unwrap();
    assert_eq!(outcome.copies, vec![shop.path("Models/../dist/address.d.ts")]);

    generator.generate(&shop.path("Models/Person.cs")).unwrap();
    let text = shop.read("Models/Person.cs.d.ts");
    assert!(text.contains("/// <reference path=\"address.d.ts\" />\n"));
    assert!(!text.contains("Address.cs.d.ts"));
}

#[test]
fn test_keep_references_unchanged() {
    let shop = Shop::new();
    shop.write(
        "Models/Person.cs.d.ts",
        "/// <reference path=\"zeta.d.ts\" />\r\n/// <reference path=\"alpha.d.ts\" />\r\n\r\nstale\r\n",
    );
    let options = Options {
        keep_references_unchanged: true,
        ..Options::default()
    };
    shop.generator(options)
        .generate(&shop.path("Models/Person.cs"))
        .unwrap();
    let text = shop.read("Models/Person.cs.d.ts");
    assert!(text.starts_with(
        "/// <reference path=\"alpha.d.ts\" />\n/// <reference path=\"zeta.d.ts\" />\n\ndeclare module Shop.Models {\n"
    ));
    assert!(!text.contains("Entity.cs.d.ts"));
}

#[test]
fn test_assume_external_type_uses_cached_metadata() {
    let shop = Shop::new();
    // A full run caches where Address and Entity live.
    shop.generator(Options::default())
        .generate(&shop.path("Models/Person.cs"))
        .unwrap();

    let options = Options {
        assume_external_type: true,
        ..Options::default()
    };
    shop.generator(options)
        .generate(&shop.path("Models/Person.cs"))
        .unwrap();
    assert_eq!(shop.read("Models/Person.cs.d.ts"), PERSON_DTS);
}

#[test]
fn test_split_modes() {
    let shop = Shop::new();
    let enums = shop
        .generator(Options::default())
        .with_mode(RenderMode::EnumsOnly);
    let outcome = enums.generate(&shop.path("Models/Address.cs")).unwrap();
    assert!(!outcome.written);
    assert!(!shop.path("Models/Address.cs.d.ts").exists());

    let classes = shop
        .generator(Options::default())
        .with_mode(RenderMode::WithoutEnums);
    let translation = classes.translate(&shop.path("Models/Person.cs")).unwrap();
    assert!(translation.text.contains("interface Person"));
    assert!(!translation.text.contains("const enum"));
}

#[test]
fn test_output_naming_without_original_extension() {
    let shop = Shop::new();
    let options = Options {
        include_original_extension: false,
        ..Options::default()
    };
    let outcome = shop
        .generator(options)
        .generate(&shop.path("Models/Person.cs"))
        .unwrap();
    assert_eq!(outcome.output, shop.path("Models/Person.d.ts"));
    let text = shop.read("Models/Person.d.ts");
    assert!(text.starts_with(
        "/// <reference path=\"../Core/Entity.d.ts\" />\n/// <reference path=\"Address.d.ts\" />\n"
    ));
}

fn tsdefgen(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tsdefgen"));
    cmd.env("HOME", home).env_remove("TSDEFGEN_LOG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_generate_and_refresh() {
    let shop = Shop::new();
    let status = tsdefgen(&shop.root)
        .arg("generate")
        .arg(shop.path("Models/Person.cs"))
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(shop.read("Models/Person.cs.d.ts"), PERSON_DTS);

    fs::remove_file(shop.path("Models/Person.cs.d.ts")).unwrap();
    shop.write("Models/Address.cs.d.ts", "");
    let status = tsdefgen(&shop.root)
        .args(["refresh", "--project"])
        .arg(&shop.root)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(shop.read("Models/Address.cs.d.ts").contains("interface Address"));
    assert!(!shop.path("Models/Person.cs.d.ts").exists());
}

#[test]
fn test_cli_reports_failures_with_exit_code() {
    let shop = Shop::new();
    shop.write("Models/Broken.cs", "namespace Shop.Models { public class {");
    let output = tsdefgen(&shop.root)
        .arg("generate")
        .arg(shop.path("Models/Broken.cs"))
        .arg(shop.path("Models/Address.cs"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&output.stderr).is_empty());
    // The other file still ran.
    assert!(shop.path("Models/Address.cs.d.ts").exists());
}

#[test]
fn test_cli_prints_effective_options() {
    let shop = Shop::new();
    shop.write("tsdefgen.json", r#"{ "DefaultModuleName": "Api" }"#);
    let output = tsdefgen(&shop.root)
        .args(["options", "--project"])
        .arg(&shop.root)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\"DefaultModuleName\": \"Api\""));
    assert!(stdout.contains("\"CamelCasePropertyNames\": true"));
}
