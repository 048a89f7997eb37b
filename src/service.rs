//! One generation run per source file: load map, parse, resolve references,
//! render, write, copy, save map.

use std::cell::OnceCell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::Options;
use crate::csharp;
use crate::definition_map::{DefinitionMapData, DefinitionMapStore, FileSystemStore};
use crate::error::{GenerateError, WriteFailure};
use crate::host::{HostFile, ProjectIndex};
use crate::naming::OutputNaming;
use crate::parser::{self, ParseContext};
use crate::project::Project;
use crate::references::ReferenceResolver;
use crate::writer::{self, RenderMode};

/// The rendered result of one source file, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct Translation {
    pub source: PathBuf,
    pub output: PathBuf,
    pub text: String,
    /// Nothing matched the render mode.
    pub is_empty: bool,
    /// Definition map updated with this run's reference metadata.
    pub map: DefinitionMapData,
}

#[derive(Debug, Default)]
pub struct GenerateOutcome {
    pub output: PathBuf,
    /// False when a split mode left nothing to write.
    pub written: bool,
    pub copies: Vec<PathBuf>,
    pub copy_failures: Vec<WriteFailure>,
}

/// Generates declaration files for the sources of one project.
///
/// Other project files are read once per generator and reused across runs;
/// the file being generated is always read fresh.
pub struct Generator<S: DefinitionMapStore = FileSystemStore> {
    project: Project,
    options: Options,
    naming: OutputNaming,
    store: S,
    mode: RenderMode,
    project_files: OnceCell<Vec<HostFile>>,
}

impl Generator<FileSystemStore> {
    pub fn new(project: Project, options: Options) -> Self {
        Self::with_store(project, options, FileSystemStore)
    }
}

impl<S: DefinitionMapStore> Generator<S> {
    pub fn with_store(project: Project, options: Options, store: S) -> Self {
        let naming = OutputNaming::from_options(&options);
        Self {
            project,
            options,
            naming,
            store,
            mode: RenderMode::default(),
            project_files: OnceCell::new(),
        }
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn naming(&self) -> &OutputNaming {
        &self.naming
    }

    /// Translate `source` without touching the file system beyond reads.
    pub fn translate(&self, source: &Path) -> Result<Translation, GenerateError> {
        let source = fs::canonicalize(source).map_err(|err| GenerateError::io(source, err))?;
        let name = display_name(&source);
        info!("{name} - Started");
        let result = self.translate_source(&source);
        match &result {
            Ok(_) => info!("{name} - Completed"),
            Err(err) => warn!("{name} - Failure: {err}"),
        }
        result
    }

    fn translate_source(&self, source: &Path) -> Result<Translation, GenerateError> {
        let output = self.naming.output_path(source);
        let mut map = self.store.load(&output).unwrap_or_default();

        let file = load_host_file(source)?;
        let index = self.build_index(&file);
        let ctx = ParseContext {
            index: &index,
            options: &self.options,
            naming: &self.naming,
        };
        let objects = parser::parse(&file, &ctx, &mut map);

        let previous = fs::read_to_string(&output).ok();
        let resolver = ReferenceResolver::new(
            &self.store,
            &self.naming,
            self.options.keep_references_unchanged,
        );
        let references = resolver.resolve(&objects, source, previous.as_deref());
        let rendered = writer::render(&objects, &references, &self.options, self.mode);

        Ok(Translation {
            source: source.to_path_buf(),
            output,
            text: rendered.text,
            is_empty: rendered.is_empty,
            map,
        })
    }

    /// Translate `source`, write its output and copies, and persist the
    /// definition map. Nothing is written when translation fails, or when a
    /// split mode leaves nothing to render.
    pub fn generate(&self, source: &Path) -> Result<GenerateOutcome, GenerateError> {
        let translation = self.translate(source)?;
        let mut outcome = GenerateOutcome {
            output: translation.output.clone(),
            ..GenerateOutcome::default()
        };
        if translation.is_empty && self.mode != RenderMode::Full {
            debug!("{} - nothing to write", display_name(&translation.source));
            return Ok(outcome);
        }

        write_atomic(&translation.output, &translation.text)
            .map_err(|err| GenerateError::io(&translation.output, err))?;
        outcome.written = true;
        info!("File written to \"{}\"", translation.output.display());

        self.write_copies(&translation, &mut outcome);

        if let Err(err) = self.store.save(&translation.output, &translation.map) {
            warn!(
                "could not save definition map for {}: {err}",
                translation.output.display()
            );
        }
        Ok(outcome)
    }

    /// Sources whose generated output already exists.
    pub fn refresh_targets(&self) -> Vec<PathBuf> {
        self.project
            .sources()
            .into_iter()
            .filter(|source| self.naming.output_path(source).is_file())
            .collect()
    }

    fn write_copies(&self, translation: &Translation, outcome: &mut GenerateOutcome) {
        let Some(dir) = translation.source.parent() else {
            return;
        };
        let file_name = self.naming.copy_file_name(&translation.source, &translation.map);
        for copy_path in translation.map.copy_paths() {
            let target = dir.join(copy_path).join(&file_name);
            match write_atomic(&target, &translation.text) {
                Ok(()) => {
                    info!("File written to \"{}\"", target.display());
                    outcome.copies.push(target);
                }
                Err(err) => {
                    let failure = WriteFailure {
                        path: target,
                        message: err.to_string(),
                    };
                    warn!("{failure}");
                    outcome.copy_failures.push(failure);
                }
            }
        }
    }

    /// Index of the current file plus, unless types are assumed external,
    /// every other project source that loads.
    fn build_index(&self, file: &HostFile) -> ProjectIndex {
        let mut index = ProjectIndex::new(self.project.name(), self.project.root());
        index.add_file(file);
        if self.options.assume_external_type {
            return index;
        }
        for other in self.project_files() {
            if other.path != file.path {
                index.add_file(other);
            }
        }
        index
    }

    fn project_files(&self) -> &[HostFile] {
        self.project_files.get_or_init(|| {
            self.project
                .sources()
                .iter()
                .filter_map(|path| match load_host_file(path) {
                    Ok(file) => Some(file),
                    Err(err) => {
                        warn!("skipping {}: {err}", path.display());
                        None
                    }
                })
                .collect()
        })
    }
}

/// Read host metadata from a C# source or a JSON host document.
pub fn load_host_file(path: &Path) -> Result<HostFile, GenerateError> {
    let text = fs::read_to_string(path).map_err(|err| GenerateError::io(path, err))?;
    if is_host_document(path) {
        let mut file =
            HostFile::from_json(&text).map_err(|err| GenerateError::from_json(path, &text, err))?;
        file.path = path.to_path_buf();
        Ok(file)
    } else {
        csharp::parse_file(path, &text).map_err(|err| GenerateError::from_csharp(path, &text, err))
    }
}

fn is_host_document(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Replace `path` with `contents` through a temporary file in the same
/// directory, so readers never see a partial file.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition_map::memory::MemoryStore;

    fn project_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Project) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let project = Project::at(dir.path());
        (dir, project)
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.d.ts");
        write_atomic(&path, "first").unwrap();
        write_atomic(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomic_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_atomic(&dir.path().join("missing/out.d.ts"), "x").is_err());
    }

    #[test]
    fn test_translate_resolves_types_from_other_files() {
        let (_dir, project) = project_with(&[
            (
                "Person.cs",
                "namespace App { public class Person { public Address Home { get; set; } } }",
            ),
            (
                "Address.cs",
                "namespace App { public class Address { public string Street { get; set; } } }",
            ),
        ]);
        let root = project.root().to_path_buf();
        let generator = Generator::with_store(project, Options::default(), MemoryStore::default());
        let translation = generator.translate(&root.join("Person.cs")).unwrap();
        assert_eq!(translation.output, root.join("Person.cs.d.ts"));
        assert_eq!(
            translation.text,
            "/// <reference path=\"Address.cs.d.ts\" />\n\ndeclare module App {\n\tinterface Person {\n\t\thome: Address;\n\t}\n}\n"
        );
        assert_eq!(translation.map.reference_metadata.len(), 1);
        assert_eq!(translation.map.reference_metadata[0].type_name, "App.Address");
    }

    #[test]
    fn test_assume_external_skips_other_files() {
        let (_dir, project) = project_with(&[
            (
                "Person.cs",
                "namespace App { public class Person { public Address Home { get; set; } } }",
            ),
            ("Address.cs", "namespace App { public class Address { } }"),
        ]);
        let root = project.root().to_path_buf();
        let options = Options {
            assume_external_type: true,
            ..Options::default()
        };
        let generator = Generator::with_store(project, options, MemoryStore::default());
        let translation = generator.translate(&root.join("Person.cs")).unwrap();
        assert!(!translation.text.contains("reference"));
        assert!(translation.text.contains("\t\thome: Address;\n"));
    }

    #[test]
    fn test_broken_neighbour_is_skipped() {
        let (_dir, project) = project_with(&[
            ("Good.cs", "namespace App { public class Good { public int Id { get; set; } } }"),
            ("Broken.cs", "namespace App { public class {"),
        ]);
        let root = project.root().to_path_buf();
        let generator = Generator::with_store(project, Options::default(), MemoryStore::default());
        assert!(generator.translate(&root.join("Good.cs")).is_ok());
        assert!(matches!(
            generator.translate(&root.join("Broken.cs")),
            Err(GenerateError::Parse { .. })
        ));
    }

    #[test]
    fn test_json_host_document() {
        let doc = r#"{
            "types": [
                { "name": "Color", "namespace": "App", "kind": "enum",
                  "members": [ { "name": "Red", "init": "1" }, { "name": "Blue" } ] }
            ]
        }"#;
        let (_dir, project) = project_with(&[("Colors.types.json", doc)]);
        let root = project.root().to_path_buf();
        let generator = Generator::with_store(project, Options::default(), MemoryStore::default());
        let translation = generator.translate(&root.join("Colors.types.json")).unwrap();
        assert_eq!(
            translation.text,
            "declare module App {\n\tconst enum Color {\n\t\tRed = 1,\n\t\tBlue,\n\t}\n}\n"
        );
    }

    #[test]
    fn test_split_mode_with_nothing_to_render_writes_nothing() {
        let (_dir, project) = project_with(&[(
            "Person.cs",
            "namespace App { public class Person { public int Id { get; set; } } }",
        )]);
        let root = project.root().to_path_buf();
        let generator = Generator::with_store(project, Options::default(), MemoryStore::default())
            .with_mode(RenderMode::EnumsOnly);
        let outcome = generator.generate(&root.join("Person.cs")).unwrap();
        assert!(!outcome.written);
        assert!(!root.join("Person.cs.d.ts").exists());
        assert!(generator.store.maps.borrow().is_empty());
    }

    #[test]
    fn test_refresh_targets_only_include_generated_sources() {
        let (_dir, project) = project_with(&[
            ("A.cs", "namespace App { public class A { } }"),
            ("B.cs", "namespace App { public class B { } }"),
            ("A.cs.d.ts", ""),
        ]);
        let root = project.root().to_path_buf();
        let generator = Generator::with_store(project, Options::default(), MemoryStore::default());
        assert_eq!(generator.refresh_targets(), vec![root.join("A.cs")]);
    }
}
