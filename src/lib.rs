//! Generates TypeScript declaration files (`.d.ts`) from C# class and enum
//! declarations.

pub mod config;
pub mod csharp;
pub mod definition_map;
pub mod diagnostic;
pub mod error;
pub mod host;
pub mod known_types;
pub mod logging;
pub mod model;
pub mod naming;
pub mod parser;
pub mod project;
pub mod references;
pub mod service;
pub mod writer;

pub use config::{Options, OptionsResolver};
pub use definition_map::{DefinitionMapData, DefinitionMapStore, FileSystemStore, ReferenceMetadata};
pub use error::{GenerateError, WriteFailure};
pub use model::{Member, TypeModelObject, TypeRef};
pub use project::Project;
pub use service::{GenerateOutcome, Generator, Translation};
pub use writer::{render, RenderMode, RenderOutput};
