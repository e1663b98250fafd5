//! Service layer for Sightline

pub mod completion;
pub mod config;
pub mod definition;
pub mod engine;
pub mod facts;
pub mod hover;
pub mod program;
pub mod provider;
pub mod references;
pub mod registry;
pub mod resolver;

pub use config::{ConfigService, DefaultConfigService};
pub use engine::{Engine, EngineStatus};
pub use facts::{DeclarationPolicy, EcmaPolicy, SyntacticFacts, TypeFacts};
pub use program::{Program, ProgramBuilder};
pub use provider::{ContentProvider, DirectoryProvider};
pub use registry::SourceRegistry;
