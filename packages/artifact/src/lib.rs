//! Serves uploaded source trees as a Maven/Gradle repository.
//!
//! Projects live as plain directories under a projects root. Repository
//! requests are answered on demand: archives are packed from the detected
//! source root, metadata and POMs are synthesized, and checksums track the
//! project directory's modification time.

pub mod coordinate;
pub mod dispatcher;
pub mod error;
pub mod locator;
pub mod packager;
pub mod project;
pub mod synth;
pub mod version;

pub use coordinate::{Coordinate, DEFAULT_VERSION, DependencyDeclarations};
pub use dispatcher::{RepositoryDispatcher, RepositoryResponse};
pub use error::{RepositoryError, Result};
pub use project::{FilesystemProjectStore, Project, ProjectMetadata, ProjectStore};
pub use version::{GithubTagSource, TagSource, VersionResolver};
