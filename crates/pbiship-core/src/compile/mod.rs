//! Package compilation for folder-mode sources.

mod compiler;
mod package;
mod scratch;

pub use compiler::{CommandCompiler, CompiledPackage, DEFAULT_COMPILER, PackageCompiler};
pub use package::{list_entries, read_entries};
pub use scratch::{ScratchArea, ScratchPackage};
