// Shader module - stage resolution and compiler invocation
//
// Design: static stage tables, one external compiler process per stage

pub mod compiler;
pub mod detect;
pub mod language;
pub mod naming;
pub mod rename;
pub mod stage;
pub mod unit;

pub use compiler::{find_compiler, CompileOptions, Compiler, Executor, ProcessExecutor};
pub use language::ShaderLanguage;
pub use rename::RenameTable;
pub use unit::{CompileResult, CompileUnit};
