//! Front-end of the spargel compiler
//!
//! Source text goes through these stages:
//! - [parse] builds the lossless concrete tree ([cst])
//! - [lower] turns it into the abstract tree ([ast])
//! - [resolve] binds names against the opened modules
//! - [type_check] assigns types
//! - [emit] writes C-like target text
//!
//! [compile] runs all of them.

use miette::Diagnostic;
use thiserror::Error;

pub mod ast;
pub mod codegen;
pub mod cst;
pub mod lowering;
pub mod parsing;
pub mod resolving;
pub mod type_checking;
pub mod types;
mod util;

pub use codegen::{emit, CodegenError};
pub use lowering::lower;
pub use parsing::{parse, ParsingError};
pub use resolving::{resolve, ModuleRegistry, ResolveError};
pub use type_checking::{type_check, TypeCheckError};
pub use types::Type;
pub use util::{NodeId, NodeIdCounter, Span, TreeNode};

#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    #[error("Failed to parse the source")]
    Parsing {
        #[related]
        errors: Vec<ParsingError>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolving(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    TypeChecking(#[from] TypeCheckError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Codegen(#[from] CodegenError),
}

impl From<Vec<ParsingError>> for CompileError {
    fn from(errors: Vec<ParsingError>) -> Self {
        CompileError::Parsing { errors }
    }
}

/// Run the whole pipeline on one source file
pub fn compile(source: &str, modules: &ModuleRegistry) -> Result<String, CompileError> {
    let concrete = parse(source)?;
    let file = lower(&concrete);
    let resolution = resolve(&file, modules)?;
    let types = type_check(&file, &resolution)?;
    Ok(emit(&file, &resolution, &types)?)
}
