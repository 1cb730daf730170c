//! Modules that source files can `open`

use std::collections::HashSet;

use tracing::debug;

use super::ResolveError;
use crate::types::{PrimTag, Type};

/// Declaration of a function exported by a module
///
/// Types are usually [Type::Named] references to types of the same module, which
/// [Module::build] replaces with the exported alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncSpec {
    pub name: String,
    pub params: Vec<Type>,
    pub ret: Type,
}

impl FuncSpec {
    /// A function whose types are all named
    pub fn new(name: &str, params: &[&str], ret: &str) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().map(|param| Type::Named(param.to_string())).collect(),
            ret: Type::Named(ret.to_string()),
        }
    }
}

/// Description of a module before it is registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub name: String,
    pub types: Vec<(String, Type)>,
    pub functions: Vec<FuncSpec>,
}

/// A function signature whose types are fully resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFunction {
    pub name: String,
    pub params: Vec<Type>,
    pub ret: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Export {
    Type(Type),
    Function(ExportedFunction),
}

/// A registered module with validated exports
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    name: String,
    exports: Vec<(String, Export)>,
}

impl Module {
    /// Validate a module description and resolve the types of its functions
    ///
    /// Type names used by exported functions must be exported by the module itself.
    pub fn build(spec: ModuleSpec) -> Result<Self, ResolveError> {
        let mut seen = HashSet::new();
        let mut exports = Vec::with_capacity(spec.types.len() + spec.functions.len());

        let duplicate = |name: &str| ResolveError::DuplicateExport {
            module: spec.name.clone(),
            name: name.to_string(),
        };

        for (name, ty) in &spec.types {
            if !seen.insert(name.as_str()) {
                return Err(duplicate(name.as_str()));
            }
            exports.push((name.clone(), Export::Type(Type::alias(name.clone(), ty.clone()))));
        }

        let resolve_type = |ty: &Type| match ty {
            Type::Named(name) => spec
                .types
                .iter()
                .find(|(ty_name, _)| ty_name == name)
                .map(|(ty_name, ty)| Type::alias(ty_name.clone(), ty.clone()))
                .ok_or_else(|| ResolveError::UnknownExportType {
                    module: spec.name.clone(),
                    name: name.clone(),
                }),
            other => Ok(other.clone()),
        };

        for func in &spec.functions {
            if !seen.insert(func.name.as_str()) {
                return Err(duplicate(func.name.as_str()));
            }
            let params = func
                .params
                .iter()
                .map(&resolve_type)
                .collect::<Result<_, _>>()?;
            let ret = resolve_type(&func.ret)?;

            exports.push((
                func.name.clone(),
                Export::Function(ExportedFunction {
                    name: func.name.clone(),
                    params,
                    ret,
                }),
            ));
        }

        Ok(Self {
            name: spec.name,
            exports,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exports in declaration order
    pub fn exports(&self) -> &[(String, Export)] {
        &self.exports
    }
}

/// The standard module, `std`
pub fn std_module() -> ModuleSpec {
    ModuleSpec {
        name: String::from("std"),
        types: vec![
            (String::from("int"), Type::Prim(PrimTag::Int)),
            (String::from("uint"), Type::Prim(PrimTag::Uint)),
            (String::from("float"), Type::Prim(PrimTag::Float)),
            (String::from("float3"), Type::Prim(PrimTag::Float3)),
        ],
        functions: vec![
            FuncSpec::new("add", &["int", "int"], "int"),
            FuncSpec::new("addu", &["uint", "int"], "int"),
            FuncSpec::new("addf", &["float", "float"], "float"),
        ],
    }
}

/// The set of modules available to a compilation
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<Module>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only [std_module]
    pub fn with_std() -> Self {
        let mut registry = Self::new();
        if let Err(err) = registry.register(std_module()) {
            unreachable!("the std module is well-formed: {err}");
        }
        registry
    }

    /// Add a module, replacing any earlier module of the same name
    pub fn register(&mut self, spec: ModuleSpec) -> Result<(), ResolveError> {
        let module = Module::build(spec)?;
        debug!(
            "Registered module {} with {} exports",
            module.name,
            module.exports.len()
        );

        self.modules.retain(|existing| existing.name != module.name);
        self.modules.push(module);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.name == name)
    }
}
