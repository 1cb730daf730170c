use std::collections::HashMap;
use std::fmt::Write;

use crate::types::Type;
use crate::NodeId;

/// Handle of a scope inside a [ScopeArena]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// Handle of a function signature inside a [Resolution](super::Resolution)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SigId(pub(super) usize);

/// What a name refers to
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// Function parameter, by parameter node
    Param(NodeId),

    /// Let binding, by statement node
    Let(NodeId),

    Function(SigId),
    Type(Type),
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Param(id) => write!(f, "param {id}"),
            Symbol::Let(id) => write!(f, "let {id}"),
            Symbol::Function(sig) => write!(f, "function sig{}", sig.0),
            Symbol::Type(ty) => write!(f, "type {ty}"),
        }
    }
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    names: HashMap<String, Symbol>,
}

/// Owner of all scopes of one compilation
///
/// Scopes only point upwards to their parent, so a chain is walked by following handles.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn push(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            names: HashMap::new(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    /// Bind `name` in exactly this scope
    ///
    /// Returns `false` and leaves the scope untouched if the name is already bound here.
    /// Bindings in parent scopes do not count.
    pub fn insert(&mut self, scope: ScopeId, name: &str, symbol: Symbol) -> bool {
        let names = &mut self.scopes[scope.0].names;
        if names.contains_key(name) {
            return false;
        }
        names.insert(name.to_string(), symbol);
        true
    }

    /// Find the innermost binding of `name`, starting at `scope`
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(symbol) = self.scopes[id.0].names.get(name) {
                return Some(symbol);
            }
            current = self.parent(id);
        }
        None
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    /// Describe the chain starting at `scope`, innermost first
    pub fn dump(&self, scope: ScopeId) -> String {
        let mut out = String::new();
        let mut current = Some(scope);
        let mut depth = 0;
        while let Some(id) = current {
            let mut names: Vec<_> = self.scopes[id.0].names.iter().collect();
            names.sort_by(|lhs, rhs| lhs.0.cmp(rhs.0));

            let _ = writeln!(out, "scope #{depth} [{} names]", names.len());
            for (name, symbol) in names {
                let _ = writeln!(out, "  {name} -- {symbol}");
            }

            current = self.parent(id);
            depth += 1;
        }
        out
    }
}
