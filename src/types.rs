use std::fmt;

/// Builtin primitive types, identified by their tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimTag {
    Int,
    Uint,
    Float,
    Float3,

    /// Type of a block without any `return`
    Unit,
}

impl PrimTag {
    pub fn tag(self) -> &'static str {
        match self {
            PrimTag::Int => "$int",
            PrimTag::Uint => "$uint",
            PrimTag::Float => "$float",
            PrimTag::Float3 => "$float3",
            PrimTag::Unit => "$unit",
        }
    }
}

impl fmt::Display for PrimTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Prim(PrimTag),

    /// A name bound to another type
    Alias { name: String, real: Box<Type> },

    /// Reference to a type by name that was never resolved
    Named(String),
}

impl Type {
    pub const INT: Type = Type::Prim(PrimTag::Int);
    pub const FLOAT: Type = Type::Prim(PrimTag::Float);
    pub const UNIT: Type = Type::Prim(PrimTag::Unit);

    pub fn alias(name: impl Into<String>, real: Type) -> Self {
        Type::Alias {
            name: name.into(),
            real: Box::new(real),
        }
    }

    /// Unwrap aliases down to the underlying primitive
    pub fn primitive(&self) -> Option<PrimTag> {
        match self {
            Type::Prim(tag) => Some(*tag),
            Type::Alias { real, .. } => real.primitive(),
            Type::Named(_) => None,
        }
    }

    /// Equality after unwrapping aliases; anything that is not a primitive underneath
    /// is unequal to everything, itself included
    pub fn structurally_eq(&self, other: &Type) -> bool {
        match (self.primitive(), other.primitive()) {
            (Some(lhs), Some(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Prim(tag) => write!(f, "{tag}"),
            Type::Alias { name, real } => write!(f, "{name} (= {real})"),
            Type::Named(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_unwrap_recursively() {
        let int = Type::alias("int", Type::INT);
        let integer = Type::alias("integer", int.clone());
        assert!(integer.structurally_eq(&Type::INT));
        assert!(int.structurally_eq(&integer));
        assert_eq!(integer.primitive(), Some(PrimTag::Int));
    }

    #[test]
    fn distinct_tags_differ() {
        let uint = Type::alias("uint", Type::Prim(PrimTag::Uint));
        assert!(!uint.structurally_eq(&Type::INT));
        assert!(!Type::FLOAT.structurally_eq(&Type::INT));
    }

    #[test]
    fn named_types_never_match() {
        let named = Type::Named(String::from("int"));
        assert!(!named.structurally_eq(&named));
        assert!(!named.structurally_eq(&Type::INT));
    }

    #[test]
    fn display() {
        assert_eq!(Type::alias("int", Type::INT).to_string(), "int (= $int)");
        assert_eq!(Type::UNIT.to_string(), "$unit");
    }
}
