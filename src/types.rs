//! The type model: a closed set of Go type kinds stored in a table and referred to by
//! [`TypeRef`]. Named types are created first and completed later, which is what allows
//! recursive declarations.

use std::collections::HashMap;

use crate::program::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(u32);

impl TypeRef {
    #[inline]
    fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Invalid,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub const ALL: [BasicKind; 26] = [
        BasicKind::Invalid,
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Complex64,
        BasicKind::Complex128,
        BasicKind::String,
        BasicKind::UnsafePointer,
        BasicKind::UntypedBool,
        BasicKind::UntypedInt,
        BasicKind::UntypedRune,
        BasicKind::UntypedFloat,
        BasicKind::UntypedComplex,
        BasicKind::UntypedString,
        BasicKind::UntypedNil,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid type",
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedComplex => "untyped complex",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedComplex
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    /// The type an untyped constant takes when nothing else constrains it.
    pub fn default_kind(self) -> BasicKind {
        match self {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Int32,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedComplex => BasicKind::Complex128,
            BasicKind::UntypedString => BasicKind::String,
            other => other,
        }
    }

    /// Ranking used to pick the result kind of mixed untyped constant arithmetic.
    fn untyped_rank(self) -> u8 {
        match self {
            BasicKind::UntypedInt => 1,
            BasicKind::UntypedRune => 2,
            BasicKind::UntypedFloat => 3,
            BasicKind::UntypedComplex => 4,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub embedded: bool,
}

impl Field {
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    pub name: String,
    pub sig: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<TypeRef>,
    pub results: Vec<TypeRef>,
    /// The last parameter is `...T`; its entry in `params` is `[]T`.
    pub variadic: bool,
}

/// A defined type. `unit` is `None` for predeclared names such as `error`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Named {
    pub name: String,
    pub unit: Option<UnitId>,
    pub underlying: TypeRef,
    pub methods: Vec<Method>,
}

impl Named {
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// `name` keeps alias spellings (`byte`, `rune`).
    Basic { kind: BasicKind, name: &'static str },
    Named(Named),
    Struct { fields: Vec<Field> },
    Pointer { elem: TypeRef },
    Interface { methods: Vec<Method> },
    Slice { elem: TypeRef },
    Array { elem: TypeRef, len: u64 },
    Map { key: TypeRef, elem: TypeRef },
    Chan { elem: TypeRef, dir: ChanDir },
    Signature(Signature),
}

impl Type {
    /// Composite shapes that are identical whenever their parts are, and so can be shared.
    fn is_structural(&self) -> bool {
        matches!(
            self,
            Type::Pointer { .. }
                | Type::Slice { .. }
                | Type::Array { .. }
                | Type::Map { .. }
                | Type::Chan { .. }
                | Type::Signature(_)
        )
    }
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

const BYTE: TypeRef = TypeRef(BasicKind::ALL.len() as u32);
const RUNE: TypeRef = TypeRef(BYTE.0 + 1);
const EMPTY_INTERFACE: TypeRef = TypeRef(RUNE.0 + 1);
const ERROR: TypeRef = TypeRef(EMPTY_INTERFACE.0 + 1);

/// How deep embedded-field promotion is followed.
const MAX_EMBED_DEPTH: usize = 8;

#[derive(Debug)]
pub struct TypeTable {
    types: Vec<Type>,
    interned: HashMap<Type, TypeRef>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = TypeTable {
            types: Vec::with_capacity(64),
            interned: HashMap::new(),
        };
        for kind in BasicKind::ALL {
            table.push(Type::Basic {
                kind,
                name: kind.name(),
            });
        }
        table.push(Type::Basic {
            kind: BasicKind::Uint8,
            name: "byte",
        });
        table.push(Type::Basic {
            kind: BasicKind::Int32,
            name: "rune",
        });
        table.push(Type::Interface {
            methods: Vec::new(),
        });

        let error = table.new_named("error", None);
        debug_assert_eq!(error, ERROR);
        let string = table.basic(BasicKind::String);
        let error_sig = table.signature(Signature {
            params: Vec::new(),
            results: vec![string],
            variadic: false,
        });
        let iface = table.push(Type::Interface {
            methods: vec![Method {
                name: "Error".to_string(),
                sig: error_sig,
            }],
        });
        table.set_underlying(error, iface);
        table
    }

    fn push(&mut self, ty: Type) -> TypeRef {
        let id = TypeRef(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    fn intern(&mut self, ty: Type) -> TypeRef {
        debug_assert!(ty.is_structural());
        if let Some(&id) = self.interned.get(&ty) {
            return id;
        }
        let id = self.push(ty.clone());
        self.interned.insert(ty, id);
        id
    }

    #[inline]
    pub fn get(&self, t: TypeRef) -> &Type {
        &self.types[t.idx()]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // Predeclared

    #[inline]
    pub fn basic(&self, kind: BasicKind) -> TypeRef {
        TypeRef(kind as u32)
    }

    #[inline]
    pub fn invalid(&self) -> TypeRef {
        self.basic(BasicKind::Invalid)
    }

    pub fn byte(&self) -> TypeRef {
        BYTE
    }

    pub fn rune(&self) -> TypeRef {
        RUNE
    }

    pub fn error(&self) -> TypeRef {
        ERROR
    }

    pub fn empty_interface(&self) -> TypeRef {
        EMPTY_INTERFACE
    }

    // Constructors

    pub fn pointer(&mut self, elem: TypeRef) -> TypeRef {
        self.intern(Type::Pointer { elem })
    }

    pub fn slice(&mut self, elem: TypeRef) -> TypeRef {
        self.intern(Type::Slice { elem })
    }

    pub fn array(&mut self, elem: TypeRef, len: u64) -> TypeRef {
        self.intern(Type::Array { elem, len })
    }

    pub fn map(&mut self, key: TypeRef, elem: TypeRef) -> TypeRef {
        self.intern(Type::Map { key, elem })
    }

    pub fn chan(&mut self, elem: TypeRef, dir: ChanDir) -> TypeRef {
        self.intern(Type::Chan { elem, dir })
    }

    pub fn signature(&mut self, sig: Signature) -> TypeRef {
        self.intern(Type::Signature(sig))
    }

    /// Every struct type expression is a distinct type, even when spelled identically.
    pub fn new_struct(&mut self, fields: Vec<Field>) -> TypeRef {
        self.push(Type::Struct { fields })
    }

    pub fn new_interface(&mut self, methods: Vec<Method>) -> TypeRef {
        if methods.is_empty() {
            return EMPTY_INTERFACE;
        }
        self.push(Type::Interface { methods })
    }

    /// A named type whose underlying type is filled in later with [`Self::set_underlying`].
    pub fn new_named(&mut self, name: &str, unit: Option<UnitId>) -> TypeRef {
        let invalid = self.invalid();
        self.push(Type::Named(Named {
            name: name.to_string(),
            unit,
            underlying: invalid,
            methods: Vec::new(),
        }))
    }

    pub fn set_underlying(&mut self, named: TypeRef, underlying: TypeRef) {
        if let Type::Named(n) = &mut self.types[named.idx()] {
            n.underlying = underlying;
        }
    }

    pub fn add_method(&mut self, named: TypeRef, method: Method) {
        if let Type::Named(n) = &mut self.types[named.idx()] {
            n.methods.push(method);
        }
    }

    // Queries

    pub fn is_invalid(&self, t: TypeRef) -> bool {
        matches!(
            self.get(t),
            Type::Basic {
                kind: BasicKind::Invalid,
                ..
            }
        )
    }

    pub fn as_named(&self, t: TypeRef) -> Option<&Named> {
        match self.get(t) {
            Type::Named(n) => Some(n),
            _ => None,
        }
    }

    pub fn basic_kind(&self, t: TypeRef) -> Option<BasicKind> {
        match self.get(self.underlying(t)) {
            Type::Basic { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Follows named types to their underlying type. A chain that never bottoms out
    /// (only possible for invalid declarations) yields the invalid type.
    pub fn underlying(&self, mut t: TypeRef) -> TypeRef {
        for _ in 0..64 {
            match self.get(t) {
                Type::Named(n) => t = n.underlying,
                _ => return t,
            }
        }
        self.invalid()
    }

    pub fn struct_fields(&self, t: TypeRef) -> Option<&[Field]> {
        match self.get(self.underlying(t)) {
            Type::Struct { fields } => Some(fields),
            _ => None,
        }
    }

    pub fn is_struct(&self, t: TypeRef) -> bool {
        self.struct_fields(t).is_some()
    }

    /// The element type of pointers, slices, arrays, maps and channels.
    pub fn elem(&self, t: TypeRef) -> Option<TypeRef> {
        match self.get(self.underlying(t)) {
            Type::Pointer { elem }
            | Type::Slice { elem }
            | Type::Array { elem, .. }
            | Type::Map { elem, .. }
            | Type::Chan { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    pub fn as_signature(&self, t: TypeRef) -> Option<&Signature> {
        match self.get(self.underlying(t)) {
            Type::Signature(sig) => Some(sig),
            _ => None,
        }
    }

    /// Replaces an untyped constant type by its default type.
    pub fn default_type(&self, t: TypeRef) -> TypeRef {
        match self.get(t) {
            Type::Basic { kind, .. } if kind.is_untyped() => match kind {
                BasicKind::UntypedRune => RUNE,
                BasicKind::UntypedNil => self.invalid(),
                k => self.basic(k.default_kind()),
            },
            _ => t,
        }
    }

    /// Result of a binary arithmetic operation between two operand types.
    pub fn binary_result(&self, x: TypeRef, y: TypeRef) -> TypeRef {
        match (self.get(x), self.get(y)) {
            (Type::Basic { kind: kx, .. }, Type::Basic { kind: ky, .. })
                if kx.is_untyped() && ky.is_untyped() =>
            {
                if kx.untyped_rank() >= ky.untyped_rank() {
                    x
                } else {
                    y
                }
            }
            (Type::Basic { kind, .. }, _) if kind.is_untyped() => y,
            _ => x,
        }
    }

    /// Field or method `name` of `t`, looking through one pointer and promoted through
    /// embedded fields breadth-first.
    pub fn lookup_member(&self, t: TypeRef, name: &str) -> Option<TypeRef> {
        let mut level = vec![self.deref(t)];
        let mut seen = Vec::new();
        for _ in 0..MAX_EMBED_DEPTH {
            let mut next = Vec::new();
            for t in level {
                if seen.contains(&t) {
                    continue;
                }
                seen.push(t);
                if let Type::Named(n) = self.get(t) {
                    if let Some(m) = n.methods.iter().find(|m| m.name == name) {
                        return Some(m.sig);
                    }
                }
                match self.get(self.underlying(t)) {
                    Type::Struct { fields } => {
                        if let Some(f) = fields.iter().find(|f| f.name == name) {
                            return Some(f.ty);
                        }
                        next.extend(
                            fields
                                .iter()
                                .filter(|f| f.embedded)
                                .map(|f| self.deref(f.ty)),
                        );
                    }
                    Type::Interface { methods } => {
                        if let Some(m) = methods.iter().find(|m| m.name == name) {
                            return Some(m.sig);
                        }
                    }
                    _ => {}
                }
            }
            if next.is_empty() {
                break;
            }
            level = next;
        }
        None
    }

    fn deref(&self, t: TypeRef) -> TypeRef {
        match self.get(t) {
            Type::Pointer { elem } => *elem,
            _ => match self.get(self.underlying(t)) {
                Type::Pointer { elem } => *elem,
                _ => t,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_types_are_shared() {
        let mut t = TypeTable::new();
        let int = t.basic(BasicKind::Int);
        assert_eq!(t.slice(int), t.slice(int));
        assert_ne!(t.slice(int), t.pointer(int));
        assert_ne!(t.new_struct(Vec::new()), t.new_struct(Vec::new()));
    }

    #[test]
    fn recursive_named_types_resolve() {
        let mut t = TypeTable::new();
        let node = t.new_named("Node", None);
        let ptr = t.pointer(node);
        let st = t.new_struct(vec![Field {
            name: "Next".to_string(),
            ty: ptr,
            embedded: false,
        }]);
        t.set_underlying(node, st);
        assert_eq!(t.underlying(node), st);
        assert_eq!(t.lookup_member(ptr, "Next"), Some(ptr));
    }

    #[test]
    fn promoted_fields_are_found() {
        let mut t = TypeTable::new();
        let string = t.basic(BasicKind::String);
        let inner = t.new_named("Inner", None);
        let inner_st = t.new_struct(vec![Field {
            name: "Name".to_string(),
            ty: string,
            embedded: false,
        }]);
        t.set_underlying(inner, inner_st);
        let inner_ptr = t.pointer(inner);
        let outer = t.new_struct(vec![Field {
            name: "Inner".to_string(),
            ty: inner_ptr,
            embedded: true,
        }]);
        assert_eq!(t.lookup_member(outer, "Name"), Some(string));
        assert_eq!(t.lookup_member(outer, "Missing"), None);
    }

    #[test]
    fn error_has_an_error_method() {
        let t = TypeTable::new();
        let sig = t.lookup_member(t.error(), "Error").expect("Error method");
        let string = t.basic(BasicKind::String);
        assert_eq!(t.as_signature(sig).map(|s| s.results.clone()), Some(vec![string]));
    }
}
