//! Static type descriptors for schema generation.
//!
//! Rust has no runtime reflection over struct fields, so every domain type opts into a
//! descriptor once by implementing [`ApiModel`]. Built-in types (numbers, strings,
//! collections, maps, `serde_json::Value`) implement [`Describe`], which lets descriptors
//! be composed from real Rust field types:
//!
//! ```
//! use openapi_from_routes::descriptor::{ApiModel, Describe, FieldDef, TypeDef, TypeRef};
//!
//! struct Tag;
//! struct Post;
//!
//! impl ApiModel for Tag {
//!     fn type_def() -> TypeDef {
//!         TypeDef::object_of::<Self>().field(FieldDef::new("label", String::type_ref()))
//!     }
//! }
//!
//! impl ApiModel for Post {
//!     fn type_def() -> TypeDef {
//!         TypeDef::object_of::<Self>()
//!             .field(FieldDef::new("id", i64::type_ref()).required())
//!             .field(FieldDef::new("tags", TypeRef::list(TypeRef::model::<Tag>())))
//!     }
//! }
//!
//! assert_eq!(Post::type_name(), "Post");
//! ```
//!
//! Nested models are referenced lazily through [`ModelRef`], so mutually referencing
//! types never recurse while their descriptors are being built.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::fmt;

/// Numeric categories that matter to the OpenAPI `type`/`format` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    /// 32-bit integer (`integer`/`int32`)
    Int32,
    /// 64-bit integer (`integer`/`int64`)
    Int64,
    /// Single precision float (`number`/`float`)
    Float,
    /// Double precision float (`number`/`double`)
    Double,
    /// Arbitrary precision decimal or integer (`number`, no format)
    Arbitrary,
    /// Numeric-like type without a fixed width; maps to a plain `object`
    Unrecognized,
}

/// The shape of a declared type, before generic arguments are applied
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Number(NumberKind),
    Boolean,
    /// Character sequences
    String,
    /// Fixed-size array or slice; the item type travels with the type itself
    Array(Box<TypeRef>),
    /// Ordered collection; the item type comes from captured generic arguments
    List,
    /// Map-like type; the value type comes from captured generic arguments
    Map,
    /// Opaque dynamic JSON container
    Json,
    /// A described domain type (struct or enum)
    Model(ModelRef),
    /// A generic type variable such as `T`
    Var(String),
}

/// A type expression: a kind plus its generic arguments (e.g. `Vec<User>`)
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub kind: TypeKind,
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            args: Vec::new(),
        }
    }

    pub fn with_args(kind: TypeKind, args: Vec<TypeRef>) -> Self {
        Self { kind, args }
    }

    pub fn number(kind: NumberKind) -> Self {
        Self::new(TypeKind::Number(kind))
    }

    pub fn boolean() -> Self {
        Self::new(TypeKind::Boolean)
    }

    pub fn string() -> Self {
        Self::new(TypeKind::String)
    }

    pub fn json() -> Self {
        Self::new(TypeKind::Json)
    }

    pub fn array(item: TypeRef) -> Self {
        Self::new(TypeKind::Array(Box::new(item)))
    }

    pub fn list(item: TypeRef) -> Self {
        Self::with_args(TypeKind::List, vec![item])
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        Self::with_args(TypeKind::Map, vec![key, value])
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Var(name.into()))
    }

    /// Reference to a domain type that implements [`ApiModel`]
    pub fn model<T: ApiModel>() -> Self {
        Self::new(TypeKind::Model(ModelRef::of::<T>()))
    }

    /// Reference to a domain type known only by name (resolved through the registry)
    pub fn named(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self::new(TypeKind::Model(ModelRef::named(name, module)))
    }

    /// Apply generic arguments to this type (e.g. `Page` + `[User]` -> `Page<User>`)
    pub fn of(mut self, args: Vec<TypeRef>) -> Self {
        self.args = args;
        self
    }

    pub fn model_ref(&self) -> Option<&ModelRef> {
        match &self.kind {
            TypeKind::Model(model) => Some(model),
            _ => None,
        }
    }

    /// A bare, fully known type: not a type variable and without generic arguments
    pub fn is_concrete(&self) -> bool {
        !matches!(self.kind, TypeKind::Var(_)) && self.args.is_empty()
    }

    /// Replace type variables with their bound types
    pub fn substitute(&self, bindings: &HashMap<String, TypeRef>) -> TypeRef {
        if let TypeKind::Var(name) = &self.kind {
            if let Some(bound) = bindings.get(name) {
                return bound.clone();
            }
        }
        let kind = match &self.kind {
            TypeKind::Array(item) => TypeKind::Array(Box::new(item.substitute(bindings))),
            other => other.clone(),
        };
        TypeRef {
            kind,
            args: self.args.iter().map(|a| a.substitute(bindings)).collect(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Number(kind) => write!(f, "{:?}", kind)?,
            TypeKind::Boolean => write!(f, "bool")?,
            TypeKind::String => write!(f, "String")?,
            TypeKind::Array(item) => write!(f, "[{}]", item)?,
            TypeKind::List => write!(f, "List")?,
            TypeKind::Map => write!(f, "Map")?,
            TypeKind::Json => write!(f, "Json")?,
            TypeKind::Model(model) => write!(f, "{}", model.name)?,
            TypeKind::Var(name) => write!(f, "{}", name)?,
        }
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

/// Lazy reference to a domain type.
///
/// Carries the simple name and module path eagerly and, for types implementing
/// [`ApiModel`], a function producing the full descriptor on demand.
#[derive(Clone)]
pub struct ModelRef {
    pub name: String,
    pub module: String,
    resolver: Option<fn() -> TypeDef>,
}

impl ModelRef {
    pub fn of<T: ApiModel>() -> Self {
        Self {
            name: T::type_name(),
            module: T::module_path(),
            resolver: Some(T::type_def),
        }
    }

    pub fn named(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            resolver: None,
        }
    }

    /// Produce the descriptor when this reference was created from an [`ApiModel`]
    pub fn describe(&self) -> Option<TypeDef> {
        self.resolver.map(|resolve| resolve())
    }

    /// Whether this names a type from `std`, `core` or `alloc`
    pub fn is_standard_library(&self) -> bool {
        matches!(
            self.module.split("::").next(),
            Some("std" | "core" | "alloc")
        )
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRef")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("described", &self.resolver.is_some())
            .finish()
    }
}

impl PartialEq for ModelRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.module == other.module
    }
}

/// Whether a described type is a plain object or an enumeration
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefKind {
    Object,
    /// Display strings of the enum constants, in declaration order
    Enum(Vec<String>),
}

/// Full descriptor of a domain type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Simple type name, used as the component key
    pub name: String,
    /// Module path, used for domain membership checks
    pub module: String,
    pub kind: TypeDefKind,
    pub type_params: Vec<String>,
    /// Parent type, including the generic arguments it is instantiated with
    pub parent: Option<TypeRef>,
    pub interfaces: Vec<ModelRef>,
    pub fields: Vec<FieldDef>,
}

impl TypeDef {
    pub fn object(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            kind: TypeDefKind::Object,
            type_params: Vec::new(),
            parent: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn enumeration<I, S>(name: impl Into<String>, module: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut def = Self::object(name, module);
        def.kind = TypeDefKind::Enum(constants.into_iter().map(Into::into).collect());
        def
    }

    /// Object descriptor named after `T`
    pub fn object_of<T: ApiModel>() -> Self {
        Self::object(T::type_name(), T::module_path())
    }

    /// Enum descriptor named after `T`
    pub fn enum_of<T, I, S>(constants: I) -> Self
    where
        T: ApiModel,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::enumeration(T::type_name(), T::module_path(), constants)
    }

    pub fn type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(name.into());
        self
    }

    pub fn extends(mut self, parent: TypeRef) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn implements(mut self, interface: ModelRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeDefKind::Enum(_))
    }
}

/// A declared field of a domain type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    /// Static (type-level) members never appear in schemas
    pub is_static: bool,
    pub description: Option<String>,
    /// Serialization alias overriding `name`
    pub rename: Option<String>,
    pub default_value: Option<String>,
    pub required: bool,
    /// Concrete type the field deserializes as, replacing the declared type
    pub deserialize_as: Option<ModelRef>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
            description: None,
            rename: None,
            default_value: None,
            required: false,
            deserialize_as: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn rename(mut self, alias: impl Into<String>) -> Self {
        self.rename = Some(alias.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn deserialize_as(mut self, target: ModelRef) -> Self {
        self.deserialize_as = Some(target);
        self
    }

    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Name under which the field is serialized
    pub fn serialized_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }
}

/// Implemented by every domain type that appears in the generated document
pub trait ApiModel {
    /// Full descriptor of the type
    fn type_def() -> TypeDef;

    /// Simple name used as the component key
    fn type_name() -> String {
        simple_name(std::any::type_name::<Self>())
    }

    /// Module the type lives in
    fn module_path() -> String {
        module_of(std::any::type_name::<Self>())
    }
}

/// Implemented by built-in types that map to terminal schema kinds
pub trait Describe {
    fn type_ref() -> TypeRef;
}

/// `my_crate::model::Page<my_crate::User>` -> `Page`
pub fn simple_name(type_path: &str) -> String {
    let base = type_path.split('<').next().unwrap_or(type_path);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// `my_crate::model::Page<my_crate::User>` -> `my_crate::model`
pub fn module_of(type_path: &str) -> String {
    let base = type_path.split('<').next().unwrap_or(type_path);
    match base.rfind("::") {
        Some(idx) => base[..idx].to_string(),
        None => String::new(),
    }
}

macro_rules! describe_numbers {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn type_ref() -> TypeRef {
                    TypeRef::number(NumberKind::$kind)
                }
            }
        )*
    };
}

describe_numbers! {
    i8 => Int32,
    i16 => Int32,
    i32 => Int32,
    u8 => Int32,
    u16 => Int32,
    u32 => Int64,
    i64 => Int64,
    u64 => Int64,
    f32 => Float,
    f64 => Double,
    i128 => Arbitrary,
    u128 => Arbitrary,
    isize => Unrecognized,
    usize => Unrecognized,
}

impl Describe for bool {
    fn type_ref() -> TypeRef {
        TypeRef::boolean()
    }
}

impl Describe for String {
    fn type_ref() -> TypeRef {
        TypeRef::string()
    }
}

impl Describe for str {
    fn type_ref() -> TypeRef {
        TypeRef::string()
    }
}

impl Describe for char {
    fn type_ref() -> TypeRef {
        TypeRef::string()
    }
}

impl<T: Describe> Describe for Option<T> {
    fn type_ref() -> TypeRef {
        T::type_ref()
    }
}

impl<T: Describe + ?Sized> Describe for Box<T> {
    fn type_ref() -> TypeRef {
        T::type_ref()
    }
}

impl<T: Describe> Describe for [T] {
    fn type_ref() -> TypeRef {
        TypeRef::array(T::type_ref())
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn type_ref() -> TypeRef {
        TypeRef::array(T::type_ref())
    }
}

macro_rules! describe_lists {
    ($($list:ident),* $(,)?) => {
        $(
            impl<T: Describe> Describe for $list<T> {
                fn type_ref() -> TypeRef {
                    TypeRef::list(T::type_ref())
                }
            }
        )*
    };
}

describe_lists!(Vec, VecDeque, LinkedList, HashSet, BTreeSet);

impl<K: Describe, V: Describe> Describe for HashMap<K, V> {
    fn type_ref() -> TypeRef {
        TypeRef::map(K::type_ref(), V::type_ref())
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn type_ref() -> TypeRef {
        TypeRef::map(K::type_ref(), V::type_ref())
    }
}

impl Describe for serde_json::Value {
    fn type_ref() -> TypeRef {
        TypeRef::json()
    }
}

impl Describe for serde_json::Map<String, serde_json::Value> {
    fn type_ref() -> TypeRef {
        TypeRef::json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node;

    impl ApiModel for Node {
        fn type_def() -> TypeDef {
            TypeDef::object_of::<Self>()
                .field(FieldDef::new("children", TypeRef::list(TypeRef::model::<Node>())))
        }
    }

    #[test]
    fn test_simple_name_strips_path_and_generics() {
        assert_eq!(simple_name("app::model::Page<app::model::User>"), "Page");
        assert_eq!(simple_name("User"), "User");
        assert_eq!(module_of("app::model::Page<app::model::User>"), "app::model");
        assert_eq!(module_of("User"), "");
    }

    #[test]
    fn test_api_model_default_names() {
        assert_eq!(Node::type_name(), "Node");
        assert!(Node::module_path().ends_with("descriptor::tests"));
    }

    #[test]
    fn test_self_reference_is_lazy() {
        let def = Node::type_def();
        let children = &def.fields[0].ty;
        assert_eq!(children.kind, TypeKind::List);
        let item = children.args[0].model_ref().unwrap();
        assert_eq!(item.name, "Node");
        assert_eq!(item.describe().unwrap().name, "Node");
    }

    #[test]
    fn test_describe_numbers() {
        assert_eq!(i32::type_ref(), TypeRef::number(NumberKind::Int32));
        assert_eq!(i64::type_ref(), TypeRef::number(NumberKind::Int64));
        assert_eq!(f32::type_ref(), TypeRef::number(NumberKind::Float));
        assert_eq!(f64::type_ref(), TypeRef::number(NumberKind::Double));
        assert_eq!(usize::type_ref(), TypeRef::number(NumberKind::Unrecognized));
    }

    #[test]
    fn test_describe_collections() {
        let list = Vec::<String>::type_ref();
        assert_eq!(list.kind, TypeKind::List);
        assert_eq!(list.args, vec![TypeRef::string()]);

        let map = HashMap::<String, f64>::type_ref();
        assert_eq!(map.kind, TypeKind::Map);
        assert_eq!(map.args.len(), 2);

        let array = <[u8; 4]>::type_ref();
        assert_eq!(array.kind, TypeKind::Array(Box::new(TypeRef::number(NumberKind::Int32))));

        assert_eq!(Option::<bool>::type_ref(), TypeRef::boolean());
        assert_eq!(serde_json::Value::type_ref(), TypeRef::json());
    }

    #[test]
    fn test_substitute_type_variables() {
        let mut bindings = HashMap::new();
        bindings.insert("T".to_string(), TypeRef::string());
        let list = TypeRef::list(TypeRef::var("T"));
        assert_eq!(list.substitute(&bindings), TypeRef::list(TypeRef::string()));
        assert_eq!(TypeRef::var("U").substitute(&bindings), TypeRef::var("U"));
    }

    #[test]
    fn test_display() {
        let ty = TypeRef::map(TypeRef::string(), TypeRef::list(TypeRef::named("User", "app")));
        assert_eq!(ty.to_string(), "Map<String, List<User>>");
    }

    #[test]
    fn test_field_serialized_name() {
        let field = FieldDef::new("user_name", TypeRef::string()).rename("userName");
        assert_eq!(field.serialized_name(), "userName");
        assert_eq!(FieldDef::new("id", TypeRef::string()).serialized_name(), "id");
    }

    enum Color {}

    impl ApiModel for Color {
        fn type_def() -> TypeDef {
            TypeDef::enum_of::<Self, _, _>(["RED", "GREEN"])
        }
    }

    #[test]
    fn test_enum_descriptor() {
        let def = Color::type_def();
        assert!(def.is_enum());
        assert_eq!(def.name, "Color");
        assert_eq!(
            def.kind,
            TypeDefKind::Enum(vec!["RED".to_string(), "GREEN".to_string()])
        );
        assert!(!Node::type_def().is_enum());
    }
}
