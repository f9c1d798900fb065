use crate::descriptor::{ApiModel, ModelRef, NumberKind, TypeDef, TypeKind, TypeRef};
use log::{debug, warn};
use std::collections::HashMap;

/// Type resolver - registry of type descriptors keyed by simple name
///
/// Descriptors can come from [`ApiModel`] implementations or from declarative manifests.
/// Lookups by name take precedence over the lazy descriptor carried by a [`ModelRef`], so a
/// registered definition always wins.
#[derive(Debug, Clone, Default)]
pub struct TypeResolver {
    definitions: HashMap<String, TypeDef>,
}

impl TypeResolver {
    /// Create an empty TypeResolver
    pub fn new() -> Self {
        debug!("Initializing TypeResolver");
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Register a descriptor under its simple name
    pub fn register(&mut self, def: TypeDef) {
        if let Some(existing) = self.definitions.get(&def.name) {
            if existing.module != def.module {
                warn!(
                    "Type {} from {} replaces the definition from {}",
                    def.name, def.module, existing.module
                );
            }
        }
        debug!("Registering type: {}", def.name);
        self.definitions.insert(def.name.clone(), def);
    }

    /// Register the descriptor of a Rust domain type
    pub fn register_model<T: ApiModel>(&mut self) {
        self.register(T::type_def());
    }

    pub fn extend(&mut self, defs: impl IntoIterator<Item = TypeDef>) {
        for def in defs {
            self.register(def);
        }
    }

    /// Find a registered definition by simple name
    pub fn lookup(&self, name: &str) -> Option<&TypeDef> {
        self.definitions.get(name)
    }

    /// Resolve a model reference to its descriptor
    pub fn resolve(&self, model: &ModelRef) -> Option<TypeDef> {
        if let Some(def) = self.definitions.get(&model.name) {
            debug!("Type {} found in registry", model.name);
            return Some(def.clone());
        }
        let described = model.describe();
        if described.is_none() {
            debug!("Type {} not found", model.name);
        }
        described
    }

    /// Module of a model, preferring the registered definition
    pub fn module_of(&self, model: &ModelRef) -> String {
        self.definitions
            .get(&model.name)
            .map(|def| def.module.clone())
            .unwrap_or_else(|| model.module.clone())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Parse a Rust type expression such as `HashMap<String, Vec<User>>`.
    ///
    /// Names listed in `type_params` become type variables. Unknown names become model
    /// references that are resolved later through the registry.
    pub fn parse_type(expr: &str, type_params: &[String]) -> syn::Result<TypeRef> {
        let ty: syn::Type = syn::parse_str(expr)?;
        Ok(Self::extract_type_ref(&ty, type_params))
    }

    /// Extract a TypeRef from a syn::Type
    fn extract_type_ref(ty: &syn::Type, type_params: &[String]) -> TypeRef {
        match ty {
            syn::Type::Path(type_path) => Self::extract_from_path(&type_path.path, type_params),
            syn::Type::Array(array) => {
                TypeRef::array(Self::extract_type_ref(&array.elem, type_params))
            }
            syn::Type::Slice(slice) => {
                TypeRef::array(Self::extract_type_ref(&slice.elem, type_params))
            }
            syn::Type::Reference(reference) => Self::extract_type_ref(&reference.elem, type_params),
            syn::Type::Paren(paren) => Self::extract_type_ref(&paren.elem, type_params),
            syn::Type::Group(group) => Self::extract_type_ref(&group.elem, type_params),
            _ => {
                debug!("Unsupported type expression, using object placeholder");
                TypeRef::number(NumberKind::Unrecognized)
            }
        }
    }

    /// Extract a TypeRef from a syn::Path
    fn extract_from_path(path: &syn::Path, type_params: &[String]) -> TypeRef {
        let Some(segment) = path.segments.last() else {
            return TypeRef::number(NumberKind::Unrecognized);
        };
        let type_name = segment.ident.to_string();
        let qualifiers: Vec<String> = path
            .segments
            .iter()
            .take(path.segments.len() - 1)
            .map(|s| s.ident.to_string())
            .collect();

        let mut args = Vec::new();
        if let syn::PathArguments::AngleBracketed(bracketed) = &segment.arguments {
            for arg in &bracketed.args {
                if let syn::GenericArgument::Type(inner_ty) = arg {
                    args.push(Self::extract_type_ref(inner_ty, type_params));
                }
            }
        }

        if qualifiers.is_empty() && type_params.contains(&type_name) {
            return TypeRef::var(type_name);
        }

        // Transparent wrappers
        if matches!(type_name.as_str(), "Option" | "Box" | "Rc" | "Arc" | "Cow") {
            if let Some(inner) = args.pop() {
                return inner;
            }
        }

        if qualifiers.iter().any(|q| q == "serde_json")
            && matches!(type_name.as_str(), "Value" | "Map")
        {
            return TypeRef::json();
        }

        let kind = match type_name.as_str() {
            "Json" | "JsonValue" | "JsonObject" => TypeKind::Json,
            "String" | "str" | "char" => TypeKind::String,
            "bool" => TypeKind::Boolean,
            "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet" => {
                TypeKind::List
            }
            "HashMap" | "BTreeMap" | "IndexMap" => TypeKind::Map,
            other => match Self::parse_number_kind(other) {
                Some(number) => TypeKind::Number(number),
                None => {
                    let module = match Self::standard_module(other) {
                        Some(module) if qualifiers.is_empty() => module.to_string(),
                        _ => qualifiers.join("::"),
                    };
                    TypeKind::Model(ModelRef::named(other, module))
                }
            },
        };
        TypeRef::with_args(kind, args)
    }

    /// Module of standard library types commonly used without a path
    fn standard_module(type_name: &str) -> Option<&'static str> {
        match type_name {
            "PathBuf" | "Path" => Some("std::path"),
            "OsString" | "OsStr" => Some("std::ffi"),
            "SystemTime" | "Instant" | "Duration" => Some("std::time"),
            "IpAddr" | "Ipv4Addr" | "Ipv6Addr" | "SocketAddr" => Some("std::net"),
            _ => None,
        }
    }

    /// Parse a numeric type name
    fn parse_number_kind(type_name: &str) -> Option<NumberKind> {
        match type_name {
            "i8" | "i16" | "i32" | "u8" | "u16" => Some(NumberKind::Int32),
            "u32" | "i64" | "u64" => Some(NumberKind::Int64),
            "f32" => Some(NumberKind::Float),
            "f64" => Some(NumberKind::Double),
            "i128" | "u128" | "Decimal" | "BigDecimal" | "BigInt" => Some(NumberKind::Arbitrary),
            "isize" | "usize" => Some(NumberKind::Unrecognized),
            _ => None,
        }
    }
}
