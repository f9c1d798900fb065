use crate::config::GenericScope;
use crate::descriptor::{ModelRef, NumberKind, TypeDefKind, TypeKind, TypeRef};
use crate::schema::{Schema, SchemaMap, ANY_JSON};
use crate::type_resolver::TypeResolver;
use log::{debug, warn};

/// Type mapper - maps a single declared type to a schema fragment
///
/// The mapper never expands object graphs itself. Model types come back as references and
/// are queued in `pending` for the component builder. Enums are the exception: they are
/// registered as named string components right here.
pub struct TypeMapper<'a> {
    resolver: &'a TypeResolver,
    scope: GenericScope,
}

impl<'a> TypeMapper<'a> {
    pub fn new(resolver: &'a TypeResolver, scope: GenericScope) -> Self {
        Self { resolver, scope }
    }

    /// Map a type with the generic arguments captured for it
    pub fn map(
        &self,
        ty: &TypeRef,
        generics: &[TypeRef],
        components: &mut SchemaMap,
        pending: &mut Vec<ModelRef>,
    ) -> Schema {
        match &ty.kind {
            TypeKind::Number(kind) => number_schema(*kind),
            TypeKind::Boolean => Schema::of_type("boolean"),
            TypeKind::String => Schema::of_type("string"),
            TypeKind::Array(item) => {
                let mut schema = Schema::of_type("array");
                let items = self.map(item, &item.args, components, pending);
                schema.items = Some(Box::new(items));
                schema
            }
            TypeKind::List => {
                let mut schema = Schema::of_type("array");
                match generics.first().and_then(|arg| self.resolvable(arg)) {
                    Some(item) => {
                        let items = self.map(item, &item.args, components, pending);
                        schema.items = Some(Box::new(items));
                    }
                    None => {
                        let captured: Vec<String> = generics.iter().map(|g| g.to_string()).collect();
                        warn!("Unknown array type {} / {:?}", ty, captured);
                    }
                }
                schema
            }
            TypeKind::Map => {
                let mut schema = Schema::of_type("object");
                // Only the value type is modeled; keys are always strings in JSON.
                let value = if generics.len() == 2 {
                    match self.resolvable(&generics[1]) {
                        Some(value) => self.map(value, &value.args, components, pending),
                        None => Schema::of_type("object"),
                    }
                } else {
                    debug!(
                        "Map type {} has {} captured generic arguments, leaving values untyped",
                        ty,
                        generics.len()
                    );
                    Schema::of_type("object")
                };
                schema.additional_properties = Some(Box::new(value));
                schema
            }
            TypeKind::Json => {
                components
                    .entry(ANY_JSON.to_string())
                    .or_insert_with(|| Schema::of_type("object"));
                Schema::reference(ANY_JSON)
            }
            TypeKind::Model(model) => {
                match self.resolver.resolve(model) {
                    Some(def) => match &def.kind {
                        TypeDefKind::Enum(constants) => {
                            register_enum(&model.name, constants, components)
                        }
                        TypeDefKind::Object => pending.push(model.clone()),
                    },
                    None if model.is_standard_library() => {
                        debug!("{}::{} is a library type, using object", model.module, model.name);
                        return Schema::of_type("object");
                    }
                    None => pending.push(model.clone()),
                }
                Schema::object_ref(&model.name)
            }
            TypeKind::Var(name) => {
                debug!("Unresolved type variable {}, using object placeholder", name);
                Schema::of_type("object")
            }
        }
    }

    /// A captured generic argument that can be mapped, if any
    fn resolvable<'t>(&self, arg: &'t TypeRef) -> Option<&'t TypeRef> {
        match self.scope {
            GenericScope::Accumulated => arg.is_concrete().then_some(arg),
            GenericScope::PerField => match arg.kind {
                TypeKind::Var(_) => None,
                _ => Some(arg),
            },
        }
    }
}

/// Register an enum as a named string component, once
pub(crate) fn register_enum(name: &str, constants: &[String], components: &mut SchemaMap) {
    if components.contains_key(name) {
        debug!("Schema for {} already exists", name);
        return;
    }
    debug!("Generating enum schema for: {}", name);
    let mut schema = Schema::of_type("string");
    schema.enum_values = Some(constants.iter().map(|c| c.to_lowercase()).collect());
    components.insert(name.to_string(), schema);
}

fn number_schema(kind: NumberKind) -> Schema {
    match kind {
        NumberKind::Int32 => Schema::with_format("integer", "int32"),
        NumberKind::Int64 => Schema::with_format("integer", "int64"),
        NumberKind::Float => Schema::with_format("number", "float"),
        NumberKind::Double => Schema::with_format("number", "double"),
        NumberKind::Arbitrary => Schema::of_type("number"),
        NumberKind::Unrecognized => Schema::of_type("object"),
    }
}
