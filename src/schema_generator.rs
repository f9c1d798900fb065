use crate::config::GenericScope;
use crate::descriptor::{ApiModel, FieldDef, ModelRef, TypeDef, TypeDefKind, TypeKind, TypeRef};
use crate::schema::{Schema, SchemaMap};
use crate::type_mapper::{register_enum, TypeMapper};
use crate::type_resolver::TypeResolver;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Schema generator - builds component schemas for domain types
///
/// Components are keyed by simple type name and built at most once per generator. Nested
/// model types are collected on a worklist and built within the same call, so cyclic type
/// graphs terminate without recursion.
pub struct SchemaGenerator {
    /// Type resolver for looking up type definitions
    type_resolver: TypeResolver,
    /// Registered component schemas
    schemas: SchemaMap,
    scope: GenericScope,
    /// Module prefix of the application's own types
    domain: Option<String>,
}

impl SchemaGenerator {
    /// Create a new SchemaGenerator with a TypeResolver
    pub fn new(type_resolver: TypeResolver) -> Self {
        debug!("Initializing SchemaGenerator");
        Self {
            type_resolver,
            schemas: SchemaMap::new(),
            scope: GenericScope::default(),
            domain: None,
        }
    }

    pub fn with_generic_scope(mut self, scope: GenericScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_domain(mut self, domain: Option<String>) -> Self {
        self.domain = domain;
        self
    }

    pub fn type_resolver(&self) -> &TypeResolver {
        &self.type_resolver
    }

    /// Build the component for a Rust domain type
    pub fn build_model<T: ApiModel>(&mut self) {
        self.build_component(&ModelRef::of::<T>());
    }

    /// Build the component for `model` and every model type reachable from it.
    ///
    /// Already registered names are left untouched. Types that cannot be resolved are
    /// registered as empty objects so references to them stay valid.
    pub fn build_component(&mut self, model: &ModelRef) {
        let mut queue = VecDeque::from([model.clone()]);

        while let Some(next) = queue.pop_front() {
            if self.schemas.contains_key(&next.name) {
                debug!("Schema for {} already exists", next.name);
                continue;
            }

            let Some(def) = self.type_resolver.resolve(&next) else {
                if next.is_standard_library() {
                    debug!("Skipping library type {}::{}", next.module, next.name);
                    continue;
                }
                warn!(
                    "Could not resolve type: {}, registering an empty object",
                    next.name
                );
                self.schemas
                    .insert(next.name.clone(), Schema::of_type("object"));
                continue;
            };

            if let TypeDefKind::Enum(constants) = &def.kind {
                register_enum(&next.name, constants, &mut self.schemas);
                continue;
            }

            debug!("Generating struct schema for: {}", next.name);
            // Reserve the name first so self references are not queued again
            self.schemas
                .insert(next.name.clone(), Schema::of_type("object"));
            let schema = self.object_schema(&def, &mut queue);
            self.schemas.insert(next.name.clone(), schema);
        }
    }

    /// Build `model` and return a `$ref` to its component.
    ///
    /// Unregistered standard library types get no component, so a plain object is returned.
    pub fn component_reference(&mut self, model: &ModelRef) -> Schema {
        if model.is_standard_library() && self.type_resolver.resolve(model).is_none() {
            return Schema::of_type("object");
        }
        self.build_component(model);
        Schema::reference(&model.name)
    }

    /// Derive the object schema of `def`, queueing referenced model types
    fn object_schema(&mut self, def: &TypeDef, queue: &mut VecDeque<ModelRef>) -> Schema {
        let collected = self.collect_fields(def);
        let mapper = TypeMapper::new(&self.type_resolver, self.scope);
        let mut pending = Vec::new();

        let mut schema = Schema::of_type("object");
        let mut properties = BTreeMap::new();
        let mut accumulated = collected.accumulated;

        for (field, bound) in collected.fields.iter().filter(|(f, _)| !f.is_static) {
            let name = field.serialized_name().to_string();
            debug!(" - Field: {} ({})", field.name, field.ty);

            let mut field_schema = match &field.deserialize_as {
                Some(target) => {
                    let ty = TypeRef::new(TypeKind::Model(target.clone()));
                    mapper.map(&ty, &[], &mut self.schemas, &mut pending)
                }
                None => match self.scope {
                    GenericScope::PerField => {
                        mapper.map(bound, &bound.args, &mut self.schemas, &mut pending)
                    }
                    GenericScope::Accumulated => {
                        accumulated.extend(field.ty.args.iter().cloned());
                        mapper.map(&field.ty, &accumulated, &mut self.schemas, &mut pending)
                    }
                },
            };

            field_schema.description = field.description.clone();
            if let Some(default) = field.default_value.as_deref() {
                if !default.trim().is_empty() {
                    field_schema.default = Some(serde_json::Value::String(default.to_string()));
                }
            }
            if properties.contains_key(&name) {
                debug!("Property {} is shadowed by an earlier declaration", name);
                continue;
            }
            if field.required {
                schema.add_required(&name);
            }
            properties.insert(name, field_schema);
        }

        schema.properties = Some(properties);
        queue.extend(pending);
        schema
    }

    /// Walk `def`, its in-domain interfaces and its parent chain, in that order.
    ///
    /// Each level binds its own type parameters, so a field type is substituted with the
    /// arguments its declaring type received rather than those of a deeper ancestor.
    fn collect_fields(&self, def: &TypeDef) -> CollectedFields {
        let domain = self.domain_prefix(&def.module);
        let mut collected = CollectedFields {
            fields: Vec::new(),
            accumulated: def.type_params.iter().map(TypeRef::var).collect(),
        };
        let mut visited = HashSet::from([def.name.clone()]);
        let mut walk = VecDeque::from([(def.clone(), HashMap::new())]);

        while let Some((current, bindings)) = walk.pop_front() {
            debug!("Type: {}::{}", current.module, current.name);
            collected.fields.extend(
                current
                    .fields
                    .iter()
                    .map(|field| (field.clone(), field.ty.substitute(&bindings))),
            );

            for interface in &current.interfaces {
                let module = self.type_resolver.module_of(interface);
                if !in_domain(&module, &domain) {
                    debug!("Skipping interface {} outside of {}", interface.name, domain);
                    continue;
                }
                match self.type_resolver.resolve(interface) {
                    Some(found) if visited.insert(found.name.clone()) => {
                        walk.push_back((found, HashMap::new()))
                    }
                    Some(_) => {}
                    None => debug!("Interface {} not found", interface.name),
                }
            }

            let Some(parent) = &current.parent else {
                continue;
            };
            collected.accumulated.extend(parent.args.iter().cloned());
            let Some(parent_model) = parent.model_ref() else {
                continue;
            };
            match self.type_resolver.resolve(parent_model) {
                Some(parent_def) => {
                    let parent_bindings: HashMap<String, TypeRef> = parent_def
                        .type_params
                        .iter()
                        .cloned()
                        .zip(parent.args.iter().map(|arg| arg.substitute(&bindings)))
                        .collect();
                    if visited.insert(parent_def.name.clone()) {
                        walk.push_back((parent_def, parent_bindings));
                    }
                }
                None => debug!("Parent type {} not found", parent_model.name),
            }
        }

        collected
    }

    /// Module prefix that counts as "our own code" for a root type
    fn domain_prefix(&self, root_module: &str) -> String {
        match &self.domain {
            Some(domain) => domain.clone(),
            None => root_module.split("::").next().unwrap_or_default().to_string(),
        }
    }

    /// Whether `module` belongs to the configured domain.
    ///
    /// Without a configured domain every module is accepted.
    pub fn is_in_domain(&self, module: &str) -> bool {
        match &self.domain {
            Some(domain) => in_domain(module, domain),
            None => true,
        }
    }

    /// Get all generated schemas
    pub fn get_schemas(&self) -> &SchemaMap {
        &self.schemas
    }

    pub fn into_schemas(self) -> SchemaMap {
        self.schemas
    }
}

/// Fields gathered across a type hierarchy together with the generic context
struct CollectedFields {
    /// Each field with its type bound by the declaring level's arguments
    fields: Vec<(FieldDef, TypeRef)>,
    /// Every generic argument seen on the walk, in encounter order
    accumulated: Vec<TypeRef>,
}

fn in_domain(module: &str, domain: &str) -> bool {
    domain.is_empty()
        || module == domain
        || module
            .strip_prefix(domain)
            .is_some_and(|rest| rest.starts_with("::"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Describe, NumberKind};
    use crate::schema::ANY_JSON;

    struct Author;
    struct Book;

    impl ApiModel for Author {
        fn type_def() -> TypeDef {
            TypeDef::object_of::<Self>()
                .field(FieldDef::new("name", String::type_ref()).required())
                .field(FieldDef::new("books", TypeRef::list(TypeRef::model::<Book>())))
        }
    }

    impl ApiModel for Book {
        fn type_def() -> TypeDef {
            TypeDef::object_of::<Self>()
                .field(FieldDef::new("title", String::type_ref()))
                .field(FieldDef::new("author", TypeRef::model::<Author>()))
        }
    }

    fn generator(defs: Vec<TypeDef>) -> SchemaGenerator {
        let mut resolver = TypeResolver::new();
        resolver.extend(defs);
        SchemaGenerator::new(resolver)
    }

    #[test]
    fn test_cycle_builds_each_component_once() {
        let mut generator = SchemaGenerator::new(TypeResolver::new());
        generator.build_model::<Author>();

        let schemas = generator.get_schemas();
        assert_eq!(schemas.len(), 2);

        let author = &schemas["Author"];
        let books = author.property("books").unwrap();
        assert_eq!(books.schema_type.as_deref(), Some("array"));
        assert_eq!(
            books.items.as_ref().unwrap().referenced_component(),
            Some("Book")
        );

        let book = &schemas["Book"];
        assert_eq!(
            book.property("author").unwrap().referenced_component(),
            Some("Author")
        );
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut generator = SchemaGenerator::new(TypeResolver::new());
        generator.build_model::<Author>();
        let first = generator.get_schemas().clone();
        generator.build_model::<Book>();
        generator.build_model::<Author>();
        assert_eq!(generator.get_schemas(), &first);
    }

    #[test]
    fn test_numeric_formats() {
        let mut generator = generator(vec![TypeDef::object("Measure", "app")
            .field(FieldDef::new("small", i32::type_ref()))
            .field(FieldDef::new("large", i64::type_ref()))
            .field(FieldDef::new("ratio", f32::type_ref()))
            .field(FieldDef::new("precise", f64::type_ref()))
            .field(FieldDef::new("exact", TypeRef::number(NumberKind::Arbitrary)))]);
        generator.build_component(&ModelRef::named("Measure", "app"));

        let measure = &generator.get_schemas()["Measure"];
        let format = |name: &str| measure.property(name).unwrap().format.clone();
        assert_eq!(format("small").as_deref(), Some("int32"));
        assert_eq!(format("large").as_deref(), Some("int64"));
        assert_eq!(format("ratio").as_deref(), Some("float"));
        assert_eq!(format("precise").as_deref(), Some("double"));
        assert_eq!(format("exact"), None);
        assert_eq!(
            measure.property("exact").unwrap().schema_type.as_deref(),
            Some("number")
        );
    }

    #[test]
    fn test_required_uses_serialized_name() {
        let mut generator = generator(vec![TypeDef::object("Account", "app")
            .field(
                FieldDef::new("user_name", String::type_ref())
                    .rename("userName")
                    .required(),
            )
            .field(FieldDef::new("nick", String::type_ref()))]);
        generator.build_component(&ModelRef::named("Account", "app"));

        let account = &generator.get_schemas()["Account"];
        assert_eq!(account.required, Some(vec!["userName".to_string()]));
        assert!(account.property("userName").is_some());
        assert!(account.property("user_name").is_none());
    }

    #[test]
    fn test_enum_component_registered_once() {
        let mut generator = generator(vec![
            TypeDef::enumeration("Color", "app", ["RED", "Green"]),
            TypeDef::object("Car", "app")
                .field(FieldDef::new("paint", TypeRef::named("Color", "app")))
                .field(FieldDef::new("trim", TypeRef::named("Color", "app"))),
        ]);
        generator.build_component(&ModelRef::named("Car", "app"));

        let schemas = generator.get_schemas();
        assert_eq!(schemas.len(), 2);
        let color = &schemas["Color"];
        assert_eq!(color.schema_type.as_deref(), Some("string"));
        assert_eq!(
            color.enum_values,
            Some(vec!["red".to_string(), "green".to_string()])
        );
        let paint = schemas["Car"].property("paint").unwrap();
        assert_eq!(paint.schema_type.as_deref(), Some("object"));
        assert_eq!(paint.referenced_component(), Some("Color"));
    }

    #[test]
    fn test_field_annotations_and_static_members() {
        let mut generator = generator(vec![TypeDef::object("Settings", "app")
            .field(
                FieldDef::new("theme", String::type_ref())
                    .description("UI theme")
                    .default_value("dark"),
            )
            .field(FieldDef::new("blank", String::type_ref()).default_value("  "))
            .field(FieldDef::new("VERSION", String::type_ref()).static_member())]);
        generator.build_component(&ModelRef::named("Settings", "app"));

        let settings = &generator.get_schemas()["Settings"];
        let theme = settings.property("theme").unwrap();
        assert_eq!(theme.description.as_deref(), Some("UI theme"));
        assert_eq!(theme.default, Some(serde_json::json!("dark")));
        assert!(settings.property("blank").unwrap().default.is_none());
        assert!(settings.property("VERSION").is_none());
        assert!(settings.required.is_none());
    }

    #[test]
    fn test_parent_and_interface_fields() {
        let mut generator = generator(vec![
            TypeDef::object("Entity", "app::model")
                .field(FieldDef::new("uuid", String::type_ref()).required()),
            TypeDef::object("Named", "app::model")
                .field(FieldDef::new("label", String::type_ref())),
            TypeDef::object("Foreign", "vendor::api")
                .field(FieldDef::new("leaked", String::type_ref())),
            TypeDef::object("Node", "app::model")
                .extends(TypeRef::named("Entity", "app::model"))
                .implements(ModelRef::named("Named", "app::model"))
                .implements(ModelRef::named("Foreign", "vendor::api"))
                .field(FieldDef::new("path", String::type_ref())),
        ]);
        generator.build_component(&ModelRef::named("Node", "app::model"));

        let node = &generator.get_schemas()["Node"];
        let names: Vec<&String> = node.properties.as_ref().unwrap().keys().collect();
        assert_eq!(names, vec!["label", "path", "uuid"]);
        assert_eq!(node.required, Some(vec!["uuid".to_string()]));
    }

    #[test]
    fn test_configured_domain_filters_interfaces() {
        let mut generator = generator(vec![
            TypeDef::object("Named", "app::shared")
                .field(FieldDef::new("label", String::type_ref())),
            TypeDef::object("Node", "app::model")
                .implements(ModelRef::named("Named", "app::shared")),
        ])
        .with_domain(Some("app::model".to_string()));
        generator.build_component(&ModelRef::named("Node", "app::model"));

        let node = &generator.get_schemas()["Node"];
        assert!(node.property("label").is_none());
        assert!(generator.is_in_domain("app::model::nested"));
        assert!(!generator.is_in_domain("app::modeling"));
    }

    #[test]
    fn test_parent_generic_bound_per_field() {
        let mut generator = generator(vec![
            TypeDef::object("Page", "app")
                .type_param("T")
                .field(FieldDef::new("data", TypeRef::list(TypeRef::var("T"))))
                .field(FieldDef::new("total", i64::type_ref())),
            TypeDef::object("UserPage", "app")
                .extends(TypeRef::named("Page", "app").of(vec![TypeRef::named("User", "app")])),
            TypeDef::object("User", "app").field(FieldDef::new("id", String::type_ref())),
        ]);
        generator.build_component(&ModelRef::named("UserPage", "app"));

        let schemas = generator.get_schemas();
        let data = schemas["UserPage"].property("data").unwrap();
        assert_eq!(
            data.items.as_ref().unwrap().referenced_component(),
            Some("User")
        );
        assert!(schemas.contains_key("User"));
        assert!(!schemas.contains_key("Page"));
    }

    #[test]
    fn test_generic_bindings_follow_each_level() {
        let mut generator = generator(vec![
            TypeDef::object("Base", "app")
                .type_param("T")
                .field(FieldDef::new("wrapped", TypeRef::var("T"))),
            TypeDef::object("Page", "app")
                .type_param("T")
                .extends(
                    TypeRef::named("Base", "app")
                        .of(vec![TypeRef::list(TypeRef::var("T"))]),
                )
                .field(FieldDef::new("first", TypeRef::var("T"))),
            TypeDef::object("UserPage", "app")
                .extends(TypeRef::named("Page", "app").of(vec![TypeRef::named("User", "app")])),
            TypeDef::object("User", "app").field(FieldDef::new("id", String::type_ref())),
        ]);
        generator.build_component(&ModelRef::named("UserPage", "app"));

        let schemas = generator.get_schemas();
        let page = &schemas["UserPage"];
        assert_eq!(
            page.property("first").unwrap().referenced_component(),
            Some("User")
        );
        let wrapped = page.property("wrapped").unwrap();
        assert_eq!(wrapped.schema_type.as_deref(), Some("array"));
        assert_eq!(
            wrapped.items.as_ref().unwrap().referenced_component(),
            Some("User")
        );
    }

    #[test]
    fn test_shadowed_field_does_not_inherit_required() {
        let mut generator = generator(vec![
            TypeDef::object("Entity", "app")
                .field(FieldDef::new("id", i64::type_ref()).required())
                .field(FieldDef::new("version", i64::type_ref()).required()),
            TypeDef::object("Draft", "app")
                .extends(TypeRef::named("Entity", "app"))
                .field(FieldDef::new("id", String::type_ref())),
        ]);
        generator.build_component(&ModelRef::named("Draft", "app"));

        let draft = &generator.get_schemas()["Draft"];
        assert_eq!(draft.required, Some(vec!["version".to_string()]));
        assert_eq!(
            draft.property("id").unwrap().schema_type.as_deref(),
            Some("string")
        );
    }

    #[test]
    fn test_standard_library_types_get_no_component() {
        let mut generator = generator(vec![TypeDef::object("Upload", "app")
            .field(FieldDef::new("created", TypeRef::named("SystemTime", "std::time")))
            .field(
                FieldDef::new("raw", TypeRef::json())
                    .deserialize_as(ModelRef::named("PathBuf", "std::path")),
            )]);
        generator.build_component(&ModelRef::named("Upload", "app"));
        let reference = generator.component_reference(&ModelRef::named("Duration", "core::time"));

        assert_eq!(reference, Schema::of_type("object"));
        let schemas = generator.get_schemas();
        let upload = &schemas["Upload"];
        assert_eq!(*upload.property("created").unwrap(), Schema::of_type("object"));
        assert_eq!(*upload.property("raw").unwrap(), Schema::of_type("object"));
        let names: Vec<&String> = schemas.keys().collect();
        assert_eq!(names, vec!["Upload"]);
    }

    #[test]
    fn test_accumulated_generics_leak_between_fields() {
        let defs = vec![TypeDef::object("Mixed", "app")
            .field(FieldDef::new("names", TypeRef::list(TypeRef::string())))
            .field(FieldDef::new("counts", TypeRef::list(i64::type_ref())))
            .field(FieldDef::new(
                "lookup",
                TypeRef::map(TypeRef::string(), TypeRef::boolean()),
            ))];

        let mut per_field = generator(defs.clone());
        per_field.build_component(&ModelRef::named("Mixed", "app"));
        let mixed = &per_field.get_schemas()["Mixed"];
        let counts = mixed.property("counts").unwrap().items.clone().unwrap();
        assert_eq!(counts.format.as_deref(), Some("int64"));
        let lookup = mixed.property("lookup").unwrap();
        assert_eq!(
            lookup.additional_properties.as_ref().unwrap().schema_type.as_deref(),
            Some("boolean")
        );

        let mut accumulated = generator(defs).with_generic_scope(GenericScope::Accumulated);
        accumulated.build_component(&ModelRef::named("Mixed", "app"));
        let mixed = &accumulated.get_schemas()["Mixed"];
        // The first captured argument wins for every later list
        let counts = mixed.property("counts").unwrap().items.clone().unwrap();
        assert_eq!(counts.schema_type.as_deref(), Some("string"));
        // Four captured arguments leave the map untyped
        let lookup = mixed.property("lookup").unwrap();
        assert_eq!(
            **lookup.additional_properties.as_ref().unwrap(),
            Schema::of_type("object")
        );
    }

    #[test]
    fn test_deserialize_as_override() {
        let mut generator = generator(vec![
            TypeDef::object("Shape", "app").field(
                FieldDef::new("body", TypeRef::json())
                    .deserialize_as(ModelRef::named("Circle", "app")),
            ),
            TypeDef::object("Circle", "app").field(FieldDef::new("radius", f64::type_ref())),
        ]);
        generator.build_component(&ModelRef::named("Shape", "app"));

        let schemas = generator.get_schemas();
        let body = schemas["Shape"].property("body").unwrap();
        assert_eq!(body.referenced_component(), Some("Circle"));
        assert!(schemas.contains_key("Circle"));
        assert!(!schemas.contains_key(ANY_JSON));
    }

    #[test]
    fn test_unresolved_type_becomes_empty_object() {
        let mut generator = generator(vec![TypeDef::object("Holder", "app")
            .field(FieldDef::new("ghost", TypeRef::named("Ghost", "app")))]);
        generator.build_component(&ModelRef::named("Holder", "app"));

        let schemas = generator.get_schemas();
        assert_eq!(schemas["Ghost"], Schema::of_type("object"));
    }

    #[test]
    fn test_json_field_registers_sentinel() {
        let mut generator = generator(vec![TypeDef::object("Event", "app")
            .field(FieldDef::new("payload", serde_json::Value::type_ref()))]);
        generator.build_component(&ModelRef::named("Event", "app"));

        let schemas = generator.get_schemas();
        assert_eq!(schemas[ANY_JSON], Schema::of_type("object"));
        assert_eq!(
            schemas["Event"].property("payload").unwrap().referenced_component(),
            Some(ANY_JSON)
        );
    }
}
