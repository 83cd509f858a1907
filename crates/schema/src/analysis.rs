use apollo_compiler::schema::{ExtendedType, Type};
use apollo_compiler::Schema;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single field of an object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    /// Type signature as written in SDL, e.g. `[Product!]!`.
    #[serde(rename = "type")]
    pub type_signature: String,
    pub is_relation: bool,
}

/// A named object type (root operation types excluded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectTypeInfo {
    pub name: String,
    pub fields: Vec<FieldInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Directed edge between two object types via an object-typed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRelationship {
    pub from_type: String,
    pub field: String,
    pub to_type: String,
    pub is_list: bool,
    pub is_non_null: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_signature: String,
    pub required: bool,
}

/// A field of the query or mutation root type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPoint {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub args: Vec<ArgumentInfo>,
    pub return_type: String,
    pub is_list: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumInfo {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_signature: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTypeInfo {
    pub name: String,
    pub fields: Vec<InputFieldInfo>,
}

/// Structured description of a schema's graph shape.
///
/// Built once per active schema and shared read-only; see [`analyze`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaAnalysis {
    pub types: Vec<ObjectTypeInfo>,
    pub relationships: Vec<TypeRelationship>,
    pub entry_points: Vec<EntryPoint>,
    pub enums: Vec<EnumInfo>,
    pub input_types: Vec<InputTypeInfo>,
}

/// Element counts of an analysis, reported when an endpoint is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub types: usize,
    pub relationships: usize,
    pub queries: usize,
    pub mutations: usize,
    pub enums: usize,
    pub input_types: usize,
}

impl SchemaAnalysis {
    pub fn queries(&self) -> impl Iterator<Item = &EntryPoint> {
        self.entry_points
            .iter()
            .filter(|e| e.kind == OperationKind::Query)
    }

    pub fn mutations(&self) -> impl Iterator<Item = &EntryPoint> {
        self.entry_points
            .iter()
            .filter(|e| e.kind == OperationKind::Mutation)
    }

    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            types: self.types.len(),
            relationships: self.relationships.len(),
            queries: self.queries().count(),
            mutations: self.mutations().count(),
            enums: self.enums.len(),
            input_types: self.input_types.len(),
        }
    }

    /// Render the prompt-ready text form (see [`crate::render::render_context`]).
    pub fn to_llm_context(&self) -> String {
        crate::render::render_context(self)
    }
}

/// Analyse a schema into types, relationships, entry points, enums and input types.
pub fn analyze(schema: &Schema) -> SchemaAnalysis {
    let roots = RootTypes::of(schema);

    let relationships = extract_relationships(schema, &roots);
    let entry_points = extract_entry_points(schema, &roots);
    let types = extract_types(schema, &roots);
    let enums = extract_enums(schema);
    let input_types = extract_input_types(schema);

    debug!(
        types = types.len(),
        relationships = relationships.len(),
        entry_points = entry_points.len(),
        "schema analysed"
    );

    SchemaAnalysis {
        types,
        relationships,
        entry_points,
        enums,
        input_types,
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Names of the root operation types.
struct RootTypes<'a> {
    query: Option<&'a str>,
    mutation: Option<&'a str>,
    subscription: Option<&'a str>,
}

impl<'a> RootTypes<'a> {
    fn of(schema: &'a Schema) -> Self {
        let def = &schema.schema_definition;
        Self {
            query: def.query.as_ref().map(|n| n.name.as_str()),
            mutation: def.mutation.as_ref().map(|n| n.name.as_str()),
            subscription: def.subscription.as_ref().map(|n| n.name.as_str()),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.query == Some(name) || self.mutation == Some(name) || self.subscription == Some(name)
    }
}

fn is_introspection(name: &str) -> bool {
    name.starts_with("__")
}

/// A list field is `[T]` or `[T]!`: at most one non-null wrapper, then a list.
pub(crate) fn is_list(ty: &Type) -> bool {
    matches!(ty, Type::List(_) | Type::NonNullList(_))
}

fn is_object_type(schema: &Schema, name: &str) -> bool {
    matches!(schema.types.get(name), Some(ExtendedType::Object(_)))
}

/// Object types that are neither introspection nor root types, in schema order.
fn user_object_types<'s>(
    schema: &'s Schema,
    roots: &'s RootTypes<'s>,
) -> impl Iterator<Item = (&'s str, &'s apollo_compiler::schema::ObjectType)> + 's {
    schema.types.iter().filter_map(move |(name, ty)| {
        let name = name.as_str();
        if is_introspection(name) || roots.contains(name) {
            return None;
        }
        match ty {
            ExtendedType::Object(obj) => Some((name, &**obj)),
            _ => None,
        }
    })
}

fn extract_relationships(schema: &Schema, roots: &RootTypes<'_>) -> Vec<TypeRelationship> {
    let mut relationships = Vec::new();
    for (type_name, obj) in user_object_types(schema, roots) {
        for (field_name, field) in &obj.fields {
            let target = field.ty.inner_named_type().as_str();
            if is_object_type(schema, target) && !roots.contains(target) {
                relationships.push(TypeRelationship {
                    from_type: type_name.to_string(),
                    field: field_name.to_string(),
                    to_type: target.to_string(),
                    is_list: is_list(&field.ty),
                    is_non_null: field.ty.is_non_null(),
                });
            }
        }
    }
    relationships
}

fn extract_entry_points(schema: &Schema, roots: &RootTypes<'_>) -> Vec<EntryPoint> {
    let mut entry_points = Vec::new();
    let root_types = [
        (roots.query, OperationKind::Query),
        (roots.mutation, OperationKind::Mutation),
    ];

    for (root_name, kind) in root_types {
        let Some(root_name) = root_name else { continue };
        let Some(ExtendedType::Object(root)) = schema.types.get(root_name) else {
            continue;
        };

        for (field_name, field) in &root.fields {
            entry_points.push(EntryPoint {
                name: field_name.to_string(),
                kind,
                args: field
                    .arguments
                    .iter()
                    .map(|arg| ArgumentInfo {
                        name: arg.name.to_string(),
                        type_signature: arg.ty.to_string(),
                        required: arg.ty.is_non_null(),
                    })
                    .collect(),
                return_type: field.ty.to_string(),
                is_list: is_list(&field.ty),
            });
        }
    }

    entry_points
}

/// `is_relation` depends only on the field's named type, so a field returning a
/// root type is a relation even though it yields no relationship edge.
fn extract_types(schema: &Schema, roots: &RootTypes<'_>) -> Vec<ObjectTypeInfo> {
    user_object_types(schema, roots)
        .map(|(type_name, obj)| ObjectTypeInfo {
            name: type_name.to_string(),
            fields: obj
                .fields
                .iter()
                .map(|(field_name, field)| FieldInfo {
                    name: field_name.to_string(),
                    type_signature: field.ty.to_string(),
                    is_relation: is_object_type(schema, field.ty.inner_named_type().as_str()),
                })
                .collect(),
            description: obj.description.as_ref().map(|d| d.to_string()),
        })
        .collect()
}

fn extract_enums(schema: &Schema) -> Vec<EnumInfo> {
    schema
        .types
        .iter()
        .filter(|(name, _)| !is_introspection(name.as_str()))
        .filter_map(|(name, ty)| match ty {
            ExtendedType::Enum(e) => Some(EnumInfo {
                name: name.to_string(),
                values: e.values.keys().map(|v| v.to_string()).collect(),
            }),
            _ => None,
        })
        .collect()
}

fn extract_input_types(schema: &Schema) -> Vec<InputTypeInfo> {
    schema
        .types
        .iter()
        .filter(|(name, _)| !is_introspection(name.as_str()))
        .filter_map(|(name, ty)| match ty {
            ExtendedType::InputObject(input) => Some(InputTypeInfo {
                name: name.to_string(),
                fields: input
                    .fields
                    .iter()
                    .map(|(field_name, field)| InputFieldInfo {
                        name: field_name.to_string(),
                        type_signature: field.ty.to_string(),
                        required: field.ty.is_non_null(),
                    })
                    .collect(),
            }),
            _ => None,
        })
        .collect()
}
