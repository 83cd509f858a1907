//! A simplified GraphQL execution algorithm over `serde_json::Value`.
//!
//! Fields are resolved through a [`Resolver`]; when it declines a field the
//! value is looked up by name on the parent object. Completion follows the
//! usual rules: a null in a non-null position is an error that nulls the
//! nearest nullable ancestor.
//!
//! Not supported: variables, subscriptions, introspection meta-fields.

use std::collections::HashSet;

use nlgql_schema::apollo_compiler::ast::{self, DirectiveList, OperationType};
use nlgql_schema::apollo_compiler::executable::{Field, Fragment, Selection, SelectionSet};
use nlgql_schema::apollo_compiler::schema::{ExtendedType, Type};
use nlgql_schema::apollo_compiler::validation::Valid;
use nlgql_schema::apollo_compiler::{ExecutableDocument, Name, Node, Schema};
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// What a resolver knows about the field it is asked for.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInfo<'a> {
    pub parent_type: &'a str,
    pub field_name: &'a str,
    pub return_type: &'a Type,
}

/// Supplies field values that are not plain properties of the parent object.
pub trait Resolver: Send + Sync {
    /// `Ok(None)` defers to property lookup on `parent`. `Err` becomes a field error.
    fn resolve(
        &self,
        info: &ResolveInfo<'_>,
        parent: &Value,
        args: &Map<String, Value>,
    ) -> Result<Option<Value>, String>;

    /// Concrete object type of a value returned for an interface or union field.
    fn resolve_type(&self, _abstract_type: &str, value: &Value) -> Option<String> {
        value
            .get("__typename")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Resolves nothing; every field is a property lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropertyResolver;

impl Resolver for PropertyResolver {
    fn resolve(
        &self,
        _info: &ResolveInfo<'_>,
        _parent: &Value,
        _args: &Map<String, Value>,
    ) -> Result<Option<Value>, String> {
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl Response {
    fn request_error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: vec![GraphQLError {
                message: message.into(),
                path: Vec::new(),
            }],
        }
    }
}

/// Marker for a null that must bubble to the nearest nullable position.
/// The error itself has already been recorded.
struct Propagate;

/// Execute the document's single anonymous (or only) operation.
pub fn execute(
    schema: &Valid<Schema>,
    document: &Valid<ExecutableDocument>,
    resolver: &dyn Resolver,
) -> Response {
    let operation = match document.operations.get(None) {
        Ok(op) => op,
        Err(_) => {
            return Response::request_error(
                "Must provide operation name if query contains multiple operations.",
            )
        }
    };

    if operation.operation_type == OperationType::Subscription {
        return Response::request_error("Subscriptions are not supported by the local executor.");
    }
    if !operation.variables.is_empty() {
        return Response::request_error("Variables are not supported by the local executor.");
    }

    let mut executor = Executor {
        schema,
        document,
        resolver,
        errors: Vec::new(),
    };

    let root_type = operation.selection_set.ty.as_str();
    let root_value = Value::Object(Map::new());
    let mut path = Vec::new();
    // Field order doubles as execution order, so mutations already run serially.
    let data = match executor.execute_selection_sets(
        root_type,
        &root_value,
        &[&operation.selection_set],
        &mut path,
    ) {
        Ok(map) => Value::Object(map),
        Err(Propagate) => Value::Null,
    };

    Response {
        data: Some(data),
        errors: executor.errors,
    }
}

struct Executor<'a> {
    schema: &'a Schema,
    document: &'a ExecutableDocument,
    resolver: &'a dyn Resolver,
    errors: Vec<GraphQLError>,
}

/// Fields grouped by response key, in first-seen order.
type GroupedFields<'d> = Vec<(&'d Name, Vec<&'d Node<Field>>)>;

impl<'a> Executor<'a> {
    fn error(&mut self, message: impl Into<String>, path: &[Value]) {
        self.errors.push(GraphQLError {
            message: message.into(),
            path: path.to_vec(),
        });
    }

    fn execute_selection_sets(
        &mut self,
        object_type: &str,
        object: &Value,
        selection_sets: &[&'a SelectionSet],
        path: &mut Vec<Value>,
    ) -> Result<Map<String, Value>, Propagate> {
        let mut grouped: GroupedFields<'a> = Vec::new();
        let mut visited = HashSet::new();
        for &set in selection_sets {
            self.collect_fields(object_type, set, &mut grouped, &mut visited);
        }

        let mut out = Map::new();
        for (key, fields) in grouped {
            path.push(Value::String(key.to_string()));
            let value = self.execute_field(object_type, object, &fields, path);
            path.pop();
            out.insert(key.to_string(), value?);
        }
        Ok(out)
    }

    fn collect_fields(
        &self,
        object_type: &str,
        set: &'a SelectionSet,
        grouped: &mut GroupedFields<'a>,
        visited: &mut HashSet<&'a str>,
    ) {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    if !included(&field.directives) {
                        continue;
                    }
                    let key = field.response_key();
                    match grouped.iter().position(|(k, _)| *k == key) {
                        Some(i) => grouped[i].1.push(field),
                        None => grouped.push((key, vec![field])),
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if !included(&spread.directives) {
                        continue;
                    }
                    let name = spread.fragment_name.as_str();
                    if !visited.insert(name) {
                        continue;
                    }
                    let Some(fragment) = self.document.fragments.get(name) else {
                        continue;
                    };
                    if self.type_applies(object_type, fragment_condition(fragment)) {
                        self.collect_fields(object_type, &fragment.selection_set, grouped, visited);
                    }
                }
                Selection::InlineFragment(inline) => {
                    if !included(&inline.directives) {
                        continue;
                    }
                    let applies = match &inline.type_condition {
                        Some(cond) => self.type_applies(object_type, cond.as_str()),
                        None => true,
                    };
                    if applies {
                        self.collect_fields(object_type, &inline.selection_set, grouped, visited);
                    }
                }
            }
        }
    }

    /// Whether a fragment with type condition `condition` applies to `object_type`.
    fn type_applies(&self, object_type: &str, condition: &str) -> bool {
        if object_type == condition {
            return true;
        }
        match self.schema.types.get(condition) {
            Some(ExtendedType::Interface(_)) => match self.schema.types.get(object_type) {
                Some(ExtendedType::Object(obj)) => obj
                    .implements_interfaces
                    .iter()
                    .any(|i| i.name.as_str() == condition),
                _ => false,
            },
            Some(ExtendedType::Union(union)) => {
                union.members.iter().any(|m| m.name.as_str() == object_type)
            }
            _ => false,
        }
    }

    fn execute_field(
        &mut self,
        parent_type: &str,
        parent: &Value,
        fields: &[&'a Node<Field>],
        path: &mut Vec<Value>,
    ) -> Result<Value, Propagate> {
        let field = fields[0];
        let field_name = field.name.as_str();

        if field_name == "__typename" {
            return Ok(Value::String(parent_type.to_string()));
        }
        if field_name.starts_with("__") {
            self.error(
                format!("Introspection field \"{field_name}\" is not supported by the local executor."),
                path,
            );
            return Ok(Value::Null);
        }

        let ty = &field.definition.ty;
        let args = coerce_arguments(field);
        let info = ResolveInfo {
            parent_type,
            field_name,
            return_type: ty,
        };

        let resolved = match self.resolver.resolve(&info, parent, &args) {
            Ok(Some(value)) => value,
            Ok(None) => parent.get(field_name).cloned().unwrap_or(Value::Null),
            Err(message) => {
                self.error(message, path);
                return if ty.is_non_null() { Err(Propagate) } else { Ok(Value::Null) };
            }
        };

        let sub_selections: Vec<&'a SelectionSet> =
            fields.iter().map(|&f| &f.selection_set).collect();
        let site = FieldSite {
            parent_type,
            field_name,
        };
        self.complete_value(ty, resolved, &sub_selections, site, path)
    }

    fn complete_value(
        &mut self,
        ty: &Type,
        value: Value,
        selections: &[&'a SelectionSet],
        site: FieldSite<'_>,
        path: &mut Vec<Value>,
    ) -> Result<Value, Propagate> {
        let nullable = match ty {
            Type::NonNullNamed(name) => Type::Named(name.clone()),
            Type::NonNullList(inner) => Type::List(inner.clone()),
            _ => {
                return Ok(self
                    .complete_nullable(ty, value, selections, site, path)
                    .unwrap_or(Value::Null));
            }
        };

        let completed = self.complete_nullable(&nullable, value, selections, site, path)?;
        if completed.is_null() {
            self.error(
                format!(
                    "Cannot return null for non-nullable field {}.{}.",
                    site.parent_type, site.field_name
                ),
                path,
            );
            return Err(Propagate);
        }
        Ok(completed)
    }

    fn complete_nullable(
        &mut self,
        ty: &Type,
        value: Value,
        selections: &[&'a SelectionSet],
        site: FieldSite<'_>,
        path: &mut Vec<Value>,
    ) -> Result<Value, Propagate> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        match ty {
            Type::List(inner) | Type::NonNullList(inner) => {
                let Value::Array(items) = value else {
                    self.error(
                        format!(
                            "Expected Iterable, but did not find one for field \"{}.{}\".",
                            site.parent_type, site.field_name
                        ),
                        path,
                    );
                    return Err(Propagate);
                };
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    path.push(Value::from(index));
                    let completed = self.complete_value(inner, item, selections, site, path);
                    path.pop();
                    out.push(completed?);
                }
                Ok(Value::Array(out))
            }
            Type::Named(name) | Type::NonNullNamed(name) => {
                self.complete_named(name.as_str(), value, selections, site, path)
            }
        }
    }

    fn complete_named(
        &mut self,
        type_name: &str,
        value: Value,
        selections: &[&'a SelectionSet],
        site: FieldSite<'_>,
        path: &mut Vec<Value>,
    ) -> Result<Value, Propagate> {
        let object_type = match self.schema.types.get(type_name) {
            Some(ExtendedType::Object(_)) => type_name.to_string(),
            Some(ExtendedType::Interface(_)) | Some(ExtendedType::Union(_)) => {
                match self.resolver.resolve_type(type_name, &value) {
                    Some(concrete) => concrete,
                    None => {
                        self.error(
                            format!(
                                "Abstract type \"{type_name}\" must resolve to an Object type at runtime for field \"{}.{}\".",
                                site.parent_type, site.field_name
                            ),
                            path,
                        );
                        return Err(Propagate);
                    }
                }
            }
            _ => return self.complete_leaf(type_name, value, site, path),
        };

        if !value.is_object() {
            self.error(
                format!(
                    "Expected an object for field \"{}.{}\" of type {type_name}.",
                    site.parent_type, site.field_name
                ),
                path,
            );
            return Err(Propagate);
        }

        self.execute_selection_sets(&object_type, &value, selections, path)
            .map(Value::Object)
    }

    fn complete_leaf(
        &mut self,
        type_name: &str,
        value: Value,
        site: FieldSite<'_>,
        path: &mut Vec<Value>,
    ) -> Result<Value, Propagate> {
        let coerced = match (type_name, value) {
            ("Int", Value::Number(n)) => match n.as_i64().or_else(|| integral(n.as_f64())) {
                Some(i) if i32::try_from(i).is_ok() => Some(Value::from(i)),
                _ => None,
            },
            ("Float", Value::Number(n)) => Some(Value::Number(n)),
            ("ID", Value::Number(n)) => Some(Value::String(n.to_string())),
            (_, v @ (Value::Array(_) | Value::Object(_))) => {
                // Custom scalars may carry structured JSON; built-ins may not.
                if matches!(type_name, "String" | "Int" | "Float" | "Boolean" | "ID") {
                    None
                } else {
                    Some(v)
                }
            }
            ("Int" | "Float", _) => None,
            ("Boolean", v) => v.is_boolean().then_some(v),
            (_, v) => Some(v),
        };

        match coerced {
            Some(v) => Ok(v),
            None => {
                self.error(
                    format!(
                        "{type_name} cannot represent the value returned for field \"{}.{}\".",
                        site.parent_type, site.field_name
                    ),
                    path,
                );
                Err(Propagate)
            }
        }
    }
}

#[derive(Clone, Copy)]
struct FieldSite<'s> {
    parent_type: &'s str,
    field_name: &'s str,
}

fn integral(f: Option<f64>) -> Option<i64> {
    f.filter(|f| f.fract() == 0.0).map(|f| f as i64)
}

fn fragment_condition(fragment: &Fragment) -> &str {
    fragment.selection_set.ty.as_str()
}

/// `@skip(if:)` / `@include(if:)` with literal arguments.
fn included(directives: &DirectiveList) -> bool {
    let flag = |name: &str| {
        directives
            .iter()
            .find(|d| d.name.as_str() == name)
            .and_then(|d| d.arguments.iter().find(|a| a.name.as_str() == "if"))
            .and_then(|a| match &*a.value {
                ast::Value::Boolean(b) => Some(*b),
                _ => None,
            })
    };
    if flag("skip") == Some(true) {
        return false;
    }
    flag("include") != Some(false)
}

/// Literal arguments, with defaults filled in from the field definition.
fn coerce_arguments(field: &Field) -> Map<String, Value> {
    let mut args = Map::new();
    for def in &field.definition.arguments {
        let provided = field
            .arguments
            .iter()
            .find(|a| a.name == def.name)
            .map(|a| &a.value);
        if let Some(value) = provided.or(def.default_value.as_ref()) {
            args.insert(def.name.to_string(), literal_to_json(value));
        }
    }
    args
}

pub(crate) fn literal_to_json(value: &ast::Value) -> Value {
    match value {
        ast::Value::Null | ast::Value::Variable(_) => Value::Null,
        ast::Value::Enum(name) => Value::String(name.to_string()),
        ast::Value::String(s) => Value::String(s.clone()),
        ast::Value::Boolean(b) => Value::Bool(*b),
        ast::Value::Int(i) => i
            .as_str()
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| i.as_str().parse::<f64>().map(float))
            .unwrap_or(Value::Null),
        ast::Value::Float(f) => f.as_str().parse::<f64>().map(float).unwrap_or(Value::Null),
        ast::Value::List(items) => Value::Array(items.iter().map(|v| literal_to_json(v)).collect()),
        ast::Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, v)| (name.to_string(), literal_to_json(v)))
                .collect(),
        ),
    }
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests;
