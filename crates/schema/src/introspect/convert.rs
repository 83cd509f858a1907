//! Introspection JSON to SDL.
//!
//! The result is re-parsed with [`crate::parse_sdl`], so the emitted text only
//! needs to be syntactically faithful; validity is checked there.

use std::fmt::Write;

use serde::Deserialize;

const BUILTIN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];
const BUILTIN_DIRECTIVES: &[&str] = &["skip", "include", "deprecated", "specifiedBy", "oneOf"];
const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IntrospectionSchema {
    query_type: Option<NamedRef>,
    mutation_type: Option<NamedRef>,
    subscription_type: Option<NamedRef>,
    types: Vec<FullType>,
    #[serde(default)]
    directives: Vec<DirectiveDef>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullType {
    kind: TypeKind,
    name: String,
    description: Option<String>,
    fields: Option<Vec<FieldDef>>,
    input_fields: Option<Vec<InputValue>>,
    interfaces: Option<Vec<TypeRef>>,
    enum_values: Option<Vec<EnumValueDef>>,
    possible_types: Option<Vec<TypeRef>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldDef {
    name: String,
    description: Option<String>,
    #[serde(default)]
    args: Vec<InputValue>,
    #[serde(rename = "type")]
    ty: TypeRef,
    #[serde(default)]
    is_deprecated: bool,
    deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputValue {
    name: String,
    description: Option<String>,
    #[serde(rename = "type")]
    ty: TypeRef,
    default_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnumValueDef {
    name: String,
    description: Option<String>,
    #[serde(default)]
    is_deprecated: bool,
    deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeRef {
    kind: TypeKind,
    name: Option<String>,
    of_type: Option<Box<TypeRef>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectiveDef {
    name: String,
    description: Option<String>,
    #[serde(default)]
    locations: Vec<String>,
    #[serde(default)]
    args: Vec<InputValue>,
    #[serde(default)]
    is_repeatable: bool,
}

impl TypeRef {
    fn render(&self) -> Result<String, String> {
        match self.kind {
            TypeKind::NonNull => Ok(format!("{}!", self.inner("NON_NULL")?.render()?)),
            TypeKind::List => Ok(format!("[{}]", self.inner("LIST")?.render()?)),
            _ => self
                .name
                .clone()
                .ok_or_else(|| "named type reference without a name".to_string()),
        }
    }

    fn inner(&self, wrapper: &str) -> Result<&TypeRef, String> {
        self.of_type
            .as_deref()
            .ok_or_else(|| format!("{wrapper} type reference without ofType"))
    }
}

/// Render an introspection payload (`data.__schema`) as SDL.
pub(crate) fn to_sdl(schema: &IntrospectionSchema) -> Result<String, String> {
    let query = schema
        .query_type
        .as_ref()
        .ok_or_else(|| "introspection result has no query root type".to_string())?;

    let mut out = String::new();

    out.push_str("schema {\n");
    let _ = writeln!(out, "  query: {}", query.name);
    if let Some(m) = &schema.mutation_type {
        let _ = writeln!(out, "  mutation: {}", m.name);
    }
    if let Some(s) = &schema.subscription_type {
        let _ = writeln!(out, "  subscription: {}", s.name);
    }
    out.push_str("}\n");

    for directive in &schema.directives {
        if BUILTIN_DIRECTIVES.contains(&directive.name.as_str()) {
            continue;
        }
        out.push('\n');
        write_description(&mut out, directive.description.as_deref(), "");
        let _ = write!(out, "directive @{}", directive.name);
        write_arguments(&mut out, &directive.args)?;
        if directive.is_repeatable {
            out.push_str(" repeatable");
        }
        let _ = writeln!(out, " on {}", directive.locations.join(" | "));
    }

    for ty in &schema.types {
        if ty.name.starts_with("__") || BUILTIN_SCALARS.contains(&ty.name.as_str()) {
            continue;
        }
        out.push('\n');
        write_type(&mut out, ty)?;
    }

    Ok(out)
}

fn write_type(out: &mut String, ty: &FullType) -> Result<(), String> {
    write_description(out, ty.description.as_deref(), "");
    match ty.kind {
        TypeKind::Scalar => {
            let _ = writeln!(out, "scalar {}", ty.name);
        }
        TypeKind::Object | TypeKind::Interface => {
            let keyword = if ty.kind == TypeKind::Object { "type" } else { "interface" };
            let _ = write!(out, "{keyword} {}", ty.name);
            let interfaces = named_refs(ty.interfaces.as_deref().unwrap_or_default())?;
            if !interfaces.is_empty() {
                let _ = write!(out, " implements {}", interfaces.join(" & "));
            }
            out.push_str(" {\n");
            for field in ty.fields.as_deref().unwrap_or_default() {
                write_description(out, field.description.as_deref(), "  ");
                let _ = write!(out, "  {}", field.name);
                write_arguments(out, &field.args)?;
                let _ = write!(out, ": {}", field.ty.render()?);
                write_deprecation(out, field.is_deprecated, field.deprecation_reason.as_deref());
                out.push('\n');
            }
            out.push_str("}\n");
        }
        TypeKind::Union => {
            let members = named_refs(ty.possible_types.as_deref().unwrap_or_default())?;
            let _ = writeln!(out, "union {} = {}", ty.name, members.join(" | "));
        }
        TypeKind::Enum => {
            let _ = writeln!(out, "enum {} {{", ty.name);
            for value in ty.enum_values.as_deref().unwrap_or_default() {
                write_description(out, value.description.as_deref(), "  ");
                let _ = write!(out, "  {}", value.name);
                write_deprecation(out, value.is_deprecated, value.deprecation_reason.as_deref());
                out.push('\n');
            }
            out.push_str("}\n");
        }
        TypeKind::InputObject => {
            let _ = writeln!(out, "input {} {{", ty.name);
            for field in ty.input_fields.as_deref().unwrap_or_default() {
                write_description(out, field.description.as_deref(), "  ");
                let _ = writeln!(out, "  {}", input_value(field)?);
            }
            out.push_str("}\n");
        }
        TypeKind::List | TypeKind::NonNull => {
            return Err(format!("type {} has a wrapper kind at top level", ty.name));
        }
    }
    Ok(())
}

fn write_arguments(out: &mut String, args: &[InputValue]) -> Result<(), String> {
    if args.is_empty() {
        return Ok(());
    }
    let mut rendered = Vec::with_capacity(args.len());
    for arg in args {
        let mut text = String::new();
        if let Some(desc) = arg.description.as_deref() {
            let _ = write!(text, "{} ", quote(desc));
        }
        text.push_str(&input_value(arg)?);
        rendered.push(text);
    }
    let _ = write!(out, "({})", rendered.join(", "));
    Ok(())
}

fn input_value(value: &InputValue) -> Result<String, String> {
    let mut text = format!("{}: {}", value.name, value.ty.render()?);
    if let Some(default) = value.default_value.as_deref() {
        let _ = write!(text, " = {default}");
    }
    Ok(text)
}

fn write_description(out: &mut String, description: Option<&str>, indent: &str) {
    if let Some(desc) = description.filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "{indent}{}", quote(desc));
    }
}

fn write_deprecation(out: &mut String, deprecated: bool, reason: Option<&str>) {
    if !deprecated {
        return;
    }
    match reason {
        None | Some(DEFAULT_DEPRECATION_REASON) => out.push_str(" @deprecated"),
        Some(reason) => {
            let _ = write!(out, " @deprecated(reason: {})", quote(reason));
        }
    }
}

fn named_refs(refs: &[TypeRef]) -> Result<Vec<String>, String> {
    refs.iter().map(TypeRef::render).collect()
}

/// JSON string escaping is a subset of GraphQL string escaping.
fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}
