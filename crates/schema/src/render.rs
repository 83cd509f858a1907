//! Prompt-ready text rendering of a [`SchemaAnalysis`].

use crate::analysis::{EntryPoint, SchemaAnalysis};

const HEADER: &str = "## Graph Structure";

/// Render an analysis as the deterministic text block handed to the language model.
///
/// Sections appear in a fixed order and are skipped when empty.
pub fn render_context(analysis: &SchemaAnalysis) -> String {
    let mut sections: Vec<String> = Vec::new();

    if !analysis.relationships.is_empty() {
        let mut lines = vec!["### Types and Relationships".to_string()];
        for rel in &analysis.relationships {
            let cardinality = if rel.is_list { "1:N" } else { "1:1" };
            lines.push(format!(
                "- {} -> {} (via field \"{}\", {})",
                rel.from_type, rel.to_type, rel.field, cardinality
            ));
        }
        sections.push(lines.join("\n"));
    }

    if !analysis.types.is_empty() {
        let mut lines = vec!["### Object Types".to_string()];
        for ty in &analysis.types {
            match &ty.description {
                Some(desc) => lines.push(format!("- {} — {}", ty.name, desc)),
                None => lines.push(format!("- {}", ty.name)),
            }
            for field in &ty.fields {
                let marker = if field.is_relation { " [relation]" } else { "" };
                lines.push(format!("  - {}: {}{}", field.name, field.type_signature, marker));
            }
        }
        sections.push(lines.join("\n"));
    }

    let queries: Vec<&EntryPoint> = analysis.queries().collect();
    if !queries.is_empty() {
        sections.push(entry_point_section("### Entry Points (Queries)", &queries));
    }

    let mutations: Vec<&EntryPoint> = analysis.mutations().collect();
    if !mutations.is_empty() {
        sections.push(entry_point_section("### Entry Points (Mutations)", &mutations));
    }

    if !analysis.enums.is_empty() {
        let mut lines = vec!["### Enums".to_string()];
        for e in &analysis.enums {
            lines.push(format!("- {}: {}", e.name, e.values.join(", ")));
        }
        sections.push(lines.join("\n"));
    }

    if !analysis.input_types.is_empty() {
        let mut lines = vec!["### Input Types".to_string()];
        for input in &analysis.input_types {
            let fields: Vec<String> = input
                .fields
                .iter()
                .map(|f| format!("{}: {}", f.name, f.type_signature))
                .collect();
            lines.push(format!("- {}: {{ {} }}", input.name, fields.join(", ")));
        }
        sections.push(lines.join("\n"));
    }

    format!("{HEADER}\n\n{}", sections.join("\n\n"))
}

fn entry_point_section(heading: &str, entries: &[&EntryPoint]) -> String {
    let mut lines = vec![heading.to_string()];
    for ep in entries {
        let args: Vec<String> = ep
            .args
            .iter()
            .map(|a| format!("{}: {}", a.name, a.type_signature))
            .collect();
        lines.push(format!("- {}({}): {}", ep.name, args.join(", "), ep.return_type));
    }
    lines.join("\n")
}
