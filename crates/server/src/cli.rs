//! Command-line interface: `serve` plus offline schema tooling.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use nlgql_schema::{
    builtin_schema, parse_sdl, render_context, IntrospectionCache, IntrospectionOptions,
    Introspector,
};

#[derive(Parser, Debug)]
#[command(name = "nlgql", version, about = "Natural-language to GraphQL query server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Print the graph description of a schema
    Analyze {
        /// SDL file to analyse (built-in demo schema if omitted)
        #[arg(long)]
        sdl: Option<PathBuf>,
        /// Print the analysis as JSON instead of the prompt context
        #[arg(long)]
        json: bool,
    },
    /// Introspect a GraphQL endpoint and print its SDL
    Introspect {
        url: String,
        /// Extra request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

pub fn analyze(sdl: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let schema = match sdl {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_sdl(&source, path)?
        }
        None => builtin_schema()?,
    };

    let analysis = nlgql_schema::analyze(&schema);
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("{}", render_context(&analysis));
    }
    Ok(())
}

pub async fn introspect(
    config: &nlgql_core::Config,
    url: &str,
    headers: &[String],
) -> anyhow::Result<()> {
    let headers = parse_headers(headers)?;
    let introspector = Introspector::new(
        config.introspection.timeout(),
        Arc::new(IntrospectionCache::new(config.introspection.cache_ttl())),
    );
    let result = introspector
        .introspect(&IntrospectionOptions::new(url).with_headers(headers))
        .await?;
    println!("{}", result.sdl);
    Ok(())
}

/// Parse `Name: value` pairs.
pub fn parse_headers(raw: &[String]) -> anyhow::Result<HashMap<String, String>> {
    let mut headers = HashMap::new();
    for entry in raw {
        let Some((name, value)) = entry.split_once(':') else {
            bail!("invalid header '{entry}', expected 'Name: value'");
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("invalid header '{entry}', name is empty");
        }
        headers.insert(name.to_string(), value.trim().to_string());
    }
    Ok(headers)
}
