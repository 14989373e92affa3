use std::collections::HashMap;

use clap::{Parser, Subcommand};
use rest_dispatcher::uri::{compile, UriBuilder, UriPattern};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "uri-tool")]
#[command(about = "Compile, match, rank and expand URI templates", long_about = None)]
struct Cli {
    /// Pretty-print JSON output
    #[arg(short, long)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the regex, literal count and parameters of a template
    Compile { template: String },
    /// Match a path against a template
    Match { template: String, path: String },
    /// Expand a template
    Build {
        template: String,

        /// Positional values, bound to parameters in order of first occurrence
        values: Vec<String>,

        /// Named values as name=value (repeatable); overrides positional values
        #[arg(short, long = "named", value_parser = parse_named)]
        named: Vec<(String, String)>,

        /// Percent-encode characters that are illegal in the path
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        encode: bool,

        /// Keep placeholders without a value as {name}
        #[arg(long)]
        as_template: bool,
    },
    /// Order templates from most to least specific
    Rank { templates: Vec<String> },
}

fn parse_named(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Compile { template } => {
            let compiled = compile(&template)?;
            json!({
                "template": compiled.template(),
                "regex": compiled.regex(),
                "literal_chars": compiled.literal_chars(),
                "parameters": compiled.parameter_names(),
                "group_indexes": compiled.group_indexes(),
            })
        }
        Commands::Match { template, path } => {
            let pattern = UriPattern::new(&template)?;
            match pattern.match_path(&path) {
                Some(matched) => {
                    let values: Vec<Value> = pattern
                        .parameter_names()
                        .iter()
                        .zip(matched.values())
                        .map(|(name, value)| json!({ "name": name, "value": value }))
                        .collect();
                    json!({
                        "matched": true,
                        "values": values,
                        "remainder": matched.remainder(),
                        "terminal": matched.is_terminal(),
                    })
                }
                None => json!({ "matched": false }),
            }
        }
        Commands::Build {
            template,
            values,
            named,
            encode,
            as_template,
        } => {
            let builder = UriBuilder::from_path(template)
                .encode(encode)
                .as_template(as_template);
            let uri = if named.is_empty() {
                builder.build(&values)?
            } else {
                let map: HashMap<String, String> = named.into_iter().collect();
                builder.build_from_map(&map)?
            };
            json!({ "uri": uri })
        }
        Commands::Rank { templates } => {
            let mut patterns = templates
                .iter()
                .map(|t| UriPattern::new(t))
                .collect::<Result<Vec<_>, _>>()?;
            patterns.sort();
            let ranked: Vec<Value> = patterns
                .iter()
                .map(|p| {
                    json!({
                        "template": p.template(),
                        "regex": p.regex(),
                        "literal_chars": p.literal_chars(),
                        "parameters": p.parameter_names().len(),
                    })
                })
                .collect();
            Value::Array(ranked)
        }
    };

    if cli.pretty {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{output}");
    }
    Ok(())
}
