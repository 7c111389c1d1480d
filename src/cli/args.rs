// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and the widget subcommands

use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "widgetkit")]
#[command(about = "Render, inspect and update widget instances from declarative widget definitions")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a widget template to HTML
    Render {
        #[arg(help = "Path to widget definition (YAML or JSON)")]
        widget: PathBuf,

        #[arg(short = 'V', long = "var", help = "Parameter or template variable (key=value)")]
        vars: Vec<String>,

        #[arg(short, long, help = "Locale for {{#I18n}} messages")]
        lang: Option<String>,
    },

    /// Read parameter values from an HTML fragment through the widget's bindings
    Inspect {
        #[arg(help = "Path to widget definition (YAML or JSON)")]
        widget: PathBuf,

        #[arg(help = "Path to HTML fragment containing the widget")]
        fragment: PathBuf,
    },

    /// Write parameter values into an HTML fragment through the widget's bindings
    Apply {
        #[arg(help = "Path to widget definition (YAML or JSON)")]
        widget: PathBuf,

        #[arg(help = "Path to HTML fragment containing the widget")]
        fragment: PathBuf,

        #[arg(short = 'V', long = "var", help = "Parameter value to write (key=value)")]
        vars: Vec<String>,

        #[arg(short, long, help = "Write the updated fragment here instead of stdout")]
        output: Option<PathBuf>,
    },

    /// Validate a widget definition
    Validate {
        #[arg(help = "Path to widget definition (YAML or JSON)")]
        widget: PathBuf,

        #[arg(long, help = "Treat undeclared template variables as errors")]
        strict: bool,
    },

    /// Render a widget into a standalone HTML preview page
    Preview {
        #[arg(help = "Path to widget definition (YAML or JSON)")]
        widget: PathBuf,

        #[arg(short = 'V', long = "var", help = "Parameter or template variable (key=value)")]
        vars: Vec<String>,

        #[arg(short, long, help = "Locale for {{#I18n}} messages")]
        lang: Option<String>,

        #[arg(short, long, help = "Output HTML file")]
        output: PathBuf,

        #[arg(long = "stylesheet", help = "Stylesheet URL to link from the page")]
        stylesheets: Vec<String>,
    },

    /// Evaluate an expression against variables
    Eval {
        #[arg(help = "Expression to evaluate")]
        expression: String,

        #[arg(short = 'V', long = "var", help = "Variable (key=value)")]
        vars: Vec<String>,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse variables from key=value format
    pub fn parse_variables(vars: &[String]) -> anyhow::Result<IndexMap<String, String>> {
        let mut variables = IndexMap::new();

        for var in vars {
            match var.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    variables.insert(key.trim().to_string(), value.to_string());
                }
                _ => {
                    return Err(anyhow::anyhow!(
                        "Invalid variable format '{}'. Expected 'key=value'",
                        var
                    ));
                }
            }
        }

        Ok(variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variables() {
        let vars = vec![
            "tipus=important".to_string(),
            "width=50".to_string(),
            "expr=a=b".to_string(),
        ];

        let parsed = Args::parse_variables(&vars).unwrap();

        assert_eq!(parsed.get("tipus"), Some(&"important".to_string()));
        assert_eq!(parsed.get("width"), Some(&"50".to_string()));
        assert_eq!(parsed.get("expr"), Some(&"a=b".to_string()));
    }

    #[test]
    fn test_parse_variables_invalid() {
        assert!(Args::parse_variables(&["invalid_format".to_string()]).is_err());
        assert!(Args::parse_variables(&["=value".to_string()]).is_err());
    }

    #[test]
    fn test_parse_render_command() {
        let args = Args::parse_from([
            "widgetkit", "render", "alert.yaml", "--var", "tipus=alerta", "--lang", "ca",
        ]);
        match args.command {
            Commands::Render { widget, vars, lang } => {
                assert_eq!(widget, PathBuf::from("alert.yaml"));
                assert_eq!(vars, vec!["tipus=alerta"]);
                assert_eq!(lang.as_deref(), Some("ca"));
            }
            _ => panic!("expected render"),
        }
    }
}
