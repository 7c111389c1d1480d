// ABOUTME: Main application orchestration for the widgetkit CLI
// ABOUTME: Coordinates between CLI arguments, configuration, and command execution

use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::commands;
use super::{Args, Commands, Config};

pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self, verbose: bool, no_color: bool) -> Result<()> {
        let log_level = if verbose {
            "debug"
        } else {
            &self.config.logging.level
        };

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        // stdout is reserved for command output
        match self.config.logging.format.as_str() {
            "compact" => {
                tracing_subscriber::fmt()
                    .compact()
                    .with_env_filter(env_filter)
                    .with_ansi(!no_color)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .try_init()
                    .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
            }
            _ => {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(!no_color)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .try_init()
                    .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
            }
        }

        debug!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    /// Run the application with parsed arguments
    pub async fn run(&mut self, args: Args) -> Result<()> {
        self.init_logging(args.verbose, args.no_color)?;

        info!("Starting widgetkit v{}", env!("CARGO_PKG_VERSION"));
        debug!("Configuration loaded from: {:?}", args.config);

        match args.command {
            Commands::Render { widget, vars, lang } => {
                let vars = Args::parse_variables(&vars)?;
                commands::render_widget(widget, vars, lang, &self.config).await
            }

            Commands::Inspect { widget, fragment } => {
                commands::inspect_widget(widget, fragment, &self.config).await
            }

            Commands::Apply {
                widget,
                fragment,
                vars,
                output,
            } => {
                let vars = Args::parse_variables(&vars)?;
                commands::apply_widget(widget, fragment, vars, output, &self.config).await
            }

            Commands::Validate { widget, strict } => {
                commands::validate_widget(widget, strict, &self.config).await
            }

            Commands::Preview {
                widget,
                vars,
                lang,
                output,
                stylesheets,
            } => {
                let vars = Args::parse_variables(&vars)?;
                commands::preview_widget(widget, vars, lang, output, stylesheets, &self.config)
                    .await
            }

            Commands::Eval { expression, vars } => {
                let vars = Args::parse_variables(&vars)?;
                commands::eval_expression(expression, vars).await
            }
        }
    }

    /// Create application from command line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Config::load(args.config.clone())?;
        Ok(Self::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_app_creation() {
        let app = App::new(Config::default());
        assert_eq!(app.config().bs_version, 5);
    }

    #[test]
    fn test_app_from_args_with_config_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("widgetkit.yaml");
        fs::write(
            &config_path,
            "bs_version: 4\nlogging:\n  level: debug\n  format: compact\n",
        )
        .unwrap();

        let args = <Args as clap::Parser>::parse_from([
            "widgetkit",
            "--config",
            config_path.to_str().unwrap(),
            "eval",
            "1 + 1",
        ]);
        let app = App::from_args(&args).unwrap();
        assert_eq!(app.config().bs_version, 4);
        assert_eq!(app.config().logging.level, "debug");
        assert_eq!(app.config().logging.format, "compact");
    }
}
