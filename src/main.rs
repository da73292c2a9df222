use obex::cli::{Cli, Commands, ConfigAction};
use obex::config::{expand_path, Config, MATCHERS_FILE};
use anyhow::{Context, Result};
use obex::error::ObexError;
use obex::observables::MatcherGroup;
use std::io::Read;
use std::path::{Path, PathBuf};

const MATCHERS_TEMPLATE: &str = include_str!("../config-templates/matchers.toml");

fn main() {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract {
            input,
            matchers,
            by_kind,
            pretty,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            let group = build_group(&config, matchers).context("Failed to build matcher group")?;
            cmd_extract(&group, input, by_kind, pretty)?;
        }
        Commands::Matchers { matchers } => {
            let config = load_config(cli.config, cli.profile)?;
            let group = build_group(&config, matchers).context("Failed to build matcher group")?;
            cmd_matchers(&group);
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "obex=debug" } else { "obex=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries JSON output, keep logs on stderr
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_extract(
    group: &MatcherGroup,
    input: Option<PathBuf>,
    by_kind: bool,
    pretty: bool,
) -> Result<()> {
    let text = read_input(input.as_deref()).context("Failed to read document")?;
    let result = group.extract(&text);

    tracing::info!(
        "Extracted {} observables from {} bytes",
        result.len(),
        text.len()
    );

    let json = if by_kind {
        to_json(result.observables_by_kind(), pretty)
    } else {
        to_json(result.observables(), pretty)
    }
    .map_err(|e| ObexError::Json {
        source: e,
        context: "Failed to serialize observables".to_string(),
    })?;

    println!("{}", json);
    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn read_input(input: Option<&Path>) -> obex::Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path).map_err(|e| ObexError::Io {
            source: e,
            context: format!("Failed to read input file: {:?}", path),
        }),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| ObexError::Io {
                    source: e,
                    context: "Failed to read stdin".to_string(),
                })?;
            Ok(text)
        }
    }
}

fn cmd_matchers(group: &MatcherGroup) {
    println!("{} matchers (metadata policy: {:?})", group.len(), group.policy());
    for (idx, matcher) in group.matchers().iter().enumerate() {
        println!("  #{:<3} {:<20} {}", idx, matcher.kind, matcher.describe());
        if !matcher.tags.is_empty() {
            println!("        tags: {}", matcher.tags.join(", "));
        }
        if !matcher.directives.is_empty() {
            println!("        directives: {}", matcher.directives.join(", "));
        }
    }
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, profile)?;
            let text = toml::to_string_pretty(&config)?;
            println!("{}", text);
        }
        ConfigAction::Path => {
            let path = resolve_config_path(config_path)?;
            println!("{}", path.display());
        }
        ConfigAction::Validate { file } => {
            let path = resolve_config_path(file.or(config_path))?;
            let config =
                Config::load(&path).with_context(|| format!("Invalid configuration {:?}", path))?;
            let group = config
                .build_group()
                .context("Configured matchers failed to compile")?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Matchers: {}", group.len());
        }
        ConfigAction::Init { force } => {
            let path = resolve_config_path(config_path)?;

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            let config_dir = path
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| ObexError::Config(format!("Invalid config path: {:?}", path)))?;
            std::fs::create_dir_all(&config_dir).map_err(|e| ObexError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", config_dir),
            })?;

            let mut config = Config::default();
            config.patterns.matchers_file = config_dir.join(MATCHERS_FILE);
            config.save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());

            let matchers_path = &config.patterns.matchers_file;
            if force || !matchers_path.exists() {
                std::fs::write(matchers_path, MATCHERS_TEMPLATE).map_err(|e| ObexError::Io {
                    source: e,
                    context: format!("Failed to write matchers.toml: {:?}", matchers_path),
                })?;
                println!("✓ Matcher template installed at: {}", matchers_path.display());
            }
        }
    }

    Ok(())
}

fn resolve_config_path(config_path: Option<PathBuf>) -> obex::Result<PathBuf> {
    match config_path {
        Some(path) => expand_path(&path),
        None => Config::default_path(),
    }
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = resolve_config_path(config_path)?;

    if !path.exists() {
        tracing::warn!("Config file not found, using defaults. Run 'obex config init' to create one.");
        let mut config = Config::default();
        config.apply_env_overrides();
        if let Some(profile) = profile {
            config.apply_profile(&profile)?;
        }
        return Ok(config);
    }

    let config = match profile {
        Some(profile) => Config::load_with_profile(&path, &profile),
        None => Config::load(&path),
    }
    .with_context(|| format!("Failed to load configuration {:?}", path))?;
    Ok(config)
}

fn build_group(config: &Config, matchers: Option<PathBuf>) -> obex::Result<MatcherGroup> {
    match matchers {
        Some(path) => config.group_from_file(&path),
        None => config.build_group(),
    }
}
