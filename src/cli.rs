use crate::definition::NamingScheme;
use crate::manifest::MANIFEST_FILE;
use crate::oracle::cargo::CargoOracle;
use crate::pipeline::{generate, GeneratorConfig};
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::{Component, Path, PathBuf};

/// Swagger from source - generate a Swagger 2.0 document from annotated Rust crates
#[derive(Parser, Debug)]
#[command(name = "swagger-from-source")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Import path of the root package, relative to the source root
    #[arg(value_name = "PACKAGE")]
    pub package: String,

    /// Directory that import paths are relative to
    #[arg(short = 's', long = "src-root", value_name = "DIR", default_value = ".")]
    pub src_root: PathBuf,

    /// How definition names are written
    #[arg(short = 'n', long = "naming", value_enum, default_value = "full")]
    pub naming: NamingScheme,

    /// Comma-separated substrings of import paths to skip
    #[arg(short = 'i', long = "ignore", value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Validated settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub src_root: PathBuf,
    pub generator: GeneratorConfig,
    pub output_format: OutputFormat,
    pub output_path: Option<PathBuf>,
}

/// Parse command line arguments
pub fn parse_args() -> Result<Config> {
    parse_args_from_parsed(CliArgs::parse())
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<Config> {
    debug!("Parsed arguments: {:?}", args);

    if !args.src_root.is_dir() {
        anyhow::bail!(
            "Source root is not a directory: {}",
            args.src_root.display()
        );
    }

    let package = args.package.trim().trim_end_matches('/').to_string();
    validate_import_path(&package)?;

    let manifest = args.src_root.join(&package).join(MANIFEST_FILE);
    if !manifest.is_file() {
        anyhow::bail!("Package '{}' has no {}", package, manifest.display());
    }

    let ignore: Vec<String> = args
        .ignore
        .iter()
        .map(|pattern| pattern.trim().to_string())
        .filter(|pattern| !pattern.is_empty())
        .collect();

    info!("Source root: {}", args.src_root.display());
    info!("Package: {}", package);
    info!("Naming: {:?}", args.naming);
    if !ignore.is_empty() {
        info!("Ignoring: {}", ignore.join(", "));
    }
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(Config {
        src_root: args.src_root,
        generator: GeneratorConfig {
            root: package,
            naming: args.naming,
            ignore,
        },
        output_format: args.output_format,
        output_path: args.output_path,
    })
}

fn validate_import_path(package: &str) -> Result<()> {
    if package.is_empty() || package == "." {
        anyhow::bail!("Package import path must not be empty");
    }
    let path = Path::new(package);
    if path.is_absolute() {
        anyhow::bail!("Package import path must be relative: {}", package);
    }
    if path.components().any(|c| c == Component::ParentDir) {
        anyhow::bail!("Package import path must not contain '..': {}", package);
    }
    Ok(())
}

/// Run the main workflow
pub fn run(config: Config) -> Result<()> {
    info!("Starting Swagger document generation...");

    let oracle = CargoOracle::new(&config.src_root)
        .with_context(|| format!("Failed to open source root {}", config.src_root.display()))?;
    let document = generate(&config.generator, &oracle)
        .with_context(|| format!("Failed to generate Swagger for '{}'", config.generator.root))?;

    info!("Serializing to {:?} format...", config.output_format);
    let content = match config.output_format {
        OutputFormat::Json => serialize_json(&document)?,
        OutputFormat::Yaml => serialize_yaml(&document)?,
    };

    if let Some(output_path) = &config.output_path {
        write_to_file(&content, output_path)?;
        info!("Wrote Swagger document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!(
        "Generation complete: {} paths, {} definitions",
        document.paths.len(),
        document.definitions.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(src_root: &Path, package: &str) -> CliArgs {
        CliArgs::parse_from([
            "swagger-from-source",
            package,
            "--src-root",
            src_root.to_str().unwrap(),
        ])
    }

    fn workspace() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let crate_dir = temp_dir.path().join("services/api");
        fs::create_dir_all(&crate_dir).unwrap();
        fs::write(
            crate_dir.join("Cargo.toml"),
            "[package]\nname = \"api\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        temp_dir
    }

    #[test]
    fn test_defaults() {
        let parsed = CliArgs::parse_from(["swagger-from-source", "app"]);
        assert_eq!(parsed.src_root, PathBuf::from("."));
        assert_eq!(parsed.naming, NamingScheme::Full);
        assert_eq!(parsed.output_format, OutputFormat::Json);
        assert!(parsed.ignore.is_empty());
        assert!(!parsed.verbose);
    }

    #[test]
    fn test_ignore_list_is_comma_separated() {
        let parsed = CliArgs::parse_from([
            "swagger-from-source",
            "app",
            "-i",
            "vendor,legacy",
            "-n",
            "partial",
            "-f",
            "yaml",
        ]);
        assert_eq!(parsed.ignore, vec!["vendor", "legacy"]);
        assert_eq!(parsed.naming, NamingScheme::Partial);
        assert_eq!(parsed.output_format, OutputFormat::Yaml);
    }

    #[test]
    fn test_valid_arguments_become_config() {
        let temp_dir = workspace();
        let config = parse_args_from_parsed(args(temp_dir.path(), "services/api/")).unwrap();

        assert_eq!(config.generator.root, "services/api");
        assert_eq!(config.generator.naming, NamingScheme::Full);
        assert_eq!(config.output_path, None);
    }

    #[test]
    fn test_rejects_bad_packages() {
        let temp_dir = workspace();

        assert!(parse_args_from_parsed(args(temp_dir.path(), "missing")).is_err());
        assert!(parse_args_from_parsed(args(temp_dir.path(), "../services/api")).is_err());
        assert!(parse_args_from_parsed(args(temp_dir.path(), "/services/api")).is_err());
        assert!(parse_args_from_parsed(args(temp_dir.path(), "")).is_err());
    }

    #[test]
    fn test_rejects_missing_src_root() {
        let temp_dir = workspace();
        let missing = temp_dir.path().join("nope");
        assert!(parse_args_from_parsed(args(&missing, "services/api")).is_err());
    }
}
