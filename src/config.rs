//! Config-file loading and CLI/config merge.
//!
//! The config file is TOML with a single `[basics]` table mirroring the CLI
//! options. Scalars from the command line override the file. Variation
//! selection is layered: all registered variations, then the file's
//! `variations`/`dont_vary`, then the command line's.
use crate::check::{validate_artifact, CheckRequest};
use crate::cli::RootArgs;
use crate::differ::DEFAULT_DIFF_TOOL;
use crate::error::CheckError;
use crate::registry::VariationRegistry;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = ".reprotestrc";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub basics: Basics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Basics {
    pub build_command: Option<String>,
    pub artifact: Option<PathBuf>,
    pub source_root: Option<PathBuf>,
    pub variations: Option<NameList>,
    pub dont_vary: Option<NameList>,
    pub verbosity: Option<u8>,
    pub diff_tool: Option<String>,
}

/// Either `["home", "path"]` or `"home path"` / `"home,path"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    List(Vec<String>),
    Text(String),
}

impl NameList {
    fn names(&self) -> Vec<String> {
        match self {
            NameList::List(names) => names.clone(),
            NameList::Text(text) => text
                .split(|ch: char| ch == ',' || ch.is_whitespace())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// A fully merged run: the check itself plus the knobs around it.
#[derive(Debug)]
pub struct Settings {
    pub request: CheckRequest,
    pub diff_tool: String,
}

/// Load the config file.
///
/// An explicit path must exist. Without one, `.reprotestrc` in `cwd` is
/// used when present and an empty config otherwise.
pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<ConfigFile, CheckError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = cwd.join(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                return Ok(ConfigFile::default());
            }
            default
        }
    };
    let text = fs::read_to_string(&path)
        .map_err(|err| CheckError::Config(format!("read {}: {err}", path.display())))?;
    let config: ConfigFile = toml::from_str(&text)
        .map_err(|err| {
            CheckError::Config(format!(
                "parse {} as TOML with a [basics] table (quote string values): {err}",
                path.display()
            ))
        })?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Merge CLI arguments over the config file and validate the result.
///
/// Nothing on disk is touched here; every configuration error surfaces
/// before a tree is copied.
pub fn resolve(
    args: &RootArgs,
    file: &Basics,
    registry: &VariationRegistry,
    env: BTreeMap<OsString, OsString>,
    cwd: &Path,
) -> Result<Settings, CheckError> {
    let build_command = args
        .build_command
        .clone()
        .or_else(|| file.build_command.clone())
        .filter(|command| !command.trim().is_empty())
        .ok_or_else(|| CheckError::Config("no build command provided".to_string()))?;
    let artifact = args
        .artifact
        .clone()
        .or_else(|| file.artifact.clone())
        .filter(|artifact| !artifact.as_os_str().is_empty())
        .ok_or_else(|| {
            CheckError::Config("no build artifact to test for differences provided".to_string())
        })?;
    validate_artifact(&artifact)?;
    let source_root = args
        .source_root
        .clone()
        .or_else(|| file.source_root.clone())
        .map(|root| cwd.join(root))
        .unwrap_or_else(|| cwd.to_path_buf());
    let diff_tool = args
        .diff_tool
        .clone()
        .or_else(|| file.diff_tool.clone())
        .unwrap_or_else(|| DEFAULT_DIFF_TOOL.to_string());

    let variations = select_variations(
        registry,
        file.variations.as_ref().map(NameList::names),
        file.dont_vary.as_ref().map(NameList::names),
        args.variations.clone(),
        args.dont_vary.clone(),
    )?;

    Ok(Settings {
        request: CheckRequest {
            build_command,
            artifact,
            source_root,
            variations,
            env,
        },
        diff_tool,
    })
}

/// Layer the variation selections and return them in registry order.
fn select_variations(
    registry: &VariationRegistry,
    file_variations: Option<Vec<String>>,
    file_dont_vary: Option<Vec<String>>,
    cli_variations: Option<Vec<String>>,
    cli_dont_vary: Option<Vec<String>>,
) -> Result<Vec<String>, CheckError> {
    let mut selected: Vec<String> = registry.names().map(str::to_string).collect();
    let layers = [
        (file_variations, file_dont_vary),
        (cli_variations, cli_dont_vary),
    ];
    for (only, except) in layers {
        if let Some(only) = only {
            selected = known_names(registry, only)?;
        }
        if let Some(except) = except {
            let except = known_names(registry, except)?;
            selected.retain(|name| !except.contains(name));
        }
    }
    let ordered = registry.resolve(&selected)?;
    Ok(ordered.into_iter().map(str::to_string).collect())
}

fn known_names(registry: &VariationRegistry, names: Vec<String>) -> Result<Vec<String>, CheckError> {
    let names: Vec<String> = names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    for name in &names {
        if !registry.contains(name) {
            return Err(CheckError::UnknownVariation(name.clone()));
        }
    }
    Ok(names)
}
