//! The build context threaded through the variation pipeline.
//!
//! Side A is the baseline build and side B the varied one. Variations may
//! touch either side, but most of them only mutate B.
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

/// One element of a build command.
///
/// Commands stay tokenized through the whole pipeline and are only turned
/// into a shell string by the build executor, which owns quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandToken {
    /// Shell text passed through verbatim (the user's build command, `;`).
    Raw(String),
    /// A literal argument, quoted when the command is serialized.
    Word(String),
}

impl CommandToken {
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    pub fn word(text: impl Into<String>) -> Self {
        Self::Word(text.into())
    }
}

/// Everything one build needs: what to run, with which environment, where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSide {
    pub command: Vec<CommandToken>,
    pub env: BTreeMap<OsString, OsString>,
    pub tree: PathBuf,
}

impl BuildSide {
    /// Prepend tokens to the command, keeping their relative order.
    pub fn wrap_command<I>(&mut self, prefix: I)
    where
        I: IntoIterator<Item = CommandToken>,
    {
        let mut command: Vec<CommandToken> = prefix.into_iter().collect();
        command.append(&mut self.command);
        self.command = command;
    }

    pub fn set_env(&mut self, key: &str, value: impl Into<OsString>) {
        self.env.insert(OsString::from(key), value.into());
    }

    /// Render the command as a single `sh -c` string.
    pub fn shell_command(&self) -> String {
        self.command
            .iter()
            .map(|token| match token {
                CommandToken::Raw(text) => text.clone(),
                CommandToken::Word(word) => shell_words::quote(word).into_owned(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub a: BuildSide,
    pub b: BuildSide,
}

impl BuildContext {
    /// Same command and environment on both sides, each with its own tree.
    pub fn new(
        command: Vec<CommandToken>,
        env: BTreeMap<OsString, OsString>,
        tree_a: PathBuf,
        tree_b: PathBuf,
    ) -> Self {
        Self {
            a: BuildSide {
                command: command.clone(),
                env: env.clone(),
                tree: tree_a,
            },
            b: BuildSide {
                command,
                env,
                tree: tree_b,
            },
        }
    }
}
