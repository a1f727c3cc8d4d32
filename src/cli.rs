//! CLI argument parsing.
//!
//! Every option can also come from the `[basics]` table of the config file;
//! the command line wins when both are given.
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "reprotest",
    version,
    about = "Build a source tree twice under varied conditions and check the artifacts for reproducibility",
    after_help = "Exit status:\n  0    artifacts are identical\n  2    configuration, setup or build failure\n  *    any other status is forwarded from the diff tool\n\nExamples:\n  reprotest 'make dist' dist/app.tar.gz\n  reprotest --variations=home,timezone 'python3 setup.py bdist' dist/pkg.tar.gz\n  reprotest --dont-vary=fileordering,kernel 'debuild -b -uc -us' ../pkg_1.0_all.deb"
)]
pub struct RootArgs {
    /// Build command to execute, as a single shell fragment
    #[arg(value_name = "BUILD_COMMAND")]
    pub build_command: Option<String>,

    /// Build artifact to test for reproducibility, relative to the source root
    #[arg(value_name = "ARTIFACT")]
    pub artifact: Option<PathBuf>,

    /// Root of the source tree, if not the current working directory
    #[arg(long, value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// Variations to test as a comma-separated list (default: all)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub variations: Option<Vec<String>>,

    /// Variations *not* to test as a comma-separated list
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub dont_vary: Option<Vec<String>>,

    /// Message detail: 0 warnings, 1 progress, 2 debug
    #[arg(long, value_name = "N")]
    pub verbosity: Option<u8>,

    /// TOML config file with a [basics] table of quoted values (default: ./.reprotestrc if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Program used to compare the two artifacts
    #[arg(long, value_name = "PROGRAM")]
    pub diff_tool: Option<String>,
}
