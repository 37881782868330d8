use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "channelfinder")]
#[command(about = "Manage ChannelFinder channels, tags and properties")]
#[command(version)]
pub struct Cli {
    /// Verbose output (logs each request)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base directory (default: ~/.channelfinder)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Service base URL (e.g., http://localhost:8080/ChannelFinder)
    #[arg(long, global = true, env = "CHANNELFINDER_URL")]
    pub url: Option<String>,

    /// Owner recorded on created or applied resources
    #[arg(long, global = true, env = "CHANNELFINDER_OWNER")]
    pub owner: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show service information
    Info,

    /// List all tags
    Tags,

    /// List all properties
    Properties,

    /// Search channels: <pattern> [tag | prop=value]...
    Query {
        /// Name pattern followed by tags and prop=value filters
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,

        /// Maximum results
        #[arg(short, long, default_value = "1024")]
        size: u32,

        /// Offset of the first result
        #[arg(long)]
        from: Option<u32>,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Count channels matching: <pattern> [tag | prop=value]...
    Count {
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,
    },

    /// Show a single channel
    Show {
        /// Channel name
        channel: String,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Create tags, properties or channels
    Create {
        #[command(subcommand)]
        action: CreateAction,
    },

    /// Delete tags, properties or channels
    Delete {
        #[command(subcommand)]
        action: DeleteAction,
    },

    /// Attach a tag (NAME) or property (NAME=VALUE) to channels
    Apply {
        /// Tag name, or property as name=value
        target: String,

        /// Channel names, one per line (default: stdin)
        file: Option<PathBuf>,

        /// Channel name (repeatable, replaces FILE)
        #[arg(short, long = "channel", value_name = "NAME")]
        channels: Vec<String>,
    },

    /// Detach a tag (NAME) or property (NAME=[VALUE]) from channels, one at a time
    Remove {
        /// Tag name, or property as name= (any value is ignored)
        target: String,

        /// Channel names, one per line (default: stdin)
        file: Option<PathBuf>,

        /// Channel name (repeatable, replaces FILE)
        #[arg(short, long = "channel", value_name = "NAME")]
        channels: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum CreateAction {
    /// Create or overwrite a tag
    Tag { name: String },

    /// Create or overwrite a property
    Property { name: String },

    /// Create or overwrite channels, one per line: name [tag | prop=value]...
    Channels {
        /// Input file (default: stdin)
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum DeleteAction {
    /// Delete a tag
    Tag { name: String },

    /// Delete a property
    Property { name: String },

    /// Delete channels one at a time, names one per line
    Channels {
        /// Input file (default: stdin)
        file: Option<PathBuf>,

        /// Channel name (repeatable, replaces FILE)
        #[arg(short, long = "channel", value_name = "NAME")]
        channels: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., server.url)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., client.owner)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Create config file with defaults
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_query_terms() {
        let cli = Cli::try_parse_from(["channelfinder", "query", "SR*", "archived", "host=ioc1"])
            .unwrap();
        match cli.command {
            Some(Commands::Query {
                terms, size, from, ..
            }) => {
                assert_eq!(terms, vec!["SR*", "archived", "host=ioc1"]);
                assert_eq!(size, 1024);
                assert_eq!(from, None);
            }
            _ => panic!("expected query"),
        }
    }

    #[test]
    fn query_requires_pattern() {
        assert!(Cli::try_parse_from(["channelfinder", "query"]).is_err());
    }

    #[test]
    fn parse_apply_with_channels() {
        let cli = Cli::try_parse_from([
            "channelfinder",
            "--owner",
            "me",
            "apply",
            "P1=v1",
            "-c",
            "a",
            "-c",
            "b",
        ])
        .unwrap();
        assert_eq!(cli.owner.as_deref(), Some("me"));
        match cli.command {
            Some(Commands::Apply {
                target,
                file,
                channels,
            }) => {
                assert_eq!(target, "P1=v1");
                assert!(file.is_none());
                assert_eq!(channels, vec!["a", "b"]);
            }
            _ => panic!("expected apply"),
        }
    }
}
