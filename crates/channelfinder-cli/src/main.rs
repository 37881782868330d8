use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use channelfinder_core::{
    ApplyArgs, Channel, ChannelFinderClient, ChannelFinderError, ChannelQuery, ChannelSpec,
    Config, CreateArgs, DeleteRequest, RemoveArgs, Result,
};

mod args;
use args::{Cli, Commands, ConfigAction, CreateAction, DeleteAction, Shell};

/// Settings shared by every command that talks to the service
struct Context {
    client: ChannelFinderClient,
    owner: Option<String>,
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let base_dir = resolve_base_dir(cli.base_dir);

    let result = match cli.command {
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        Some(command) => match connect(&base_dir, cli.url, cli.owner, cli.quiet) {
            Ok(ctx) => run(&ctx, command).await,
            Err(e) => Err(e),
        },
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "off" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("CHANNELFINDER_BASE") {
        return PathBuf::from(base);
    }

    dirs::home_dir()
        .map(|h| h.join(".channelfinder"))
        .unwrap_or_else(|| PathBuf::from(".channelfinder"))
}

fn connect(
    base_dir: &Path,
    url: Option<String>,
    owner: Option<String>,
    quiet: bool,
) -> Result<Context> {
    let config = Config::load(base_dir)?;
    let url = url.unwrap_or_else(|| config.base_url());
    let owner = owner.or_else(|| config.owner().map(str::to_string));
    tracing::debug!(%url, "using service");

    Ok(Context {
        client: ChannelFinderClient::new(&url)?,
        owner,
        quiet,
    })
}

async fn run(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Info => handle_info(ctx).await,
        Commands::Tags => handle_tags(ctx).await,
        Commands::Properties => handle_properties(ctx).await,
        Commands::Query {
            terms,
            size,
            from,
            json,
        } => handle_query(ctx, &terms, size, from, json).await,
        Commands::Count { terms } => handle_count(ctx, &terms).await,
        Commands::Show { channel, json } => handle_show(ctx, &channel, json).await,
        Commands::Create { action } => handle_create(ctx, action).await,
        Commands::Delete { action } => handle_delete(ctx, action).await,
        Commands::Apply {
            target,
            file,
            channels,
        } => handle_apply(ctx, &target, file.as_deref(), channels).await,
        Commands::Remove {
            target,
            file,
            channels,
        } => handle_remove(ctx, &target, file.as_deref(), channels).await,
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "channelfinder", &mut io::stdout());
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(ChannelFinderError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}

// ========== Reads ==========

async fn handle_info(ctx: &Context) -> Result<()> {
    let info = ctx.client.info().await?;
    println!("{}", to_pretty_json(&info)?);
    Ok(())
}

async fn handle_tags(ctx: &Context) -> Result<()> {
    let tags = ctx.client.tags().await?;
    if tags.is_empty() {
        println!("No tags found.");
        return Ok(());
    }

    println!();
    for tag in tags {
        println!("  {}  {}", tag.name.cyan().bold(), owner_hint(&tag.owner));
    }
    println!();
    Ok(())
}

async fn handle_properties(ctx: &Context) -> Result<()> {
    let properties = ctx.client.properties().await?;
    if properties.is_empty() {
        println!("No properties found.");
        return Ok(());
    }

    println!();
    for property in properties {
        println!(
            "  {}  {}",
            property.name.cyan().bold(),
            owner_hint(&property.owner)
        );
    }
    println!();
    Ok(())
}

async fn handle_query(
    ctx: &Context,
    terms: &[String],
    size: u32,
    from: Option<u32>,
    json: bool,
) -> Result<()> {
    let mut query = parse_terms(terms)?.size(size);
    query.from = from;

    let channels = ctx.client.query(&query).await?;
    if json {
        println!("{}", to_pretty_json(&channels)?);
        return Ok(());
    }

    if channels.is_empty() {
        println!("No channels found.");
        return Ok(());
    }

    for channel in &channels {
        println!("{}", format_channel(channel));
    }
    if !ctx.quiet {
        println!();
        println!("{} channel(s)", channels.len());
    }
    Ok(())
}

async fn handle_count(ctx: &Context, terms: &[String]) -> Result<()> {
    let query = parse_terms(terms)?;
    let count = ctx.client.count(&query).await?;
    println!("{}", count);
    Ok(())
}

async fn handle_show(ctx: &Context, name: &str, json: bool) -> Result<()> {
    let channel = ctx.client.channel(name).await?;
    if json {
        println!("{}", to_pretty_json(&channel)?);
        return Ok(());
    }

    println!();
    println!("Channel: {}", channel.name.cyan().bold());
    println!("Owner:   {}", channel.owner);
    if !channel.tags.is_empty() {
        println!();
        println!("Tags:");
        for tag in &channel.tags {
            println!("  {}  {}", tag.name.green(), owner_hint(&tag.owner));
        }
    }
    if !channel.properties.is_empty() {
        println!();
        println!("Properties:");
        for prop in &channel.properties {
            println!(
                "  {} = {}  {}",
                prop.name.yellow(),
                prop.value.as_deref().unwrap_or(""),
                owner_hint(&prop.owner)
            );
        }
    }
    println!();
    Ok(())
}

// ========== Writes ==========

async fn handle_create(ctx: &Context, action: CreateAction) -> Result<()> {
    let mut args = CreateArgs {
        owner: ctx.owner.clone(),
        ..Default::default()
    };

    let label = match action {
        CreateAction::Tag { name } => {
            let label = format!("tag {}", name);
            args.tag = Some(name);
            label
        }
        CreateAction::Property { name } => {
            let label = format!("property {}", name);
            args.property = Some(name);
            label
        }
        CreateAction::Channels { file } => {
            let channels: Vec<ChannelSpec> = read_lines(file.as_deref())?
                .iter()
                .filter_map(|line| ChannelSpec::parse(line))
                .collect();
            if channels.is_empty() {
                if !ctx.quiet {
                    println!("No channels given.");
                }
                return Ok(());
            }
            let label = format!("{} channel(s)", channels.len());
            args.channels = Some(channels);
            label
        }
    };

    ctx.client.create_args(args).await?;
    if !ctx.quiet {
        println!("{} {}", "Created:".green(), label);
    }
    Ok(())
}

async fn handle_delete(ctx: &Context, action: DeleteAction) -> Result<()> {
    match action {
        DeleteAction::Tag { name } => {
            ctx.client.delete(&DeleteRequest::Tag(name.clone())).await?;
            if !ctx.quiet {
                println!("{} tag {}", "Deleted:".green(), name);
            }
        }
        DeleteAction::Property { name } => {
            ctx.client
                .delete(&DeleteRequest::Property(name.clone()))
                .await?;
            if !ctx.quiet {
                println!("{} property {}", "Deleted:".green(), name);
            }
        }
        DeleteAction::Channels { file, channels } => {
            let names = channel_names(file.as_deref(), channels)?;
            ctx.client.delete_all(&names).await?;
            if !ctx.quiet {
                println!("{} {} channel(s)", "Deleted:".green(), names.len());
            }
        }
    }
    Ok(())
}

async fn handle_apply(
    ctx: &Context,
    target: &str,
    file: Option<&Path>,
    channels: Vec<String>,
) -> Result<()> {
    let (name, value) = split_target(target);
    let channels = channel_names(file, channels)?;
    let count = channels.len();

    let mut args = ApplyArgs {
        owner: ctx.owner.clone(),
        channels: Some(channels),
        ..Default::default()
    };
    match value {
        Some(value) => {
            args.property = Some(name.to_string());
            args.value = Some(value.to_string());
        }
        None => args.tag = Some(name.to_string()),
    }

    ctx.client.apply_args(args).await?;
    if !ctx.quiet {
        println!("{} {} to {} channel(s)", "Applied:".green(), target, count);
    }
    Ok(())
}

async fn handle_remove(
    ctx: &Context,
    target: &str,
    file: Option<&Path>,
    channels: Vec<String>,
) -> Result<()> {
    let (name, is_property) = split_remove_target(target);
    let channels = channel_names(file, channels)?;
    let count = channels.len();

    let mut args = RemoveArgs {
        channels: Some(channels),
        ..Default::default()
    };
    if is_property {
        args.property = Some(name.to_string());
    } else {
        args.tag = Some(name.to_string());
    }

    ctx.client.remove_args(args).await?;
    if !ctx.quiet {
        println!("{} {} from {} channel(s)", "Removed:".green(), name, count);
    }
    Ok(())
}

// ========== Helpers ==========

/// Build a query from `<pattern> [tag | prop=value]...`
///
/// Each argument is one term, so a quoted `"iocName=vac 1"` stays one filter.
fn parse_terms(terms: &[String]) -> Result<ChannelQuery> {
    ChannelQuery::from_terms(terms).ok_or(ChannelFinderError::MissingArgument {
        name: "pattern",
    })
}

/// `name=value` selects a property; a bare name (or empty value) a tag
fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('=') {
        Some((name, value)) if !value.is_empty() => (name, Some(value)),
        Some((name, _)) => (name, None),
        None => (target, None),
    }
}

/// For detaching, any `=` selects a property; the value is not needed
fn split_remove_target(target: &str) -> (&str, bool) {
    match target.split_once('=') {
        Some((name, _)) => (name, true),
        None => (target, false),
    }
}

/// Explicit names win; otherwise read one name per line from FILE or stdin
fn channel_names(file: Option<&Path>, channels: Vec<String>) -> Result<Vec<String>> {
    if !channels.is_empty() {
        return Ok(channels);
    }
    read_lines(file)
}

/// Trimmed non-blank lines from a file, or stdin when no file is given
fn read_lines(file: Option<&Path>) -> Result<Vec<String>> {
    let content = match file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn format_channel(channel: &Channel) -> String {
    let mut line = channel.name.cyan().bold().to_string();
    for tag in &channel.tags {
        line.push_str(&format!(" {}", tag.name.green()));
    }
    for prop in &channel.properties {
        line.push_str(&format!(
            " {}={}",
            prop.name.yellow(),
            prop.value.as_deref().unwrap_or("")
        ));
    }
    line
}

fn owner_hint(owner: &str) -> String {
    format!("(owner {})", owner).dimmed().to_string()
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(ChannelFinderError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn split_target_tag() {
        assert_eq!(split_target("archived"), ("archived", None));
    }

    #[test]
    fn split_target_property() {
        assert_eq!(split_target("hostName=ioc01"), ("hostName", Some("ioc01")));
    }

    #[test]
    fn split_target_empty_value_is_tag() {
        assert_eq!(split_target("hostName="), ("hostName", None));
    }

    #[test]
    fn remove_target_with_equals_is_property() {
        assert_eq!(split_remove_target("hostName="), ("hostName", true));
        assert_eq!(split_remove_target("hostName=ioc01"), ("hostName", true));
        assert_eq!(split_remove_target("archived"), ("archived", false));
    }

    #[test]
    fn parse_terms_keeps_each_argument_whole() {
        let terms = vec![
            "SR*".to_string(),
            "iocName=vac 1".to_string(),
            "T1".to_string(),
        ];
        let query = parse_terms(&terms).unwrap();
        assert_eq!(query.properties.len(), 1);
        assert_eq!(query.properties["iocName"], "vac 1");
        assert_eq!(query.tags, vec!["T1"]);
    }

    #[test]
    fn parse_terms_builds_query() {
        let terms = vec!["SR*".to_string(), "T1".to_string(), "P1=v1".to_string()];
        let query = parse_terms(&terms).unwrap();
        assert_eq!(query.pattern.as_deref(), Some("SR*"));
        assert_eq!(query.tags, vec!["T1"]);
        assert_eq!(query.properties["P1"], "v1");
    }

    #[test]
    fn read_lines_skips_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  ch1 T1\n\n   \nch2 P1=v1  ").unwrap();

        let lines = read_lines(Some(file.path())).unwrap();
        assert_eq!(lines, vec!["ch1 T1", "ch2 P1=v1"]);
    }

    #[test]
    fn explicit_channels_skip_input() {
        let names = channel_names(None, vec!["a".to_string()]).unwrap();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn format_channel_lists_tags_and_properties() {
        colored::control::set_override(false);
        let channel: Channel = serde_json::from_str(
            r#"{"name":"ch1","owner":"me","tags":[{"name":"T1","owner":"me"}],"properties":[{"name":"P1","owner":"me","value":"v1"}]}"#,
        )
        .unwrap();
        assert_eq!(format_channel(&channel), "ch1 T1 P1=v1");
    }
}
