use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;

use objmap::config::{self, MapperConfig};
use objmap::dialect::DialectKind;
use objmap::object_graph::fixture::{load_fixture_str, LoadedFixture};
use objmap::protection::{ProtectionEntry, ProtectionManager, SqliteEdgeStore};
use objmap::query_builder::{AggregateFunction, QueryBuilder, QueryDocument};
use objmap::type_catalog::TypeCatalog;

/// objmap - query-by-example SQL and safe deletes for mapped object graphs
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file (otherwise OBJMAP_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQL dialect: ansi or sqlite
    #[arg(long, global = true)]
    dialect: Option<DialectKind>,

    /// Edge table name
    #[arg(long, global = true)]
    edge_table: Option<String>,

    /// Maximum nesting depth of example objects
    #[arg(long, global = true)]
    max_nesting_depth: Option<usize>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true)]
    log_filter: Option<String>,

    /// SQLite database holding the edge table
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the SQL of a query document
    Render(RenderArgs),
    /// Create the edge table if it does not exist
    InitEdges,
    /// Report whether an object can be deleted
    CheckDelete(EntryArgs),
    /// Delete an object's edges if the object is deletable
    Delete(EntryArgs),
    /// Mark an object as referenced from outside the object graph
    Pin(EntryArgs),
    /// Remove an external pin
    Unpin(EntryArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Type catalog (YAML)
    #[arg(long)]
    catalog: PathBuf,

    /// Example objects (YAML)
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Query document (YAML)
    #[arg(long)]
    query: PathBuf,

    /// Select an aggregate instead of ids: avg, count, max, min or sum
    #[arg(long, requires = "property")]
    aggregate: Option<AggregateFunction>,

    /// Property the aggregate applies to
    #[arg(long)]
    property: Option<String>,

    /// Print the statement and its parameters as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct EntryArgs {
    /// Table of the object
    #[arg(long)]
    table: String,

    /// Id of the object
    #[arg(long)]
    id: i64,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn overrides(&self) -> config::CliConfig {
        config::CliConfig {
            dialect: self.dialect,
            edge_table: self.edge_table.clone(),
            max_nesting_depth: self.max_nesting_depth,
            log_filter: self.log_filter.clone(),
            database_path: self.database.clone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => MapperConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => MapperConfig::from_env()?,
    };
    let config = MapperConfig::from_cli(base, cli.overrides())?;

    // Defaults to the configured filter, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();
    log::debug!("configuration: {:?}", config);

    match &cli.command {
        Command::Render(args) => render(&config, args),
        Command::InitEdges => {
            let conn = open_database(&config)?;
            SqliteEdgeStore::with_table(&conn, &config.edge_table)?.create_table()?;
            println!("edge table {} ready", config.edge_table);
            Ok(())
        }
        Command::CheckDelete(args) => guarded_delete(&config, args, false),
        Command::Delete(args) => guarded_delete(&config, args, true),
        Command::Pin(args) => {
            let mut conn = open_database(&config)?;
            let tx = conn.transaction()?;
            let added = {
                let store = SqliteEdgeStore::with_table(&tx, &config.edge_table)?;
                ProtectionManager::new(store).pin(entry(args))?
            };
            tx.commit()?;
            println!("{} {}", entry(args), if added { "pinned" } else { "already pinned" });
            Ok(())
        }
        Command::Unpin(args) => {
            let mut conn = open_database(&config)?;
            let tx = conn.transaction()?;
            let removed = {
                let store = SqliteEdgeStore::with_table(&tx, &config.edge_table)?;
                ProtectionManager::new(store).unpin(&entry(args))?
            };
            tx.commit()?;
            println!("{}: {} pin(s) removed", entry(args), removed);
            Ok(())
        }
    }
}

fn render(config: &MapperConfig, args: &RenderArgs) -> anyhow::Result<()> {
    let catalog = TypeCatalog::from_yaml_file(&args.catalog)
        .with_context(|| format!("loading catalog {}", args.catalog.display()))?;
    let fixture = match &args.fixture {
        Some(path) => load_fixture_str(&catalog, &read(path)?)
            .with_context(|| format!("loading fixture {}", path.display()))?,
        None => LoadedFixture::default(),
    };
    let document = QueryDocument::from_yaml_str(&read(&args.query)?)?;
    let clauses = document.clauses(&fixture)?;

    let dialect = config.dialect.dialect();
    let builder = QueryBuilder::new(&catalog, dialect.as_ref(), &fixture.graph)
        .with_max_depth(config.max_nesting_depth);
    let plan = match (args.aggregate, &args.property) {
        (Some(function), Some(property)) => {
            builder
                .aggregate(&document.search, function, property, &clauses)?
                .0
        }
        (Some(_), None) => bail!("--aggregate needs --property"),
        (None, _) => builder.generate(&document.search, &clauses, document.add_joins)?,
    };
    let rendered = plan.to_sql(dialect.as_ref());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        println!("{}", rendered.sql);
        for (idx, param) in rendered.params.iter().enumerate() {
            println!("  ?{} = {}", idx + 1, param);
        }
    }
    Ok(())
}

fn guarded_delete(config: &MapperConfig, args: &EntryArgs, apply: bool) -> anyhow::Result<()> {
    let mut conn = open_database(config)?;
    let tx = conn.transaction()?;
    let set = {
        let store = SqliteEdgeStore::with_table(&tx, &config.edge_table)?;
        let mut manager = ProtectionManager::new(store);
        if apply {
            manager.delete_if_safe(entry(args))?
        } else {
            manager.check(entry(args))?
        }
    };
    tx.commit()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&set)?);
        return Ok(());
    }
    if set.is_deletable() {
        println!("{} is deletable", set.candidate());
        for dependent in set.survivors().iter().skip(1) {
            println!("  owned: {}", dependent);
        }
    } else {
        println!("{} is protected", set.candidate());
    }
    Ok(())
}

fn entry(args: &EntryArgs) -> ProtectionEntry {
    ProtectionEntry::new(args.table.clone(), args.id)
}

fn open_database(config: &MapperConfig) -> anyhow::Result<Connection> {
    let Some(path) = &config.database_path else {
        bail!("no database configured (use --database or OBJMAP_DATABASE)");
    };
    Connection::open(path).with_context(|| format!("opening {}", path))
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
