//! The `lazy-query` command line: compile a pipeline request to SQL, run it,
//! or explain it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lazy_query_configuration::{Configuration, Environment};
use query_engine_execution::{metrics::Metrics, query};
use query_engine_sql::sql::execution_plan::ExecutionPlan;
use query_engine_sql::sql::string::RenderMode;
use query_engine_translation::translation;
use query_engine_translation::translation::functions::DialectFunctions;
use query_engine_translation::translation::query::request::QueryRequest;

#[derive(Debug, Parser)]
#[command(
    name = "lazy-query",
    version,
    about = "Compile lazy table queries to SQL"
)]
pub struct Cli {
    /// The directory holding configuration.json.
    #[arg(long, env = "LAZY_QUERY_CONFIGURATION_DIRECTORY", default_value = ".")]
    pub context: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the SQL a request compiles to.
    Show {
        /// A JSON file holding the request.
        request: PathBuf,
        /// Inline parameter values as SQL literals.
        #[arg(long)]
        literal_binds: bool,
        /// Leave out redundant column labels.
        #[arg(long)]
        simple_names: bool,
        /// Format the SQL over several lines.
        #[arg(long)]
        pretty: bool,
    },
    /// Run a request and print its rows as JSON.
    Collect {
        /// A JSON file holding the request.
        request: PathBuf,
    },
    /// Print the database's plan for a request.
    Explain {
        /// A JSON file holding the request.
        request: PathBuf,
    },
    /// Print the JSON schema of configuration.json.
    PrintSchema,
}

/// Log to stderr, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run a command, returning what it prints.
pub async fn run(cli: Cli, environment: impl Environment) -> anyhow::Result<String> {
    match cli.command {
        Command::PrintSchema => Ok(serde_json::to_string_pretty(
            &lazy_query_configuration::generate_schema(),
        )?),
        Command::Show {
            request,
            literal_binds,
            simple_names,
            pretty,
        } => {
            let configuration = configure(&cli.context, environment).await?;
            let plan = plan(&configuration, &request).await?;
            let mode = RenderMode {
                literal_binds,
                simple_names,
            };
            Ok(query::show(&plan, mode, pretty))
        }
        Command::Collect { request } => {
            let configuration = configure(&cli.context, environment).await?;
            let plan = plan(&configuration, &request).await?;
            let (pool, metrics) = connect(&configuration).await?;
            let rows = query::execute(&pool, &metrics, &plan).await?;
            Ok(serde_json::to_string_pretty(&rows.to_records())?)
        }
        Command::Explain { request } => {
            let configuration = configure(&cli.context, environment).await?;
            let plan = plan(&configuration, &request).await?;
            let (pool, metrics) = connect(&configuration).await?;
            let (sql, query_plan) = query::explain(&pool, &metrics, &plan).await?;
            Ok(format!("{sql}\n\n{query_plan}"))
        }
    }
}

async fn configure(context: &Path, environment: impl Environment) -> anyhow::Result<Configuration> {
    let parsed = lazy_query_configuration::parse_configuration(context).await?;
    Ok(lazy_query_configuration::make_runtime_configuration(parsed, environment)?)
}

async fn plan(configuration: &Configuration, request: &Path) -> anyhow::Result<ExecutionPlan> {
    let contents = tokio::fs::read_to_string(request)
        .await
        .with_context(|| format!("reading {}", request.display()))?;
    let request: QueryRequest = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {}", request.display()))?;
    Ok(translation::query::translate(
        &configuration.metadata,
        Arc::new(DialectFunctions::for_dialect(configuration.dialect)),
        &request,
    )?)
}

async fn connect(configuration: &Configuration) -> anyhow::Result<(query::Pool, Metrics)> {
    let pool = query::create_pool(
        &configuration.connection_uri,
        configuration.pool_settings.max_connections,
    )
    .await?;
    let metrics = Metrics::initialize(&mut prometheus::Registry::new())?;
    Ok((pool, metrics))
}
