use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod etl;

#[derive(Debug, Parser)]
#[command(name = "petprice-cli")]
#[command(about = "Pet product price ETL command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// List the shops the ETL can scrape
    Shops,
    /// Discover product links from category listings
    Links {
        /// Only run for this shop (name or slug)
        #[arg(long)]
        shop: Option<String>,
    },
    /// Scrape product pages for every URL not yet done
    Products {
        /// Only run for this shop (name or slug)
        #[arg(long)]
        shop: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

/// Commands that run against the database.
#[derive(Debug)]
enum Job {
    Db(DbCommands),
    Links(Option<String>),
    Products(Option<String>),
}

impl Commands {
    /// `None` for commands that need neither config nor a pool.
    fn into_job(self) -> Option<Job> {
        match self {
            Commands::Db { command } => Some(Job::Db(command)),
            Commands::Links { shop } => Some(Job::Links(shop)),
            Commands::Products { shop } => Some(Job::Products(shop)),
            Commands::Shops => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("petprice-cli ready; run with --help for commands");
        return Ok(());
    };
    let Some(job) = command.into_job() else {
        etl::print_shops();
        return Ok(());
    };

    // Loads .env before reading the environment.
    let config = petprice_core::load_app_config()?;
    init_tracing(&config)?;

    let pool_config = petprice_db::PoolConfig::from_app_config(&config);
    let pool = petprice_db::connect_pool(&config.database_url, pool_config).await?;

    let result = run(&pool, &config, job).await;
    pool.close().await;
    result
}

fn init_tracing(config: &petprice_core::AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    let plain = config.env.plain_logs();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(!plain)
        .init();
    Ok(())
}

async fn run(
    pool: &sqlx::PgPool,
    config: &petprice_core::AppConfig,
    job: Job,
) -> anyhow::Result<()> {
    match job {
        Job::Db(DbCommands::Ping) => {
            petprice_db::ping(pool).await?;
            println!("database ok");
        }
        Job::Db(DbCommands::Migrate) => {
            let applied = petprice_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
        Job::Links(shop) => {
            let store = petprice_db::PgStagingStore::new(pool.clone());
            etl::run_links(&store, config, shop.as_deref()).await?;
        }
        Job::Products(shop) => {
            let store = petprice_db::PgStagingStore::new(pool.clone());
            etl::run_products(&store, config, shop.as_deref()).await?;
        }
    }

    Ok(())
}
