use std::{path::Path, process, str::FromStr, sync::Arc};

use scrivo::{
    application::{
        content_cache::ContentCacheService,
        context::ConsoleContext,
        error::AppError,
        post_index::PostIndexService,
        repos::{CacheRepo, PostIndexRepo, SettingsRepo},
    },
    config::{self, CacheCommand, Command, IndexCommand},
    domain::{
        abbrlink::{self, unix_timestamp_string},
        front_matter,
        types::{Collection, PostStatus},
    },
    infra::{
        db::PostgresRepositories, error::InfraError, memory::MemoryRepositories,
        provider::LocalSiteProvider, telemetry,
    },
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let chain = error.messages().join(": ");
    if dispatcher::has_been_set() {
        error!(error = %chain, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %chain, "application error");
    });
}

struct Repositories {
    cache: Arc<dyn CacheRepo>,
    post_index: Arc<dyn PostIndexRepo>,
    settings: Arc<dyn SettingsRepo>,
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let repositories = init_repositories(&settings).await?;
    let context =
        ConsoleContext::load(repositories.settings.clone(), settings.abbrlink.clone()).await?;

    match cli_args.command {
        Command::Parse(args) => {
            let text = read_document(&args.file).await?;
            let record = front_matter::parse(&text, &context.parse_options(args.safe));
            print_json(&record)
        }
        Command::Abbrlink(args) => {
            let explicit = args.algorithm.is_some() || args.representation.is_some();
            let abbrlink_settings = if explicit {
                settings.abbrlink.clone()
            } else {
                context.abbrlink()
            };
            let timestamp = args
                .timestamp
                .unwrap_or_else(|| unix_timestamp_string(OffsetDateTime::now_utc()));
            let link = abbrlink::generate(
                &timestamp,
                &abbrlink_settings.algorithm,
                &abbrlink_settings.representation,
            )?;
            println!("{link}");
            Ok(())
        }
        Command::Cache(args) => {
            let cache = ContentCacheService::new(repositories.cache);
            run_cache(&cache, &context, &settings, args.command).await
        }
        Command::Index(args) => {
            let index = PostIndexService::new(repositories.post_index);
            run_index(&index, &context, args.command).await
        }
    }
}

async fn run_cache(
    cache: &ContentCacheService,
    context: &ConsoleContext,
    settings: &config::Settings,
    command: CacheCommand,
) -> Result<(), AppError> {
    let language = context.language();
    match command {
        CacheCommand::List { collection, search } => {
            let collection = Collection::from_str(&collection)?;
            let provider = LocalSiteProvider::new(settings.site.root.clone());
            let items = cache
                .collection(&provider, collection, search.as_deref())
                .await?;
            print_json(&items)
        }
        CacheCommand::Purge => {
            let removed = cache.purge_all().await?;
            info!(removed, "{}", language.gettext("PURGE_ALL_CACHE_SUCCESS"));
            Ok(())
        }
        CacheCommand::Delete { name } => {
            if !cache.delete(&name).await? {
                return Err(AppError::NotFound);
            }
            info!(name = %name, "cache entry deleted");
            Ok(())
        }
    }
}

async fn run_index(
    index: &PostIndexService,
    context: &ConsoleContext,
    command: IndexCommand,
) -> Result<(), AppError> {
    let language = context.language();
    match command {
        IndexCommand::Mark {
            file,
            path,
            status,
            filename,
        } => {
            let status = PostStatus::from_str(&status)?;
            let text = read_document(&file).await?;
            let path = path.unwrap_or_else(|| file.to_string_lossy().into_owned());
            let filename = filename.unwrap_or_else(|| {
                file.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let (_, record) = index
                .index_document(context, &path, &text, status, &filename)
                .await?;
            info!(path = %record.path, "{}", language.gettext("UPDATE_POST_INDEX"));
            print_json(&record)
        }
        IndexCommand::Remove { path } => {
            let removed = index.delete(&path).await?;
            info!(path = %path, removed, "{}", language.gettext("DEL_POST_INDEX"));
            Ok(())
        }
        IndexCommand::Clear => {
            let removed = index.clear_all().await?;
            info!(removed, "{}", language.gettext("CLEAR_POST_INDEX"));
            Ok(())
        }
    }
}

async fn init_repositories(settings: &config::Settings) -> Result<Repositories, AppError> {
    let Some(database_url) = settings.database.url.as_ref() else {
        warn!("database url is not configured, using the process-local store");
        let memory = Arc::new(MemoryRepositories::new());
        return Ok(Repositories {
            cache: memory.clone(),
            post_index: memory.clone(),
            settings: memory,
        });
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::migration(err.to_string())))?;

    let postgres = Arc::new(PostgresRepositories::new(pool));
    Ok(Repositories {
        cache: postgres.clone(),
        post_index: postgres.clone(),
        settings: postgres,
    })
}

async fn read_document(path: &Path) -> Result<String, AppError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
