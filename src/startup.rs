use lukkari::components::calendar::{CourseSource, JsonFileStore, PersistenceService};
use lukkari::components::CalendarHandle;
use lukkari::config::Config;
use lukkari::error::{CalendarResult, Error};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

type Sources = (Arc<dyn PersistenceService>, Arc<dyn CourseSource>);

/// Pick the data source: the REST API when configured, otherwise the JSON file
pub async fn build_sources(config: Arc<RwLock<Config>>) -> CalendarResult<Sources> {
    let config = config.read().await;

    if let Some(api_url) = &config.api_url {
        #[cfg(feature = "rest")]
        {
            let client = Arc::new(lukkari::components::calendar::RestClient::new(
                api_url,
                config.api_token.clone(),
            )?);
            info!("Using calendar API at {}", api_url);
            let persistence: Arc<dyn PersistenceService> = client.clone();
            let courses: Arc<dyn CourseSource> = client;
            return Ok((persistence, courses));
        }

        #[cfg(not(feature = "rest"))]
        warn!(
            "LUKKARI_API_URL is set to {} but REST support is not compiled in, using {}",
            api_url, config.data_file
        );
    }

    info!("Using calendar file {}", config.data_file);
    let store = Arc::new(JsonFileStore::new(&config.data_file));
    let persistence: Arc<dyn PersistenceService> = store.clone();
    let courses: Arc<dyn CourseSource> = store;
    Ok((persistence, courses))
}

/// Spawn the calendar component and load the first view
///
/// A failed first load leaves the view empty; the error is logged and
/// returned alongside the handle so the caller can tell the user.
pub async fn start_calendar(
    config: Arc<RwLock<Config>>,
) -> CalendarResult<(CalendarHandle, Option<Error>)> {
    let (persistence, courses) = build_sources(Arc::clone(&config)).await?;
    let calendar = CalendarHandle::new(config, persistence, courses).await?;

    let load_error = match calendar.refresh().await {
        Ok(view) => {
            info!("Loaded {} calendar events", view.events().len());
            None
        }
        Err(e) => {
            warn!("Showing an empty calendar: {}", e);
            Some(e)
        }
    };

    Ok((calendar, load_error))
}
