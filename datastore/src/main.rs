//! sitekit-report: fetch a single Site Kit report and print it as JSON

use anyhow::{anyhow, Context};
use clap::Parser;

use datastore::{ClientConfig, Credentials, RealApiFetcher, Registry};
use shared::{logging, store_info, DateRange, ModuleSlug, ReportRequest, ReportResult};

#[derive(Parser, Debug)]
#[command(name = "sitekit-report")]
#[command(about = "Fetch a Site Kit module report through the datastore")]
struct Args {
    /// Module slug, e.g. search-console
    #[arg(long)]
    module: ModuleSlug,

    /// Report datapoint, e.g. searchanalytics
    #[arg(long)]
    datapoint: String,

    /// Report parameter as name=value (repeatable)
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Date range slug such as last-28-days; sets startDate/endDate
    #[arg(long)]
    date_range: Option<DateRange>,

    /// Also request the preceding comparison window
    #[arg(long, requires = "date_range")]
    compare: bool,

    /// Days between today and the end of the date range
    #[arg(long, default_value_t = 1)]
    offset_days: u32,

    /// WordPress site URL (overrides SITEKIT_SITE_URL)
    #[arg(long)]
    site_url: Option<String>,

    /// Application password user (overrides SITEKIT_USERNAME)
    #[arg(long, env = "SITEKIT_USERNAME", requires = "app_password")]
    username: Option<String>,

    /// Application password (overrides SITEKIT_APP_PASSWORD)
    #[arg(long, env = "SITEKIT_APP_PASSWORD", hide_env_values = true)]
    app_password: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn parse_param(input: &str) -> Result<(String, String), String> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{input}'"))?;
    if name.is_empty() {
        return Err(format!("empty parameter name in '{input}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn build_config(args: &Args) -> anyhow::Result<ClientConfig> {
    // Missing .env is fine; existing variables are never overridden
    let _ = dotenv::dotenv();
    let mut config = ClientConfig::from_lookup(|name| match (name, &args.site_url) {
        (datastore::config::SITE_URL_VAR, Some(site_url)) => Some(site_url.clone()),
        _ => std::env::var(name).ok(),
    })
    .context("loading configuration")?;

    if let (Some(username), Some(password)) = (&args.username, &args.app_password) {
        config.credentials = Some(Credentials::new(username, password));
    }
    Ok(config)
}

fn build_request(args: &Args) -> anyhow::Result<ReportRequest> {
    let mut request = ReportRequest::new(args.module, &args.datapoint);
    for (name, value) in &args.params {
        request = request.param(name, value.as_str());
    }
    if let Some(range) = args.date_range {
        let today = chrono::Local::now().date_naive();
        request = range
            .apply(request, today, args.offset_days, args.compare)
            .context("resolving --date-range")?;
    }
    Ok(request)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));
    logging::log_startup("sitekit-report", &format!("{} {}", args.module, args.datapoint));

    let config = build_config(&args)?;
    let fetcher = RealApiFetcher::new(config)?;
    let registry = Registry::with_modules(fetcher, [args.module]);

    let request = build_request(&args)?;
    let key = request.serialize_key()?;
    store_info!(args.module.namespace(), key = %key, "requesting report");

    match registry.get_report(request).await? {
        ReportResult::Success(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        ReportResult::Error(failure) => {
            logging::log_error("sitekit-report", "report fetch", &failure);
            Err(anyhow!(failure))
        }
        ReportResult::Pending => Err(anyhow!("report fetch did not settle")),
    }
}
