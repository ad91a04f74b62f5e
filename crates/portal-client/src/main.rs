//! portal-client: headless login and routing client for the mobile portal.
//!
//! Loads configuration, establishes a session with the configured strategy,
//! prints the returned layout payload, and dispatches an initial route.

use std::sync::Arc;

use portal_client::{
    Authenticator, Credentials, CredentialVault, EventBus, PortalConfig, Router, View, ViewManager,
};

struct Options {
    config_path: String,
    username: Option<String>,
    password: Option<String>,
    route: String,
    remember: bool,
}

fn main() -> anyhow::Result<()> {
    let options = parse_options()?;
    let config = PortalConfig::load(&options.config_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let _tracing_guard = portal_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %options.config_path,
            server = %config.server.base_url,
            strategy = %config.login.strategy.as_str(),
            "starting portal-client"
        );

        run(options, config).await
    })
}

fn parse_options() -> anyhow::Result<Options> {
    let mut options = Options {
        config_path: std::env::var("PORTAL_CLIENT_CONFIG")
            .unwrap_or_else(|_| "portal-client.toml".to_string()),
        username: None,
        password: None,
        route: String::new(),
        remember: false,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => options.config_path = flag_value(&mut args, "--config")?,
            "--username" => options.username = Some(flag_value(&mut args, "--username")?),
            "--password" => options.password = Some(flag_value(&mut args, "--password")?),
            "--route" => options.route = flag_value(&mut args, "--route")?,
            "--remember" => options.remember = true,
            other => anyhow::bail!("unrecognized argument: {other}"),
        }
    }

    Ok(options)
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    args.next()
        .ok_or_else(|| anyhow::anyhow!("{flag} requires a value"))
}

async fn run(options: Options, config: PortalConfig) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let events = EventBus::default();
    let vault = CredentialVault::new(&config.vault);

    let credentials = match (&options.username, &options.password) {
        (Some(username), Some(password)) => Credentials::new(username.clone(), password.clone()),
        (None, None) => match vault.retrieve() {
            Ok(Some(cached)) => {
                tracing::info!("using cached credentials");
                cached
            }
            Ok(None) => Credentials::guest(),
            Err(e) => {
                tracing::warn!(error = %e, "credential store unreadable, continuing as guest");
                Credentials::guest()
            }
        },
        _ => anyhow::bail!("--username and --password must be given together"),
    };

    let authenticator = Authenticator::new(config.clone(), events.clone())?;
    let session = authenticator.establish_session(&credentials).await?;

    if options.remember && credentials.is_complete() {
        vault.store(&credentials)?;
        tracing::info!("credentials stored for the next run");
    }

    println!("{}", serde_json::to_string_pretty(&session)?);

    let mut router = Router::new(LoggingViewManager, events);
    match router.dispatch(&options.route) {
        Some(view) => tracing::info!(view = %view, "initial route dispatched"),
        None => tracing::warn!(route = %options.route, "initial route did not match"),
    }

    Ok(())
}

/// View manager that only logs: the client is headless.
struct LoggingViewManager;

impl ViewManager for LoggingViewManager {
    fn show(&mut self, view: View) {
        tracing::info!(view = ?view, "view shown");
    }

    fn add_class(&mut self, class: &str) {
        tracing::debug!(class = %class, "content class added");
    }

    fn remove_class(&mut self, class: &str) {
        tracing::debug!(class = %class, "content class removed");
    }
}
