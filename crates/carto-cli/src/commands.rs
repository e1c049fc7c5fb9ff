use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::{Instrument, info, info_span, warn};

use carto_cli::logging::redact_value;
use carto_cli::report::print_categories;
use carto_cli::types::SyncResult;
use carto_core::{
    DataSource, LifecycleController, MapContext, MemorySurface, SyncPipeline, UserSession,
};
use carto_source::{
    AppConfig, AuthClient, FixtureSource, PostgrestSource, SourceError, SupabaseConfig,
};

use crate::cli::{ConfigArgs, SyncArgs};

const PASSWORD_ENV: &str = "CARTO_PASSWORD";

pub fn run_categories() -> Result<()> {
    print_categories();
    Ok(())
}

pub fn run_config(config_path: Option<&Path>, args: &ConfigArgs) -> Result<()> {
    if args.example {
        print!("{}", AppConfig::example());
        return Ok(());
    }
    let config = load_config(config_path)?;
    match config_path
        .map(Path::to_path_buf)
        .or_else(AppConfig::config_path)
    {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no configuration directory"),
    }
    print!("{}", config.redacted().to_toml().map_err(with_hint)?);
    match config.validate() {
        Ok(()) => println!("# configuration is valid"),
        Err(error) => println!("# {error}"),
    }
    Ok(())
}

pub fn run_sync(config_path: Option<&Path>, args: &SyncArgs) -> Result<SyncResult> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    runtime.block_on(sync(config_path, args))
}

async fn sync(config_path: Option<&Path>, args: &SyncArgs) -> Result<SyncResult> {
    if let Some(dir) = &args.fixtures {
        let source = Arc::new(FixtureSource::new(dir));
        let session = UserSession {
            user_id: "fixtures".to_string(),
            email: None,
        };
        return drive(source, session, dir.display().to_string(), args).await;
    }

    let config = load_config(config_path)?;
    config.validate().map_err(with_hint)?;
    let email = args
        .email
        .as_deref()
        .ok_or_else(|| anyhow!("--email is required unless --fixtures is given"))?;
    let password = std::env::var(PASSWORD_ENV)
        .with_context(|| format!("{PASSWORD_ENV} is not set"))?;

    let auth = AuthClient::new(&config.supabase).map_err(with_hint)?;
    let session = auth
        .sign_in_with_password(email, &password)
        .await
        .map_err(with_hint)?;
    info!(user = redact_value(&session.user.user_id), "signed in");

    let source = Arc::new(PostgrestSource::new(&config.supabase).map_err(with_hint)?);
    source.set_access_token(Some(session.access_token.clone()));
    let result = drive(
        Arc::clone(&source),
        session.user.clone(),
        describe(&config.supabase),
        args,
    )
    .await;

    source.set_access_token(None);
    if let Err(error) = auth.sign_out(&session).await {
        warn!(error = %error, "sign-out failed");
    }
    result
}

/// Runs one session against `source` on an in-memory surface.
async fn drive<D>(
    source: Arc<D>,
    session: UserSession,
    label: String,
    args: &SyncArgs,
) -> Result<SyncResult>
where
    D: DataSource + 'static,
{
    let span = info_span!("sync", source = %label);
    async move {
        let surface = Arc::new(MemorySurface::new());
        let context = Arc::new(MapContext::new(Arc::clone(&surface)));
        let controller = LifecycleController::new(SyncPipeline::new(Arc::clone(&context), source));

        let user = redact_value(&session.user_id).to_string();
        let load = controller.session_acquired(session).await;

        for &category in &args.hide_category {
            context.toggle_master(category, false);
        }
        for hide in &args.hide {
            context
                .toggle_override(hide.category, &hide.id, false)
                .map_err(|error| anyhow!(error.user_message()))
                .with_context(|| format!("cannot hide {}:{}", hide.category, hide.id))?;
        }

        let refresh = if args.refresh {
            Some(controller.refresh().await.context("refresh")?)
        } else {
            None
        };

        let views = context.open_panel();
        let state = controller.state();
        let attached_layers = surface.attached_count();
        let teardown = controller.session_lost();

        Ok(SyncResult {
            source: label,
            user,
            load,
            refresh,
            state,
            views,
            attached_layers,
            teardown,
        })
    }
    .instrument(span)
    .await
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = AppConfig::load(path).map_err(with_hint)?;
    let applied = config.apply_process_env();
    if !applied.is_empty() {
        info!(variables = ?applied, "environment overrides applied");
    }
    config.map = config.map.normalized();
    Ok(config)
}

fn describe(config: &SupabaseConfig) -> String {
    format!("{} (schema {})", config.base_url(), config.schema)
}

/// Attaches the user-facing message and hint to a source error.
fn with_hint(error: SourceError) -> anyhow::Error {
    let message = match error.suggestion() {
        Some(hint) => format!("{} {error}\n  hint: {hint}", error.user_message()),
        None => format!("{} {error}", error.user_message()),
    };
    anyhow!(message)
}
