// src/app.rs
use anyhow::{anyhow, Context, Result};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::application::commands::ProbeSource;
use crate::application::{Acquisition, AcquisitionOrchestrator, Cli, Commands, MarkupSource, PriceSource, StreamSource};
use crate::config::Config;
use crate::infrastructure::engine_io::{EngineIoClient, EngineIoConfig};
use crate::infrastructure::fetch::{HttpPageFetcher, PageFetcher, RenderedPageFetcher};
use crate::infrastructure::markup::MarkupExtractor;
use crate::infrastructure::notify::{LogNotifier, Notifier, TelegramNotifier};
use crate::report::{failure_message, AlertReport};
use crate::shared::errors::NotifyError;

const DEFAULT_CONFIG_FILE: &str = "Config.toml";

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub config: Config,
    pub dry_run: bool,
    pub json: bool,
}

impl AppCfg {
    /// Defaults < config file < environment < CLI
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Config::from_file(path).with_context(|| format!("load config {}", path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Config::from_file(DEFAULT_CONFIG_FILE).context("load Config.toml")?
            }
            None => Config::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        cli.apply_overrides(&mut config);
        config.validate()?;

        Ok(Self {
            config,
            dry_run: cli.dry_run,
            json: cli.json,
        })
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.source.request_timeout_secs)
    }

    fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.config.markup.render_timeout_secs)
    }

    pub fn engine_io_config(&self) -> EngineIoConfig {
        let source = &self.config.source;
        let mut cfg = EngineIoConfig::new(source.base_url.clone());
        cfg.path = source.socket_path.clone();
        cfg.event_name = source.event_name.clone();
        cfg.request_event = Some(source.request_event.clone()).filter(|e| !e.trim().is_empty());
        cfg.max_polls = source.max_polls;
        cfg.poll_delay = Duration::from_millis(source.poll_delay_ms);
        cfg.request_timeout = self.request_timeout();
        cfg
    }

    /// Outer bound for any single source
    pub fn source_timeout(&self) -> Duration {
        let stream = self.engine_io_config().overall_timeout();
        let markup = self.request_timeout() + self.render_timeout();
        stream.max(markup) + Duration::from_secs(1)
    }
}

pub fn stream_source(app_cfg: &AppCfg) -> Result<Box<dyn PriceSource>> {
    let client = EngineIoClient::new(app_cfg.engine_io_config())?;
    Ok(Box::new(StreamSource::new(
        client,
        app_cfg.config.source.preferred_timeframe.clone(),
    )))
}

pub fn markup_source(app_cfg: &AppCfg) -> Result<Box<dyn PriceSource>> {
    let mut fetchers: Vec<Box<dyn PageFetcher>> = vec![Box::new(HttpPageFetcher::new(app_cfg.request_timeout())?)];
    if let Some(binary) = &app_cfg.config.markup.renderer_binary {
        fetchers.push(Box::new(RenderedPageFetcher::new(binary.clone(), app_cfg.render_timeout())));
    }

    Ok(Box::new(MarkupSource::new(
        app_cfg.config.page_url(),
        fetchers,
        MarkupExtractor::new(app_cfg.config.markup.plausibility_floor),
    )))
}

pub fn build_orchestrator(app_cfg: &AppCfg) -> Result<AcquisitionOrchestrator> {
    let sources = vec![stream_source(app_cfg)?, markup_source(app_cfg)?];
    Ok(AcquisitionOrchestrator::new(sources, app_cfg.source_timeout()))
}

/// `None` when no credentials are configured; only an error once a message must go out
pub fn build_notifier(app_cfg: &AppCfg) -> Result<Option<Box<dyn Notifier>>> {
    if app_cfg.dry_run {
        return Ok(Some(Box::new(LogNotifier)));
    }

    let telegram = &app_cfg.config.telegram;
    match (&telegram.bot_token, &telegram.chat_id) {
        (Some(token), Some(chat_id)) => Ok(Some(Box::new(TelegramNotifier::new(
            telegram.api_base.clone(),
            token.clone(),
            chat_id.clone(),
        )?))),
        _ => Ok(None),
    }
}

pub struct App {
    cfg: AppCfg,
    orchestrator: AcquisitionOrchestrator,
    notifier: Option<Box<dyn Notifier>>,
}

impl App {
    pub fn new(cfg: AppCfg) -> Result<Self> {
        let orchestrator = build_orchestrator(&cfg)?;
        let notifier = build_notifier(&cfg)?;
        if notifier.is_none() {
            warn!("⚠️ Telegram credentials not set, alerts cannot be delivered");
        }
        Ok(Self {
            cfg,
            orchestrator,
            notifier,
        })
    }

    /// One acquisition plus alerting. `Ok(false)` when every source failed.
    pub async fn check_once(&self) -> Result<bool> {
        match self.orchestrator.acquire().await {
            Acquisition::Snapshot(snapshot) => {
                let report = AlertReport::new(snapshot);
                let s = &report.snapshot;
                info!(
                    "📊 Base {:.2} | Kronos {:.2} | Diff {:+.2} | Notify {}",
                    s.base_price, s.predicted_price, s.difference, s.should_notify
                );
                if self.cfg.json {
                    println!("{}", report.to_json()?);
                }

                if s.should_notify {
                    info!("✨ Divergence above threshold, sending alert");
                    self.deliver(&report.to_message()).await?;
                } else {
                    info!("⏸️ Divergence within {:.1}, no notification needed", report.threshold);
                }
                Ok(true)
            }
            Acquisition::Failed { attempts } => {
                error!("❌ No price data from any source ({} attempts)", attempts.len());
                if let Err(e) = self.deliver(&failure_message(&attempts)).await {
                    warn!("⚠️ Operator notification failed: {}", e);
                }
                Ok(false)
            }
        }
    }

    async fn deliver(&self, text: &str) -> Result<()> {
        let notifier = self
            .notifier
            .as_ref()
            .ok_or(NotifyError::MissingCredentials("TELEGRAM_TOKEN / TELEGRAM_CHAT_ID"))?;
        notifier.send(text).await?;
        Ok(())
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let app_cfg = AppCfg::load(&cli)?;
    info!("🤖 Kronos notifier starting");
    info!(
        "Server: {} | page: {} | timeframe: {}",
        app_cfg.config.source.base_url,
        app_cfg.config.page_url(),
        app_cfg.config.source.preferred_timeframe.as_deref().unwrap_or("auto")
    );

    match cli.command() {
        Commands::Check => {
            let app = App::new(app_cfg)?;
            if !app.check_once().await? {
                return Err(anyhow!("price acquisition failed"));
            }
            info!("✅ Check completed");
            Ok(())
        }
        Commands::Watch { interval_secs } => {
            let app = App::new(app_cfg)?;
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("⚠️ Cannot listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            run_polling_mode(&app, Duration::from_secs(interval_secs.max(1)), shutdown).await
        }
        Commands::Probe { source } => probe(&app_cfg, source).await,
    }
}

/// Check on every tick until `shutdown` resolves, including mid-acquisition
async fn run_polling_mode<F>(app: &App, every: Duration, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    info!("Running in polling mode every {:?}", every);
    let mut interval = tokio::time::interval(every);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                tokio::select! {
                    result = app.check_once() => {
                        if let Err(e) = result {
                            error!("❌ Check failed: {:#}", e);
                        }
                    }
                    _ = &mut shutdown => {
                        info!("🛑 Interrupted during a check, stopping");
                        return Ok(());
                    }
                }
            }
            _ = &mut shutdown => {
                info!("🛑 Interrupted, stopping");
                return Ok(());
            }
        }
    }
}

async fn probe(app_cfg: &AppCfg, source: ProbeSource) -> Result<()> {
    let source = match source {
        ProbeSource::Stream => stream_source(app_cfg)?,
        ProbeSource::Markup => markup_source(app_cfg)?,
    };
    let name = source.name().to_string();
    let orchestrator = AcquisitionOrchestrator::new(vec![source], app_cfg.source_timeout());

    match orchestrator.acquire().await {
        Acquisition::Snapshot(snapshot) => {
            println!("{}", AlertReport::new(snapshot).to_json()?);
            Ok(())
        }
        Acquisition::Failed { attempts } => {
            let reason = attempts.first().map(|a| a.error.to_string()).unwrap_or_default();
            Err(anyhow!("{} source returned nothing: {}", name, reason))
        }
    }
}
