use std::{process, sync::Arc};

use relaydoc::{
    application::{
        completions::{CompletionDefaults, CompletionService},
        documents::{DocumentService, ExportRequest},
        error::AppError,
        records::RecordService,
        repos::GenerativeApi,
    },
    cache::{CacheAsideFetcher, CacheConfig, CacheTierSelector, RedisConnector},
    config::{self, CompleteArgs, ExportArgs},
    infra::{
        content_api::HttpContentApi,
        error::InfraError,
        generative::HttpGenerativeApi,
        http::{self, AppState},
        telemetry::{self, LogSink},
    },
    render::{DocumentRenderer, DocxPackager, FormatConverter, PdfCommandRenderer, RtfTranspiler},
    resilience::ResilientClient,
};
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
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        InfraError::configuration(format!("failed to load configuration: {err}"))
    })?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    match command {
        config::Command::Serve(_) => {
            telemetry::init(&settings.logging, LogSink::Stdout)?;
            run_serve(settings).await
        }
        config::Command::Export(args) => {
            telemetry::init(&settings.logging, LogSink::Stderr)?;
            run_export(settings, args).await
        }
        config::Command::Complete(args) => {
            telemetry::init(&settings.logging, LogSink::Stderr)?;
            run_complete(settings, args).await
        }
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let state = build_state(&settings)?;

    let tier = state.selector.initialize().await;
    info!(
        target = "relaydoc::serve",
        tier = state.selector.active_tier().unwrap_or("none"),
        state = ?tier,
        "Cache tier resolved"
    );

    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = "relaydoc::serve",
        addr = %settings.server.addr,
        "HTTP gateway listening"
    );

    axum::serve(listener, router)
        .await
        .map_err(InfraError::from)?;
    Ok(())
}

async fn run_export(settings: config::Settings, args: ExportArgs) -> Result<(), AppError> {
    let state = build_state(&settings)?;
    let request = ExportRequest {
        format: args.format,
        user_id: args.user_id,
        post_id: args.post_id,
    };

    let document = state.documents.export(&request).await?;
    tokio::fs::write(&args.output, &document.bytes)
        .await
        .map_err(InfraError::from)?;

    info!(
        target = "relaydoc::export",
        format = document.format.as_str(),
        bytes = document.bytes.len(),
        path = %args.output.display(),
        "Document written"
    );
    Ok(())
}

async fn run_complete(settings: config::Settings, args: CompleteArgs) -> Result<(), AppError> {
    let state = build_state(&settings)?;
    let text = state
        .completions
        .complete(&args.prompt, args.system.as_deref())
        .await?;
    println!("{text}");
    Ok(())
}

fn build_state(settings: &config::Settings) -> Result<AppState, AppError> {
    let http_client = reqwest::Client::builder()
        .build()
        .map_err(|err| InfraError::configuration(format!("failed to build HTTP client: {err}")))?;
    let policy = settings.resilience.policy();

    let cache_config = CacheConfig::from(&settings.cache);
    let connector = RedisConnector::from_config(&cache_config);
    info!(
        target = "relaydoc::serve",
        redis_mode = connector.mode(),
        "Distributed cache connector configured"
    );
    let selector = Arc::new(CacheTierSelector::new(cache_config, Arc::new(connector)));
    let fetcher = CacheAsideFetcher::new(selector.clone(), settings.cache.ttl);

    let content_client = ResilientClient::new(
        http_client.clone(),
        "content",
        settings.content_api.base_url.clone(),
        settings.content_api.timeout,
        policy,
    );
    let records = RecordService::new(
        Arc::new(HttpContentApi::new(content_client)),
        fetcher.clone(),
    );

    let generative = match settings.generative.api_key.as_ref() {
        Some(api_key) => {
            let client = ResilientClient::new(
                http_client,
                "generative",
                settings.generative.base_url.clone(),
                settings.generative.timeout,
                policy,
            );
            Some(Arc::new(HttpGenerativeApi::new(
                client,
                api_key.clone(),
                settings.generative.api_version.clone(),
            )) as Arc<dyn GenerativeApi>)
        }
        None => {
            warn!(
                target = "relaydoc::serve",
                "generative.api_key is not set; completion endpoints will fail"
            );
            None
        }
    };
    let completions = CompletionService::new(
        generative,
        fetcher,
        CompletionDefaults::from(&settings.generative),
    );

    let converter = FormatConverter::new(
        Arc::new(PdfCommandRenderer::new(settings.render.pdf_command.clone())),
        Arc::new(DocxPackager),
        RtfTranspiler::new(settings.render.rtf_font.clone()),
    );
    let documents = DocumentService::new(records.clone(), DocumentRenderer::default(), converter);

    Ok(AppState {
        records,
        completions,
        documents,
        selector,
    })
}
