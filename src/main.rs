use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use jsm_insights::analysis::{
    run_component_report, run_kpi_report, AnalysisError, Component, ComponentReport,
};
use jsm_insights::config::AppConfig;
use jsm_insights::error::AppError;
use jsm_insights::source::{HttpSource, ReportSource};
use jsm_insights::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
    source: Arc<dyn ReportSource>,
}

#[derive(Parser, Debug)]
#[command(
    name = "jsm-insights",
    about = "Aggregate district water-conservation KPIs into ranked, comparative dashboard reports",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Generate an analysis report from the command line
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// One program component's two-date analysis for a district
    Component(ComponentReportArgs),
    /// Cross-component KPI analysis with ranks and state context
    Kpis(KpiReportArgs),
}

#[derive(Args, Debug)]
struct ComponentReportArgs {
    /// Component to analyze: farm_ponds, dugwell, amrit_sarovar, old_works or mybharat
    #[arg(long, value_parser = parse_component)]
    component: Component,
    /// Name of the district to analyze
    #[arg(short, long)]
    district: String,
    /// Report date (YYYY-MM-DD); compared against the day before
    #[arg(long)]
    date: String,
    /// Optional file path for the JSON output
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct KpiReportArgs {
    /// Name of the district to analyze
    #[arg(short, long)]
    district: String,
    /// Report date (YYYY-MM-DD); compared against the day before
    #[arg(long)]
    date: String,
    /// Optional file path for the JSON output
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ComponentReportRequest {
    district: String,
    date: String,
    component: String,
}

#[derive(Debug, Deserialize)]
struct KpiReportRequest {
    district: String,
    date: String,
}

fn parse_component(raw: &str) -> Result<Component, String> {
    Component::from_key(raw).ok_or_else(|| {
        format!("unknown component '{raw}' (expected farm_ponds, dugwell, amrit_sarovar, old_works or mybharat)")
    })
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Report { command } => {
            // The analysis core and its fetch client are synchronous; keep
            // them off the async worker threads.
            tokio::task::spawn_blocking(move || run_report(command)).await?
        }
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
        source: Arc::new(HttpSource::new(&config.reporting_api)),
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/reports/component", post(component_report_endpoint))
        .route("/api/v1/reports/kpis", post(kpi_report_endpoint))
        .layer(prometheus_layer)
        .with_state(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "district insights service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_report(command: ReportCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let source = HttpSource::new(&config.reporting_api);

    let (payload, output) = match command {
        ReportCommand::Component(args) => {
            let report =
                run_component_report(&source, args.component, &args.district, &args.date)?;
            (serde_json::to_string_pretty(&report)?, args.output)
        }
        ReportCommand::Kpis(args) => {
            let report = run_kpi_report(&source, &args.district, &args.date)?;
            (serde_json::to_string_pretty(&report)?, args.output)
        }
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &payload)?;
            info!(path = %path.display(), "report saved");
        }
        None => println!("{payload}"),
    }

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn component_report_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<ComponentReportRequest>,
) -> Result<Json<ComponentReport>, AppError> {
    let source = state.source.clone();
    let report =
        tokio::task::spawn_blocking(move || build_component_report(source.as_ref(), payload))
            .await??;
    Ok(Json(report))
}

async fn kpi_report_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<KpiReportRequest>,
) -> Result<Json<jsm_insights::analysis::kpi::views::KpiAnalysis>, AppError> {
    let source = state.source.clone();
    let report = tokio::task::spawn_blocking(move || {
        run_kpi_report(source.as_ref(), &payload.district, &payload.date)
    })
    .await??;
    Ok(Json(report))
}

fn build_component_report(
    source: &dyn ReportSource,
    request: ComponentReportRequest,
) -> Result<ComponentReport, AppError> {
    let component = Component::from_key(&request.component)
        .ok_or_else(|| AnalysisError::UnknownComponent(request.component.clone()))?;
    Ok(run_component_report(
        source,
        component,
        &request.district,
        &request.date,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsm_insights::source::StaticSource;

    fn mybharat_source() -> StaticSource {
        let mut source = StaticSource::new();
        let payload = json!({
            "districts_data": [
                {"district": "Bhopal", "total_count": 120, "marks": 8.0, "target": 150},
                {"district": "Sehore", "total_count": 60, "marks": 4.0, "target": 100},
            ]
        });
        source.insert(
            "/report_jsm/mybharat/gender-stats",
            &[("date", "2024-05-01")],
            payload.clone(),
        );
        source.insert(
            "/report_jsm/mybharat/gender-stats",
            &[("date", "2024-04-30")],
            payload,
        );
        source
    }

    #[test]
    fn component_request_builds_a_report() {
        let source = mybharat_source();
        let request = ComponentReportRequest {
            district: "Bhopal".to_string(),
            date: "2024-05-01".to_string(),
            component: "mybharat".to_string(),
        };

        let report = build_component_report(&source, request).expect("report builds");
        let ComponentReport::Standard(analysis) = report else {
            panic!("expected a standard component report");
        };
        assert_eq!(analysis.component, "MyBharat (Jaldoot)");
        assert_eq!(analysis.state_statistics_today.districts_reporting, 2);
    }

    #[test]
    fn unknown_component_is_rejected() {
        let source = StaticSource::new();
        let request = ComponentReportRequest {
            district: "Bhopal".to_string(),
            date: "2024-05-01".to_string(),
            component: "tanks".to_string(),
        };

        let error = build_component_report(&source, request).expect_err("must reject");
        assert!(matches!(
            error,
            AppError::Analysis(AnalysisError::UnknownComponent(_))
        ));
    }
}
