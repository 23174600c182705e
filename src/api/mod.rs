mod args;

use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    ExpenseInputs, MilestoneInputs, fire_horizon, milestone_plan, simulate_bucket_strategy,
    sip_growth, solve_goal, summarize_expenses,
};

pub use args::{BucketArgs, CliGoalType, FireArgs, InputFileArgs, SipArgs, SolveArgs};
use args::{
    BucketPayload, FirePayload, SipPayload, SolvePayload, build_bucket_inputs, build_fire_inputs,
    build_sip_inputs, build_solve_request,
};

#[derive(Parser, Debug)]
#[command(
    name = "finplan",
    about = "Personal-finance planners: three-bucket withdrawals, SIP growth, FIRE horizon, milestones and expenses"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API over HTTP.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Simulate the three-bucket withdrawal strategy.
    Bucket(BucketArgs),
    /// Project SIP growth with step-up and lumpsums.
    Sip(SipArgs),
    /// Find when the portfolio first covers the FIRE target.
    Fire(FireArgs),
    /// Solve for the corpus or requirement that lasts a target number of years.
    Solve(SolveArgs),
    /// Plan savings around inflated milestone costs.
    Milestones(InputFileArgs),
    /// Summarize inflated expenses and the FIRE number.
    Expenses(InputFileArgs),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Serve { port } => run_http_server(port)
            .await
            .map_err(|e| format!("Server error: {e}")),
        command => {
            let json = run_command(command)?;
            println!("{json}");
            Ok(())
        }
    }
}

/// Runs a one-shot calculator subcommand and renders its result as pretty JSON.
fn run_command(command: Command) -> Result<String, String> {
    match command {
        Command::Serve { .. } => Err("serve is not a one-shot command".to_string()),
        Command::Bucket(args) => {
            let inputs = build_bucket_inputs(&args)?;
            to_pretty_json(&simulate_bucket_strategy(&inputs).map_err(|e| e.to_string())?)
        }
        Command::Sip(args) => {
            let inputs = build_sip_inputs(&args)?;
            to_pretty_json(&sip_growth(&inputs).map_err(|e| e.to_string())?)
        }
        Command::Fire(args) => {
            let inputs = build_fire_inputs(&args);
            to_pretty_json(&fire_horizon(&inputs).map_err(|e| e.to_string())?)
        }
        Command::Solve(args) => {
            let (inputs, config) = build_solve_request(&args)?;
            to_pretty_json(&solve_goal(&inputs, config).map_err(|e| e.to_string())?)
        }
        Command::Milestones(file) => {
            let inputs: MilestoneInputs = file.load()?;
            to_pretty_json(&milestone_plan(&inputs).map_err(|e| e.to_string())?)
        }
        Command::Expenses(file) => {
            let inputs: ExpenseInputs = file.load()?;
            to_pretty_json(&summarize_expenses(&inputs).map_err(|e| e.to_string())?)
        }
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("failed to encode result: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/bucket", get(bucket_get_handler).post(bucket_post_handler))
        .route("/api/sip", get(sip_get_handler).post(sip_post_handler))
        .route("/api/fire", get(fire_get_handler).post(fire_post_handler))
        .route("/api/solve", post(solve_handler))
        .route("/api/milestones", post(milestones_handler))
        .route("/api/expenses", post(expenses_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("finplan HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/bucket");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn bucket_get_handler(Query(payload): Query<BucketPayload>) -> Response {
    bucket_handler_impl(payload)
}

async fn bucket_post_handler(Json(payload): Json<BucketPayload>) -> Response {
    bucket_handler_impl(payload)
}

fn bucket_handler_impl(payload: BucketPayload) -> Response {
    let mut args = BucketArgs::default();
    payload.apply(&mut args);
    respond(
        "/api/bucket",
        build_bucket_inputs(&args)
            .and_then(|inputs| simulate_bucket_strategy(&inputs).map_err(|e| e.to_string())),
    )
}

async fn sip_get_handler(Query(payload): Query<SipPayload>) -> Response {
    sip_handler_impl(payload)
}

async fn sip_post_handler(Json(payload): Json<SipPayload>) -> Response {
    sip_handler_impl(payload)
}

fn sip_handler_impl(payload: SipPayload) -> Response {
    let mut args = SipArgs::default();
    payload.apply(&mut args);
    respond(
        "/api/sip",
        build_sip_inputs(&args).and_then(|inputs| sip_growth(&inputs).map_err(|e| e.to_string())),
    )
}

async fn fire_get_handler(Query(payload): Query<FirePayload>) -> Response {
    fire_handler_impl(payload)
}

async fn fire_post_handler(Json(payload): Json<FirePayload>) -> Response {
    fire_handler_impl(payload)
}

fn fire_handler_impl(payload: FirePayload) -> Response {
    let mut args = FireArgs::default();
    payload.apply(&mut args);
    respond(
        "/api/fire",
        fire_horizon(&build_fire_inputs(&args)).map_err(|e| e.to_string()),
    )
}

async fn solve_handler(Json(payload): Json<SolvePayload>) -> Response {
    let mut args = SolveArgs::default();
    payload.apply(&mut args);
    respond(
        "/api/solve",
        build_solve_request(&args).and_then(|(inputs, config)| {
            solve_goal(&inputs, config).map_err(|e| e.to_string())
        }),
    )
}

async fn milestones_handler(Json(inputs): Json<MilestoneInputs>) -> Response {
    respond(
        "/api/milestones",
        milestone_plan(&inputs).map_err(|e| e.to_string()),
    )
}

async fn expenses_handler(Json(inputs): Json<ExpenseInputs>) -> Response {
    respond(
        "/api/expenses",
        summarize_expenses(&inputs).map_err(|e| e.to_string()),
    )
}

fn respond<T: Serialize>(route: &str, result: Result<T, String>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(msg) => {
            log::warn!("rejected {route} request: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
