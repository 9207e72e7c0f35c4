use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use std::sync::Arc;
use vnfmgr::web::models::VnfRequest;
use vnfmgr::{LoggingLifecycle, VnfFuture, VnfMgr, VnfMgrConfig, VnfOp};

const DEFAULT_COUNT: i64 = 10;

#[derive(Parser)]
#[command(name = "vnfctl")]
#[command(about = "Drive create/update/delete rounds against a VNF manager")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the lifecycle round against an in-process manager
    Local {
        #[arg(long, default_value_t = DEFAULT_COUNT, allow_negative_numbers = true)]
        count: i64,
    },
    /// Run the lifecycle round against a running vnfmgr server
    Rest {
        #[arg(long, default_value_t = DEFAULT_COUNT, allow_negative_numbers = true)]
        count: i64,
        #[arg(long, env = "VNFMGR_URL", default_value = "http://127.0.0.1:8081")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Local { count } => run_local(vnf_count(count)).await,
        Command::Rest { count, url } => run_rest(vnf_count(count), &url).await,
    }
}

fn vnf_count(requested: i64) -> usize {
    if requested <= 0 {
        DEFAULT_COUNT as usize
    } else {
        requested as usize
    }
}

fn vnf_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("vnf_{i}")).collect()
}

// ============================================================================
// In-process round
// ============================================================================

async fn run_local(count: usize) -> Result<()> {
    let mgr = VnfMgr::with_lifecycle(VnfMgrConfig::default(), Arc::new(LoggingLifecycle))
        .context("failed to start the VNF manager")?;
    let names = vnf_names(count);

    println!("Testing with {count} VNFs");

    report(mgr.create(&names, &names), "creating", "created").await;
    report(dispatch_all(&mgr, &names, VnfOp::Update), "updating", "updated").await;
    report(dispatch_all(&mgr, &names, VnfOp::Delete), "deleting", "deleted").await;
    // Every entity is gone, so this round reports NotFound.
    report(dispatch_all(&mgr, &names, VnfOp::Update), "updating", "updated").await;

    Ok(())
}

fn dispatch_all(mgr: &VnfMgr, names: &[String], op: VnfOp) -> Vec<VnfFuture> {
    names
        .iter()
        .map(|name| mgr.dispatch_op(name, op, name.as_str()))
        .collect()
}

async fn report(futures: Vec<VnfFuture>, doing: &str, done: &str) {
    for future in futures {
        let id = future.id().to_string();
        match future.get().await {
            Ok(()) => println!("VNF {id} {done} successfully"),
            Err(err) => println!("Error {err} while {doing} VNF {id}"),
        }
    }
}

// ============================================================================
// REST round
// ============================================================================

async fn run_rest(count: usize, url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let base = url.trim_end_matches('/');
    let names = vnf_names(count);

    println!("Testing with {count} VNFs against {base}");

    let creates = names.iter().enumerate().map(|(i, name)| {
        client
            .post(format!("{base}/vnf/{name}"))
            .json(&request(name, i))
            .send()
    });
    print_responses(join_all(creates).await).await;

    let updates = names.iter().enumerate().map(|(i, name)| {
        client
            .post(format!("{base}/vnf/update/{name}"))
            .json(&request(name, i))
            .send()
    });
    print_responses(join_all(updates).await).await;

    let listing = client
        .get(format!("{base}/vnfs"))
        .send()
        .await
        .context("failed to list VNFs")?
        .text()
        .await
        .context("failed to read VNF listing")?;
    println!("VNFs: {listing}");

    let deletes = names
        .iter()
        .map(|name| client.delete(format!("{base}/vnf/{name}")).send());
    print_responses(join_all(deletes).await).await;

    Ok(())
}

fn request(name: &str, index: usize) -> VnfRequest {
    VnfRequest {
        name: name.to_string(),
        args: format!("args_{index}"),
    }
}

async fn print_responses(responses: Vec<reqwest::Result<reqwest::Response>>) {
    for response in responses {
        match response {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(body) => println!("Got response {status} {body}"),
                    Err(err) => println!("{err}"),
                }
            }
            Err(err) => println!("{err}"),
        }
    }
}
