//  MAIN.rs
//    by Lut99
//
//  Created:
//    20 Jan 2025, 11:28:04
//  Last edited:
//    18 Feb 2025, 15:55:30
//  Auto updated?
//    Yes
//
//  Description:
//!   Shows an example server that lets everybody in as the anonymous
//!   user.
//

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Json, Router};
use clap::Parser;
use error_trace::trace;
use request_authn::auth::anonymous::AnonymousResolver;
use request_authn::middleware::axum::AuthMiddleware;
use request_authn::spec::Identity;
use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{Level, debug, error, info, warn};


/***** ARGUMENTS *****/
/// Defines the arguments for this binary.
#[derive(Debug, Parser)]
struct Arguments {
    /// Whether to enable INFO- and DEBUG-level logging.
    #[clap(long)]
    debug: bool,
    /// Whether to enable TRACE-level logging. Implies '--debug'.
    #[clap(long)]
    trace: bool,

    /// The address/port on which to bind the server.
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    address: SocketAddr,
}





/***** HANDLERS *****/
/// Returns the identity that the middleware resolved for this request.
async fn whoami(Extension(identity): Extension<Identity>) -> Json<Identity> { Json(identity) }





/***** ENTRYPOINT *****/
#[tokio::main]
async fn main() {
    // Parse the arguments
    let args = Arguments::parse();

    // Setup the logger
    tracing_subscriber::fmt()
        .with_max_level(if args.trace {
            Level::TRACE
        } else if args.debug {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .init();
    info!("{} - v{}", env!("CARGO_BIN_NAME"), env!("CARGO_PKG_VERSION"));

    // Hang the middleware before the routes
    let app = Router::new()
        .route("/whoami", get(whoami))
        .layer(axum::middleware::from_fn_with_state(Arc::new(AuthMiddleware::new(AnonymousResolver::new())), AuthMiddleware::<AnonymousResolver>::check));

    // OK, run the server
    let listener = match TcpListener::bind(args.address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("{}", trace!(("Failed to bind server on {}", args.address), err));
            std::process::exit(1);
        },
    };
    info!("Now serving at {}; call '/whoami' to see who you are", args.address);
    tokio::select! {
        res = async { axum::serve(listener, app).await } => match res {
            Ok(_) => info!("Done"),
            Err(err) => {
                error!("{}", trace!(("Failed to serve the server"), err));
                std::process::exit(1);
            },
        },

        _ = async move {
            match signal(SignalKind::interrupt()) {
                Ok(mut sign) => sign.recv().await,
                Err(err) => {
                    warn!("{}", trace!(("Failed to register SIGINT signal handler"), err));
                    warn!("Graceful shutdown by Ctrl+C disabled");
                    None
                },
            }
        } => {
            debug!("Received SIGINT");
        },
        _ = async move {
            match signal(SignalKind::terminate()) {
                Ok(mut sign) => sign.recv().await,
                Err(err) => {
                    warn!("{}", trace!(("Failed to register SIGTERM signal handler"), err));
                    warn!("Graceful shutdown by Docker disabled");
                    None
                },
            }
        } => {
            debug!("Received SIGTERM");
        },
    }
}
