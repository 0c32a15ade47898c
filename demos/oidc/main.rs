//  MAIN.rs
//    by Lut99
//
//  Created:
//    20 Jan 2025, 11:31:40
//  Last edited:
//    18 Feb 2025, 16:01:27
//  Auto updated?
//    Yes
//
//  Description:
//!   Shows an example server that authenticates requests against an OIDC
//!   issuer.
//

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Json, Router};
use clap::Parser;
use error_trace::trace;
use request_authn::auth::oidc::{self, OidcConfig};
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

    /// The URL of the OIDC issuer to accept tokens from.
    #[clap(short, long)]
    issuer_url: String,
    /// The OAuth2 client ID that accepted tokens must be minted for.
    #[clap(short, long)]
    client_id:  String,
    /// The path to the PEM file with root certificates to trust when calling the issuer.
    #[clap(long, default_value = "/etc/ssl/certs/ca-certificates.crt")]
    ca: PathBuf,

    /// The claim to read usernames from.
    #[clap(long, default_value = "sub")]
    username_claim:  String,
    /// The prefix to put before every username.
    #[clap(long, default_value = "oidc:")]
    username_prefix: String,
    /// The claim to read group memberships from. Empty disables group resolution.
    #[clap(long, default_value = "groups")]
    groups_claim:    String,
    /// The prefix to put before every group.
    #[clap(long, default_value = "oidc:")]
    groups_prefix:   String,

    /// The JWT signing algorithms to accept. Give multiple times for multiple algorithms; give
    /// none to accept RS256.
    #[clap(long = "signing-alg")]
    signing_algs: Vec<String>,
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

    // Setup the auth
    let config = OidcConfig {
        issuer_url: args.issuer_url,
        client_id: args.client_id,
        ca_file: args.ca,
        username_claim: args.username_claim,
        username_prefix: args.username_prefix,
        groups_claim: args.groups_claim,
        groups_prefix: args.groups_prefix,
        supported_signing_algs: args.signing_algs,
    };
    let auth = match oidc::new_authenticator(&config).await {
        Ok(auth) => auth,
        Err(err) => {
            error!("{}", trace!(("Failed to setup OIDC authentication for issuer {:?}", config.issuer_url), err));
            std::process::exit(1);
        },
    };

    // Hang the middleware before the routes
    let app = Router::new()
        .route("/whoami", get(whoami))
        .layer(axum::middleware::from_fn_with_state(Arc::new(AuthMiddleware::new(auth)), AuthMiddleware::<oidc::OidcAuthenticator>::check));

    // OK, run the server
    let listener = match TcpListener::bind(args.address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("{}", trace!(("Failed to bind server on {}", args.address), err));
            std::process::exit(1);
        },
    };
    info!("Now serving at {}; call '/whoami' with an 'Authorization: Bearer <token>' header", args.address);
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
