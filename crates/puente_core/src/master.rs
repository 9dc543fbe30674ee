//! Master process: binds the listening socket and fans incoming
//! connections out to per-connection worker tasks.

use std::sync::Arc;

use puente_config::PuenteConfig;
use tokio::{net::TcpListener, sync::Semaphore};
use tracing::{debug, error, info, instrument};

use crate::worker::handle_connection;

pub struct Master {
    listen_addr: String,
    cfg: Arc<PuenteConfig>,
}

impl Master {
    pub fn new(listen_addr: String, cfg: PuenteConfig) -> Self {
        Self {
            listen_addr,
            cfg: Arc::new(cfg),
        }
    }

    /// Starts the master process: binds the listener and runs the accept loop.
    #[instrument(skip(self), fields(listen = %self.listen_addr))]
    pub async fn run(self) -> anyhow::Result<()> {
        info!(target: "puente::master", "Starting PUENTE MASTER");

        // Global limit for concurrent connections across the entire process
        let max_conns = self.cfg.limits().max_connections();

        // We initialize the semaphore with the maximum number of configured connections
        let semaphore = Arc::new(Semaphore::new(max_conns));

        info!(
            target: "puente::master",
            max_conns,
            connect_timeout_secs = self.cfg.limits().connect_timeout_secs,
            "Global connection semaphore initialized"
        );

        info!(
            target: "puente::master",
            listen = %self.listen_addr,
            "Creating Tokio listener"
        );

        let listener = match TcpListener::bind(&self.listen_addr).await {
            Ok(l) => {
                info!(
                    target: "puente::master",
                    listen = %self.listen_addr,
                    "Bind() successful"
                );
                l
            }
            Err(e) => {
                error!(
                    target: "puente::master",
                    listen = %self.listen_addr,
                    error = ?e,
                    "Failed to bind listener"
                );
                return Err(e.into());
            }
        };

        accept_loop(listener, self.listen_addr, semaphore, self.cfg).await
    }
}

#[instrument(
    skip(listener, semaphore, cfg),
    fields(
        listen = %listen_addr,
        max_permits = semaphore.available_permits(),
    )
)]
async fn accept_loop(
    listener: TcpListener,
    listen_addr: String,
    semaphore: Arc<Semaphore>,
    cfg: Arc<PuenteConfig>,
) -> anyhow::Result<()> {
    info!(
        target: "puente::master",
        listen = %listen_addr,
        "accept_loop started for listening socket"
    );

    loop {
        // Wait for a new incoming connection
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                error!(
                    target: "puente::master",
                    listen = %listen_addr,
                    error = ?e,
                    "Failed to accept connection"
                );
                return Err(e.into());
            }
        };

        // Permits must be acquired via Semaphore::acquire_owned to be movable across the task boundary
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(p) => p,
            Err(e) => {
                error!(
                    target: "puente::master",
                    listen = %listen_addr,
                    error = ?e,
                    "Failed to acquire connection permit"
                );
                return Err(e.into());
            }
        };

        // Returns the current number of available permits
        let in_flight = semaphore.available_permits();

        debug!(
            target: "puente::master",
            listen = %listen_addr,
            client_addr = %addr,
            in_flight = in_flight,
            "New connection accepted"
        );

        let cfg_clone = cfg.clone();
        let listen_for_span = listen_addr.clone();

        tokio::spawn(async move {
            let span = tracing::info_span!(
                "worker_connection",
                client_addr = %addr,
                listen = %listen_for_span,
            );
            let _enter = span.enter();

            debug!(
                target: "puente::worker",
                "Worker spawned for incoming connection"
            );

            if let Err(e) = handle_connection(Box::new(stream), addr, cfg_clone).await {
                error!(
                    target: "puente::worker",
                    client_addr = %addr,
                    error = ?e,
                    "Error while handling connection"
                );
            } else {
                debug!(
                    target: "puente::worker",
                    client_addr = %addr,
                    "Connection handled successfully"
                );
            }

            drop(permit);

            debug!(
                target: "puente::master",
                client_addr = %addr,
                "Permit released after connection closed"
            );
        });
    }
}
