use log::*;
use order_engine::{ChainClient, OrderManagement, PaymentWatcher, WatcherConfig};
use tokio::{sync::watch, task::JoinHandle};

use crate::errors::ServerError;

/// A handle to the payment watcher running in the background.
pub struct PaymentWorker {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl PaymentWorker {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Asks the watcher to stop and waits for it. A tick in progress is allowed to finish first.
    pub async fn stop(self) -> Result<(), ServerError> {
        info!("🕰️ Stopping the payment watcher");
        // If the watcher has already exited there is no receiver, and that is fine.
        let _ = self.shutdown.send(true);
        self.handle.await.map_err(|e| ServerError::TaskError(format!("The payment watcher task panicked. {e}")))
    }
}

/// Starts the payment watcher on the tokio runtime. It runs until [`PaymentWorker::stop`] is called.
pub fn start_payment_worker<B, C>(db: B, chain: C, config: WatcherConfig) -> PaymentWorker
where
    B: OrderManagement,
    C: ChainClient,
{
    let (shutdown, rx) = watch::channel(false);
    let watcher = PaymentWatcher::new(db, chain, config);
    let handle = tokio::spawn(watcher.run(rx));
    info!("🕰️ Payment watcher worker started");
    PaymentWorker { handle, shutdown }
}
