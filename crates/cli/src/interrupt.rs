use model::execution::summary::RunSummary;
use tokio::{signal, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Cancels `token` on the first SIGINT or SIGTERM.
///
/// Sheets still in flight are then recorded as cancelled and the annotated
/// workbook is still written. The task ends on its own once `token` is
/// cancelled by anyone else.
pub fn cancel_on_signal(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            name = next_signal() => {
                warn!(signal = name, "Cancelling remaining sheets");
                token.cancel();
            }
        }
    })
}

async fn next_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Could not listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Process exit status of the `check` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// The run finished but at least one sheet failed.
    SheetFailures = 2,
    Cancelled = 130, // Standard exit code for SIGINT
}

impl ExitCode {
    pub fn for_run(summary: &RunSummary, cancelled: bool) -> Self {
        if cancelled {
            ExitCode::Cancelled
        } else if summary.failures() > 0 {
            ExitCode::SheetFailures
        } else {
            ExitCode::Success
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
