use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tracker_logging::{tracker_debug, tracker_warn};

use crate::export::{export_result, ExportRequest};
use crate::poller::{Poller, Tagged};
use crate::service::{ReqwestService, ServiceSettings, TranslationService};
use crate::{EngineEvent, JobId, ServiceError, UploadRequest};

enum EngineCommand {
    Submit { ticket: u64, upload: UploadRequest },
    StartPolling { job_id: JobId, interval: Duration },
    StopPolling,
    Export { job_id: JobId, request: ExportRequest },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Front end of the IO worker. Commands are executed on a dedicated thread
/// that owns the tokio runtime and the poller; results come back as
/// [`EngineEvent`]s on the receiver returned by the constructor.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(
        service: Arc<dyn TranslationService>,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>), EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            let mut poller = Poller::new(runtime.handle().clone());
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Submit { ticket, upload } => {
                        let service = service.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let result = service.submit(&upload).await;
                            let _ = event_tx.send(EngineEvent::Submitted { ticket, result });
                        });
                    }
                    EngineCommand::StartPolling { job_id, interval } => {
                        let service = service.clone();
                        let event_tx = event_tx.clone();
                        poller.start(
                            job_id,
                            interval,
                            move |job_id: JobId| {
                                let service = service.clone();
                                async move { service.progress(&job_id).await }
                            },
                            move |Tagged { job_id, value }| {
                                let _ = event_tx.send(EngineEvent::Progress {
                                    job_id,
                                    result: value,
                                });
                            },
                        );
                    }
                    EngineCommand::StopPolling => poller.stop(),
                    EngineCommand::Export { job_id, request } => {
                        let service = service.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let result = export_result(service.as_ref(), &job_id, &request).await;
                            let _ = event_tx.send(EngineEvent::Exported { job_id, result });
                        });
                    }
                }
            }
            poller.stop();
            tracker_debug!("Engine command channel closed");
        });

        Ok((Self { cmd_tx }, event_rx))
    }

    pub fn from_settings(
        settings: ServiceSettings,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>), EngineError> {
        let service = ReqwestService::new(settings)?;
        Self::new(Arc::new(service))
    }

    pub fn submit(&self, ticket: u64, upload: UploadRequest) {
        self.send(EngineCommand::Submit { ticket, upload });
    }

    pub fn start_polling(&self, job_id: JobId, interval: Duration) {
        self.send(EngineCommand::StartPolling { job_id, interval });
    }

    pub fn stop_polling(&self) {
        self.send(EngineCommand::StopPolling);
    }

    pub fn export(&self, job_id: JobId, request: ExportRequest) {
        self.send(EngineCommand::Export { job_id, request });
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            tracker_warn!("Engine worker is gone; command dropped");
        }
    }
}
