//! # Delivery Notification Scheduler
//!
//! Every placed order with a push subscription gets one detached task that walks
//! through the delivery stages:
//!
//! ```text
//! Scheduled -> WaitingPreparation -> NotifiedDispatch -> WaitingDelivery -> NotifiedDelivery -> Done
//! ```
//!
//! The tasks are owned by a [`NotificationSupervisor`] running in its own Tokio task.
//! Callers talk to it through the cloneable [`NotificationScheduler`] handle:
//! [`schedule`](NotificationScheduler::schedule) never waits, and
//! [`drain`](NotificationScheduler::drain) resolves once nothing is in flight.
//!
//! Failed sends are logged and the sequence moves on. Nothing is retried,
//! nothing is persisted, and there is no cap on how many sequences may be
//! waiting at once; `in_flight()` reports the current count. Finished reports
//! are kept for `drain()` only up to [`RETAINED_REPORTS`]; older ones are dropped.

use crate::model::{NotificationSubscription, OrderId};
use crate::notify::{PushError, PushPayload, PushTransport};
use crate::status::DeliveryDurations;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

pub const DISPATCHED_MESSAGE: &str = "Your order has been dispatched!";
pub const DELIVERED_MESSAGE: &str = "Your order is now delivered. Enjoy!";

/// Finished reports held for the next `drain()`; the oldest is dropped beyond this.
pub const RETAINED_REPORTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStage {
    Scheduled,
    WaitingPreparation,
    NotifiedDispatch,
    WaitingDelivery,
    NotifiedDelivery,
    Done,
}

impl NotificationStage {
    /// The stage that follows this one; `None` after `Done`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Scheduled => Some(Self::WaitingPreparation),
            Self::WaitingPreparation => Some(Self::NotifiedDispatch),
            Self::NotifiedDispatch => Some(Self::WaitingDelivery),
            Self::WaitingDelivery => Some(Self::NotifiedDelivery),
            Self::NotifiedDelivery => Some(Self::Done),
            Self::Done => None,
        }
    }
}

/// One order's notification sequence, ready to run.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub order_id: OrderId,
    pub subscription: NotificationSubscription,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Sent,
    Failed(String),
}

/// What happened to one finished sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationReport {
    pub order_id: OrderId,
    pub stages: Vec<NotificationStage>,
    pub dispatch: Option<SendOutcome>,
    pub delivery: Option<SendOutcome>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchedulerError {
    #[error("Notification supervisor is not running")]
    Closed,
}

enum SchedulerCommand {
    Track(NotificationJob),
    Drain {
        respond_to: oneshot::Sender<Vec<NotificationReport>>,
    },
}

/// Handle for submitting notification sequences.
#[derive(Clone)]
pub struct NotificationScheduler {
    sender: mpsc::UnboundedSender<SchedulerCommand>,
    in_flight: watch::Receiver<usize>,
}

impl NotificationScheduler {
    /// Creates the supervisor and its handle. The supervisor must be spawned with `.run()`.
    pub fn new(transport: Arc<dyn PushTransport>, durations: DeliveryDurations) -> (NotificationSupervisor, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (in_flight_tx, in_flight) = watch::channel(0);
        let supervisor = NotificationSupervisor {
            receiver,
            transport,
            durations,
            in_flight: in_flight_tx,
        };
        (supervisor, Self { sender, in_flight })
    }

    /// Hands a sequence to the supervisor and returns immediately.
    pub fn schedule(&self, job: NotificationJob) -> Result<(), SchedulerError> {
        self.sender
            .send(SchedulerCommand::Track(job))
            .map_err(|_| SchedulerError::Closed)
    }

    /// Number of sequences currently waiting or sending.
    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Waits until no sequence is in flight and returns the reports completed
    /// since the previous drain, at most [`RETAINED_REPORTS`] of them.
    pub async fn drain(&self) -> Result<Vec<NotificationReport>, SchedulerError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::Drain { respond_to })
            .map_err(|_| SchedulerError::Closed)?;
        response.await.map_err(|_| SchedulerError::Closed)
    }
}

/// Owns every running notification sequence.
pub struct NotificationSupervisor {
    receiver: mpsc::UnboundedReceiver<SchedulerCommand>,
    transport: Arc<dyn PushTransport>,
    durations: DeliveryDurations,
    in_flight: watch::Sender<usize>,
}

impl NotificationSupervisor {
    /// Runs until every handle is dropped, then lets the sequences already in
    /// flight finish.
    pub async fn run(self) {
        let NotificationSupervisor {
            mut receiver,
            transport,
            durations,
            in_flight,
        } = self;
        let mut tasks: JoinSet<NotificationReport> = JoinSet::new();
        let mut completed: VecDeque<NotificationReport> = VecDeque::with_capacity(RETAINED_REPORTS);
        let mut waiters: Vec<oneshot::Sender<Vec<NotificationReport>>> = Vec::new();
        info!("Notification supervisor started");

        loop {
            tokio::select! {
                command = receiver.recv() => match command {
                    Some(SchedulerCommand::Track(job)) => {
                        let order_id = job.order_id;
                        tasks.spawn(run_sequence(job, transport.clone(), durations));
                        info!(%order_id, in_flight = tasks.len(), "Notification sequence scheduled");
                    }
                    Some(SchedulerCommand::Drain { respond_to }) => waiters.push(respond_to),
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => record(joined, &mut completed),
            }

            in_flight.send_replace(tasks.len());
            if tasks.is_empty() {
                release(&mut waiters, &mut completed);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            record(joined, &mut completed);
            in_flight.send_replace(tasks.len());
        }
        release(&mut waiters, &mut completed);
        info!(unreported = completed.len(), "Notification supervisor shutdown");
    }
}

fn record(joined: Result<NotificationReport, JoinError>, completed: &mut VecDeque<NotificationReport>) {
    match joined {
        Ok(report) => {
            debug!(order_id = %report.order_id, "Notification sequence finished");
            if completed.len() == RETAINED_REPORTS {
                if let Some(dropped) = completed.pop_front() {
                    debug!(order_id = %dropped.order_id, "Oldest undrained report dropped");
                }
            }
            completed.push_back(report);
        }
        Err(e) => error!(error = %e, "Notification sequence task failed"),
    }
}

fn release(waiters: &mut Vec<oneshot::Sender<Vec<NotificationReport>>>, completed: &mut VecDeque<NotificationReport>) {
    if waiters.is_empty() {
        return;
    }
    let reports: Vec<NotificationReport> = completed.drain(..).collect();
    for waiter in waiters.drain(..) {
        let _ = waiter.send(reports.clone());
    }
}

async fn run_sequence(
    job: NotificationJob,
    transport: Arc<dyn PushTransport>,
    durations: DeliveryDurations,
) -> NotificationReport {
    let mut report = NotificationReport {
        order_id: job.order_id,
        stages: vec![NotificationStage::Scheduled],
        dispatch: None,
        delivery: None,
    };

    let mut stage = NotificationStage::Scheduled;
    while let Some(next) = stage.next() {
        stage = next;
        report.stages.push(stage);
        debug!(order_id = %job.order_id, ?stage, "Notification stage");

        match stage {
            NotificationStage::WaitingPreparation => tokio::time::sleep(durations.preparation_timer()).await,
            NotificationStage::NotifiedDispatch => {
                report.dispatch = Some(send_stage(&job, transport.as_ref(), DISPATCHED_MESSAGE).await);
            }
            NotificationStage::WaitingDelivery => tokio::time::sleep(durations.delivery_timer()).await,
            NotificationStage::NotifiedDelivery => {
                report.delivery = Some(send_stage(&job, transport.as_ref(), DELIVERED_MESSAGE).await);
            }
            NotificationStage::Scheduled | NotificationStage::Done => {}
        }
    }

    report
}

async fn send_stage(job: &NotificationJob, transport: &dyn PushTransport, message: &str) -> SendOutcome {
    let payload = PushPayload {
        message: message.to_string(),
        url: format!("myorders/{}", job.order_id),
    };

    let result = match serde_json::to_vec(&payload) {
        Ok(bytes) => transport.send(&job.subscription.endpoint, &bytes).await,
        Err(e) => Err(PushError::Payload(e.to_string())),
    };

    match result {
        Ok(()) => {
            info!(order_id = %job.order_id, message, "Push notification sent");
            SendOutcome::Sent
        }
        Err(e) => {
            warn!(order_id = %job.order_id, error = %e, "Push notification failed");
            SendOutcome::Failed(e.to_string())
        }
    }
}
