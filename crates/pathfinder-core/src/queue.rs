//! Single-writer persistence queue.
//!
//! Every write to a session record is funneled through one background
//! worker that runs queued write operations strictly one at a time, in
//! submission order, across all sessions. Callers get a future that resolves
//! with the outcome of their own write once the worker reaches it. A failing
//! write is reported to its caller only; the worker moves on to the next
//! item.

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use log::{debug, info, warn};
use tokio::{
    sync::{mpsc, oneshot},
    task::{self, JoinHandle},
};

use crate::{
    db::Database,
    error::{PipelineError, Result},
    models::Session,
};

/// A write operation run by the queue worker against the database.
pub type WriteOp = Box<dyn FnOnce(&mut Database) -> Result<Session> + Send>;

struct WriteRequest {
    /// Session the write targets, for logging
    session_id: String,
    op: WriteOp,
    response_tx: oneshot::Sender<Result<Session>>,
}

/// FIFO queue serializing all session writes through a single worker.
///
/// Cloning the queue yields another handle to the same worker. The worker
/// shuts down once every handle is dropped and the backlog is drained.
#[derive(Clone)]
pub struct PersistenceQueue {
    tx: mpsc::UnboundedSender<WriteRequest>,
    pending: Arc<AtomicUsize>,
    _worker_handle: Arc<JoinHandle<()>>,
}

impl PersistenceQueue {
    /// Starts the worker for the database at `db_path`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(db_path: PathBuf) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteRequest>();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker_pending = Arc::clone(&pending);

        let worker_handle = tokio::spawn(async move {
            info!("Persistence queue worker started");
            let mut cached: Option<Database> = None;
            let mut write_count: u64 = 0;

            while let Some(request) = rx.recv().await {
                worker_pending.fetch_sub(1, Ordering::SeqCst);
                let WriteRequest {
                    session_id,
                    op,
                    response_tx,
                } = request;
                debug!("Processing write for session {session_id}");

                let path = db_path.clone();
                let connection = cached.take();
                let joined = task::spawn_blocking(move || {
                    let mut db = match connection {
                        Some(db) => db,
                        None => match Database::new(&path) {
                            Ok(db) => db,
                            Err(e) => return (None, Err(e)),
                        },
                    };
                    let result = op(&mut db);
                    (Some(db), result)
                })
                .await;

                let result = match joined {
                    Ok((connection, result)) => {
                        cached = connection;
                        result
                    }
                    Err(e) => Err(PipelineError::join(e)),
                };

                match &result {
                    Ok(_) => {
                        write_count += 1;
                        debug!("Completed write {write_count} for session {session_id}");
                    }
                    Err(e) => warn!("Write for session {session_id} failed: {e}"),
                }

                // The caller may have stopped waiting; that is not our concern
                let _ = response_tx.send(result);
            }

            info!("Persistence queue worker shutting down (processed {write_count} writes)");
        });

        Self {
            tx,
            pending,
            _worker_handle: Arc::new(worker_handle),
        }
    }

    /// Queues a write operation and returns a future for its outcome.
    ///
    /// The operation is submitted when this method is called, not when the
    /// future is first polled, so the call order is the execution order.
    pub fn enqueue<F>(
        &self,
        session_id: &str,
        op: F,
    ) -> impl Future<Output = Result<Session>> + Send + 'static + use<F>
    where
        F: FnOnce(&mut Database) -> Result<Session> + Send + 'static,
    {
        let (response_tx, response_rx) = oneshot::channel();
        let session_id = session_id.to_string();
        let request = WriteRequest {
            session_id: session_id.clone(),
            op: Box::new(op),
            response_tx,
        };

        self.pending.fetch_add(1, Ordering::SeqCst);
        let submitted = self.tx.send(request).is_ok();
        if !submitted {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }

        async move {
            if !submitted {
                return Err(PipelineError::Configuration {
                    message: format!(
                        "Persistence queue closed; write for session {session_id} dropped"
                    ),
                });
            }
            response_rx.await.map_err(|_| PipelineError::Configuration {
                message: format!("Persistence queue dropped the write for session {session_id}"),
            })?
        }
    }

    /// Number of writes waiting for the worker. An estimate under concurrency.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use jiff::Timestamp;
    use tempfile::TempDir;

    use super::*;

    fn seeded_queue(id: &str) -> (TempDir, PersistenceQueue, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("queue.db");
        let mut db = Database::new(&db_path).expect("Failed to open database");
        db.insert_session(&Session::new(id, "queue test", false, Timestamp::now()))
            .expect("Failed to insert session");
        let queue = PersistenceQueue::new(db_path.clone());
        (temp_dir, queue, db_path)
    }

    #[tokio::test]
    async fn test_writes_run_in_submission_order() {
        let (_temp_dir, queue, _) = seeded_queue("session_order");
        let order = Arc::new(Mutex::new(Vec::new()));

        let futures: Vec<_> = (0..10)
            .map(|i| {
                let order = Arc::clone(&order);
                queue.enqueue("session_order", move |db| {
                    order.lock().unwrap().push(i);
                    db.update_session("session_order", |s| {
                        s.metadata.error_count += 1;
                        Ok(())
                    })
                })
            })
            .collect();

        let results = join_in_order(futures).await;
        let counts: Vec<u32> = results
            .into_iter()
            .map(|r| r.expect("write failed").metadata.error_count)
            .collect();

        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
        assert_eq!(counts, (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_failed_write_does_not_halt_queue() {
        let (_temp_dir, queue, _) = seeded_queue("session_fail");

        let failed = queue
            .enqueue("session_fail", |_db| {
                Err(PipelineError::conflict("session_fail", "simulated store error"))
            })
            .await;
        assert!(matches!(failed, Err(PipelineError::Conflict { .. })));

        let next = queue
            .enqueue("session_fail", |db| {
                db.update_session("session_fail", |s| {
                    s.progress = 20;
                    Ok(())
                })
            })
            .await
            .expect("queue should keep running");
        assert_eq!(next.progress, 20);
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn test_panicking_write_is_isolated() {
        let (_temp_dir, queue, db_path) = seeded_queue("session_panic");

        let result = queue
            .enqueue("session_panic", |_db| panic!("boom"))
            .await;
        assert!(matches!(result, Err(PipelineError::Configuration { .. })));

        queue
            .enqueue("session_panic", |db| {
                db.update_session("session_panic", |s| s.cancel(Timestamp::now()))
            })
            .await
            .expect("queue should recover after a panicking write");

        let stored = Database::new(&db_path)
            .unwrap()
            .get_session("session_panic")
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, crate::models::SessionStatus::Cancelled);
    }

    /// Drives every future concurrently, keeping submission order.
    async fn join_in_order<F, T>(futures: Vec<F>) -> Vec<T>
    where
        F: std::future::Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let handles: Vec<_> = futures.into_iter().map(tokio::spawn).collect();
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            out.push(handle.await.expect("task panicked"));
        }
        out
    }
}
