//! Self-healing cache client.
//!
//! Each [`CacheClient`] owns one background driver task. The driver holds the
//! connection, performs the readiness check, reconnects with linear capped
//! backoff, and drains the offline queue in submission order. Callers only
//! enqueue commands and await their replies.
//!
//! A queued command survives at most `max_retries_per_request` failed
//! (re)connection attempts before it fails with
//! [`CacheError::RetriesExhausted`], so no caller waits forever.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use redis::{Cmd, Value};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{oneshot, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use super::connection::{CacheConnection, CacheConnector};
use super::error::{CacheError, CacheResult};
use super::events::{CacheEvent, ConnectionStatus};
use crate::config::CacheConfig;
use crate::infra::observer::Listeners;

struct Request {
    cmd: Cmd,
    attempts: u32,
    reply: oneshot::Sender<CacheResult<Value>>,
}

#[derive(Default)]
struct Queue {
    items: VecDeque<Request>,
    /// No new commands are accepted; queued ones still run
    closing: bool,
}

enum Next {
    Run(Request),
    Wait,
    Shutdown,
}

enum Served {
    Shutdown,
    Lost(CacheError),
}

struct Shared {
    config: CacheConfig,
    status: watch::Sender<ConnectionStatus>,
    retries: AtomicU32,
    queue: Mutex<Queue>,
    queue_signal: Notify,
    shutdown_signal: Notify,
    listeners: Listeners<CacheEvent>,
}

/// Handle to one logical cache connection.
pub struct CacheClient {
    id: u64,
    shared: Arc<Shared>,
    driver: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl CacheClient {
    /// Create the client and start connecting in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(
        id: u64,
        config: CacheConfig,
        connector: Arc<dyn CacheConnector>,
        listeners: Listeners<CacheEvent>,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Connecting);
        let shared = Arc::new(Shared {
            config,
            status,
            retries: AtomicU32::new(0),
            queue: Mutex::new(Queue::default()),
            queue_signal: Notify::new(),
            shutdown_signal: Notify::new(),
            listeners,
        });

        let driver = tokio::spawn(drive(shared.clone(), connector));

        Self {
            id,
            shared,
            driver: tokio::sync::Mutex::new(Some(driver)),
        }
    }

    /// Identifier, unique per manager
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current tracked status
    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    /// Reconnect attempts since the last time the client was ready.
    pub fn retry_count(&self) -> u32 {
        self.shared.retries.load(Ordering::SeqCst)
    }

    /// True once shutdown started or the client gave up reconnecting.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closing()
    }

    /// Number of commands waiting for the connection.
    pub fn queued(&self) -> usize {
        self.shared.lock_queue().items.len()
    }

    /// Execute a raw command.
    ///
    /// While the connection is not ready the command is buffered (when the
    /// offline queue is enabled, up to its capacity) and replayed once the
    /// client is ready. A command that times out fails on its own; only
    /// socket-level errors drop the connection.
    pub async fn query(&self, cmd: Cmd) -> CacheResult<Value> {
        let (reply, response) = oneshot::channel();
        {
            let mut queue = self.shared.lock_queue();
            if queue.closing {
                return Err(CacheError::Closed);
            }
            if self.status() != ConnectionStatus::Ready {
                if !self.shared.config.offline_queue {
                    return Err(CacheError::NotReady);
                }
                if queue.items.len() >= self.shared.config.offline_queue_capacity {
                    return Err(CacheError::QueueFull(queue.items.len()));
                }
            }
            queue.items.push_back(Request {
                cmd,
                attempts: 0,
                reply,
            });
        }
        self.shared.queue_signal.notify_one();

        response.await.unwrap_or_else(|_| Err(CacheError::Closed))
    }

    /// Liveness round-trip.
    pub async fn ping(&self) -> CacheResult<()> {
        let reply = self.query(redis::cmd("PING")).await?;
        expect_pong(&reply)
    }

    /// Get a JSON value.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        let value = self.query(cmd).await?;

        let raw: Option<String> =
            redis::from_redis_value(&value).map_err(|e| CacheError::Decode(e.to_string()))?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Set a JSON value with a TTL in seconds.
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> CacheResult<()> {
        let json = serde_json::to_string(value)?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(json).arg("EX").arg(ttl_seconds);
        self.query(cmd).await?;
        Ok(())
    }

    /// Delete a key. Returns whether it existed.
    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        let value = self.query(cmd).await?;
        let removed: i64 =
            redis::from_redis_value(&value).map_err(|e| CacheError::Decode(e.to_string()))?;
        Ok(removed > 0)
    }

    /// Graceful shutdown: stop accepting commands, let queued ones finish,
    /// then close the connection and wait for the driver to exit.
    pub async fn shutdown(&self) {
        self.shared.begin_close();

        let driver = self.driver.lock().await.take();
        if let Some(driver) = driver {
            if let Err(e) = driver.await {
                tracing::warn!(client = self.id, error = %e, "Cache driver ended abnormally");
            }
        }
    }
}

impl Drop for CacheClient {
    fn drop(&mut self) {
        self.shared.begin_close();
    }
}

impl Shared {
    fn lock_queue(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_closing(&self) -> bool {
        self.lock_queue().closing
    }

    fn begin_close(&self) {
        self.lock_queue().closing = true;
        self.shutdown_signal.notify_one();
    }

    fn transition(&self, event: CacheEvent) {
        self.status.send_replace(event.status());
        self.listeners.emit(&event);
    }

    fn next_request(&self) -> Next {
        let mut queue = self.lock_queue();
        match queue.items.pop_front() {
            Some(request) => Next::Run(request),
            None if queue.closing => Next::Shutdown,
            None => Next::Wait,
        }
    }

    /// Put an interrupted command back at the head of the queue, or fail it
    /// once it has used up its retries.
    fn requeue_front(&self, mut request: Request) {
        request.attempts += 1;
        if request.attempts > self.config.max_retries_per_request {
            let _ = request.reply.send(Err(CacheError::RetriesExhausted(
                self.config.max_retries_per_request,
            )));
            return;
        }
        self.lock_queue().items.push_front(request);
    }

    /// Count one failed connection attempt against every queued command.
    fn age_queued(&self) {
        let limit = self.config.max_retries_per_request;
        let expired: Vec<Request> = {
            let mut queue = self.lock_queue();
            let mut kept = VecDeque::with_capacity(queue.items.len());
            let mut expired = Vec::new();
            for mut request in queue.items.drain(..) {
                request.attempts += 1;
                if request.attempts > limit {
                    expired.push(request);
                } else {
                    kept.push_back(request);
                }
            }
            queue.items = kept;
            expired
        };

        if !expired.is_empty() {
            tracing::warn!(
                failed = expired.len(),
                limit,
                "Failing queued cache commands after reconnect attempts"
            );
        }
        for request in expired {
            let _ = request.reply.send(Err(CacheError::RetriesExhausted(limit)));
        }
    }

    /// Stop for good: reject new work, fail whatever is still queued.
    fn finish(&self, status: ConnectionStatus, error: CacheError) {
        let pending: Vec<Request> = {
            let mut queue = self.lock_queue();
            queue.closing = true;
            queue.items.drain(..).collect()
        };
        for request in pending {
            let _ = request.reply.send(Err(error.clone()));
        }
        self.status.send_replace(status);
        self.listeners.emit(&CacheEvent::End);
    }

    async fn establish(
        &self,
        connector: &dyn CacheConnector,
    ) -> CacheResult<Box<dyn CacheConnection>> {
        let mut connection = connector.connect().await?;
        self.transition(CacheEvent::Connect);

        if self.config.ready_check {
            let reply = timeout(
                self.config.command_timeout(),
                connection.execute(&redis::cmd("PING")),
            )
            .await
            .map_err(|_| CacheError::Timeout)??;
            expect_pong(&reply)?;
        }

        Ok(connection)
    }

    async fn serve(&self, connection: &mut Box<dyn CacheConnection>) -> Served {
        loop {
            match self.next_request() {
                Next::Run(request) => {
                    let pending = connection.execute(&request.cmd);
                    let result = match timeout(self.config.command_timeout(), pending).await {
                        Ok(result) => result,
                        Err(_) => {
                            tracing::warn!(
                                timeout_ms = self.config.command_timeout_ms,
                                "Cache command timed out"
                            );
                            Err(CacheError::Timeout)
                        }
                    };

                    match result {
                        Err(e) if e.is_connection_error() => {
                            self.requeue_front(request);
                            return Served::Lost(e);
                        }
                        result => {
                            let _ = request.reply.send(result);
                        }
                    }
                }
                Next::Wait => {
                    tokio::select! {
                        _ = self.queue_signal.notified() => {}
                        _ = self.shutdown_signal.notified() => {}
                    }
                }
                Next::Shutdown => {
                    let quit = timeout(
                        self.config.command_timeout(),
                        connection.execute(&redis::cmd("QUIT")),
                    )
                    .await;
                    if !matches!(quit, Ok(Ok(_))) {
                        tracing::debug!("QUIT not acknowledged during shutdown");
                    }
                    return Served::Shutdown;
                }
            }
        }
    }
}

async fn drive(shared: Arc<Shared>, connector: Arc<dyn CacheConnector>) {
    let mut attempt: u32 = 0;

    loop {
        if shared.is_closing() {
            shared.transition(CacheEvent::Close);
            shared.finish(ConnectionStatus::Closed, CacheError::Closed);
            return;
        }

        let established = tokio::select! {
            result = shared.establish(connector.as_ref()) => Some(result),
            _ = shared.shutdown_signal.notified() => None,
        };
        let Some(established) = established else {
            continue;
        };

        let failure = match established {
            Ok(mut connection) => {
                attempt = 0;
                shared.retries.store(0, Ordering::SeqCst);
                shared.transition(CacheEvent::Ready);

                match shared.serve(&mut connection).await {
                    Served::Shutdown => {
                        shared.transition(CacheEvent::Close);
                        shared.finish(ConnectionStatus::Closed, CacheError::Closed);
                        return;
                    }
                    Served::Lost(error) => {
                        shared.transition(CacheEvent::Error {
                            message: error.to_string(),
                        });
                        shared.transition(CacheEvent::Close);
                        error
                    }
                }
            }
            Err(error) => {
                shared.transition(CacheEvent::Error {
                    message: error.to_string(),
                });
                shared.age_queued();
                error
            }
        };

        if !shared.config.reconnect_on_error {
            shared.finish(ConnectionStatus::Error, failure);
            return;
        }

        attempt = attempt.saturating_add(1);
        shared.retries.store(attempt, Ordering::SeqCst);
        let delay = shared.config.reconnect_delay(attempt);
        shared.transition(CacheEvent::Reconnecting { attempt, delay });

        tokio::select! {
            _ = sleep(delay) => {}
            _ = shared.shutdown_signal.notified() => {}
        }
    }
}

fn expect_pong(reply: &Value) -> CacheResult<()> {
    match redis::from_redis_value::<String>(reply) {
        Ok(pong) if pong.eq_ignore_ascii_case("PONG") => Ok(()),
        _ => Err(CacheError::Decode(format!("unexpected PING reply: {:?}", reply))),
    }
}
