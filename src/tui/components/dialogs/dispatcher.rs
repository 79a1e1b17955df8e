//! Affinity thread for a host surface
//!
//! Each host owns one dispatcher: a dedicated OS thread running a
//! current-thread tokio runtime that executes posted jobs in order. Everything
//! that touches host state runs there, which is what serializes container
//! mutations without a lock around the whole show/hide sequence. Tasks spawned
//! from a job (animations) also run on this thread.

use super::types::{DialogError, DialogResult};
use std::fmt;
use std::thread::{self, ThreadId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Single-threaded job executor bound to one host
pub struct HostDispatcher {
    name: String,
    sender: mpsc::UnboundedSender<Job>,
    thread_id: ThreadId,
}

impl HostDispatcher {
    /// Start the dispatcher thread
    pub fn spawn(name: impl Into<String>) -> std::io::Result<Self> {
        let name = name.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let thread_name = format!("host-{}", name);
        let handle = thread::Builder::new().name(thread_name).spawn(move || {
            runtime.block_on(async move {
                while let Some(job) = receiver.recv().await {
                    job();
                }
            });
        })?;

        debug!("Started dispatcher for host '{}'", name);
        Ok(Self {
            name,
            sender,
            thread_id: handle.thread().id(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the caller is running on this dispatcher's thread
    pub fn is_host_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Queue a job without waiting for it
    pub fn post<F>(&self, job: F) -> DialogResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .send(Box::new(job))
            .map_err(|_| DialogError::HostUnavailable(self.name.clone()))
    }

    /// Run `f` on the host thread and return its result. When already on
    /// the host thread `f` runs synchronously.
    pub async fn invoke<T, F>(&self, f: F) -> DialogResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self.is_host_thread() {
            return Ok(f());
        }

        let (reply, result) = oneshot::channel();
        self.post(move || {
            let _ = reply.send(f());
        })?;
        result.await.map_err(|_| {
            error!("Host '{}' dropped a job before it ran", self.name);
            DialogError::HostUnavailable(self.name.clone())
        })
    }
}

impl fmt::Debug for HostDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostDispatcher")
            .field("name", &self.name)
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_invoke_runs_on_host_thread() {
        let dispatcher = Arc::new(HostDispatcher::spawn("test").unwrap());
        assert!(!dispatcher.is_host_thread());

        let d = dispatcher.clone();
        let on_host = dispatcher.invoke(move || d.is_host_thread()).await.unwrap();
        assert!(on_host);
    }

    #[tokio::test]
    async fn test_jobs_run_in_post_order() {
        let dispatcher = HostDispatcher::spawn("order").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let seen = seen.clone();
            dispatcher.post(move || seen.lock().unwrap().push(i)).unwrap();
        }
        let seen_at_end = {
            let seen = seen.clone();
            dispatcher.invoke(move || seen.lock().unwrap().clone()).await.unwrap()
        };
        assert_eq!(seen_at_end, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_nested_invoke_on_host_thread_is_synchronous() {
        let dispatcher = Arc::new(HostDispatcher::spawn("nested").unwrap());
        let d = dispatcher.clone();
        let value = dispatcher
            .invoke(move || {
                let inner = d.invoke(|| 21);
                futures::executor::block_on(inner).unwrap() * 2
            })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }
}
