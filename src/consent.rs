//! Request/response bridge between the provisioning flow and a consent surface.
//!
//! The surface receives [`ConsentRequest`]s on a channel and answers each
//! through its one-shot reply sender. At most one request per [`ConsentKind`] may be in flight;
//! a second one fails with [`ConsentError::AlreadyPending`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::ports::consent::{
    CapabilityGrant, ConsentError, ConsentFuture, ConsentGateway, ConsentKind, DirectoryGrant,
};

/// A consent request delivered to the surface.
#[derive(Debug)]
pub enum ConsentRequest {
    /// Ask for shared-storage read access.
    StorageCapability {
        /// Request id, unique per broker.
        id: u64,
        /// Reply slot.
        reply: oneshot::Sender<CapabilityGrant>,
    },
    /// Ask the user to choose a directory.
    DirectoryGrant {
        /// Request id, unique per broker.
        id: u64,
        /// Reply slot.
        reply: oneshot::Sender<DirectoryGrant>,
    },
}

impl ConsentRequest {
    /// The request id.
    #[must_use]
    pub fn id(&self) -> u64 {
        match self {
            Self::StorageCapability { id, .. } | Self::DirectoryGrant { id, .. } => *id,
        }
    }

    /// The kind of consent asked for.
    #[must_use]
    pub fn kind(&self) -> ConsentKind {
        match self {
            Self::StorageCapability { .. } => ConsentKind::StorageCapability,
            Self::DirectoryGrant { .. } => ConsentKind::DirectoryGrant,
        }
    }
}

/// [`ConsentGateway`] that forwards requests to a surface over a channel.
pub struct ConsentBroker {
    requests: mpsc::UnboundedSender<ConsentRequest>,
    pending: Mutex<HashMap<ConsentKind, u64>>,
    next_id: AtomicU64,
}

impl ConsentBroker {
    /// Creates a broker and the receiver the surface should drain.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ConsentRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let broker =
            Self { requests: tx, pending: Mutex::new(HashMap::new()), next_id: AtomicU64::new(1) };
        (broker, rx)
    }

    fn begin(&self, kind: ConsentKind) -> Result<PendingSlot<'_>, ConsentError> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&existing) = pending.get(&kind) {
            return Err(ConsentError::AlreadyPending(kind, existing));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        pending.insert(kind, id);
        debug!(request_id = id, ?kind, "consent request opened");
        Ok(PendingSlot { broker: self, kind, id })
    }
}

/// Clears the in-flight marker for a kind when the request resolves or is dropped.
struct PendingSlot<'a> {
    broker: &'a ConsentBroker,
    kind: ConsentKind,
    id: u64,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        let mut pending = self.broker.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.get(&self.kind) == Some(&self.id) {
            pending.remove(&self.kind);
        }
        debug!(request_id = self.id, kind = ?self.kind, "consent request closed");
    }
}

impl ConsentGateway for ConsentBroker {
    fn request_storage_capability(&self) -> ConsentFuture<'_, CapabilityGrant> {
        Box::pin(async move {
            let slot = self.begin(ConsentKind::StorageCapability)?;
            let (reply, answer) = oneshot::channel();
            self.requests
                .send(ConsentRequest::StorageCapability { id: slot.id, reply })
                .map_err(|_| ConsentError::Unavailable)?;
            answer.await.map_err(|_| ConsentError::Abandoned(slot.id))
        })
    }

    fn request_directory_grant(&self) -> ConsentFuture<'_, DirectoryGrant> {
        Box::pin(async move {
            let slot = self.begin(ConsentKind::DirectoryGrant)?;
            let (reply, answer) = oneshot::channel();
            self.requests
                .send(ConsentRequest::DirectoryGrant { id: slot.id, reply })
                .map_err(|_| ConsentError::Unavailable)?;
            answer.await.map_err(|_| ConsentError::Abandoned(slot.id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn surface_answer_resolves_request() {
        let (broker, mut rx) = ConsentBroker::new();
        let surface = tokio::spawn(async move {
            match rx.recv().await {
                Some(ConsentRequest::StorageCapability { reply, .. }) => {
                    let _ = reply.send(CapabilityGrant::Granted);
                }
                other => panic!("unexpected request: {other:?}"),
            }
        });

        let grant = broker.request_storage_capability().await;
        assert_eq!(grant, Ok(CapabilityGrant::Granted));
        surface.await.unwrap();
    }

    #[tokio::test]
    async fn second_request_of_same_kind_fails_loudly() {
        let (broker, mut rx) = ConsentBroker::new();

        let first = broker.request_directory_grant();
        let second = broker.request_directory_grant();

        let surface = async {
            let request = rx.recv().await.unwrap();
            assert_eq!(request.kind(), ConsentKind::DirectoryGrant);
            if let ConsentRequest::DirectoryGrant { reply, .. } = request {
                let _ = reply.send(DirectoryGrant::Granted("file:///tmp/ids".into()));
            }
        };

        let (first, second, ()) = tokio::join!(first, second, surface);
        assert_eq!(first, Ok(DirectoryGrant::Granted("file:///tmp/ids".into())));
        assert!(matches!(
            second,
            Err(ConsentError::AlreadyPending(ConsentKind::DirectoryGrant, _))
        ));
    }

    #[tokio::test]
    async fn different_kinds_may_be_pending_together() {
        let (broker, mut rx) = ConsentBroker::new();
        let surface = async {
            for _ in 0..2 {
                match rx.recv().await.unwrap() {
                    ConsentRequest::StorageCapability { reply, .. } => {
                        let _ = reply.send(CapabilityGrant::Denied);
                    }
                    ConsentRequest::DirectoryGrant { reply, .. } => {
                        let _ = reply.send(DirectoryGrant::Cancelled);
                    }
                }
            }
        };
        let (cap, dir, ()) = tokio::join!(
            broker.request_storage_capability(),
            broker.request_directory_grant(),
            surface
        );
        assert_eq!(cap, Ok(CapabilityGrant::Denied));
        assert_eq!(dir, Ok(DirectoryGrant::Cancelled));
    }

    #[tokio::test]
    async fn slot_is_released_after_resolution() {
        let (broker, mut rx) = ConsentBroker::new();
        for expected in [CapabilityGrant::Denied, CapabilityGrant::Granted] {
            let surface = async {
                if let Some(ConsentRequest::StorageCapability { reply, .. }) = rx.recv().await {
                    let _ = reply.send(expected);
                }
            };
            let (grant, ()) = tokio::join!(broker.request_storage_capability(), surface);
            assert_eq!(grant, Ok(expected));
        }
    }

    #[tokio::test]
    async fn dropped_reply_is_abandoned() {
        let (broker, mut rx) = ConsentBroker::new();
        let surface = async {
            let request = rx.recv().await.unwrap();
            drop(request);
        };
        let (grant, ()) = tokio::join!(broker.request_storage_capability(), surface);
        assert!(matches!(grant, Err(ConsentError::Abandoned(_))));
    }

    #[tokio::test]
    async fn missing_surface_is_unavailable() {
        let (broker, rx) = ConsentBroker::new();
        drop(rx);
        let grant = broker.request_directory_grant().await;
        assert_eq!(grant, Err(ConsentError::Unavailable));
    }

    #[test]
    fn request_ids_are_unique() {
        let (broker, _rx) = ConsentBroker::new();
        let a = broker.begin(ConsentKind::StorageCapability).unwrap().id;
        let b = broker.begin(ConsentKind::StorageCapability).unwrap().id;
        assert_ne!(a, b);
    }
}
