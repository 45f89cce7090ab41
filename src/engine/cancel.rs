//! Cancellation token checked at every suspension point

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::errors::DomainError;

/// Owner side: flips the token once
#[derive(Clone, Debug)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observer side, cloned into every in-flight operation
#[derive(Clone, Debug)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> (CancelHandle, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx: Arc::new(tx) }, CancelToken { rx })
    }

    /// A token nobody can cancel
    pub fn never() -> CancelToken {
        let (_tx, rx) = watch::channel(false);
        CancelToken { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    pub fn check(&self) -> Result<(), DomainError> {
        if self.is_cancelled() {
            Err(DomainError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves once the token is cancelled; never if the handle is gone
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let (handle, token) = CancelToken::new();
        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.cancelled().await }
        });

        assert!(!token.is_cancelled());
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(DomainError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_token_stays_pending() {
        let token = CancelToken::never();
        let result = tokio::time::timeout(Duration::from_secs(60), token.cancelled()).await;
        assert!(result.is_err());
        assert!(token.check().is_ok());
    }
}
