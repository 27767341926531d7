//! # Run a single bounded store call.
//!
//! Every remote read and the single write go through [`call`]:
//! - **Execute once** (no retry; retry belongs to the admission caller)
//! - **Apply deadline** if configured (wraps the call in `tokio::time::timeout`)
//!
//! ```text
//! call(Some(d), fut) ─► tokio::time::timeout(d, fut)
//!                         ├─ Ok(r)    ─► r
//!                         └─ Elapsed  ─► Err(StoreError::Timeout { d })
//! call(None, fut)    ─► fut.await
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time;

use crate::error::StoreError;

/// Awaits `fut`, failing with [`StoreError::Timeout`] once `timeout` elapses.
pub(crate) async fn call<T, F>(timeout: Option<Duration>, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match timeout.filter(|d| *d > Duration::ZERO) {
        Some(dur) => match time::timeout(dur, fut).await {
            Ok(res) => res,
            Err(_elapsed) => Err(StoreError::Timeout { timeout: dur }),
        },
        None => fut.await,
    }
}
