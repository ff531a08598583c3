//! A capacity-one error sink: the first node failure wins, later ones are
//! dropped on the floor (the execution is failing regardless of which error
//! is reported).

use tokio::sync::Mutex;
use weave_errors::WeaveError;

#[derive(Default)]
pub(crate) struct ErrorSink {
  slot: Mutex<Option<WeaveError>>,
}

impl ErrorSink {
  pub(crate) async fn set_first(&self, error: WeaveError) {
    let mut slot = self.slot.lock().await;
    if slot.is_none() {
      *slot = Some(error);
    }
  }

  pub(crate) async fn take(&self) -> Option<WeaveError> {
    self.slot.lock().await.clone()
  }
}
