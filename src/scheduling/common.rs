use tokio::sync::{mpsc, oneshot};

use crate::definition::DefinitionId;

#[derive(Debug)]
pub enum AlarmManagerMessage {
    /// Full rebuild: clear every timer and re-arm one per active definition.
    Refresh { ack: oneshot::Sender<bool> },
    /// Startup healing: arm only active definitions missing a timer.
    Reconcile { ack: oneshot::Sender<bool> },
    /// A timer task's delay elapsed.
    Fired(DefinitionId),
    /// Enumerate the ids of currently armed timers.
    ListArmed(oneshot::Sender<Vec<DefinitionId>>),
}

#[derive(Clone)]
pub struct AlarmManagerSender(mpsc::Sender<AlarmManagerMessage>);

impl AlarmManagerSender {
    pub fn new(inner: mpsc::Sender<AlarmManagerMessage>) -> Self {
        AlarmManagerSender(inner)
    }

    pub async fn refresh(&self) -> anyhow::Result<bool> {
        let (ack, acked) = oneshot::channel();
        self.0.send(AlarmManagerMessage::Refresh { ack }).await?;
        Ok(acked.await?)
    }

    pub async fn reconcile(&self) -> anyhow::Result<bool> {
        let (ack, acked) = oneshot::channel();
        self.0.send(AlarmManagerMessage::Reconcile { ack }).await?;
        Ok(acked.await?)
    }

    pub async fn armed_ids(&self) -> anyhow::Result<Vec<DefinitionId>> {
        let (reply, replied) = oneshot::channel();
        self.0.send(AlarmManagerMessage::ListArmed(reply)).await?;
        Ok(replied.await?)
    }

    pub(crate) async fn notify_fired(&self, id: DefinitionId) -> anyhow::Result<()> {
        self.0.send(AlarmManagerMessage::Fired(id)).await?;
        Ok(())
    }
}
