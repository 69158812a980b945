use std::pin::Pin;
use std::task::{Context, Poll};
use futures::Stream;
use tokio::sync::mpsc;
use crate::core::UploadEvent;

/// 上传事件流，上传任务结束后自动关闭
#[derive(Debug)]
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<UploadEvent>,
}

impl EventStream {
    pub fn new(receiver: mpsc::UnboundedReceiver<UploadEvent>) -> Self {
        Self { receiver }
    }

    pub fn channel() -> (mpsc::UnboundedSender<UploadEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx))
    }

    pub async fn recv(&mut self) -> Option<UploadEvent> {
        self.receiver.recv().await
    }
}

impl Stream for EventStream {
    type Item = UploadEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
