use std::path::Path;
use std::sync::Arc;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::config::Config;
use crate::core::{
    ChunkInfo, ChunkProgress, ChunkRecord, ChunkSource, ChunkTransport, ChunkedConfig,
    CompletedUpload, ProgressCallback, Result, UploadError, UploadEvent, UploadResponse,
    UploadSession,
};
use crate::source::FileSource;
use crate::transport::HttpTransport;
use super::events::EventStream;

type Observer<'a> = dyn Fn(&UploadEvent) + Send + Sync + 'a;

/// 只把进度事件转发给回调
fn progress_observer(on_progress: Option<&ProgressCallback>) -> impl Fn(&UploadEvent) + Send + Sync + '_ {
    move |event: &UploadEvent| {
        if let (UploadEvent::Progress { progress, .. }, Some(callback)) = (event, on_progress) {
            callback(*progress);
        }
    }
}

/// 分片上传器
///
/// 逐个发送分片，收到应答后才读取下一片。任一分片失败即终止会话，不重试。
pub struct ChunkedUploader<T = HttpTransport> {
    transport: T,
    config: ChunkedConfig,
}

impl ChunkedUploader<HttpTransport> {
    pub fn new(server_url: &str, config: ChunkedConfig) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(server_url)?, config))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::with_transport(
            HttpTransport::from_config(config)?,
            config.chunked_config(),
        ))
    }
}

impl<T: ChunkTransport> ChunkedUploader<T> {
    pub fn with_transport(transport: T, config: ChunkedConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ChunkedConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 上传数据源，返回接收端的最终对象
    ///
    /// 接收端从未返回 `complete: true` 时得到 `Ok(None)`
    pub async fn upload<S>(
        &self,
        source: &S,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Option<CompletedUpload>>
    where
        S: ChunkSource + ?Sized,
    {
        let observer = progress_observer(on_progress);
        self.run(source, &observer).await
    }

    /// 同 [`upload`](Self::upload)，未完成的会话返回 [`UploadError::Incomplete`]
    pub async fn upload_strict<S>(
        &self,
        source: &S,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<CompletedUpload>
    where
        S: ChunkSource + ?Sized,
    {
        let observer = progress_observer(on_progress);
        let session = self.open_session(source)?;
        match self.drive(&session, source, &observer).await? {
            Some(upload) => Ok(upload),
            None => Err(UploadError::Incomplete {
                upload_id: session.id,
                total_chunks: session.total_chunks,
            }),
        }
    }

    /// 上传并把事件发送到 `events`，接收方关闭不影响上传
    pub async fn upload_with_events<S>(
        &self,
        source: &S,
        events: mpsc::UnboundedSender<UploadEvent>,
    ) -> Result<Option<CompletedUpload>>
    where
        S: ChunkSource + ?Sized,
    {
        let observer = |event: &UploadEvent| {
            let _ = events.send(event.clone());
        };

        self.run(source, &observer).await
    }

    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Option<CompletedUpload>> {
        let source = FileSource::open(path).await?;
        self.upload(&source, on_progress).await
    }

    pub async fn upload_file_strict(
        &self,
        path: impl AsRef<Path>,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<CompletedUpload> {
        let source = FileSource::open(path).await?;
        self.upload_strict(&source, on_progress).await
    }

    async fn run<S>(&self, source: &S, observer: &Observer<'_>) -> Result<Option<CompletedUpload>>
    where
        S: ChunkSource + ?Sized,
    {
        let session = self.open_session(source)?;
        self.drive(&session, source, observer).await
    }

    fn open_session<S>(&self, source: &S) -> Result<UploadSession>
    where
        S: ChunkSource + ?Sized,
    {
        UploadSession::new(source.name(), source.len(), self.config.chunk_size)
    }

    /// 驱动整个会话，并把结果通知给观察者
    async fn drive<S>(
        &self,
        session: &UploadSession,
        source: &S,
        observer: &Observer<'_>,
    ) -> Result<Option<CompletedUpload>>
    where
        S: ChunkSource + ?Sized,
    {
        let upload_id = session.id;

        info!(
            %upload_id,
            filename = %session.filename,
            filetype = %session.filetype,
            file_size = session.file_size,
            total_chunks = session.total_chunks,
            "starting chunked upload"
        );
        observer(&UploadEvent::Started {
            upload_id,
            filename: session.filename.clone(),
            total_bytes: session.file_size,
            total_chunks: session.total_chunks,
            started_at: session.created_at,
        });

        if session.total_chunks == 0 {
            warn!(%upload_id, "source is empty, nothing to send");
        }

        let result = self.transfer(session, source, observer).await;
        match &result {
            Ok(Some(upload)) => {
                info!(%upload_id, url = %upload.url, size = upload.size, "upload completed");
                observer(&UploadEvent::Finished { upload_id, completed: true });
            }
            Ok(None) => {
                warn!(%upload_id, total_chunks = session.total_chunks, "receiver never reported completion");
                observer(&UploadEvent::Finished { upload_id, completed: false });
            }
            Err(err) => {
                warn!(%upload_id, error = %err, "upload failed");
                observer(&UploadEvent::Failed { upload_id, error: err.to_string() });
            }
        }

        result
    }

    async fn transfer<S>(
        &self,
        session: &UploadSession,
        source: &S,
        observer: &Observer<'_>,
    ) -> Result<Option<CompletedUpload>>
    where
        S: ChunkSource + ?Sized,
    {
        let mut completed = None;

        for chunk in session.chunks() {
            let record = self.read_chunk(session, source, &chunk).await?;

            debug!(
                upload_id = %session.id,
                chunk_index = chunk.index,
                offset = chunk.offset,
                size = chunk.size,
                "sending chunk"
            );

            match self.transport.send_chunk(&record).await? {
                UploadResponse::Complete(upload) => {
                    observer(&UploadEvent::Completed {
                        upload_id: session.id,
                        upload: upload.clone(),
                    });
                    completed = Some(upload);
                }
                UploadResponse::Pending(ack) => {
                    observer(&UploadEvent::ChunkAccepted {
                        upload_id: session.id,
                        chunk_index: chunk.index,
                        ack,
                    });
                }
            }

            observer(&UploadEvent::Progress {
                upload_id: session.id,
                progress: ChunkProgress {
                    percentage: session.percentage(chunk.ordinal()),
                    current_chunk: chunk.ordinal(),
                    total_chunks: session.total_chunks,
                    bytes_sent: chunk.end(),
                    total_bytes: session.file_size,
                },
            });
        }

        Ok(completed)
    }

    /// 读取并编码单个分片
    async fn read_chunk<S>(
        &self,
        session: &UploadSession,
        source: &S,
        chunk: &ChunkInfo,
    ) -> Result<ChunkRecord>
    where
        S: ChunkSource + ?Sized,
    {
        let data = source.read_range(chunk.offset, chunk.size).await?;

        Ok(ChunkRecord {
            id: session.id,
            chunk_index: chunk.index,
            current_chunk: chunk.ordinal(),
            total_chunks: session.total_chunks,
            filetype: session.filetype.clone(),
            data: BASE64_STANDARD.encode(&data),
        })
    }
}

/// 一次性上传文件到 `{server_url}upload`
pub async fn upload_file(
    path: impl AsRef<Path>,
    on_progress: Option<&ProgressCallback>,
    server_url: &str,
    chunk_size: usize,
) -> Result<Option<CompletedUpload>> {
    ChunkedUploader::new(server_url, ChunkedConfig { chunk_size })?
        .upload_file(path, on_progress)
        .await
}

impl<T: ChunkTransport + 'static> ChunkedUploader<T> {
    /// 在后台任务中上传，返回任务句柄和事件流
    pub fn spawn<S>(self: Arc<Self>, source: S) -> (JoinHandle<Result<Option<CompletedUpload>>>, EventStream)
    where
        S: ChunkSource + 'static,
    {
        let (tx, stream) = EventStream::channel();
        let handle = tokio::spawn(async move {
            self.upload_with_events(&source, tx).await
        });

        (handle, stream)
    }
}
