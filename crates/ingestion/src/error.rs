//! Ingestion 错误类型

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 录制文件中的一行无法解析
    #[error("failed to parse {path}:{line}: {message}")]
    ParseFailed {
        /// 录制文件路径
        path: PathBuf,
        /// 行号（从 1 开始）
        line: usize,
        /// 错误消息
        message: String,
    },

    /// 录制文件读取失败
    #[error("failed to read recording {path}: {source}")]
    Recording {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 录制文件中没有任何帧
    #[error("recording {path} contains no frames")]
    EmptyRecording { path: PathBuf },

    /// 通道已关闭
    #[error("channel {channel} is closed")]
    ChannelClosed {
        /// 通道名
        channel: String,
    },

    /// 数据源已在运行
    #[error("source {source_id} is already running")]
    AlreadyRunning {
        /// 数据源 ID
        source_id: String,
    },

    /// Subscriber 已启动，不能再注册数据源
    #[error("subscriber on {channel} already started")]
    AlreadyStarted {
        /// 通道名
        channel: String,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
