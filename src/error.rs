use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// AI 生成题目错误
    #[error("{0}")]
    Generation(#[from] GenerationError),
    /// 导出/渲染错误
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 本地存储错误（logo 槽位）
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 剪贴板错误
    #[error("剪贴板错误: {0}")]
    Clipboard(#[from] ClipboardError),
    /// 预览窗口错误
    #[error("预览错误: {0}")]
    Preview(#[from] PreviewError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 试卷编辑错误
    #[error("编辑错误: {0}")]
    Edit(#[from] EditError),
}

/// AI 生成题目错误
///
/// Display 文本直接展示给用户，所以使用印尼语。
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 请求频率限制（HTTP 429）
    #[error("Terlalu banyak permintaan (Quota Exceeded). Mohon tunggu 1 menit sebelum mencoba lagi.")]
    RateLimited,
    /// 服务端繁忙（500 / 503 / overloaded）
    #[error("Server AI sedang sibuk. Silakan coba lagi dalam beberapa saat.")]
    Overloaded,
    /// 内容安全拦截
    #[error("Topik soal terdeteksi sensitif oleh sistem keamanan AI. Coba ubah kata kunci topik.")]
    SafetyBlocked,
    /// 返回内容无法解析为题目列表
    #[error("Gagal membaca format data dari AI. Silakan coba lagi.")]
    MalformedResponse {
        #[source]
        source: Option<serde_json::Error>,
    },
    /// 返回内容为空
    #[error("Respon dari server AI kosong (Empty Response).")]
    EmptyResponse,
    /// 没有生成任何题目
    #[error("Tidak ada soal yang dihasilkan.")]
    NoQuestions,
    /// 配置非法（题目数量超出范围等）
    #[error("Konfigurasi tidak valid: {0}")]
    InvalidConfig(String),
    /// 其他 API 错误
    #[error("Error: {0}")]
    Other(String),
}

/// 导出/渲染错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// PDF 构建失败
    #[error("PDF 生成失败: {0}")]
    Pdf(#[from] lopdf::Error),
    /// DOCX 打包失败
    #[error("DOCX 打包失败: {0}")]
    Package(#[from] zip::result::ZipError),
    /// 图片解码/编码失败
    #[error("图片处理失败: {0}")]
    Image(#[from] image::ImageError),
    /// 图片数据不是合法的 data URL
    #[error("非法的图片数据: {0}")]
    InvalidDataUrl(String),
    /// 远程图片下载失败
    #[error("下载图片失败 ({url}): {source}")]
    ImageFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// 内存写入失败
    #[error("写入缓冲区失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 本地存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 超出存储配额
    #[error("Ukuran logo terlalu besar untuk disimpan ({size} byte, maksimal {limit} byte)")]
    QuotaExceeded { size: usize, limit: usize },
    /// 读取存储文件失败
    #[error("读取存储失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入存储文件失败
    #[error("写入存储失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 存储内容损坏
    #[error("存储内容无法解析 ({path}): {source}")]
    Corrupted {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 上传的文件不是可识别的图片
    #[error("File logo bukan gambar yang valid: {0}")]
    InvalidImage(#[from] image::ImageError),
}

/// 剪贴板错误
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// 初始化剪贴板失败
    #[error("无法访问剪贴板: {0}")]
    InitializationFailed(String),
    /// 写入剪贴板失败
    #[error("复制到剪贴板失败: {0}")]
    CopyFailed(String),
}

/// 预览窗口错误
#[derive(Debug, Error)]
pub enum PreviewError {
    /// 宿主环境拒绝打开新窗口
    #[error("Gagal membuka jendela preview. Mohon izinkan pop-up untuk melihat preview PDF.")]
    Blocked,
    /// 启动查看器失败
    #[error("启动 PDF 查看器失败: {0}")]
    LaunchFailed(#[source] std::io::Error),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 试卷文件解析失败
    #[error("解析文件失败 ({path}): {message}")]
    ParseFailed { path: String, message: String },
    /// 不支持的文件格式
    #[error("不支持的文件格式: {path}")]
    UnsupportedFormat { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    FileParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 缺少 API Key
    #[error("缺少 LLM API Key，请设置环境变量 LLM_API_KEY")]
    MissingApiKey,
}

/// 试卷编辑错误
#[derive(Debug, Error)]
pub enum EditError {
    /// 当前没有试卷
    #[error("当前没有试卷")]
    NoExam,
    /// 题目不存在
    #[error("题目不存在: {id}")]
    QuestionNotFound { id: String },
}

// ========== 从常见错误类型转换 ==========

impl From<lopdf::Error> for AppError {
    fn from(err: lopdf::Error) -> Self {
        AppError::Export(ExportError::Pdf(err))
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Export(ExportError::Package(err))
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Export(ExportError::Image(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Export(ExportError::Io(err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件解析错误
    pub fn file_parse_failed(path: impl Into<String>, message: impl ToString) -> Self {
        AppError::File(FileError::ParseFailed {
            path: path.into(),
            message: message.to_string(),
        })
    }

    /// 创建题目不存在错误
    pub fn question_not_found(id: impl Into<String>) -> Self {
        AppError::Edit(EditError::QuestionNotFound { id: id.into() })
    }

    /// 是否为 AI 生成错误
    pub fn is_generation(&self) -> bool {
        matches!(self, AppError::Generation(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_messages_are_user_facing() {
        let err = AppError::from(GenerationError::RateLimited);
        assert!(err.to_string().contains("Quota Exceeded"));
        assert!(err.is_generation());
    }

    #[test]
    fn io_error_maps_to_export() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = AppError::from(io);
        assert!(matches!(err, AppError::Export(ExportError::Io(_))));
    }
}
