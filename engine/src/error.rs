use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    /// A node record failed a type or range check, or a layer has no pixels.
    #[error("malformed node: {0}")]
    MalformedNode(String),
    /// The parent links do not describe a forest in declaration order.
    #[error("invalid tree: {0}")]
    InvalidTree(String),
    /// Encoding or decoding a raster buffer failed.
    #[error("resource error: {0}")]
    Resource(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ViewerError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedNode(msg.into())
    }

    pub fn invalid_tree(msg: impl Into<String>) -> Self {
        Self::InvalidTree(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }
}

impl From<image::ImageError> for ViewerError {
    fn from(err: image::ImageError) -> Self {
        Self::Resource(err.to_string())
    }
}

impl From<base64::DecodeError> for ViewerError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Resource(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
