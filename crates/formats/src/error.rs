#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A JSON document failed to parse.
    Json(String),
    /// The columnar feature table could not be decoded.
    Table(String),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Json(msg) => write!(f, "json parse error: {msg}"),
            FormatError::Table(msg) => write!(f, "feature table decode error: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {}
