use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk '{}': {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },
    #[error("invalid token json in '{}': {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("required input not found: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("unresolved reference {{{0}}}")]
    UnresolvedReference(String),
    #[error("circular reference through {{{0}}}")]
    CircularReference(String),
    #[error("token '{path}' has an invalid modifier: {reason}")]
    InvalidModifier { path: String, reason: String },
    #[error("token '{0}' has a composite value where a single value is required")]
    CompositeValue(String),
    #[error("line {line}: not a variable definition: {content}")]
    MalformedLine { line: usize, content: String },
    #[error("no variables found in '{}'", .0.display())]
    NoVariables(PathBuf),
    #[error("failed to serialize tokens: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("theme '{theme}' diverges from the reference theme: {detail}")]
    ThemeShape { theme: String, detail: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
