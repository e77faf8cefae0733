use thiserror::Error;

/// Main error type for the Reel-Compositor library
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Invalid parameter {context}: {details}")]
    InvalidParameter { context: String, details: String },

    #[error("Cannot read {asset} from {path}: {reason}")]
    AssetUnreadable {
        asset: String,
        path: String,
        reason: String,
    },

    #[error("Encoding failed: {reason}")]
    Encode { reason: String },

    #[error("Project contains no images")]
    EmptyProject,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using ReelError
pub type Result<T> = std::result::Result<T, ReelError>;

impl ReelError {
    pub fn invalid<C: Into<String>, D: Into<String>>(context: C, details: D) -> Self {
        Self::InvalidParameter {
            context: context.into(),
            details: details.into(),
        }
    }

    pub fn unreadable<A, P, R>(asset: A, path: P, reason: R) -> Self
    where
        A: Into<String>,
        P: Into<String>,
        R: Into<String>,
    {
        Self::AssetUnreadable {
            asset: asset.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn encode<S: Into<String>>(reason: S) -> Self {
        Self::Encode {
            reason: reason.into(),
        }
    }

    /// Prefix the context of an `InvalidParameter` error, e.g. with the
    /// image index it came from. Other kinds pass through untouched.
    pub fn within(self, prefix: &str) -> Self {
        match self {
            Self::InvalidParameter { context, details } => Self::InvalidParameter {
                context: format!("{}.{}", prefix, context),
                details,
            },
            other => other,
        }
    }

    /// Whether fixing the project input would make the render succeed.
    /// Nothing in the pipeline is retried: identical input fails identically.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. }
                | Self::AssetUnreadable { .. }
                | Self::EmptyProject
                | Self::Config(_)
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyProject => "Add at least one image before rendering.".to_string(),
            Self::AssetUnreadable { asset, path, .. } => {
                format!("Could not read {} '{}'. Please check the file exists and is a supported format.", asset, path)
            }
            Self::InvalidParameter { context, details } => {
                format!("The value of '{}' is out of range: {}", context, details)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
