//! Error types for rating computation and feed parsing.

pub type Result<T> = std::result::Result<T, EloError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EloError {
    #[error("unknown team id {team_id}")]
    UnknownTeam { team_id: u32 },

    #[error("malformed match data: {message}")]
    DataFormat { message: String },

    #[error("invalid season range {start}..={end}")]
    InvalidSeasonRange { start: u16, end: u16 },
}

impl EloError {
    pub fn data_format(message: impl Into<String>) -> Self {
        Self::DataFormat {
            message: message.into(),
        }
    }
}
