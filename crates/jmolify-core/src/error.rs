pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(
        "Script for {target} is {len} bytes, over the {limit}-byte limit; this viewer must be converted by hand"
    )]
    OversizedScript {
        target: String,
        len: usize,
        limit: usize,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}
