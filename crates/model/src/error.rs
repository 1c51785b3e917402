/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself was malformed (bad audio payload, empty
    /// prompt, unsupported parameters).
    InvalidInput,
    /// The provider is rate limited.
    RateLimitExceeded,
    /// Any other errors.
    Other,
}
