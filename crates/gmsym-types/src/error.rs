/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    // General errors
    #[error("invalid argument")]
    InvalidArg,

    // Buffer errors
    #[error("buffer length not enough: need {need}, got {got}")]
    BufferTooSmall { need: usize, got: usize },
    #[error("input data too long")]
    InputOverflow,

    // Symmetric cipher errors
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("invalid iv length")]
    InvalidIvLength,
    #[error("invalid nonce length")]
    InvalidNonceLength,
    #[error("invalid tag length")]
    InvalidTagLength,
    #[error("aead: tag verification failed")]
    AeadTagVerifyFail,

    // DRBG errors
    #[error("drbg: reseed required")]
    DrbgReseedRequired,
    #[error("drbg: invalid entropy length")]
    DrbgInvalidEntropyLength,
    #[error("drbg: invalid nonce length")]
    DrbgInvalidNonceLength,
    #[error("drbg: personalization is too long")]
    DrbgPersonalizationTooLong,
    #[error("drbg: additional input too long")]
    DrbgAdditionalInputTooLong,
    #[error("drbg: too many bytes requested: max {max}, got {got}")]
    DrbgRequestTooLarge { max: usize, got: usize },
    #[error("drbg: invalid security strength")]
    DrbgInvalidSecurityStrength,
    #[error("drbg: failed to obtain entropy")]
    DrbgEntropyFail,
    #[error("drbg: invalid state")]
    DrbgInvalidState,
}
