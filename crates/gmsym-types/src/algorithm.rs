/// Hash algorithm identifiers accepted by the hash-based DRBGs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgId {
    Sm3,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgId {
    /// Digest size in bytes.
    pub fn output_size(self) -> usize {
        match self {
            Self::Sm3 | Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

/// Which standard a DRBG instance follows.
///
/// GM/T 0105-2021 differs from NIST SP 800-90A in reseed operand order,
/// per-request output caps and the time-based reseed policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrbgDialect {
    #[default]
    Nist,
    Gm,
}

/// DRBG security level, selecting the reseed intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecurityLevel {
    /// Level one: 2^20 generate calls / 600 s (GM).
    #[default]
    One,
    /// Level two: 2^10 generate calls / 60 s (GM).
    Two,
    /// Short intervals for exercising reseed paths in tests.
    Test,
}

/// Tweak-doubling convention for XTS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum XtsDialect {
    /// IEEE 1619: little-endian multiply by x, feedback byte 0x87.
    #[default]
    Ieee,
    /// GB/T 17964-2021: bit-reflected multiply, feedback byte 0xE1.
    Gb,
}
