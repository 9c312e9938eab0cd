use sea_orm::DbErr;

/// Failures of the banner resolution and persistence core.
///
/// Referential misses (`NoSuchFeature`, `NoSuchTag`) and resolution misses
/// (`NoSuchBanner`) are caller-visible outcomes; `Transaction` always implies
/// the enclosing transaction was rolled back before the error surfaced.
#[derive(Debug, thiserror::Error)]
pub enum BannerError {
    #[error("no such feature")]
    NoSuchFeature,
    #[error("no such tag")]
    NoSuchTag,
    #[error("no such banner")]
    NoSuchBanner,
    /// The resolved banner is inactive and the caller is not an admin.
    #[error("banner is inactive")]
    Inactive,
    #[error("{0}")]
    Validation(String),
    #[error("transaction failed: {0}")]
    Transaction(#[from] DbErr),
    /// A cached revision failed its shape check. Treated as fatal for the
    /// request rather than falling back to the store.
    #[error("cached revision failed shape check: {0}")]
    CacheCorruption(String),
}
