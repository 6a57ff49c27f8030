use crate::model::Reservation;
use crate::store::StoreError;

#[derive(Debug)]
pub enum BookingError {
    /// Malformed or missing input; the caller must correct it.
    Validation(String),
    /// The shared secret did not match.
    Unauthorized,
    /// The requested range overlaps this existing reservation.
    Conflict(Box<Reservation>),
    NotFound,
    Store(StoreError),
}

impl BookingError {
    /// Stable name reported to callers as `errorKind`.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "ValidationError",
            BookingError::Unauthorized => "AuthError",
            BookingError::Conflict(_) => "ConflictError",
            BookingError::NotFound => "NotFoundError",
            BookingError::Store(_) => "StoreError",
        }
    }

    /// Short label for per-occurrence reports.
    pub fn short_label(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "invalid",
            BookingError::Unauthorized => "access denied",
            BookingError::Conflict(_) => "conflict",
            BookingError::NotFound => "not found",
            BookingError::Store(_) => "store error",
        }
    }

    /// True only for store failures that happened before anything was
    /// written. Anything else must be re-queried before a retry.
    pub fn is_retry_safe(&self) -> bool {
        matches!(self, BookingError::Store(e) if !e.op.is_write())
    }
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::Validation(msg) => write!(f, "invalid request: {msg}"),
            BookingError::Unauthorized => write!(f, "access denied: secret does not match"),
            BookingError::Conflict(r) => {
                match r.id {
                    Some(id) => write!(f, "conflicts with reservation {id}")?,
                    None => write!(f, "conflicts with an existing reservation")?,
                }
                write!(f, " ({}-{} by {})", r.start, r.end, r.reserved_by)
            }
            BookingError::NotFound => write!(f, "no matching reservation"),
            BookingError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BookingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BookingError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(e: StoreError) -> Self {
        BookingError::Store(e)
    }
}
