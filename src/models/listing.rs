use thiserror::Error;

/// Sale mode of a listing, fixed when the post is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStatus {
    ForRental,
    ForSale,
}

impl ListingStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForRental => "for rental",
            Self::ForSale => "for sale",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "for rental" => Some(Self::ForRental),
            "for sale" => Some(Self::ForSale),
            _ => None,
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a listing currently sits in its rental/sale lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Rented,
    Sold,
}

impl Availability {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented => "rented",
            Self::Sold => "sold",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(Self::Available),
            "rented" => Some(Self::Rented),
            "sold" => Some(Self::Sold),
            _ => None,
        }
    }

    /// Parses a client-supplied availability, case-insensitively.
    pub fn from_request(value: &str) -> Result<Self, TransitionError> {
        Self::parse(&value.to_lowercase()).ok_or(TransitionError::InvalidValue)
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Instrument category a listing is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentCategory {
    Guitar,
    Piano,
    Drums,
    Violin,
}

impl InstrumentCategory {
    pub const ALL: [Self; 4] = [Self::Guitar, Self::Piano, Self::Drums, Self::Violin];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guitar => "Guitar",
            Self::Piano => "Piano",
            Self::Drums => "Drums",
            Self::Violin => "Violin",
        }
    }

    /// Exact-case match; categories are stored with their canonical labels.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl std::fmt::Display for InstrumentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid availability. Must be one of: sold, rented, available")]
    InvalidValue,

    #[error("Only posts with '{required}' status can be marked as {requested}")]
    WrongStatus {
        required: ListingStatus,
        requested: Availability,
    },

    #[error("{0}")]
    IllegalTransition(&'static str),

    /// Stored status or availability failed to parse.
    #[error("{0}")]
    CorruptState(&'static str),
}

/// Decides whether a listing may move to the requested availability.
///
/// Takes the stored `status` and `availability` columns as-is plus the raw
/// client value, and returns the availability to persist. Checks run in a
/// fixed order: requested value, stored status, stored availability, then
/// the transition rules for the requested target.
pub fn attempt_transition(
    stored_status: &str,
    stored_availability: &str,
    requested: &str,
) -> Result<Availability, TransitionError> {
    let requested = Availability::from_request(requested)?;

    let status = ListingStatus::parse(stored_status)
        .ok_or(TransitionError::CorruptState("Invalid post status."))?;
    let current = Availability::parse(stored_availability)
        .ok_or(TransitionError::CorruptState("Invalid post availability."))?;

    match requested {
        Availability::Available => {
            if current == Availability::Sold {
                return Err(TransitionError::IllegalTransition(
                    "Cannot mark a sold item as available",
                ));
            }
        }
        Availability::Rented => {
            if status != ListingStatus::ForRental {
                return Err(TransitionError::WrongStatus {
                    required: ListingStatus::ForRental,
                    requested,
                });
            }
            if current == Availability::Sold {
                return Err(TransitionError::IllegalTransition("Cannot rent a sold item"));
            }
        }
        Availability::Sold => {
            if status != ListingStatus::ForSale {
                return Err(TransitionError::WrongStatus {
                    required: ListingStatus::ForSale,
                    requested,
                });
            }
        }
    }

    Ok(requested)
}
