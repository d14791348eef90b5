use thiserror::Error;

/// Failure of a name → sky position lookup.
///
/// Surfaced to the caller of [`CentralObjectTracker`](crate::tracker::CentralObjectTracker);
/// whenever one of these is returned the viewport has not been touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("Empty object name")]
    EmptyQuery,

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Ephemeris failure while resolving {0}")]
    Ephemeris(String),

    #[error("External name resolver failed: {0}")]
    ExternalService(String),

    #[error("External name resolver timed out for: {0}")]
    Timeout(String),
}

#[derive(Error, Debug)]
pub enum SkyChartError {
    #[error("Position outside the projection domain")]
    ProjectionDomain,

    #[error("Ephemeris computation failed: {0}")]
    EphemerisComputation(String),

    #[error("Name resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Renderer failed: {0}")]
    Render(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unable to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP ureq error: {0}")]
    UreqHttpError(#[from] ureq::Error),

    #[error("Invalid coordinate literal: {0}")]
    InvalidCoordinateLiteral(String),

    #[error("NaN value where a finite number is required")]
    NaNValue(#[from] ordered_float::FloatIsNan),

    #[error("Time computation error: {0}")]
    Time(String),

    #[error("Logging initialisation failed: {0}")]
    Logging(String),
}

impl From<hifitime::HifitimeError> for SkyChartError {
    fn from(err: hifitime::HifitimeError) -> Self {
        SkyChartError::Time(err.to_string())
    }
}

impl PartialEq for SkyChartError {
    fn eq(&self, other: &Self) -> bool {
        use SkyChartError::*;
        match (self, other) {
            (ProjectionDomain, ProjectionDomain) => true,
            (EphemerisComputation(a), EphemerisComputation(b)) => a == b,
            (Resolution(a), Resolution(b)) => a == b,
            (Render(a), Render(b)) => a == b,
            (InvalidConfig(a), InvalidConfig(b)) => a == b,
            (InvalidCoordinateLiteral(a), InvalidCoordinateLiteral(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (Logging(a), Logging(b)) => a == b,

            // not comparable: same variant is enough
            (ConfigParse(_), ConfigParse(_)) => true,
            (IoError(_), IoError(_)) => true,
            (UreqHttpError(_), UreqHttpError(_)) => true,
            (NaNValue(_), NaNValue(_)) => true,

            _ => false,
        }
    }
}
