pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String, fields: Vec<String> },
	#[error("Internal error: {message}")]
	Internal { message: String },
	#[error("Request was cancelled.")]
	Cancelled,
}
impl From<linkopt_domain::Error> for Error {
	fn from(err: linkopt_domain::Error) -> Self {
		match err {
			linkopt_domain::Error::InvalidRequest { message, fields } =>
				Self::InvalidRequest { message, fields },
			linkopt_domain::Error::ModelConstruction { message } => Self::Internal { message },
		}
	}
}

impl From<linkopt_engine::Error> for Error {
	fn from(err: linkopt_engine::Error) -> Self {
		match err {
			linkopt_engine::Error::ModelConstruction { message } => Self::Internal { message },
			linkopt_engine::Error::Cancelled => Self::Cancelled,
		}
	}
}
