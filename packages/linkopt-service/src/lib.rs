pub mod links;
pub mod update;

mod error;

pub use error::{Error, Result};

use std::{future::Future, pin::Pin, sync::Arc};

use tokio::sync::Semaphore;

use linkopt_config::{Config, ProviderConfig};
use linkopt_domain::{
	RawQualifications, SuggestLinksRequest, UpdateModelRequest, UpdateModelResponse,
};
use linkopt_providers::QualificationClient;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait QualificationProvider
where
	Self: Send + Sync,
{
	fn qualifications<'a>(
		&'a self,
		user_id: Option<&'a str>,
		request: &'a SuggestLinksRequest,
	) -> BoxFuture<'a, linkopt_providers::Result<RawQualifications>>;
}

pub trait ClassifierProvider
where
	Self: Send + Sync,
{
	fn update_model<'a>(
		&'a self,
		user_id: &'a str,
		request: &'a UpdateModelRequest,
	) -> BoxFuture<'a, linkopt_providers::Result<UpdateModelResponse>>;
}

#[derive(Clone)]
pub struct Providers {
	pub qualification: Arc<dyn QualificationProvider>,
	pub classifier: Arc<dyn ClassifierProvider>,
}
impl Providers {
	pub fn new(
		qualification: Arc<dyn QualificationProvider>,
		classifier: Arc<dyn ClassifierProvider>,
	) -> Self {
		Self { qualification, classifier }
	}

	/// Both providers backed by one HTTP client for the configured service.
	pub fn from_config(cfg: &ProviderConfig) -> linkopt_providers::Result<Self> {
		let client = Arc::new(DefaultProviders(QualificationClient::new(cfg)?));

		Ok(Self { qualification: client.clone(), classifier: client })
	}
}

struct DefaultProviders(QualificationClient);
impl QualificationProvider for DefaultProviders {
	fn qualifications<'a>(
		&'a self,
		user_id: Option<&'a str>,
		request: &'a SuggestLinksRequest,
	) -> BoxFuture<'a, linkopt_providers::Result<RawQualifications>> {
		Box::pin(self.0.qualifications(user_id, request))
	}
}

impl ClassifierProvider for DefaultProviders {
	fn update_model<'a>(
		&'a self,
		user_id: &'a str,
		request: &'a UpdateModelRequest,
	) -> BoxFuture<'a, linkopt_providers::Result<UpdateModelResponse>> {
		Box::pin(self.0.update_model(user_id, request))
	}
}

pub struct LinkService {
	pub cfg: Config,
	pub providers: Providers,
	solve_slots: Arc<Semaphore>,
}
impl LinkService {
	pub fn new(cfg: Config) -> Result<Self> {
		let providers = Providers::from_config(&cfg.provider).map_err(|err| Error::Internal {
			message: format!("Failed to build provider client: {err}"),
		})?;

		Ok(Self::with_providers(cfg, providers))
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		let solve_slots = Arc::new(Semaphore::new(cfg.solver.max_concurrent_solves.max(1) as usize));

		Self { cfg, providers, solve_slots }
	}

	/// Solver slots not held by a running solve.
	pub fn available_solve_slots(&self) -> usize {
		self.solve_slots.available_permits()
	}
}
