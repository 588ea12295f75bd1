use std::sync::Arc;

use linkopt_service::LinkService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<LinkService>,
}
impl AppState {
	pub fn new(config: linkopt_config::Config) -> color_eyre::Result<Self> {
		let service = LinkService::new(config)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: LinkService) -> Self {
		Self { service: Arc::new(service) }
	}
}
