use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = linkopt_api::Args::parse();

	linkopt_api::run(args).await
}
