use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_env("YAMLPROPS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    yamlprops::app::cli::run();
}
