use keygate_server::{Server, ServerConfig, init_tracing};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = Server::new(config).run().await {
        eprintln!("server error: {err}");
        std::process::exit(1);
    }
}
