mod cli;

use adminctl_core::GatewayError;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{e:#}"); // pretty anyhow chain
        let expired = e.chain().any(|cause| {
            cause
                .downcast_ref::<GatewayError>()
                .is_some_and(GatewayError::is_session_expired)
        });
        if expired {
            eprintln!("Run `adminctl login` to start a new session.");
        }
        std::process::exit(1);
    }
}
