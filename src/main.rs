//! Binary entrypoint that launches the WhatsApp inbox server.

use std::process::ExitCode;

use whatsapp_inbox::start_inbox;

/// Start the server with configuration from the environment.
fn main() -> ExitCode {
    start_inbox::run()
}
