use std::process::ExitCode;

fn main() -> ExitCode {
    product_audit_cli::run()
}
