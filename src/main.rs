use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    let result = app::start();
    match result {
        Ok(..) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}
