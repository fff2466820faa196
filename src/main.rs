use avontuur_studio::{api, StudioApp};

/// `--server <url>` / `--server=<url>` beats the environment, which beats the
/// default local backend.
fn server_address(args: impl Iterator<Item = String>) -> String {
    let args: Vec<String> = args.collect();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--server" {
            if let Some(value) = iter.next() {
                return value.clone();
            }
        } else if let Some(value) = arg.strip_prefix("--server=") {
            return value.to_owned();
        }
    }
    std::env::var("AVONTUUR_SERVER").unwrap_or_else(|_| api::DEFAULT_SERVER.to_owned())
}

fn main() -> eframe::Result {
    env_logger::init();
    let server = server_address(std::env::args().skip(1));
    StudioApp::run(server)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_flag_with_separate_value() {
        let args = ["--server", "http://spel.local:8080"].map(String::from);
        assert_eq!(server_address(args.into_iter()), "http://spel.local:8080");
    }

    #[test]
    fn server_flag_with_equals_value() {
        let args = ["--server=http://spel.local:8080"].map(String::from);
        assert_eq!(server_address(args.into_iter()), "http://spel.local:8080");
    }
}
