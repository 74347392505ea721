use std::path::PathBuf;

fn main() {
    let mut opts = feedscroll::app::RunOptions::default();
    match handle_cli_flags(&mut opts) {
        Ok(true) => return,
        Ok(false) => {}
        Err(message) => {
            eprintln!("error: {message}");
            std::process::exit(2);
        }
    }

    if let Err(err) = feedscroll::run(opts) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags(opts: &mut feedscroll::app::RunOptions) -> Result<bool, String> {
    let mut saw_flag = false;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("feedscroll {}", feedscroll::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "feedscroll: scroll through DummyJSON posts from the terminal.\n\n  --config <path>      Read configuration from <path>\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message"
                );
                saw_flag = true;
            }
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| "--config needs a path".to_string())?;
                opts.config_file = Some(PathBuf::from(path));
            }
            other => return Err(format!("unknown argument {other:?}, see --help")),
        }
    }
    Ok(saw_flag)
}
