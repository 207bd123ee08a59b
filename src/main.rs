fn main() {
    let cli = keybatch::cli::parse();
    keybatch::tracing::init(cli.log_file.as_deref());

    if let Err(e) = keybatch::app::run(&cli) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
