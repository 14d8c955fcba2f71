fn main() {
    match rules_extract::cli::run() {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            rules_extract::ui::eprintln_error(&err);
            std::process::exit(rules_extract::exit::exit_code(&err));
        }
    }
}
