//! Workflow commands understood by the CI runner. These are the only lines the
//! uploader writes to stdout.

pub fn add_mask(value: &str) {
    println!("{}", command("add-mask", value));
}

pub fn error(message: &str) {
    println!("{}", command("error", message));
}

fn command(name: &str, value: &str) -> String {
    format!("::{name}::{}", escape_data(value))
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
