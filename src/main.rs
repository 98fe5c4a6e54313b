fn main() {
    if let Err(err) = student_performance::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
