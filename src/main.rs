use jobsh::Interpreter;

fn main() -> anyhow::Result<()> {
    jobsh::signals::install()?;
    Interpreter::default().repl()
}
