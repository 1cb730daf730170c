use spargel::{compile, ModuleRegistry};

pub fn run_pipeline(src: &str) -> String {
    compile(src, &ModuleRegistry::with_std()).unwrap()
}
