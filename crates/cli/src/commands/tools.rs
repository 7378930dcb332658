//! `foundation tools`: List built-in tools.

pub fn run() {
    let registry = aifoundation_tools::default_registry();
    for tool in registry.list() {
        println!("  {}", tool.name);
        println!("    {}", tool.description);
        if let Some(props) = tool.parameters.get("properties").and_then(|p| p.as_object()) {
            let params = props.keys().cloned().collect::<Vec<_>>().join(", ");
            println!("    params: {params}");
        }
    }
}
